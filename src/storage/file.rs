//! Model artifact storage on the local filesystem.

use std::future::Future;
use std::path::{Component, Path, PathBuf};

use tracing::debug;

use crate::entities::{RunArtifactId, RunId};
use crate::{Error, Result};

/// Blob storage for model artifacts.
pub trait ModelStorage: Send + Sync {
    /// Copy the file at `source` into storage as artifact `run_artifact_id`
    /// of `run_id`; returns its URI.
    fn upload(
        &self,
        run_id: RunId,
        run_artifact_id: RunArtifactId,
        source: &Path,
    ) -> impl Future<Output = Result<String>> + Send;

    /// Copy the artifact at `uri` to `destination`.
    fn download(&self, uri: &str, destination: &Path) -> impl Future<Output = Result<()>> + Send;
}

/// Stores artifacts as `<root>/<run_id>/<run_artifact_id>/<file name>`.
#[derive(Debug, Clone)]
pub struct FileModelStorage {
    root: PathBuf,
}

impl FileModelStorage {
    /// Store artifacts below `root`. The directory is created on first upload.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Storage root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map a URI back to a file below the root. Everything after the root
    /// must be plain path segments, so `..` cannot leave the root.
    fn resolve(&self, uri: &str) -> Result<PathBuf> {
        let path = PathBuf::from(uri);
        let confined = path.strip_prefix(&self.root).is_ok_and(|rest| {
            rest.components().next().is_some()
                && rest.components().all(|c| matches!(c, Component::Normal(_)))
        });
        if confined {
            Ok(path)
        } else {
            Err(Error::InvalidInput(format!(
                "artifact uri '{uri}' is outside model storage {}",
                self.root.display()
            )))
        }
    }
}

impl ModelStorage for FileModelStorage {
    async fn upload(&self, run_id: RunId, run_artifact_id: RunArtifactId, source: &Path) -> Result<String> {
        let file_name = source.file_name().ok_or_else(|| {
            Error::InvalidInput(format!("artifact path {} has no file name", source.display()))
        })?;
        let directory = self
            .root
            .join(run_id.to_string())
            .join(run_artifact_id.to_string());
        tokio::fs::create_dir_all(&directory).await?;

        let destination = directory.join(file_name);
        let bytes = tokio::fs::copy(source, &destination).await?;
        debug!(%run_id, bytes, destination = %destination.display(), "uploaded model artifact");
        Ok(destination.to_string_lossy().into_owned())
    }

    async fn download(&self, uri: &str, destination: &Path) -> Result<()> {
        let source = self.resolve(uri)?;
        if let Some(parent) = destination.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::copy(&source, destination).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_upload_then_download() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("model.onnx");
        tokio::fs::write(&source, b"weights").await.unwrap();

        let storage = FileModelStorage::new(dir.path().join("repo"));
        let run_id = RunId::new();
        let uri = storage.upload(run_id, RunArtifactId::new(), &source).await.unwrap();
        assert!(uri.contains(&run_id.to_string()));
        assert!(uri.ends_with("model.onnx"));

        let destination = dir.path().join("out").join("model.onnx");
        storage.download(&uri, &destination).await.unwrap();
        assert_eq!(tokio::fs::read(&destination).await.unwrap(), b"weights");
    }

    #[tokio::test]
    async fn test_upload_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileModelStorage::new(dir.path());
        let err = storage
            .upload(RunId::new(), RunArtifactId::new(), &dir.path().join("absent.bin"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }

    #[tokio::test]
    async fn test_download_outside_root_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileModelStorage::new(dir.path().join("repo"));
        let err = storage
            .download("/etc/passwd", &dir.path().join("x"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_download_parent_dir_escape_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let secret = dir.path().join("secret.txt");
        tokio::fs::write(&secret, b"outside").await.unwrap();
        let root = dir.path().join("repo");
        tokio::fs::create_dir_all(&root).await.unwrap();
        let storage = FileModelStorage::new(&root);
        let destination = dir.path().join("copied.txt");

        for uri in [
            root.join("..").join("secret.txt"),
            root.join("run").join("..").join("..").join("secret.txt"),
            root.clone(),
        ] {
            let err = storage
                .download(&uri.to_string_lossy(), &destination)
                .await
                .unwrap_err();
            assert!(matches!(err, Error::InvalidInput(_)), "{}", uri.display());
        }
        assert!(!destination.exists());
    }

    #[tokio::test]
    async fn test_same_file_name_twice_keeps_both() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileModelStorage::new(dir.path().join("repo"));
        let run_id = RunId::new();
        let source = dir.path().join("model.onnx");

        tokio::fs::write(&source, b"first").await.unwrap();
        let first = storage.upload(run_id, RunArtifactId::new(), &source).await.unwrap();
        tokio::fs::write(&source, b"second").await.unwrap();
        let second = storage.upload(run_id, RunArtifactId::new(), &source).await.unwrap();

        assert_ne!(first, second);
        assert_eq!(tokio::fs::read(&first).await.unwrap(), b"first");
        assert_eq!(tokio::fs::read(&second).await.unwrap(), b"second");
    }
}
