//! Configuration for the container registry, the cluster and model storage.
//!
//! Loaded from a JSON file, then optionally overridden from the environment:
//!
//! | Variable | Field |
//! |---|---|
//! | `MLOPS_DOCKER_REGISTRY` | `docker.registry_name` |
//! | `MLOPS_DOCKER_USERNAME` | `docker.username` |
//! | `MLOPS_DOCKER_PASSWORD` | `docker.password` |
//! | `MLOPS_KUBECONFIG` | `kubernetes.config_path` |
//! | `MLOPS_MODEL_STORAGE_ROOT` | `model_storage.root` |

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct MlOpsConfig {
    /// Container registry settings
    pub docker: DockerSettings,

    /// Cluster settings
    pub kubernetes: KubernetesSettings,

    /// Model artifact storage settings
    pub model_storage: ModelStorageSettings,
}

/// Container registry settings.
#[derive(Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DockerSettings {
    /// Registry host (and optional path) images are pushed to
    pub registry_name: String,

    /// Registry user
    pub username: String,

    /// Registry password
    pub password: String,
}

impl fmt::Debug for DockerSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DockerSettings")
            .field("registry_name", &self.registry_name)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Cluster settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct KubernetesSettings {
    /// kubeconfig file used by the cluster client
    pub config_path: Option<PathBuf>,

    /// Prefix prepended to every created namespace
    pub namespace_prefix: String,
}

/// Model artifact storage settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ModelStorageSettings {
    /// Directory artifacts are copied into
    pub root: PathBuf,
}

impl Default for ModelStorageSettings {
    fn default() -> Self {
        Self {
            root: PathBuf::from("./model-repository"),
        }
    }
}

impl MlOpsConfig {
    /// Load configuration from a JSON file. Missing fields take defaults.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the file cannot be read and
    /// [`Error::Config`] if it is not valid configuration JSON.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        serde_json::from_str(&text)
            .map_err(|e| Error::Config(format!("{}: {e}", path.display())))
    }

    /// Apply `MLOPS_*` environment overrides.
    #[must_use]
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary variable lookup.
    #[must_use]
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(registry) = lookup("MLOPS_DOCKER_REGISTRY") {
            self.docker.registry_name = registry;
        }
        if let Some(username) = lookup("MLOPS_DOCKER_USERNAME") {
            self.docker.username = username;
        }
        if let Some(password) = lookup("MLOPS_DOCKER_PASSWORD") {
            self.docker.password = password;
        }
        if let Some(kubeconfig) = lookup("MLOPS_KUBECONFIG") {
            self.kubernetes.config_path = Some(PathBuf::from(kubeconfig));
        }
        if let Some(root) = lookup("MLOPS_MODEL_STORAGE_ROOT") {
            self.model_storage.root = PathBuf::from(root);
        }
        self
    }

    /// Check cross-field consistency.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if a password is set without a username, or
    /// the namespace prefix is not a valid cluster label prefix.
    pub fn validate(&self) -> Result<()> {
        if !self.docker.password.is_empty() && self.docker.username.is_empty() {
            return Err(Error::Config(
                "docker.password is set but docker.username is empty".to_string(),
            ));
        }
        let prefix = &self.kubernetes.namespace_prefix;
        if !prefix
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        {
            return Err(Error::Config(format!(
                "kubernetes.namespace_prefix '{prefix}' may only contain lowercase letters, digits and '-'"
            )));
        }
        Ok(())
    }
}
