//! Package dependency snapshots for run reproducibility.
//!
//! A Rust process has no runtime view of its linked crates, so the snapshot is
//! taken from the `Cargo.lock` of the workspace the process runs in. When no
//! lockfile can be read the snapshot falls back to this crate's own
//! name/version, so it is never empty.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, warn};

use crate::entities::PackageDependency;

/// Environment variable naming an explicit lockfile to read.
pub const LOCKFILE_ENV: &str = "MLOPS_CARGO_LOCK";

/// Captures the package dependencies of the calling process.
pub trait PackageDependencyIdentifier: Send + Sync {
    /// Current dependency set, sorted by name then version.
    fn identify(&self) -> Vec<PackageDependency>;
}

#[derive(Debug, Deserialize)]
struct Lockfile {
    #[serde(default)]
    package: Vec<LockedPackage>,
}

#[derive(Debug, Deserialize)]
struct LockedPackage {
    name: String,
    version: String,
}

/// Reads dependencies from a `Cargo.lock` file.
#[derive(Debug, Clone)]
pub struct LockfileDependencyIdentifier {
    path: PathBuf,
}

impl LockfileDependencyIdentifier {
    /// Read the lockfile at `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Lockfile from `MLOPS_CARGO_LOCK`, else `Cargo.lock` in the working directory.
    #[must_use]
    pub fn from_env() -> Self {
        let path = std::env::var_os(LOCKFILE_ENV)
            .map_or_else(|| PathBuf::from("Cargo.lock"), PathBuf::from);
        Self::new(path)
    }

    /// Path that will be read.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> crate::Result<Vec<PackageDependency>> {
        let text = std::fs::read_to_string(&self.path)?;
        parse_lockfile(&text)
    }
}

impl Default for LockfileDependencyIdentifier {
    fn default() -> Self {
        Self::from_env()
    }
}

impl PackageDependencyIdentifier for LockfileDependencyIdentifier {
    fn identify(&self) -> Vec<PackageDependency> {
        match self.read() {
            Ok(dependencies) if !dependencies.is_empty() => {
                debug!(path = %self.path.display(), count = dependencies.len(), "captured dependency snapshot");
                dependencies
            }
            Ok(_) => own_package(),
            Err(error) => {
                warn!(path = %self.path.display(), %error, "lockfile unreadable, recording own package only");
                own_package()
            }
        }
    }
}

/// Returns a fixed dependency list.
#[derive(Debug, Clone, Default)]
pub struct StaticDependencyIdentifier {
    dependencies: Vec<PackageDependency>,
}

impl StaticDependencyIdentifier {
    /// Always report `dependencies`.
    #[must_use]
    pub fn new(mut dependencies: Vec<PackageDependency>) -> Self {
        dependencies.sort();
        dependencies.dedup();
        Self { dependencies }
    }
}

impl PackageDependencyIdentifier for StaticDependencyIdentifier {
    fn identify(&self) -> Vec<PackageDependency> {
        self.dependencies.clone()
    }
}

/// Parse the `[[package]]` entries of a `Cargo.lock` document.
///
/// # Errors
///
/// Returns [`crate::Error::InvalidInput`] if the document is not valid TOML.
pub fn parse_lockfile(text: &str) -> crate::Result<Vec<PackageDependency>> {
    let lockfile: Lockfile = toml::from_str(text)
        .map_err(|e| crate::Error::InvalidInput(format!("malformed Cargo.lock: {e}")))?;
    let mut dependencies: Vec<PackageDependency> = lockfile
        .package
        .into_iter()
        .map(|p| PackageDependency::new(p.name, p.version))
        .collect();
    dependencies.sort();
    dependencies.dedup();
    Ok(dependencies)
}

fn own_package() -> Vec<PackageDependency> {
    vec![PackageDependency::new(
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION"),
    )]
}
