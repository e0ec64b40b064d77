//! Error types for mlops-core
//!
//! Toyota Way: Clear error messages with actionable guidance (Respect for People)

use std::fmt;

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Boxed collaborator error carried inside [`Error::Deployment`].
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Step of a deployment saga at which a collaborator failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeploymentStage {
    /// Building and pushing the container image
    ImageBuild,
    /// Creating (or reusing) the cluster namespace
    NamespaceCreate,
    /// Deploying the image into the namespace
    Deploy,
}

impl DeploymentStage {
    /// Stable tag used in error messages and logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ImageBuild => "image-build",
            Self::NamespaceCreate => "namespace-create",
            Self::Deploy => "deploy",
        }
    }
}

impl fmt::Display for DeploymentStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// mlops-core error types
#[derive(Error, Debug)]
pub enum Error {
    /// Referenced entity does not exist
    #[error("{entity} not found: {key}")]
    NotFound {
        /// Entity family, e.g. "experiment" or "run"
        entity: &'static str,
        /// Id or name that was looked up
        key: String,
    },

    /// Uniqueness violation on a named entity
    #[error("{entity} named '{name}' already exists\nPick a different name or look the existing one up")]
    DuplicateName {
        /// Entity family, e.g. "experiment"
        entity: &'static str,
        /// The conflicting name
        name: String,
    },

    /// Best-run query found no metric with the requested name
    #[error("No run of experiment {experiment_id} has a metric named '{metric_name}'")]
    NoMatch {
        /// Experiment that was searched
        experiment_id: String,
        /// Metric name that was requested
        metric_name: String,
    },

    /// Container or cluster collaborator failed during a deployment
    #[error("Deployment failed at stage {stage}: {source}\nNo deployment record was persisted")]
    Deployment {
        /// Saga step that failed
        stage: DeploymentStage,
        /// Underlying collaborator error
        #[source]
        source: BoxError,
    },

    /// Caller supplied an invalid value
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Configuration could not be loaded or is inconsistent
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Shorthand for [`Error::NotFound`].
    pub fn not_found(entity: &'static str, key: impl fmt::Display) -> Self {
        Self::NotFound {
            entity,
            key: key.to_string(),
        }
    }

    /// Wrap a collaborator failure with the saga stage it occurred in.
    pub fn deployment(stage: DeploymentStage, source: anyhow::Error) -> Self {
        Self::Deployment {
            stage,
            source: source.into(),
        }
    }

    /// Stage tag of a deployment failure, if this is one.
    #[must_use]
    pub const fn deployment_stage(&self) -> Option<DeploymentStage> {
        match self {
            Self::Deployment { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}
