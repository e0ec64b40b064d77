//! State of a single deployment attempt.
//!
//! ```text
//! Requested ─► ImageBuilt ─► NamespaceReady ─► Deployed
//!     │             │               │
//!     └─────────────┴───────────────┴──► Failed(stage)
//! ```
//!
//! There is no rollback and no retry: a failed attempt leaves whatever the
//! collaborators already created in place.

use crate::error::DeploymentStage;

/// Progress of one deployment attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeploymentState {
    /// Nothing done yet.
    Requested,
    /// Image built and pushed.
    ImageBuilt {
        /// Pushed image
        image_name: String,
    },
    /// Namespace exists.
    NamespaceReady {
        /// Pushed image
        image_name: String,
        /// Namespace name
        namespace: String,
    },
    /// Container deployed.
    Deployed {
        /// Pushed image
        image_name: String,
        /// Namespace name
        namespace: String,
        /// Cluster handle of the deployment
        deployment_handle: String,
    },
    /// A collaborator failed.
    Failed {
        /// Step that failed
        stage: DeploymentStage,
    },
}

impl DeploymentState {
    /// Stage the next transition runs, `None` once finished or failed.
    #[must_use]
    pub const fn next_stage(&self) -> Option<DeploymentStage> {
        match self {
            Self::Requested => Some(DeploymentStage::ImageBuild),
            Self::ImageBuilt { .. } => Some(DeploymentStage::NamespaceCreate),
            Self::NamespaceReady { .. } => Some(DeploymentStage::Deploy),
            Self::Deployed { .. } | Self::Failed { .. } => None,
        }
    }

    /// Short name for logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Requested => "requested",
            Self::ImageBuilt { .. } => "image-built",
            Self::NamespaceReady { .. } => "namespace-ready",
            Self::Deployed { .. } => "deployed",
            Self::Failed { .. } => "failed",
        }
    }

    /// Whether the attempt reached a final state.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        self.next_stage().is_none()
    }

    /// Record a successful step. `output` is what the collaborator returned
    /// (image name, namespace, deployment handle). Terminal states are kept.
    #[must_use]
    pub fn advance(self, output: String) -> Self {
        match self {
            Self::Requested => Self::ImageBuilt { image_name: output },
            Self::ImageBuilt { image_name } => Self::NamespaceReady {
                image_name,
                namespace: output,
            },
            Self::NamespaceReady {
                image_name,
                namespace,
            } => Self::Deployed {
                image_name,
                namespace,
                deployment_handle: output,
            },
            terminal @ (Self::Deployed { .. } | Self::Failed { .. }) => terminal,
        }
    }

    /// Record a failure of the pending step. Terminal states are kept.
    #[must_use]
    pub fn fail(self) -> Self {
        match self.next_stage() {
            Some(stage) => Self::Failed { stage },
            None => self,
        }
    }
}
