//! Deployment targets and deployment records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{DeploymentId, DeploymentTargetId, ExperimentId, RunId};

/// Logical destination environment of a deployment (e.g. "Test", "Prod").
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeploymentTarget {
    /// Unique id
    pub deployment_target_id: DeploymentTargetId,
    /// Unique name
    pub name: String,
    /// Whether this target serves production traffic
    pub is_production: bool,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl DeploymentTarget {
    /// Create a target with a fresh id.
    #[must_use]
    pub fn new(name: impl Into<String>, is_production: bool, created_at: DateTime<Utc>) -> Self {
        Self {
            deployment_target_id: DeploymentTargetId::new(),
            name: name.into(),
            is_production,
            created_at,
        }
    }
}

/// Record of a successful deployment of a run's model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Deployment {
    /// Unique id
    pub deployment_id: DeploymentId,
    /// Deployed run
    pub run_id: RunId,
    /// Experiment of the deployed run
    pub experiment_id: ExperimentId,
    /// Target the run was deployed to
    pub deployment_target_id: DeploymentTargetId,
    /// Container image that was built and pushed
    pub image_name: String,
    /// Cluster namespace the image runs in
    pub namespace: String,
    /// Handle returned by the cluster for the created deployment
    pub deployment_handle: String,
    /// Who requested the deployment
    pub deployed_by: String,
    /// When the deployment completed
    pub deployment_date: DateTime<Utc>,
}
