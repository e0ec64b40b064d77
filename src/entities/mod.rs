//! Experiment Tracking Entities
//!
//! ## Schema Overview
//!
//! ```text
//! Experiment (1) ──< Run (N)
//!                     │
//!                     ├──< Metric (N)
//!                     ├──< ModelSchema (≤2: ModelInput, ModelOutput)
//!                     ├──< HyperParameter (N)
//!                     ├──< ConfusionMatrix (≤1)
//!                     ├──< Data (≤1) ──< DataColumn (N) ──< DataDistribution (N)
//!                     ├──< RunArtifact (N) ──< RegisteredModel (N)
//!                     └──< Deployment (N) >── DeploymentTarget
//! ```

mod data;
mod deployment;
mod evaluation;
mod experiment;
mod ids;
mod metric;
mod model;
mod run;

pub use data::{Data, DataColumn, DataDistribution};
pub use deployment::{Deployment, DeploymentTarget};
pub use evaluation::{ConfusionMatrix, HyperParameter};
pub use experiment::Experiment;
pub use ids::{
    DataColumnId, DataDistributionId, DataId, DeploymentId, DeploymentTargetId, ExperimentId,
    HyperParameterId, MetricId, RegisteredModelId, RunArtifactId, RunId,
};
pub use metric::Metric;
pub use model::{RegisteredModel, RunArtifact};
pub use run::{ModelSchema, PackageDependency, Run, RunBuilder, MODEL_INPUT, MODEL_OUTPUT};
