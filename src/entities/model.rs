//! Model artifacts and the model registry

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ExperimentId, RegisteredModelId, RunArtifactId, RunId};

/// A model file produced by a run and copied into model storage.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RunArtifact {
    /// Unique id
    pub run_artifact_id: RunArtifactId,
    /// Producing run
    pub run_id: RunId,
    /// Artifact file name (e.g., "model.onnx")
    pub name: String,
    /// Location in model storage
    pub uri: String,
}

/// A versioned entry in the model registry of an experiment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RegisteredModel {
    /// Unique id
    pub registered_model_id: RegisteredModelId,
    /// Owning experiment
    pub experiment_id: ExperimentId,
    /// Registered artifact
    pub run_artifact_id: RunArtifactId,
    /// 1-based, increasing per experiment
    pub version: u32,
    /// Who registered the model
    pub registered_by: String,
    /// Free-form description
    pub description: String,
    /// Registration timestamp
    pub registered_at: DateTime<Utc>,
}
