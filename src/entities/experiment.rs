//! Experiment - root entity for experiment tracking

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ExperimentId;

/// Experiment represents a named group of training attempts.
///
/// This is the root entity in the tracking schema. Each experiment can
/// have multiple runs. Names are unique across the store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Experiment {
    experiment_id: ExperimentId,
    experiment_name: String,
    created_at: DateTime<Utc>,
}

impl Experiment {
    /// Create a new experiment with a fresh id.
    ///
    /// # Arguments
    ///
    /// * `name` - Human-readable, unique name for the experiment
    /// * `created_at` - Creation timestamp
    #[must_use]
    pub fn new(name: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            experiment_id: ExperimentId::new(),
            experiment_name: name.into(),
            created_at,
        }
    }

    /// Get the experiment ID.
    #[must_use]
    pub const fn experiment_id(&self) -> ExperimentId {
        self.experiment_id
    }

    /// Get the experiment name.
    #[must_use]
    pub fn experiment_name(&self) -> &str {
        &self.experiment_name
    }

    /// Get the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}
