//! Run - one training attempt within an experiment

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ExperimentId, Metric, RunId};
use crate::schema::SchemaDefinition;

/// Role name of the recorded model input schema.
pub const MODEL_INPUT: &str = "ModelInput";

/// Role name of the recorded model output schema.
pub const MODEL_OUTPUT: &str = "ModelOutput";

/// A package name/version pair captured when a run is created.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PackageDependency {
    name: String,
    version: String,
}

impl PackageDependency {
    /// Create a dependency entry.
    #[must_use]
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }

    /// Package name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Package version.
    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }
}

/// Recorded field-level shape of a run's model input or output.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ModelSchema {
    name: String,
    definition: SchemaDefinition,
}

impl ModelSchema {
    /// Create a schema record for role `name`.
    #[must_use]
    pub fn new(name: impl Into<String>, definition: SchemaDefinition) -> Self {
        Self {
            name: name.into(),
            definition,
        }
    }

    /// Role name (`ModelInput` or `ModelOutput`).
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Generated field definition.
    #[must_use]
    pub const fn definition(&self) -> &SchemaDefinition {
        &self.definition
    }
}

/// Run represents a single training attempt of an experiment.
///
/// A run is the aggregation root for metrics, model schemas and the package
/// dependency snapshot taken when it was created.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Run {
    run_id: RunId,
    experiment_id: ExperimentId,
    run_date: DateTime<Utc>,
    git_commit_hash: Option<String>,
    training_time: Option<Duration>,
    package_dependencies: Vec<PackageDependency>,
    metrics: Vec<Metric>,
    model_schemas: Vec<ModelSchema>,
}

impl Run {
    /// Create a builder for a run of `experiment_id` created at `run_date`.
    #[must_use]
    pub fn builder(experiment_id: ExperimentId, run_date: DateTime<Utc>) -> RunBuilder {
        RunBuilder::new(experiment_id, run_date)
    }

    /// Get the run ID.
    #[must_use]
    pub const fn run_id(&self) -> RunId {
        self.run_id
    }

    /// Get the parent experiment ID.
    #[must_use]
    pub const fn experiment_id(&self) -> ExperimentId {
        self.experiment_id
    }

    /// Get the creation timestamp.
    #[must_use]
    pub const fn run_date(&self) -> DateTime<Utc> {
        self.run_date
    }

    /// Get the linked git commit hash, if any.
    #[must_use]
    pub fn git_commit_hash(&self) -> Option<&str> {
        self.git_commit_hash.as_deref()
    }

    /// Get the recorded training time, if set.
    #[must_use]
    pub const fn training_time(&self) -> Option<Duration> {
        self.training_time
    }

    /// Get the package dependency snapshot.
    #[must_use]
    pub fn package_dependencies(&self) -> &[PackageDependency] {
        &self.package_dependencies
    }

    /// Get all metrics logged for this run, in logging order.
    #[must_use]
    pub fn metrics(&self) -> &[Metric] {
        &self.metrics
    }

    /// Get the registered model schemas.
    #[must_use]
    pub fn model_schemas(&self) -> &[ModelSchema] {
        &self.model_schemas
    }

    /// Get a model schema by role name.
    #[must_use]
    pub fn model_schema(&self, name: &str) -> Option<&ModelSchema> {
        self.model_schemas.iter().find(|s| s.name() == name)
    }

    /// Largest value of the metric `name` (case-insensitive), ignoring NaN.
    #[must_use]
    pub fn max_metric(&self, name: &str) -> Option<f64> {
        self.metrics
            .iter()
            .filter(|m| m.is_named(name) && !m.value().is_nan())
            .map(Metric::value)
            .reduce(f64::max)
    }

    pub(crate) fn set_training_time(&mut self, training_time: Duration) {
        self.training_time = Some(training_time);
    }

    pub(crate) fn push_metric(&mut self, metric: Metric) {
        self.metrics.push(metric);
    }

    /// Insert schemas, replacing any existing schema with the same role name.
    pub(crate) fn upsert_model_schemas(&mut self, schemas: Vec<ModelSchema>) {
        for schema in schemas {
            self.model_schemas.retain(|s| s.name() != schema.name());
            self.model_schemas.push(schema);
        }
    }
}

/// Builder for `Run`.
#[derive(Debug)]
pub struct RunBuilder {
    experiment_id: ExperimentId,
    run_date: DateTime<Utc>,
    git_commit_hash: Option<String>,
    package_dependencies: Vec<PackageDependency>,
}

impl RunBuilder {
    /// Create a new builder with required fields.
    #[must_use]
    pub const fn new(experiment_id: ExperimentId, run_date: DateTime<Utc>) -> Self {
        Self {
            experiment_id,
            run_date,
            git_commit_hash: None,
            package_dependencies: Vec::new(),
        }
    }

    /// Link a git commit hash. An empty hash means "no commit".
    #[must_use]
    pub fn git_commit_hash(mut self, hash: impl Into<String>) -> Self {
        let hash = hash.into();
        self.git_commit_hash = (!hash.is_empty()).then_some(hash);
        self
    }

    /// Set the package dependency snapshot.
    #[must_use]
    pub fn package_dependencies(mut self, dependencies: Vec<PackageDependency>) -> Self {
        self.package_dependencies = dependencies;
        self
    }

    /// Build the `Run` with a fresh id.
    #[must_use]
    pub fn build(self) -> Run {
        Run {
            run_id: RunId::new(),
            experiment_id: self.experiment_id,
            run_date: self.run_date,
            git_commit_hash: self.git_commit_hash,
            training_time: None,
            package_dependencies: self.package_dependencies,
            metrics: Vec::new(),
            model_schemas: Vec::new(),
        }
    }
}
