//! Storage Repositories
//!
//! One trait per entity family. Catalogs depend on these traits only; a
//! storage backend is one type implementing all of them, wired once when the
//! [`MlOpsContext`](crate::MlOpsContext) is built.
//!
//! - [`MemoryStore`]: concurrent in-memory backend (`DashMap`)
//! - [`FileModelStorage`]: model artifact files on the local filesystem
//!
//! Consistency (experiment name uniqueness, atomic metric append) is the
//! backend's job. Catalogs perform no locking of their own.
//!
//! # Example
//!
//! ```rust
//! use mlops_core::entities::Experiment;
//! use mlops_core::storage::{ExperimentRepository, MemoryStore};
//!
//! # async fn example() -> mlops_core::Result<()> {
//! let store = MemoryStore::new();
//! let id = store.create_experiment(Experiment::new("iris", chrono::Utc::now())).await?;
//! let experiment = store.get_experiment("iris").await?;
//! assert_eq!(experiment.map(|e| e.experiment_id()), Some(id));
//! # Ok(())
//! # }
//! ```

mod file;
mod memory;

pub use file::{FileModelStorage, ModelStorage};
pub use memory::MemoryStore;

use std::future::Future;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::entities::{
    ConfusionMatrix, Data, Deployment, DeploymentTarget, Experiment, ExperimentId, HyperParameter,
    Metric, ModelSchema, RegisteredModel, Run, RunArtifact, RunArtifactId, RunId,
};
use crate::Result;

/// Experiments.
pub trait ExperimentRepository: Send + Sync {
    /// Persist a new experiment.
    ///
    /// Fails with [`Error::DuplicateName`](crate::Error::DuplicateName) if an
    /// experiment with the same name exists.
    fn create_experiment(
        &self,
        experiment: Experiment,
    ) -> impl Future<Output = Result<ExperimentId>> + Send;

    /// Look an experiment up by name.
    fn get_experiment(&self, name: &str) -> impl Future<Output = Result<Option<Experiment>>> + Send;

    /// Look an experiment up by id.
    fn get_experiment_by_id(
        &self,
        experiment_id: ExperimentId,
    ) -> impl Future<Output = Result<Option<Experiment>>> + Send;

    /// All experiments, oldest first.
    fn get_experiments(&self) -> impl Future<Output = Result<Vec<Experiment>>> + Send;
}

/// Runs, their schemas and training time.
pub trait RunRepository: Send + Sync {
    /// Persist a new run. Fails with `NotFound` if its experiment is absent.
    fn create_run(&self, run: Run) -> impl Future<Output = Result<Run>> + Send;

    /// Look a run up by id, metrics populated.
    fn get_run(&self, run_id: RunId) -> impl Future<Output = Result<Option<Run>>> + Send;

    /// Look a run up by linked git commit hash. The oldest run wins if the
    /// hash was linked more than once.
    fn get_run_by_commit_hash(
        &self,
        commit_hash: &str,
    ) -> impl Future<Output = Result<Option<Run>>> + Send;

    /// All runs of an experiment with metrics populated, ordered by
    /// `run_date` then `run_id`.
    fn get_runs(&self, experiment_id: ExperimentId) -> impl Future<Output = Result<Vec<Run>>> + Send;

    /// Store model schemas in one write, replacing schemas with the same role.
    fn create_model_schemas(
        &self,
        run_id: RunId,
        schemas: Vec<ModelSchema>,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Overwrite the training time of a run.
    fn set_training_time(
        &self,
        run_id: RunId,
        training_time: Duration,
    ) -> impl Future<Output = Result<()>> + Send;
}

/// Metrics.
pub trait MetricRepository: Send + Sync {
    /// Append a metric to its run.
    fn log_metric(&self, metric: Metric) -> impl Future<Output = Result<()>> + Send;

    /// Metrics of a run in logging order.
    fn get_metrics(&self, run_id: RunId) -> impl Future<Output = Result<Vec<Metric>>> + Send;
}

/// Confusion matrices.
pub trait ConfusionMatrixRepository: Send + Sync {
    /// Store the confusion matrix of a run, replacing any previous one.
    fn log_confusion_matrix(
        &self,
        run_id: RunId,
        matrix: ConfusionMatrix,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Confusion matrix of a run.
    fn get_confusion_matrix(
        &self,
        run_id: RunId,
    ) -> impl Future<Output = Result<Option<ConfusionMatrix>>> + Send;
}

/// Hyperparameters.
pub trait HyperParameterRepository: Send + Sync {
    /// Append hyperparameters.
    fn log_hyper_parameters(
        &self,
        parameters: Vec<HyperParameter>,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Hyperparameters of a run in logging order.
    fn get_hyper_parameters(
        &self,
        run_id: RunId,
    ) -> impl Future<Output = Result<Vec<HyperParameter>>> + Send;
}

/// Logged data sets and column distributions.
pub trait DataRepository: Send + Sync {
    /// Store the data set of a run, replacing any previous one.
    fn log_data(&self, data: Data) -> impl Future<Output = Result<()>> + Send;

    /// Data set of a run.
    fn get_data(&self, run_id: RunId) -> impl Future<Output = Result<Option<Data>>> + Send;

    /// Merge `(value, count)` entries into a column's histogram.
    fn log_data_distribution(
        &self,
        run_id: RunId,
        column_name: &str,
        entries: Vec<(String, u64)>,
    ) -> impl Future<Output = Result<()>> + Send;
}

/// Deployment targets and deployment records.
pub trait DeploymentRepository: Send + Sync {
    /// Persist a target. Fails with `DuplicateName` if the name is taken.
    fn create_deployment_target(
        &self,
        target: DeploymentTarget,
    ) -> impl Future<Output = Result<DeploymentTarget>> + Send;

    /// All targets, oldest first.
    fn get_deployment_targets(&self) -> impl Future<Output = Result<Vec<DeploymentTarget>>> + Send;

    /// Persist a deployment record.
    fn create_deployment(&self, deployment: Deployment) -> impl Future<Output = Result<()>> + Send;

    /// Deployments of a run, oldest first.
    fn get_deployments_for_run(
        &self,
        run_id: RunId,
    ) -> impl Future<Output = Result<Vec<Deployment>>> + Send;

    /// Deployments of all runs of an experiment, oldest first.
    fn get_deployments_for_experiment(
        &self,
        experiment_id: ExperimentId,
    ) -> impl Future<Output = Result<Vec<Deployment>>> + Send;
}

/// Run artifacts and the model registry.
pub trait ModelRepository: Send + Sync {
    /// Record an uploaded artifact.
    fn create_run_artifact(&self, artifact: RunArtifact) -> impl Future<Output = Result<()>> + Send;

    /// Artifact by id.
    fn get_run_artifact(
        &self,
        run_artifact_id: RunArtifactId,
    ) -> impl Future<Output = Result<Option<RunArtifact>>> + Send;

    /// Artifacts of a run.
    fn get_run_artifacts(&self, run_id: RunId) -> impl Future<Output = Result<Vec<RunArtifact>>> + Send;

    /// Register an artifact under the next version number of its experiment.
    fn register_model(
        &self,
        experiment_id: ExperimentId,
        run_artifact_id: RunArtifactId,
        registered_by: &str,
        description: &str,
        registered_at: DateTime<Utc>,
    ) -> impl Future<Output = Result<RegisteredModel>> + Send;

    /// Registered models of an experiment, by ascending version.
    fn get_registered_models(
        &self,
        experiment_id: ExperimentId,
    ) -> impl Future<Output = Result<Vec<RegisteredModel>>> + Send;
}

/// A backend implementing every repository.
pub trait MetadataStore:
    ExperimentRepository
    + RunRepository
    + MetricRepository
    + ConfusionMatrixRepository
    + HyperParameterRepository
    + DataRepository
    + DeploymentRepository
    + ModelRepository
{
}

impl<T> MetadataStore for T where
    T: ExperimentRepository
        + RunRepository
        + MetricRepository
        + ConfusionMatrixRepository
        + HyperParameterRepository
        + DataRepository
        + DeploymentRepository
        + ModelRepository
{
}
