//! Experiment and run lifecycle.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, instrument, warn};

use super::require_run;
use crate::clock::Clock;
use crate::dependencies::PackageDependencyIdentifier;
use crate::entities::{
    Experiment, ExperimentId, ModelSchema, Run, RunId, MODEL_INPUT, MODEL_OUTPUT,
};
use crate::schema::{SchemaGenerator, SchemaType};
use crate::storage::{ExperimentRepository, RunRepository};
use crate::{Error, Result};

/// Exposes experiment and run operations.
pub struct LifeCycleCatalog<S> {
    store: Arc<S>,
    clock: Arc<dyn Clock>,
    dependency_identifier: Arc<dyn PackageDependencyIdentifier>,
    schema_generator: SchemaGenerator,
}

impl<S> LifeCycleCatalog<S>
where
    S: ExperimentRepository + RunRepository,
{
    /// Wire the catalog to its collaborators.
    #[must_use]
    pub fn new(
        store: Arc<S>,
        clock: Arc<dyn Clock>,
        dependency_identifier: Arc<dyn PackageDependencyIdentifier>,
        schema_generator: SchemaGenerator,
    ) -> Self {
        Self {
            store,
            clock,
            dependency_identifier,
            schema_generator,
        }
    }

    /// Create a uniquely named experiment.
    ///
    /// # Errors
    ///
    /// [`Error::DuplicateName`] if the name is taken.
    #[instrument(skip(self))]
    pub async fn create_experiment(&self, name: &str) -> Result<ExperimentId> {
        let id = self
            .store
            .create_experiment(Experiment::new(name, self.clock.now()))
            .await?;
        info!(experiment_id = %id, "created experiment");
        Ok(id)
    }

    /// Create a run of an existing experiment.
    ///
    /// The package dependency snapshot is taken from the calling process at
    /// call time. An empty `git_commit_hash` links no commit.
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`] if the experiment does not exist.
    #[instrument(skip(self))]
    pub async fn create_run(&self, experiment_id: ExperimentId, git_commit_hash: &str) -> Result<Run> {
        let dependencies = self.dependency_identifier.identify();
        let run = Run::builder(experiment_id, self.clock.now())
            .git_commit_hash(git_commit_hash)
            .package_dependencies(dependencies)
            .build();

        let run = self.store.create_run(run).await?;
        info!(run_id = %run.run_id(), dependencies = run.package_dependencies().len(), "created run");
        Ok(run)
    }

    /// Create an experiment and a first run of it.
    ///
    /// Two separate writes: if the run cannot be created the experiment stays
    /// behind without runs. Look it up by name and retry [`Self::create_run`].
    ///
    /// # Errors
    ///
    /// [`Error::DuplicateName`] if the experiment exists; any error of
    /// [`Self::create_run`].
    #[instrument(skip(self))]
    pub async fn create_run_for_experiment(
        &self,
        experiment_name: &str,
        git_commit_hash: &str,
    ) -> Result<Run> {
        let experiment_id = self.create_experiment(experiment_name).await?;
        match self.create_run(experiment_id, git_commit_hash).await {
            Ok(run) => Ok(run),
            Err(error) => {
                warn!(%experiment_id, %error, "run creation failed, experiment left without runs");
                Err(error)
            }
        }
    }

    /// Register the model input and output schema of a run.
    ///
    /// Both schemas are written in one storage call and replace previously
    /// registered ones.
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`] if the run does not exist.
    #[instrument(skip(self))]
    pub async fn register_model_schema<I, O>(&self, run_id: RunId) -> Result<()>
    where
        I: SchemaType + ?Sized,
        O: SchemaType + ?Sized,
    {
        let schemas = vec![
            ModelSchema::new(MODEL_INPUT, self.schema_generator.generate::<I>(MODEL_INPUT)),
            ModelSchema::new(MODEL_OUTPUT, self.schema_generator.generate::<O>(MODEL_OUTPUT)),
        ];
        self.store.create_model_schemas(run_id, schemas).await
    }

    /// Get an experiment by name.
    ///
    /// # Errors
    ///
    /// Storage errors only; absence is `Ok(None)`.
    pub async fn get_experiment(&self, name: &str) -> Result<Option<Experiment>> {
        self.store.get_experiment(name).await
    }

    /// All experiments, oldest first.
    ///
    /// # Errors
    ///
    /// Storage errors only.
    pub async fn get_experiments(&self) -> Result<Vec<Experiment>> {
        self.store.get_experiments().await
    }

    /// Get a run by id.
    ///
    /// # Errors
    ///
    /// Storage errors only; absence is `Ok(None)`.
    pub async fn get_run(&self, run_id: RunId) -> Result<Option<Run>> {
        self.store.get_run(run_id).await
    }

    /// Get a run by linked git commit hash.
    ///
    /// # Errors
    ///
    /// Storage errors only; absence is `Ok(None)`.
    pub async fn get_run_by_commit_hash(&self, commit_hash: &str) -> Result<Option<Run>> {
        self.store.get_run_by_commit_hash(commit_hash).await
    }

    /// All runs of an experiment, oldest first.
    ///
    /// # Errors
    ///
    /// Storage errors only.
    pub async fn get_runs(&self, experiment_id: ExperimentId) -> Result<Vec<Run>> {
        self.store.get_runs(experiment_id).await
    }

    /// Get the run holding the largest value of `metric_name` (e.g.
    /// "Accuracy", matched case-insensitively) in an experiment.
    ///
    /// # Errors
    ///
    /// [`Error::NoMatch`] if no run of the experiment logged that metric.
    #[instrument(skip(self))]
    pub async fn get_best_run(&self, experiment_id: ExperimentId, metric_name: &str) -> Result<Run> {
        let runs = self.store.get_runs(experiment_id).await?;
        select_best_run(&runs, metric_name)
            .cloned()
            .ok_or_else(|| Error::NoMatch {
                experiment_id: experiment_id.to_string(),
                metric_name: metric_name.to_string(),
            })
    }

    /// Set the training time of a run to now minus its creation time.
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`] if the run does not exist.
    #[instrument(skip(self))]
    pub async fn set_training_time(&self, run_id: RunId) -> Result<Duration> {
        let run = require_run(self.store.as_ref(), run_id).await?;
        let elapsed = (self.clock.now() - run.run_date())
            .to_std()
            .unwrap_or(Duration::ZERO);
        self.set_training_time_to(run_id, elapsed).await?;
        Ok(elapsed)
    }

    /// Set the training time of a run, overriding any previous value.
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`] if the run does not exist.
    #[instrument(skip(self))]
    pub async fn set_training_time_to(&self, run_id: RunId, training_time: Duration) -> Result<()> {
        self.store.set_training_time(run_id, training_time).await
    }
}

/// Pick the run holding the maximum value of `metric_name` across all runs.
///
/// Names match case-insensitively and NaN values are ignored. On equal
/// maxima the earliest run (by `run_date`, then `run_id`) wins, whatever the
/// order of `runs`.
#[must_use]
pub fn select_best_run<'a>(runs: &'a [Run], metric_name: &str) -> Option<&'a Run> {
    let mut ordered: Vec<&Run> = runs.iter().collect();
    ordered.sort_by_key(|r| (r.run_date(), r.run_id()));

    let mut best: Option<(f64, &Run)> = None;
    for run in ordered {
        let Some(value) = run.max_metric(metric_name) else {
            continue;
        };
        if best.map_or(true, |(top, _)| value > top) {
            best = Some((value, run));
        }
    }
    best.map(|(_, run)| run)
}
