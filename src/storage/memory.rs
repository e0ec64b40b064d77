//! In-memory metadata store using `DashMap`.
//!
//! This is the default backend - data is lost on process restart.

use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use super::{
    ConfusionMatrixRepository, DataRepository, DeploymentRepository, ExperimentRepository,
    HyperParameterRepository, MetricRepository, ModelRepository, RunRepository,
};
use crate::entities::{
    ConfusionMatrix, Data, Deployment, DeploymentTarget, DeploymentTargetId, Experiment,
    ExperimentId, HyperParameter, Metric, ModelSchema, RegisteredModel, RegisteredModelId, Run,
    RunArtifact, RunArtifactId, RunId,
};
use crate::{Error, Result};

/// In-memory implementation of every repository.
///
/// Thread-safe; each map is a lock-free sharded `DashMap`, so single writes
/// are atomic per entity. Name uniqueness for experiments and deployment
/// targets is enforced through the entry API.
#[derive(Debug, Default)]
pub struct MemoryStore {
    experiments: DashMap<ExperimentId, Experiment>,
    experiment_names: DashMap<String, ExperimentId>,
    runs: DashMap<RunId, Run>,
    confusion_matrices: DashMap<RunId, ConfusionMatrix>,
    hyper_parameters: DashMap<RunId, Vec<HyperParameter>>,
    data: DashMap<RunId, Data>,
    deployment_targets: DashMap<DeploymentTargetId, DeploymentTarget>,
    deployment_target_names: DashMap<String, DeploymentTargetId>,
    deployments: DashMap<RunId, Vec<Deployment>>,
    run_artifacts: DashMap<RunArtifactId, RunArtifact>,
    registered_models: DashMap<ExperimentId, Vec<RegisteredModel>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of experiments.
    #[must_use]
    pub fn experiment_count(&self) -> usize {
        self.experiments.len()
    }

    /// Number of runs.
    #[must_use]
    pub fn run_count(&self) -> usize {
        self.runs.len()
    }

    /// Number of deployment records.
    #[must_use]
    pub fn deployment_count(&self) -> usize {
        self.deployments.iter().map(|d| d.value().len()).sum()
    }

    /// Check if the store holds no experiments and no runs.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.experiments.is_empty() && self.runs.is_empty()
    }

    fn ensure_run(&self, run_id: RunId) -> Result<()> {
        if self.runs.contains_key(&run_id) {
            Ok(())
        } else {
            Err(Error::not_found("run", run_id))
        }
    }
}

impl ExperimentRepository for MemoryStore {
    async fn create_experiment(&self, experiment: Experiment) -> Result<ExperimentId> {
        let id = experiment.experiment_id();
        match self.experiment_names.entry(experiment.experiment_name().to_string()) {
            Entry::Occupied(entry) => Err(Error::DuplicateName {
                entity: "experiment",
                name: entry.key().clone(),
            }),
            Entry::Vacant(entry) => {
                // Visible by id before it is visible by name.
                self.experiments.insert(id, experiment);
                entry.insert(id);
                Ok(id)
            }
        }
    }

    async fn get_experiment(&self, name: &str) -> Result<Option<Experiment>> {
        let Some(id) = self.experiment_names.get(name).map(|e| *e.value()) else {
            return Ok(None);
        };
        Ok(self.experiments.get(&id).map(|e| e.value().clone()))
    }

    async fn get_experiment_by_id(&self, experiment_id: ExperimentId) -> Result<Option<Experiment>> {
        Ok(self.experiments.get(&experiment_id).map(|e| e.value().clone()))
    }

    async fn get_experiments(&self) -> Result<Vec<Experiment>> {
        let mut experiments: Vec<Experiment> =
            self.experiments.iter().map(|e| e.value().clone()).collect();
        experiments.sort_by_key(|e| (e.created_at(), e.experiment_id()));
        Ok(experiments)
    }
}

impl RunRepository for MemoryStore {
    async fn create_run(&self, run: Run) -> Result<Run> {
        if !self.experiments.contains_key(&run.experiment_id()) {
            return Err(Error::not_found("experiment", run.experiment_id()));
        }
        self.runs.insert(run.run_id(), run.clone());
        Ok(run)
    }

    async fn get_run(&self, run_id: RunId) -> Result<Option<Run>> {
        Ok(self.runs.get(&run_id).map(|r| r.value().clone()))
    }

    async fn get_run_by_commit_hash(&self, commit_hash: &str) -> Result<Option<Run>> {
        if commit_hash.is_empty() {
            return Ok(None);
        }
        Ok(self
            .runs
            .iter()
            .filter(|r| r.git_commit_hash() == Some(commit_hash))
            .map(|r| r.value().clone())
            .min_by_key(|r| (r.run_date(), r.run_id())))
    }

    async fn get_runs(&self, experiment_id: ExperimentId) -> Result<Vec<Run>> {
        let mut runs: Vec<Run> = self
            .runs
            .iter()
            .filter(|r| r.experiment_id() == experiment_id)
            .map(|r| r.value().clone())
            .collect();
        runs.sort_by_key(|r| (r.run_date(), r.run_id()));
        Ok(runs)
    }

    async fn create_model_schemas(&self, run_id: RunId, schemas: Vec<ModelSchema>) -> Result<()> {
        let mut run = self
            .runs
            .get_mut(&run_id)
            .ok_or_else(|| Error::not_found("run", run_id))?;
        run.upsert_model_schemas(schemas);
        Ok(())
    }

    async fn set_training_time(&self, run_id: RunId, training_time: Duration) -> Result<()> {
        let mut run = self
            .runs
            .get_mut(&run_id)
            .ok_or_else(|| Error::not_found("run", run_id))?;
        run.set_training_time(training_time);
        Ok(())
    }
}

impl MetricRepository for MemoryStore {
    async fn log_metric(&self, metric: Metric) -> Result<()> {
        let mut run = self
            .runs
            .get_mut(&metric.run_id())
            .ok_or_else(|| Error::not_found("run", metric.run_id()))?;
        run.push_metric(metric);
        Ok(())
    }

    async fn get_metrics(&self, run_id: RunId) -> Result<Vec<Metric>> {
        Ok(self
            .runs
            .get(&run_id)
            .map(|r| r.metrics().to_vec())
            .unwrap_or_default())
    }
}

impl ConfusionMatrixRepository for MemoryStore {
    async fn log_confusion_matrix(&self, run_id: RunId, matrix: ConfusionMatrix) -> Result<()> {
        self.ensure_run(run_id)?;
        self.confusion_matrices.insert(run_id, matrix);
        Ok(())
    }

    async fn get_confusion_matrix(&self, run_id: RunId) -> Result<Option<ConfusionMatrix>> {
        Ok(self.confusion_matrices.get(&run_id).map(|m| m.value().clone()))
    }
}

impl HyperParameterRepository for MemoryStore {
    async fn log_hyper_parameters(&self, parameters: Vec<HyperParameter>) -> Result<()> {
        for parameter in &parameters {
            self.ensure_run(parameter.run_id)?;
        }
        for parameter in parameters {
            self.hyper_parameters
                .entry(parameter.run_id)
                .or_default()
                .push(parameter);
        }
        Ok(())
    }

    async fn get_hyper_parameters(&self, run_id: RunId) -> Result<Vec<HyperParameter>> {
        Ok(self
            .hyper_parameters
            .get(&run_id)
            .map(|p| p.value().clone())
            .unwrap_or_default())
    }
}

impl DataRepository for MemoryStore {
    async fn log_data(&self, data: Data) -> Result<()> {
        self.ensure_run(data.run_id)?;
        self.data.insert(data.run_id, data);
        Ok(())
    }

    async fn get_data(&self, run_id: RunId) -> Result<Option<Data>> {
        Ok(self.data.get(&run_id).map(|d| d.value().clone()))
    }

    async fn log_data_distribution(
        &self,
        run_id: RunId,
        column_name: &str,
        entries: Vec<(String, u64)>,
    ) -> Result<()> {
        let mut data = self
            .data
            .get_mut(&run_id)
            .ok_or_else(|| Error::not_found("data", run_id))?;
        let column = data
            .column_mut(column_name)
            .ok_or_else(|| Error::not_found("data column", column_name))?;
        column.merge_distribution(entries);
        Ok(())
    }
}

impl DeploymentRepository for MemoryStore {
    async fn create_deployment_target(&self, target: DeploymentTarget) -> Result<DeploymentTarget> {
        match self.deployment_target_names.entry(target.name.clone()) {
            Entry::Occupied(entry) => Err(Error::DuplicateName {
                entity: "deployment target",
                name: entry.key().clone(),
            }),
            Entry::Vacant(entry) => {
                self.deployment_targets
                    .insert(target.deployment_target_id, target.clone());
                entry.insert(target.deployment_target_id);
                Ok(target)
            }
        }
    }

    async fn get_deployment_targets(&self) -> Result<Vec<DeploymentTarget>> {
        let mut targets: Vec<DeploymentTarget> =
            self.deployment_targets.iter().map(|t| t.value().clone()).collect();
        targets.sort_by_key(|t| (t.created_at, t.deployment_target_id));
        Ok(targets)
    }

    async fn create_deployment(&self, deployment: Deployment) -> Result<()> {
        self.ensure_run(deployment.run_id)?;
        self.deployments
            .entry(deployment.run_id)
            .or_default()
            .push(deployment);
        Ok(())
    }

    async fn get_deployments_for_run(&self, run_id: RunId) -> Result<Vec<Deployment>> {
        Ok(self
            .deployments
            .get(&run_id)
            .map(|d| d.value().clone())
            .unwrap_or_default())
    }

    async fn get_deployments_for_experiment(
        &self,
        experiment_id: ExperimentId,
    ) -> Result<Vec<Deployment>> {
        let mut deployments: Vec<Deployment> = self
            .deployments
            .iter()
            .flat_map(|d| d.value().clone())
            .filter(|d| d.experiment_id == experiment_id)
            .collect();
        deployments.sort_by_key(|d| (d.deployment_date, d.deployment_id));
        Ok(deployments)
    }
}

impl ModelRepository for MemoryStore {
    async fn create_run_artifact(&self, artifact: RunArtifact) -> Result<()> {
        self.ensure_run(artifact.run_id)?;
        self.run_artifacts.insert(artifact.run_artifact_id, artifact);
        Ok(())
    }

    async fn get_run_artifact(&self, run_artifact_id: RunArtifactId) -> Result<Option<RunArtifact>> {
        Ok(self.run_artifacts.get(&run_artifact_id).map(|a| a.value().clone()))
    }

    async fn get_run_artifacts(&self, run_id: RunId) -> Result<Vec<RunArtifact>> {
        let mut artifacts: Vec<RunArtifact> = self
            .run_artifacts
            .iter()
            .filter(|a| a.run_id == run_id)
            .map(|a| a.value().clone())
            .collect();
        artifacts.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(artifacts)
    }

    async fn register_model(
        &self,
        experiment_id: ExperimentId,
        run_artifact_id: RunArtifactId,
        registered_by: &str,
        description: &str,
        registered_at: DateTime<Utc>,
    ) -> Result<RegisteredModel> {
        if !self.experiments.contains_key(&experiment_id) {
            return Err(Error::not_found("experiment", experiment_id));
        }
        if !self.run_artifacts.contains_key(&run_artifact_id) {
            return Err(Error::not_found("run artifact", run_artifact_id));
        }

        let mut models = self.registered_models.entry(experiment_id).or_default();
        let version = u32::try_from(models.len() + 1)
            .map_err(|_| Error::InvalidInput("model registry version overflow".to_string()))?;
        let model = RegisteredModel {
            registered_model_id: RegisteredModelId::new(),
            experiment_id,
            run_artifact_id,
            version,
            registered_by: registered_by.to_string(),
            description: description.to_string(),
            registered_at,
        };
        models.push(model.clone());
        Ok(model)
    }

    async fn get_registered_models(&self, experiment_id: ExperimentId) -> Result<Vec<RegisteredModel>> {
        Ok(self
            .registered_models
            .get(&experiment_id)
            .map(|m| m.value().clone())
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{DataColumn, DataColumnId, DataId};
    use std::sync::Arc;

    async fn store_with_run() -> (MemoryStore, Run) {
        let store = MemoryStore::new();
        let experiment_id = store
            .create_experiment(Experiment::new("exp", Utc::now()))
            .await
            .unwrap();
        let run = store
            .create_run(Run::builder(experiment_id, Utc::now()).build())
            .await
            .unwrap();
        (store, run)
    }

    #[tokio::test]
    async fn test_duplicate_experiment_name() {
        let store = MemoryStore::new();
        let first = store
            .create_experiment(Experiment::new("exp", Utc::now()))
            .await
            .unwrap();
        let err = store
            .create_experiment(Experiment::new("exp", Utc::now()))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::DuplicateName { entity: "experiment", .. }));
        assert_eq!(store.experiment_count(), 1);
        let found = store.get_experiment("exp").await.unwrap().unwrap();
        assert_eq!(found.experiment_id(), first);
    }

    #[tokio::test]
    async fn test_concurrent_experiment_creation_single_winner() {
        let store = Arc::new(MemoryStore::new());
        let mut handles = vec![];

        for _ in 0..50 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store
                    .create_experiment(Experiment::new("shared", Utc::now()))
                    .await
                    .is_ok()
            }));
        }

        let mut successes = 0;
        for handle in handles {
            if handle.await.unwrap() {
                successes += 1;
            }
        }
        assert_eq!(successes, 1);
        assert_eq!(store.experiment_count(), 1);
    }

    #[tokio::test]
    async fn test_run_requires_experiment() {
        let store = MemoryStore::new();
        let err = store
            .create_run(Run::builder(ExperimentId::new(), Utc::now()).build())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound { entity: "experiment", .. }));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_metric_append_requires_run() {
        let (store, run) = store_with_run().await;
        store
            .log_metric(Metric::new(run.run_id(), "loss", 0.3, Utc::now()))
            .await
            .unwrap();
        assert_eq!(store.get_metrics(run.run_id()).await.unwrap().len(), 1);

        let err = store
            .log_metric(Metric::new(RunId::new(), "loss", 0.3, Utc::now()))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound { entity: "run", .. }));
    }

    #[tokio::test]
    async fn test_get_run_by_commit_hash() {
        let store = MemoryStore::new();
        let experiment_id = store
            .create_experiment(Experiment::new("exp", Utc::now()))
            .await
            .unwrap();
        let run = store
            .create_run(Run::builder(experiment_id, Utc::now()).git_commit_hash("abc123").build())
            .await
            .unwrap();

        let found = store.get_run_by_commit_hash("abc123").await.unwrap().unwrap();
        assert_eq!(found.run_id(), run.run_id());
        assert!(store.get_run_by_commit_hash("").await.unwrap().is_none());
        assert!(store.get_run_by_commit_hash("zzz").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_data_distribution_requires_column() {
        let (store, run) = store_with_run().await;
        let data_id = DataId::new();
        store
            .log_data(Data {
                data_id,
                run_id: run.run_id(),
                data_hash: "blake3:00".to_string(),
                rows: 2,
                columns: vec![DataColumn {
                    data_column_id: DataColumnId::new(),
                    data_id,
                    name: "label".to_string(),
                    column_type: "String".to_string(),
                    distributions: Vec::new(),
                }],
            })
            .await
            .unwrap();

        store
            .log_data_distribution(run.run_id(), "label", vec![("a".to_string(), 2)])
            .await
            .unwrap();
        let err = store
            .log_data_distribution(run.run_id(), "missing", vec![])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound { entity: "data column", .. }));

        let data = store.get_data(run.run_id()).await.unwrap().unwrap();
        assert_eq!(data.column("label").unwrap().distributions[0].count, 2);
    }

    #[tokio::test]
    async fn test_register_model_versions_increase() {
        let (store, run) = store_with_run().await;
        let artifact = RunArtifact {
            run_artifact_id: RunArtifactId::new(),
            run_id: run.run_id(),
            name: "model.onnx".to_string(),
            uri: "/tmp/model.onnx".to_string(),
        };
        store.create_run_artifact(artifact.clone()).await.unwrap();

        let v1 = store
            .register_model(run.experiment_id(), artifact.run_artifact_id, "ci", "", Utc::now())
            .await
            .unwrap();
        let v2 = store
            .register_model(run.experiment_id(), artifact.run_artifact_id, "ci", "", Utc::now())
            .await
            .unwrap();
        assert_eq!((v1.version, v2.version), (1, 2));
    }

    #[tokio::test]
    async fn test_duplicate_deployment_target() {
        let store = MemoryStore::new();
        store
            .create_deployment_target(DeploymentTarget::new("Test", false, Utc::now()))
            .await
            .unwrap();
        let err = store
            .create_deployment_target(DeploymentTarget::new("Test", true, Utc::now()))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::DuplicateName { entity: "deployment target", .. }));
        assert_eq!(store.get_deployment_targets().await.unwrap().len(), 1);
    }
}
