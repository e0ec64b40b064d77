//! Model artifacts and the model registry.

use std::path::Path;
use std::sync::Arc;

use tracing::{info, instrument};

use super::require_run;
use crate::clock::Clock;
use crate::entities::{ExperimentId, RegisteredModel, RunArtifact, RunArtifactId, RunId};
use crate::storage::{ModelRepository, ModelStorage, RunRepository};
use crate::{Error, Result};

/// Exposes model artifact and registry operations.
pub struct ModelCatalog<S, M> {
    store: Arc<S>,
    model_storage: Arc<M>,
    clock: Arc<dyn Clock>,
}

impl<S, M> ModelCatalog<S, M>
where
    S: RunRepository + ModelRepository,
    M: ModelStorage,
{
    /// Wire the catalog to its collaborators.
    #[must_use]
    pub fn new(store: Arc<S>, model_storage: Arc<M>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            model_storage,
            clock,
        }
    }

    /// Copy a model file produced by a run into model storage.
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`] if the run does not exist, [`Error::Io`] if the
    /// file cannot be copied.
    #[instrument(skip(self))]
    pub async fn upload(&self, run_id: RunId, path: &Path) -> Result<RunArtifact> {
        require_run(self.store.as_ref(), run_id).await?;

        let run_artifact_id = RunArtifactId::new();
        let uri = self.model_storage.upload(run_id, run_artifact_id, path).await?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let artifact = RunArtifact {
            run_artifact_id,
            run_id,
            name,
            uri,
        };
        self.store.create_run_artifact(artifact.clone()).await?;
        info!(run_artifact_id = %artifact.run_artifact_id, uri = %artifact.uri, "uploaded model");
        Ok(artifact)
    }

    /// Copy a stored artifact to `destination`.
    ///
    /// # Errors
    ///
    /// [`Error::Io`] if the copy fails.
    pub async fn download(&self, artifact: &RunArtifact, destination: &Path) -> Result<()> {
        self.model_storage.download(&artifact.uri, destination).await
    }

    /// Artifacts uploaded for a run.
    ///
    /// # Errors
    ///
    /// Storage errors only.
    pub async fn get_run_artifacts(&self, run_id: RunId) -> Result<Vec<RunArtifact>> {
        self.store.get_run_artifacts(run_id).await
    }

    /// Register an artifact as the next model version of an experiment.
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`] if the artifact or its run does not exist,
    /// [`Error::InvalidInput`] if the artifact belongs to another experiment.
    #[instrument(skip(self, description))]
    pub async fn register_model(
        &self,
        experiment_id: ExperimentId,
        run_artifact_id: RunArtifactId,
        registered_by: &str,
        description: &str,
    ) -> Result<RegisteredModel> {
        let artifact = self
            .store
            .get_run_artifact(run_artifact_id)
            .await?
            .ok_or_else(|| Error::not_found("run artifact", run_artifact_id))?;
        let run = require_run(self.store.as_ref(), artifact.run_id).await?;
        if run.experiment_id() != experiment_id {
            return Err(Error::InvalidInput(format!(
                "artifact {run_artifact_id} belongs to experiment {}, not {experiment_id}",
                run.experiment_id()
            )));
        }

        let model = self
            .store
            .register_model(
                experiment_id,
                run_artifact_id,
                registered_by,
                description,
                self.clock.now(),
            )
            .await?;
        info!(version = model.version, "registered model");
        Ok(model)
    }

    /// Registered models of an experiment, by ascending version.
    ///
    /// # Errors
    ///
    /// Storage errors only.
    pub async fn get_registered_models(&self, experiment_id: ExperimentId) -> Result<Vec<RegisteredModel>> {
        self.store.get_registered_models(experiment_id).await
    }

    /// Highest registered version of an experiment.
    ///
    /// # Errors
    ///
    /// Storage errors only.
    pub async fn get_latest_registered_model(
        &self,
        experiment_id: ExperimentId,
    ) -> Result<Option<RegisteredModel>> {
        Ok(self
            .store
            .get_registered_models(experiment_id)
            .await?
            .into_iter()
            .max_by_key(|m| m.version))
    }
}
