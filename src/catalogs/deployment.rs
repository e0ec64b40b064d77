//! Packaging and deploying a run's model.

use std::future::Future;
use std::sync::Arc;

use tracing::{info, instrument, warn};

use super::require_run;
use crate::clock::Clock;
use crate::deployment::{DeploymentState, DockerContext, KubernetesContext};
use crate::entities::{Deployment, DeploymentId, DeploymentTarget, RunId};
use crate::storage::{DeploymentRepository, ExperimentRepository, RunRepository};
use crate::{Error, Result};

/// Exposes deployment operations.
pub struct DeploymentCatalog<S, D, K> {
    store: Arc<S>,
    docker: Arc<D>,
    kubernetes: Arc<K>,
    clock: Arc<dyn Clock>,
}

impl<S, D, K> DeploymentCatalog<S, D, K>
where
    S: ExperimentRepository + RunRepository + DeploymentRepository,
    D: DockerContext,
    K: KubernetesContext,
{
    /// Wire the catalog to its collaborators.
    #[must_use]
    pub fn new(store: Arc<S>, docker: Arc<D>, kubernetes: Arc<K>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            docker,
            kubernetes,
            clock,
        }
    }

    /// Create a deployment target such as "Test" or "Production".
    ///
    /// # Errors
    ///
    /// [`Error::DuplicateName`] if a target with that name exists.
    #[instrument(skip(self))]
    pub async fn create_deployment_target(&self, name: &str, is_production: bool) -> Result<DeploymentTarget> {
        let target = DeploymentTarget::new(name, is_production, self.clock.now());
        self.store.create_deployment_target(target).await
    }

    /// All deployment targets, oldest first.
    ///
    /// # Errors
    ///
    /// Storage errors only.
    pub async fn get_deployment_targets(&self) -> Result<Vec<DeploymentTarget>> {
        self.store.get_deployment_targets().await
    }

    /// Build an image for a run, create the namespace for its experiment on
    /// `target`, deploy the image there and record the deployment.
    ///
    /// Steps run in order with no rollback and no retry. The deployment
    /// record is written only when every step succeeded.
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`] if the run, its experiment or the target does not
    /// exist. [`Error::Deployment`] tagged with the failing stage if a
    /// collaborator fails.
    #[instrument(skip(self, target), fields(target = %target.name))]
    pub async fn deploy(
        &self,
        run_id: RunId,
        target: &DeploymentTarget,
        deployed_by: &str,
    ) -> Result<Deployment> {
        let run = require_run(self.store.as_ref(), run_id).await?;
        let experiment = self
            .store
            .get_experiment_by_id(run.experiment_id())
            .await?
            .ok_or_else(|| Error::not_found("experiment", run.experiment_id()))?;
        let known_target = self
            .store
            .get_deployment_targets()
            .await?
            .into_iter()
            .any(|t| t.deployment_target_id == target.deployment_target_id);
        if !known_target {
            return Err(Error::not_found("deployment target", &target.name));
        }

        let experiment_name = experiment.experiment_name();
        let mut state = DeploymentState::Requested;

        let image_name = step(
            &mut state,
            self.docker.build_and_push_image(experiment_name, run_id),
        )
        .await?;
        let namespace = step(
            &mut state,
            self.kubernetes.create_namespace(experiment_name, target),
        )
        .await?;
        let deployment_handle = step(
            &mut state,
            self.kubernetes
                .deploy_container(experiment_name, &image_name, &namespace),
        )
        .await?;

        let deployment = Deployment {
            deployment_id: DeploymentId::new(),
            run_id,
            experiment_id: run.experiment_id(),
            deployment_target_id: target.deployment_target_id,
            image_name,
            namespace,
            deployment_handle,
            deployed_by: deployed_by.to_string(),
            deployment_date: self.clock.now(),
        };
        self.store.create_deployment(deployment.clone()).await?;
        info!(
            deployment_id = %deployment.deployment_id,
            image = %deployment.image_name,
            namespace = %deployment.namespace,
            "deployed run"
        );
        Ok(deployment)
    }

    /// Deployments of all runs of an experiment, oldest first. Unknown
    /// experiments have none.
    ///
    /// # Errors
    ///
    /// Storage errors only.
    pub async fn get_deployments(&self, experiment_name: &str) -> Result<Vec<Deployment>> {
        match self.store.get_experiment(experiment_name).await? {
            Some(experiment) => {
                self.store
                    .get_deployments_for_experiment(experiment.experiment_id())
                    .await
            }
            None => Ok(Vec::new()),
        }
    }

    /// Deployments of a run, oldest first.
    ///
    /// # Errors
    ///
    /// Storage errors only.
    pub async fn get_deployments_for_run(&self, run_id: RunId) -> Result<Vec<Deployment>> {
        self.store.get_deployments_for_run(run_id).await
    }
}

/// Run the pending step of `state` and advance it with the step's output.
async fn step<F>(state: &mut DeploymentState, action: F) -> Result<String>
where
    F: Future<Output = anyhow::Result<String>> + Send,
{
    let Some(stage) = state.next_stage() else {
        return Err(Error::InvalidInput(format!(
            "deployment attempt already {}",
            state.name()
        )));
    };

    let current = std::mem::replace(state, DeploymentState::Requested);
    match action.await {
        Ok(output) => {
            *state = current.advance(output.clone());
            info!(%stage, state = state.name(), "deployment step done");
            Ok(output)
        }
        Err(source) => {
            *state = current.fail();
            warn!(%stage, error = %source, "deployment step failed");
            Err(Error::deployment(stage, source))
        }
    }
}
