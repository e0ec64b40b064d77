//! Top-level entry point wiring storage and collaborators into the catalogs.

use std::sync::Arc;

use tracing::debug;

use crate::catalogs::{
    DataCatalog, DeploymentCatalog, EvaluationCatalog, LifeCycleCatalog, ModelCatalog,
    TrainingCatalog,
};
use crate::clock::{Clock, SystemClock};
use crate::config::MlOpsConfig;
use crate::dependencies::{LockfileDependencyIdentifier, PackageDependencyIdentifier};
use crate::deployment::{DockerContext, KubernetesContext};
use crate::schema::SchemaGenerator;
use crate::storage::{FileModelStorage, MetadataStore, ModelStorage};
use crate::Result;

/// All catalogs, sharing one store, clock and set of collaborators.
pub struct MlOpsContext<S, D, K, M = FileModelStorage> {
    config: MlOpsConfig,
    lifecycle: LifeCycleCatalog<S>,
    data: DataCatalog<S>,
    evaluation: EvaluationCatalog<S>,
    training: TrainingCatalog<S>,
    model: ModelCatalog<S, M>,
    deployment: DeploymentCatalog<S, D, K>,
}

impl MlOpsContext<(), (), ()> {
    /// Create a new context builder
    #[must_use]
    pub fn builder() -> MlOpsBuilder {
        MlOpsBuilder::default()
    }
}

impl<S, D, K, M> MlOpsContext<S, D, K, M>
where
    S: MetadataStore,
    D: DockerContext,
    K: KubernetesContext,
    M: ModelStorage,
{
    /// Experiments, runs, schemas, best run, training time.
    #[must_use]
    pub const fn lifecycle(&self) -> &LifeCycleCatalog<S> {
        &self.lifecycle
    }

    /// Logged data and distributions.
    #[must_use]
    pub const fn data(&self) -> &DataCatalog<S> {
        &self.data
    }

    /// Metrics and confusion matrices.
    #[must_use]
    pub const fn evaluation(&self) -> &EvaluationCatalog<S> {
        &self.evaluation
    }

    /// Hyperparameters.
    #[must_use]
    pub const fn training(&self) -> &TrainingCatalog<S> {
        &self.training
    }

    /// Model artifacts and registry.
    #[must_use]
    pub const fn model(&self) -> &ModelCatalog<S, M> {
        &self.model
    }

    /// Deployment targets and deployments.
    #[must_use]
    pub const fn deployment(&self) -> &DeploymentCatalog<S, D, K> {
        &self.deployment
    }

    /// Configuration the context was built with.
    #[must_use]
    pub const fn config(&self) -> &MlOpsConfig {
        &self.config
    }
}

/// Context builder
#[derive(Default)]
pub struct MlOpsBuilder {
    config: MlOpsConfig,
    clock: Option<Arc<dyn Clock>>,
    dependency_identifier: Option<Arc<dyn PackageDependencyIdentifier>>,
}

impl MlOpsBuilder {
    /// Set the configuration.
    #[must_use]
    pub fn config(mut self, config: MlOpsConfig) -> Self {
        self.config = config;
        self
    }

    /// Replace the system clock.
    #[must_use]
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Replace the lockfile-based dependency identifier.
    #[must_use]
    pub fn dependency_identifier(mut self, identifier: Arc<dyn PackageDependencyIdentifier>) -> Self {
        self.dependency_identifier = Some(identifier);
        self
    }

    /// Build the context, storing model artifacts below
    /// `config.model_storage.root`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`](crate::Error::Config) if the configuration
    /// is inconsistent.
    pub fn build<S, D, K>(self, store: S, docker: D, kubernetes: K) -> Result<MlOpsContext<S, D, K>>
    where
        S: MetadataStore,
        D: DockerContext,
        K: KubernetesContext,
    {
        let model_storage = FileModelStorage::new(self.config.model_storage.root.clone());
        self.build_with_model_storage(store, docker, kubernetes, model_storage)
    }

    /// Build the context with a custom model artifact storage.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`](crate::Error::Config) if the configuration
    /// is inconsistent.
    pub fn build_with_model_storage<S, D, K, M>(
        self,
        store: S,
        docker: D,
        kubernetes: K,
        model_storage: M,
    ) -> Result<MlOpsContext<S, D, K, M>>
    where
        S: MetadataStore,
        D: DockerContext,
        K: KubernetesContext,
        M: ModelStorage,
    {
        self.config.validate()?;

        let store = Arc::new(store);
        let clock: Arc<dyn Clock> = match self.clock {
            Some(clock) => clock,
            None => Arc::new(SystemClock),
        };
        let dependency_identifier: Arc<dyn PackageDependencyIdentifier> =
            match self.dependency_identifier {
                Some(identifier) => identifier,
                None => Arc::new(LockfileDependencyIdentifier::from_env()),
            };
        let schema_generator = SchemaGenerator::new();
        debug!("wiring catalogs");

        Ok(MlOpsContext {
            lifecycle: LifeCycleCatalog::new(
                Arc::clone(&store),
                Arc::clone(&clock),
                dependency_identifier,
                schema_generator,
            ),
            data: DataCatalog::new(Arc::clone(&store), schema_generator),
            evaluation: EvaluationCatalog::new(Arc::clone(&store), Arc::clone(&clock)),
            training: TrainingCatalog::new(Arc::clone(&store)),
            model: ModelCatalog::new(Arc::clone(&store), Arc::new(model_storage), Arc::clone(&clock)),
            deployment: DeploymentCatalog::new(store, Arc::new(docker), Arc::new(kubernetes), clock),
            config: self.config,
        })
    }
}
