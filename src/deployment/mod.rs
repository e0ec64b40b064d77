//! Container registry and cluster collaborators.
//!
//! The crate does not build images or talk to a cluster itself. Callers
//! supply implementations of [`DockerContext`] and [`KubernetesContext`]
//! (a CLI wrapper, an HTTP client, or a test double) and the
//! [`DeploymentCatalog`](crate::catalogs::DeploymentCatalog) drives them
//! through the [`DeploymentState`] saga.

mod naming;
mod saga;

pub use naming::{image_name, namespace_name, sanitize_label, MAX_LABEL_LEN};
pub use saga::DeploymentState;

use std::future::Future;

use crate::entities::{DeploymentTarget, RunId};

/// Builds container images for runs and pushes them to a registry.
pub trait DockerContext: Send + Sync {
    /// Build and push the image serving `run_id`; returns the pushed image name.
    fn build_and_push_image(
        &self,
        experiment_name: &str,
        run_id: RunId,
    ) -> impl Future<Output = anyhow::Result<String>> + Send;
}

/// Creates namespaces and deployments in a cluster.
pub trait KubernetesContext: Send + Sync {
    /// Create (or reuse) the namespace for an experiment on a target;
    /// returns the namespace name.
    fn create_namespace(
        &self,
        experiment_name: &str,
        target: &DeploymentTarget,
    ) -> impl Future<Output = anyhow::Result<String>> + Send;

    /// Deploy `image_name` into `namespace`; returns a handle for the deployment.
    fn deploy_container(
        &self,
        experiment_name: &str,
        image_name: &str,
        namespace: &str,
    ) -> impl Future<Output = anyhow::Result<String>> + Send;
}
