//! # mlops-core: Experiment Tracking and Model Deployment Orchestration
//!
//! Records experiments, runs, metrics, hyperparameters, data schemas and
//! distributions, and model artifacts, then drives deployment of a trained
//! model through a container registry and a cluster.
//!
//! ## Design Principles (Toyota Way Aligned)
//!
//! - **Jidoka**: Catalogs stop and surface the first failing step; nothing is
//!   retried or silently rolled back
//! - **Poka-Yoke safety**: Typed ids per entity, one adapter per backend
//!   wired once at construction
//! - **Genchi Genbutsu**: Dependency snapshots are taken from the real
//!   `Cargo.lock`, not declared by hand
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use mlops_core::deployment::{DockerContext, KubernetesContext};
//! use mlops_core::entities::{DeploymentTarget, RunId};
//! use mlops_core::storage::MemoryStore;
//! use mlops_core::MlOpsContext;
//!
//! # struct Docker;
//! # impl DockerContext for Docker {
//! #     async fn build_and_push_image(&self, e: &str, r: RunId) -> anyhow::Result<String> { Ok(format!("{e}:{r}")) }
//! # }
//! # struct Kube;
//! # impl KubernetesContext for Kube {
//! #     async fn create_namespace(&self, e: &str, t: &DeploymentTarget) -> anyhow::Result<String> { Ok(format!("{e}-{}", t.name)) }
//! #     async fn deploy_container(&self, _: &str, _: &str, ns: &str) -> anyhow::Result<String> { Ok(ns.to_string()) }
//! # }
//! # async fn example() -> mlops_core::Result<()> {
//! let mlops = MlOpsContext::builder().build(MemoryStore::new(), Docker, Kube)?;
//!
//! let run = mlops.lifecycle().create_run_for_experiment("iris", "").await?;
//! mlops.evaluation().log_metric(run.run_id(), "Accuracy", 0.97).await?;
//!
//! let best = mlops
//!     .lifecycle()
//!     .get_best_run(run.experiment_id(), "accuracy")
//!     .await?;
//! let target = mlops.deployment().create_deployment_target("Test", false).await?;
//! mlops.deployment().deploy(best.run_id(), &target, "ci").await?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

pub mod catalogs;
pub mod clock;
pub mod config;
mod context;
pub mod dependencies;
pub mod deployment;
pub mod entities;
pub mod error;
pub mod logging;
pub mod schema;
pub mod storage;

pub use context::{MlOpsBuilder, MlOpsContext};
pub use error::{Error, Result};
