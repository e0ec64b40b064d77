//! Catalogs: the orchestration layer over repositories and collaborators.
//!
//! | Catalog | Concern |
//! |---|---|
//! | [`LifeCycleCatalog`] | experiments, runs, schemas, best run, training time |
//! | [`DeploymentCatalog`] | deployment targets, build → namespace → deploy |
//! | [`EvaluationCatalog`] | metrics, confusion matrices |
//! | [`TrainingCatalog`] | hyperparameters |
//! | [`DataCatalog`] | data schema, hash and column distributions |
//! | [`ModelCatalog`] | artifact upload/download, model registry |

mod data;
mod deployment;
mod evaluation;
mod lifecycle;
mod model;
mod training;

pub use data::DataCatalog;
pub use deployment::DeploymentCatalog;
pub use evaluation::EvaluationCatalog;
pub use lifecycle::{select_best_run, LifeCycleCatalog};
pub use model::ModelCatalog;
pub use training::TrainingCatalog;

use crate::entities::{Run, RunId};
use crate::storage::RunRepository;
use crate::{Error, Result};

/// Load a run or fail with `NotFound`.
async fn require_run<S: RunRepository>(store: &S, run_id: RunId) -> Result<Run> {
    store
        .get_run(run_id)
        .await?
        .ok_or_else(|| Error::not_found("run", run_id))
}
