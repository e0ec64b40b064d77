//! Metrics and confusion matrices.

use std::sync::Arc;

use tracing::{debug, instrument};

use super::require_run;
use crate::clock::Clock;
use crate::entities::{ConfusionMatrix, Metric, RunId};
use crate::storage::{ConfusionMatrixRepository, MetricRepository, RunRepository};
use crate::Result;

/// Exposes evaluation operations.
pub struct EvaluationCatalog<S> {
    store: Arc<S>,
    clock: Arc<dyn Clock>,
}

impl<S> EvaluationCatalog<S>
where
    S: RunRepository + MetricRepository + ConfusionMatrixRepository,
{
    /// Wire the catalog to its collaborators.
    #[must_use]
    pub fn new(store: Arc<S>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Log a metric value for a run. The same name may be logged repeatedly.
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`](crate::Error::NotFound) if the run does not exist.
    #[instrument(skip(self))]
    pub async fn log_metric(&self, run_id: RunId, metric_name: &str, value: f64) -> Result<Metric> {
        require_run(self.store.as_ref(), run_id).await?;
        let metric = Metric::new(run_id, metric_name, value, self.clock.now());
        self.store.log_metric(metric.clone()).await?;
        debug!(metric_id = %metric.metric_id(), "logged metric");
        Ok(metric)
    }

    /// Metrics of a run in logging order. Unknown runs have none.
    ///
    /// # Errors
    ///
    /// Storage errors only.
    pub async fn get_metrics(&self, run_id: RunId) -> Result<Vec<Metric>> {
        self.store.get_metrics(run_id).await
    }

    /// Store the confusion matrix of a run, replacing a previous one.
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`](crate::Error::NotFound) if the run does not exist.
    #[instrument(skip(self, matrix), fields(labels = matrix.labels().len()))]
    pub async fn log_confusion_matrix(&self, run_id: RunId, matrix: ConfusionMatrix) -> Result<()> {
        require_run(self.store.as_ref(), run_id).await?;
        self.store.log_confusion_matrix(run_id, matrix).await
    }

    /// Confusion matrix of a run, if one was logged.
    ///
    /// # Errors
    ///
    /// Storage errors only.
    pub async fn get_confusion_matrix(&self, run_id: RunId) -> Result<Option<ConfusionMatrix>> {
        self.store.get_confusion_matrix(run_id).await
    }
}
