//! Hyperparameters.

use std::fmt::Display;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tracing::instrument;

use super::require_run;
use crate::entities::{HyperParameter, RunId};
use crate::storage::{HyperParameterRepository, RunRepository};
use crate::{Error, Result};

/// Exposes training operations.
pub struct TrainingCatalog<S> {
    store: Arc<S>,
}

impl<S> TrainingCatalog<S>
where
    S: RunRepository + HyperParameterRepository,
{
    /// Wire the catalog to its store.
    #[must_use]
    pub const fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Log one hyperparameter.
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`] if the run does not exist.
    #[instrument(skip(self, value))]
    pub async fn log_hyper_parameter(
        &self,
        run_id: RunId,
        parameter_name: &str,
        value: impl Display + Send,
    ) -> Result<HyperParameter> {
        let value = value.to_string();
        require_run(self.store.as_ref(), run_id).await?;
        let parameter = HyperParameter::new(run_id, parameter_name, value);
        self.store.log_hyper_parameters(vec![parameter.clone()]).await?;
        Ok(parameter)
    }

    /// Log every top-level field of a serializable options struct (e.g. the
    /// options of a trainer) as a hyperparameter.
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`] if the run does not exist, [`Error::InvalidInput`]
    /// if `options` does not serialize to an object.
    #[instrument(skip(self, options))]
    pub async fn log_hyper_parameters<T>(&self, run_id: RunId, options: &T) -> Result<Vec<HyperParameter>>
    where
        T: Serialize + Sync + ?Sized,
    {
        let Value::Object(fields) = serde_json::to_value(options)? else {
            return Err(Error::InvalidInput(
                "hyperparameters must serialize to a struct or map".to_string(),
            ));
        };
        require_run(self.store.as_ref(), run_id).await?;

        let parameters: Vec<HyperParameter> = fields
            .into_iter()
            .map(|(name, value)| HyperParameter::new(run_id, name, value_to_string(value)))
            .collect();
        self.store.log_hyper_parameters(parameters.clone()).await?;
        Ok(parameters)
    }

    /// Hyperparameters of a run in logging order.
    ///
    /// # Errors
    ///
    /// Storage errors only.
    pub async fn get_hyper_parameters(&self, run_id: RunId) -> Result<Vec<HyperParameter>> {
        self.store.get_hyper_parameters(run_id).await
    }
}

/// Plain strings unquoted, everything else as compact JSON.
pub(crate) fn value_to_string(value: Value) -> String {
    match value {
        Value::String(s) => s,
        other => other.to_string(),
    }
}
