//! Hyperparameters and confusion matrices recorded for a run

use serde::{Deserialize, Serialize};

use super::{HyperParameterId, RunId};
use crate::{Error, Result};

/// A single named training hyperparameter, stored in string form.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HyperParameter {
    /// Unique id
    pub hyper_parameter_id: HyperParameterId,
    /// Owning run
    pub run_id: RunId,
    /// Parameter name (e.g., "learning_rate")
    pub parameter_name: String,
    /// Parameter value
    pub value: String,
}

impl HyperParameter {
    /// Create a hyperparameter with a fresh id.
    #[must_use]
    pub fn new(run_id: RunId, parameter_name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            hyper_parameter_id: HyperParameterId::new(),
            run_id,
            parameter_name: parameter_name.into(),
            value: value.into(),
        }
    }
}

/// Square confusion matrix of a classifier evaluation.
///
/// `counts[actual][predicted]` is the number of samples of class `actual`
/// that were predicted as `predicted`. Rows and columns follow `labels`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConfusionMatrix {
    labels: Vec<String>,
    counts: Vec<Vec<u64>>,
}

impl ConfusionMatrix {
    /// Create a matrix, validating that it is square and matches `labels`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if `labels` is empty, or if `counts`
    /// does not have one row and one column per label.
    pub fn new(labels: Vec<String>, counts: Vec<Vec<u64>>) -> Result<Self> {
        if labels.is_empty() {
            return Err(Error::InvalidInput(
                "confusion matrix needs at least one label".to_string(),
            ));
        }
        let n = labels.len();
        if counts.len() != n || counts.iter().any(|row| row.len() != n) {
            return Err(Error::InvalidInput(format!(
                "confusion matrix must be {n}x{n} to match its labels"
            )));
        }
        Ok(Self { labels, counts })
    }

    /// Class labels.
    #[must_use]
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Raw counts, row = actual class, column = predicted class.
    #[must_use]
    pub fn counts(&self) -> &[Vec<u64>] {
        &self.counts
    }

    /// Total number of evaluated samples.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.counts.iter().flatten().sum()
    }

    /// Fraction of samples on the diagonal, `None` for an all-zero matrix.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn accuracy(&self) -> Option<f64> {
        let total = self.total();
        if total == 0 {
            return None;
        }
        let correct: u64 = (0..self.labels.len()).map(|i| self.counts[i][i]).sum();
        Some(correct as f64 / total as f64)
    }
}
