//! Metric - numeric measurements logged against a run

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{MetricId, RunId};

/// Metric represents a single logged measurement.
///
/// The same metric name may be logged many times for one run (e.g. once per
/// epoch). Name comparison for lookups is case-insensitive.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Metric {
    metric_id: MetricId,
    run_id: RunId,
    metric_name: String,
    value: f64,
    logged_at: DateTime<Utc>,
}

impl Metric {
    /// Create a new metric logged at `logged_at`.
    ///
    /// # Arguments
    ///
    /// * `run_id` - ID of the owning run
    /// * `metric_name` - Metric name (e.g., "Accuracy", "F1")
    /// * `value` - Metric value
    /// * `logged_at` - Timestamp of the measurement
    #[must_use]
    pub fn new(
        run_id: RunId,
        metric_name: impl Into<String>,
        value: f64,
        logged_at: DateTime<Utc>,
    ) -> Self {
        Self {
            metric_id: MetricId::new(),
            run_id,
            metric_name: metric_name.into(),
            value,
            logged_at,
        }
    }

    /// Get the metric ID.
    #[must_use]
    pub const fn metric_id(&self) -> MetricId {
        self.metric_id
    }

    /// Get the owning run ID.
    #[must_use]
    pub const fn run_id(&self) -> RunId {
        self.run_id
    }

    /// Get the metric name as logged.
    #[must_use]
    pub fn metric_name(&self) -> &str {
        &self.metric_name
    }

    /// Get the metric value.
    #[must_use]
    pub const fn value(&self) -> f64 {
        self.value
    }

    /// Get the timestamp when the metric was recorded.
    #[must_use]
    pub const fn logged_at(&self) -> DateTime<Utc> {
        self.logged_at
    }

    /// Case-insensitive name comparison.
    #[must_use]
    pub fn is_named(&self, name: &str) -> bool {
        self.metric_name.to_lowercase() == name.to_lowercase()
    }
}
