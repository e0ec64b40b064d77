//! Logged training data: schema, content hash and column distributions

use serde::{Deserialize, Serialize};

use super::{DataColumnId, DataDistributionId, DataId, RunId};

/// One categorical histogram entry of a data column.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DataDistribution {
    /// Unique id
    pub data_distribution_id: DataDistributionId,
    /// Owning column
    pub data_column_id: DataColumnId,
    /// Distinct value, in string form
    pub value: String,
    /// Number of rows holding `value`
    pub count: u64,
}

/// A column of a logged data set.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DataColumn {
    /// Unique id
    pub data_column_id: DataColumnId,
    /// Owning data set
    pub data_id: DataId,
    /// Column name
    pub name: String,
    /// Column type name as produced by the schema generator
    pub column_type: String,
    /// Histogram entries, values unique
    pub distributions: Vec<DataDistribution>,
}

impl DataColumn {
    /// Merge `(value, count)` pairs into the histogram.
    ///
    /// Counts of values already present are added to; new values are
    /// appended. Values stay unique.
    pub(crate) fn merge_distribution(&mut self, entries: Vec<(String, u64)>) {
        for (value, count) in entries {
            if let Some(existing) = self.distributions.iter_mut().find(|d| d.value == value) {
                existing.count = existing.count.saturating_add(count);
            } else {
                self.distributions.push(DataDistribution {
                    data_distribution_id: DataDistributionId::new(),
                    data_column_id: self.data_column_id,
                    value,
                    count,
                });
            }
        }
    }
}

/// Schema and fingerprint of the data a run trained on.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Data {
    /// Unique id
    pub data_id: DataId,
    /// Owning run
    pub run_id: RunId,
    /// Content hash of the serialized rows (`blake3:<hex>`)
    pub data_hash: String,
    /// Number of rows
    pub rows: u64,
    /// Columns in declaration order
    pub columns: Vec<DataColumn>,
}

impl Data {
    /// Look a column up by name.
    #[must_use]
    pub fn column(&self, name: &str) -> Option<&DataColumn> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub(crate) fn column_mut(&mut self, name: &str) -> Option<&mut DataColumn> {
        self.columns.iter_mut().find(|c| c.name == name)
    }
}
