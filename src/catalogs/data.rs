//! Training data schema, fingerprint and column distributions.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, instrument};

use super::require_run;
use super::training::value_to_string;
use crate::entities::{Data, DataColumn, DataColumnId, DataId, RunId};
use crate::schema::{SchemaGenerator, SchemaType};
use crate::storage::{DataRepository, RunRepository};
use crate::{Error, Result};

/// Exposes data operations.
pub struct DataCatalog<S> {
    store: Arc<S>,
    schema_generator: SchemaGenerator,
}

impl<S> DataCatalog<S>
where
    S: RunRepository + DataRepository,
{
    /// Wire the catalog to its collaborators.
    #[must_use]
    pub const fn new(store: Arc<S>, schema_generator: SchemaGenerator) -> Self {
        Self {
            store,
            schema_generator,
        }
    }

    /// Record the schema, row count and content hash of the rows a run
    /// trained on. Replaces previously logged data of the run.
    ///
    /// Every field of `T` (nested ones under dotted names) becomes a column.
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`] if the run does not exist.
    #[instrument(skip(self, rows), fields(rows = rows.len()))]
    pub async fn log_data<T>(&self, run_id: RunId, rows: &[T]) -> Result<Data>
    where
        T: SchemaType + Serialize + Sync,
    {
        let bytes = serde_json::to_vec(rows)?;
        let data_hash = format!("blake3:{}", blake3::hash(&bytes).to_hex());
        require_run(self.store.as_ref(), run_id).await?;

        let data_id = DataId::new();
        let columns = self
            .schema_generator
            .generate::<T>("Data")
            .fields()
            .iter()
            .map(|field| DataColumn {
                data_column_id: DataColumnId::new(),
                data_id,
                name: field.name().to_string(),
                column_type: field.type_name().to_string(),
                distributions: Vec::new(),
            })
            .collect();
        let data = Data {
            data_id,
            run_id,
            data_hash,
            rows: rows.len() as u64,
            columns,
        };

        self.store.log_data(data.clone()).await?;
        debug!(data_hash = %data.data_hash, "logged data");
        Ok(data)
    }

    /// Compute the categorical histogram of `column_name` over `rows` and
    /// merge it into the column's distribution.
    ///
    /// Values are compared in string form; absent values count as `null`.
    /// A column below a list (`features.petal` for `features: Vec<Feature>`)
    /// counts the value of every list element, so a row may contribute
    /// several entries or none. Returns the histogram of `rows`, most
    /// frequent value first.
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`] if the run has no logged data or the data has no
    /// such column.
    #[instrument(skip(self, rows), fields(rows = rows.len()))]
    pub async fn log_data_distribution<T>(
        &self,
        run_id: RunId,
        rows: &[T],
        column_name: &str,
    ) -> Result<Vec<(String, u64)>>
    where
        T: Serialize + Sync,
    {
        let histogram = histogram(rows, column_name)?;

        let data = self
            .store
            .get_data(run_id)
            .await?
            .ok_or_else(|| Error::not_found("data", run_id))?;
        if data.column(column_name).is_none() {
            return Err(Error::not_found("data column", column_name));
        }

        self.store
            .log_data_distribution(run_id, column_name, histogram.clone())
            .await?;
        Ok(histogram)
    }

    /// Logged data of a run.
    ///
    /// # Errors
    ///
    /// Storage errors only.
    pub async fn get_data(&self, run_id: RunId) -> Result<Option<Data>> {
        self.store.get_data(run_id).await
    }
}

fn histogram<T: Serialize>(rows: &[T], column_name: &str) -> Result<Vec<(String, u64)>> {
    let path: Vec<&str> = column_name.split('.').collect();
    let mut counts: HashMap<String, u64> = HashMap::new();
    for row in rows {
        let mut values = Vec::new();
        collect_values(serde_json::to_value(row)?, &path, &mut values);
        for value in values {
            *counts.entry(value_to_string(value)).or_insert(0) += 1;
        }
    }

    let mut entries: Vec<(String, u64)> = counts.into_iter().collect();
    entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    Ok(entries)
}

/// Values at `path` below `value`. Arrays met before the end of the path
/// contribute every element; a missing step yields `null`.
fn collect_values(value: Value, path: &[&str], out: &mut Vec<Value>) {
    let Some((step, rest)) = path.split_first() else {
        out.push(value);
        return;
    };
    match value {
        Value::Array(items) => {
            for item in items {
                collect_values(item, path, out);
            }
        }
        Value::Object(mut fields) => {
            let next = fields.remove(*step).unwrap_or(Value::Null);
            collect_values(next, rest, out);
        }
        _ => out.push(Value::Null),
    }
}
