// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! In-memory result of reading one source object

use crate::Result;
use arrow::compute::concat_batches;
use arrow::util::pretty::pretty_format_batches;
use arrow_array::RecordBatch;
use arrow_schema::SchemaRef;

/// Rows read from a source object, held as a single record batch
#[derive(Debug, Clone)]
pub struct ColumnarBatch {
    batch: RecordBatch,
}

impl ColumnarBatch {
    /// Combine the engine's output batches under `schema`
    pub fn from_batches(schema: SchemaRef, batches: &[RecordBatch]) -> Result<Self> {
        let batch = match batches {
            [] => RecordBatch::new_empty(schema),
            [single] => single.clone(),
            many => concat_batches(&schema, many)?,
        };
        Ok(Self { batch })
    }

    #[must_use]
    pub fn num_rows(&self) -> usize {
        self.batch.num_rows()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.batch.num_rows() == 0
    }

    #[must_use]
    pub fn schema(&self) -> SchemaRef {
        self.batch.schema()
    }

    #[must_use]
    pub fn into_record_batch(self) -> RecordBatch {
        self.batch
    }

    /// Pretty-printed table of at most `rows` leading rows
    pub fn preview(&self, rows: usize) -> Result<String> {
        let head = self.batch.slice(0, rows.min(self.batch.num_rows()));
        Ok(pretty_format_batches(&[head])?.to_string())
    }
}
