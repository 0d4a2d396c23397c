// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Append-only Delta Lake destination

use crate::batch::ColumnarBatch;
use crate::error::IngestError;
use crate::s3_registration::register_s3_handlers;
use crate::{IngestConfig, Result};
use deltalake::DeltaOps;
use deltalake::operations::write::SchemaMode;
use deltalake::protocol::SaveMode;
use std::collections::HashMap;

/// Result of one append
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppendOutcome {
    pub rows: usize,
    /// Table version after the commit; `None` when nothing was committed
    pub version: Option<i64>,
}

/// The shared table every invocation appends to
///
/// Rows are only ever added. Ordering and conflict handling between
/// concurrent appenders is left to the Delta commit protocol.
#[derive(Debug, Clone)]
pub struct DestinationTable {
    uri: String,
    storage_options: HashMap<String, String>,
    merge_schema: bool,
}

impl DestinationTable {
    #[must_use]
    pub fn new(config: &IngestConfig) -> Self {
        Self {
            uri: config.destination.clone(),
            storage_options: config.table_storage_options(),
            merge_schema: config.merge_schema,
        }
    }

    #[must_use]
    pub fn uri(&self) -> &str {
        &self.uri
    }

    fn local_path(&self) -> Option<&str> {
        if let Some(path) = self.uri.strip_prefix("file://") {
            Some(path)
        } else if self.uri.contains("://") {
            None
        } else {
            Some(&self.uri)
        }
    }

    async fn ops(&self) -> Result<DeltaOps> {
        if let Some(path) = self.local_path() {
            std::fs::create_dir_all(path)?;
        } else if self.uri.starts_with("s3://") || self.uri.starts_with("s3a://") {
            register_s3_handlers();
        }

        DeltaOps::try_from_uri_with_storage_options(&self.uri, self.storage_options.clone())
            .await
            .map_err(|e| IngestError::write(&self.uri, e))
    }

    /// Append `batch`, creating the table on first write
    ///
    /// An empty batch commits nothing and reports zero rows.
    pub async fn append(&self, batch: ColumnarBatch) -> Result<AppendOutcome> {
        if batch.is_empty() {
            diagnostics::debug!("Empty batch, nothing to append to {uri}", uri: self.uri.as_str());
            return Ok(AppendOutcome {
                rows: 0,
                version: None,
            });
        }

        let rows = batch.num_rows();
        let mut write = self
            .ops()
            .await?
            .write(vec![batch.into_record_batch()])
            .with_save_mode(SaveMode::Append);
        if self.merge_schema {
            write = write.with_schema_mode(SchemaMode::Merge);
        }

        let table = write.await.map_err(|e| IngestError::write(&self.uri, e))?;

        diagnostics::debug!(
            "Appended {rows} rows to {uri}",
            rows: rows,
            uri: self.uri.as_str()
        );

        Ok(AppendOutcome {
            rows,
            version: Some(table.version()),
        })
    }
}
