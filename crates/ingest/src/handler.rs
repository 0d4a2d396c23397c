// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! The ingest handler: one notification in, one append out

use crate::batch::ColumnarBatch;
use crate::format::SourceFormat;
use crate::notification::{Notification, ObjectRef};
use crate::observer::{IngestObserver, LogObserver};
use crate::source::{S3SourceStores, SourceReader, SourceStores};
use crate::table::DestinationTable;
use crate::{IngestConfig, IngestError, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Reply handed back to the invoking environment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestResponse {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub body: String,
}

impl IngestResponse {
    #[must_use]
    pub fn success(key: &str) -> Self {
        Self {
            status_code: 200,
            body: format!("Successfully processed {key}"),
        }
    }

    #[must_use]
    pub fn failure(err: &IngestError) -> Self {
        Self {
            status_code: err.status_code(),
            body: err.to_string(),
        }
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status_code == 200
    }
}

/// What one invocation did, for library callers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestOutcome {
    pub object: ObjectRef,
    pub format: SourceFormat,
    pub rows_appended: usize,
    pub table_version: Option<i64>,
}

/// Reads newly created objects and appends them to the destination table
///
/// Nothing is shared between invocations except the destination table
/// itself: each call opens its own query session and table handle.
pub struct IngestHandler {
    reader: SourceReader,
    table: DestinationTable,
    observer: Arc<dyn IngestObserver>,
}

impl IngestHandler {
    /// Handler reading from S3 through the environment's credential chain
    pub fn new(config: IngestConfig) -> Result<Self> {
        let stores = Arc::new(S3SourceStores::new(&config));
        Self::with_sources(config, stores)
    }

    /// Handler reading buckets from `stores`
    pub fn with_sources(config: IngestConfig, stores: Arc<dyn SourceStores>) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            reader: SourceReader::new(stores, config.row_limit),
            table: DestinationTable::new(&config),
            observer: Arc::new(LogObserver::new(config.preview_rows)),
        })
    }

    /// Replace the default log observer
    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn IngestObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Handle a storage notification
    ///
    /// Errors are returned unchanged and nothing is retried; the invoking
    /// environment owns retry and dead-letter policy.
    pub async fn process(&self, notification: &Notification) -> Result<IngestResponse> {
        let object = notification.first_object()?;
        let outcome = self.ingest(&object).await?;
        Ok(IngestResponse::success(&outcome.object.key))
    }

    /// Read one object and append it to the destination
    ///
    /// Processing the same object twice appends its rows twice.
    pub async fn ingest(&self, object: &ObjectRef) -> Result<IngestOutcome> {
        let format = SourceFormat::detect(&object.key)?;
        self.observer.format_detected(object, format);

        let batch: ColumnarBatch = self.reader.read(object, format).await?;
        self.observer.batch_loaded(object, &batch);

        let appended = self.table.append(batch).await?;
        self.observer.batch_appended(object, self.table.uri(), &appended);

        Ok(IngestOutcome {
            object: object.clone(),
            format,
            rows_appended: appended.rows,
            table_version: appended.version,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_json_shape() {
        let response = IngestResponse::success("data/2024/file.parquet");
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["statusCode"], 200);
        assert_eq!(json["body"], "Successfully processed data/2024/file.parquet");
        assert!(response.is_success());
    }

    #[test]
    fn test_failure_response() {
        let response = IngestResponse::failure(&IngestError::UnsupportedFormat("txt".into()));
        assert_eq!(response.status_code, 400);
        assert!(response.body.contains("txt"));
        assert!(!response.is_success());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = IngestConfig::new("/tmp/never-written");
        config.row_limit = 0;
        assert!(matches!(
            IngestHandler::new(config),
            Err(IngestError::Configuration(_))
        ));
    }
}
