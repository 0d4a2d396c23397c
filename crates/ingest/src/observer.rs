// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Diagnostic sink for handler progress
//!
//! Observers see what the handler did but cannot influence it: every method
//! returns `()` and is invoked after the corresponding step succeeded.

use crate::batch::ColumnarBatch;
use crate::format::SourceFormat;
use crate::notification::ObjectRef;
use crate::table::AppendOutcome;

pub trait IngestObserver: Send + Sync {
    fn format_detected(&self, object: &ObjectRef, format: SourceFormat);

    fn batch_loaded(&self, object: &ObjectRef, batch: &ColumnarBatch);

    fn batch_appended(&self, object: &ObjectRef, destination: &str, outcome: &AppendOutcome);
}

/// Forwards handler progress to the diagnostics log
#[derive(Debug, Clone)]
pub struct LogObserver {
    preview_rows: usize,
}

impl LogObserver {
    #[must_use]
    pub fn new(preview_rows: usize) -> Self {
        Self { preview_rows }
    }
}

impl IngestObserver for LogObserver {
    fn format_detected(&self, object: &ObjectRef, format: SourceFormat) {
        diagnostics::info!(
            "Detected {format} for {key}",
            format: format.tag(),
            key: object.key.as_str()
        );
    }

    fn batch_loaded(&self, object: &ObjectRef, batch: &ColumnarBatch) {
        match batch.preview(self.preview_rows) {
            Ok(preview) => diagnostics::debug!(
                "Preview of {key}:\n{preview}",
                key: object.key.as_str(),
                preview: preview
            ),
            Err(err) => diagnostics::warn!(
                "Cannot render preview of {key}: {err}",
                key: object.key.as_str(),
                err
            ),
        }
        diagnostics::info!(
            "Loaded {rows} rows from {key}",
            rows: batch.num_rows(),
            key: object.key.as_str()
        );
    }

    fn batch_appended(&self, object: &ObjectRef, destination: &str, outcome: &AppendOutcome) {
        match outcome.version {
            Some(version) => diagnostics::info!(
                "Appended {rows} rows from {key} to {destination} at version {version}",
                rows: outcome.rows,
                key: object.key.as_str(),
                destination: destination,
                version: version
            ),
            None => diagnostics::info!(
                "No rows from {key} to append to {destination}",
                key: object.key.as_str(),
                destination: destination
            ),
        }
    }
}
