// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Object-arrival ingest into a Delta Lake table
//!
//! When a new object lands in a bucket, the handler reads it (Parquet or
//! CSV, chosen by the key's extension), keeps at most `row_limit` rows and
//! appends them to a shared append-only Delta table.
//!
//! # Architecture
//!
//! - **Notification**: the storage service's object-created event
//! - **SourceReader**: DataFusion scan of `s3://<bucket>/<key>` with a limit
//! - **ColumnarBatch**: the rows read, as one Arrow record batch
//! - **DestinationTable**: Delta Lake append, created on first write
//! - **IngestObserver**: diagnostic sink, log-backed by default
//!
//! # Usage
//!
//! ```no_run
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! use ingest::{IngestConfig, IngestHandler, Notification};
//!
//! let handler = IngestHandler::new(IngestConfig::load(None)?)?;
//! let notification = Notification::for_object("landing", "data/2024/file.parquet");
//! let response = handler.process(&notification).await?;
//! assert_eq!(response.status_code, 200);
//! # Ok(())
//! # }
//! ```

mod batch;
mod config;
mod error;
mod format;
mod handler;
mod notification;
mod observer;
mod s3_registration;
mod source;
mod table;
mod unsafe_commit;

pub use batch::ColumnarBatch;
pub use config::{
    ALLOW_UNSAFE_RENAME_KEY, DEFAULT_DESTINATION, DEFAULT_PREVIEW_ROWS, DEFAULT_ROW_LIMIT,
    IngestConfig,
};
pub use error::IngestError;
pub use format::{SourceFormat, extension, format_tag};
pub use handler::{IngestHandler, IngestOutcome, IngestResponse};
pub use notification::{Notification, NotificationRecord, ObjectRef, decode_key};
pub use observer::{IngestObserver, LogObserver};
pub use s3_registration::{CommitMode, commit_is_permitted, commit_mode, register_s3_handlers};
pub use source::{LocalSourceStores, S3SourceStores, SourceReader, SourceStores};
pub use table::{AppendOutcome, DestinationTable};
pub use unsafe_commit::UnsafeCommitStore;

/// Result type for ingest operations
pub type Result<T> = std::result::Result<T, IngestError>;
