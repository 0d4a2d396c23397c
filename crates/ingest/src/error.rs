// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Error types for ingest invocations

use thiserror::Error;

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("Invalid notification: {0}")]
    InvalidNotification(String),

    #[error("Unsupported format: '{0}'")]
    UnsupportedFormat(String),

    /// The query engine could not access or parse the source object
    #[error("Failed to read {location}: {source}")]
    ReadFailure {
        location: String,
        #[source]
        source: datafusion::error::DataFusionError,
    },

    /// The table writer could not append to the destination
    #[error("Failed to append to {table}: {source}")]
    WriteFailure {
        table: String,
        #[source]
        source: deltalake::DeltaTableError,
    },

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),

    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),
}

impl IngestError {
    /// Status code reported to the invoking environment for this failure
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            IngestError::InvalidNotification(_) | IngestError::UnsupportedFormat(_) => 400,
            _ => 500,
        }
    }

    pub(crate) fn read(location: &str, source: datafusion::error::DataFusionError) -> Self {
        IngestError::ReadFailure {
            location: location.to_string(),
            source,
        }
    }

    pub(crate) fn write(table: &str, source: deltalake::DeltaTableError) -> Self {
        IngestError::WriteFailure {
            table: table.to_string(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_format_names_tag() {
        let err = IngestError::UnsupportedFormat("txt".to_string());
        assert_eq!(err.to_string(), "Unsupported format: 'txt'");
        assert_eq!(err.status_code(), 400);
    }

    #[test]
    fn test_read_failure_keeps_source() {
        let err = IngestError::read(
            "s3://bucket/data.csv",
            datafusion::error::DataFusionError::Plan("no such file".to_string()),
        );
        assert_eq!(err.status_code(), 500);
        assert!(err.to_string().contains("s3://bucket/data.csv"));
        assert!(std::error::Error::source(&err).is_some());
    }
}
