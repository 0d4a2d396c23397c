// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Handler configuration
//!
//! Values come from built-in defaults, optionally a YAML file, then
//! `INGEST_*` environment variables. Callers may override fields afterwards.

use crate::Result;
use crate::error::IngestError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Default destination table
pub const DEFAULT_DESTINATION: &str = "s3://duckdb-lambda-delta-bucket/delta-table";

/// Rows sampled from each source object
pub const DEFAULT_ROW_LIMIT: usize = 100;

/// Rows rendered in the diagnostic preview
pub const DEFAULT_PREVIEW_ROWS: usize = 5;

/// Storage option understood by the S3 log store to permit non-atomic renames
pub const ALLOW_UNSAFE_RENAME_KEY: &str = "AWS_S3_ALLOW_UNSAFE_RENAME";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestConfig {
    /// Delta table URI (`s3://...`, `file://...` or a local path)
    #[serde(default = "default_destination")]
    pub destination: String,

    /// Maximum rows read from each source object
    #[serde(default = "default_row_limit")]
    pub row_limit: usize,

    #[serde(default = "default_preview_rows")]
    pub preview_rows: usize,

    /// Trade commit atomicity for compatibility with stores lacking atomic rename
    #[serde(default = "default_allow_unsafe_rename")]
    pub allow_unsafe_rename: bool,

    /// Let appends add columns to the destination schema
    #[serde(default)]
    pub merge_schema: bool,

    /// S3 region override; the credential chain supplies it otherwise
    #[serde(default)]
    pub region: Option<String>,

    /// S3-compatible endpoint (MinIO, R2, ...)
    #[serde(default)]
    pub endpoint: Option<String>,

    #[serde(default)]
    pub allow_http: bool,

    /// Extra options handed verbatim to the table writer
    #[serde(default)]
    pub storage_options: HashMap<String, String>,
}

fn default_destination() -> String {
    DEFAULT_DESTINATION.to_string()
}
fn default_row_limit() -> usize {
    DEFAULT_ROW_LIMIT
}
fn default_preview_rows() -> usize {
    DEFAULT_PREVIEW_ROWS
}
fn default_allow_unsafe_rename() -> bool {
    true
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            destination: default_destination(),
            row_limit: default_row_limit(),
            preview_rows: default_preview_rows(),
            allow_unsafe_rename: default_allow_unsafe_rename(),
            merge_schema: false,
            region: None,
            endpoint: None,
            allow_http: false,
            storage_options: HashMap::new(),
        }
    }
}

impl IngestConfig {
    /// Configuration for the given destination, everything else defaulted
    #[must_use]
    pub fn new(destination: impl Into<String>) -> Self {
        Self {
            destination: destination.into(),
            ..Self::default()
        }
    }

    /// Parse configuration from YAML text
    pub fn from_yaml(text: &str) -> Result<Self> {
        Ok(serde_yaml_ng::from_str(text)?)
    }

    /// Read configuration from a YAML file
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml(&text)
    }

    /// Defaults (or `file`, when given) with environment overrides applied
    pub fn load(file: Option<&Path>) -> Result<Self> {
        let config = match file {
            Some(path) => Self::from_yaml_file(path)?,
            None => Self::default(),
        };
        config.with_overrides(|name| std::env::var(name).ok())
    }

    /// Apply `INGEST_*` overrides looked up through `lookup`
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(destination) = lookup("INGEST_DESTINATION") {
            self.destination = destination;
        }
        if let Some(limit) = lookup("INGEST_ROW_LIMIT") {
            self.row_limit = parse_value("INGEST_ROW_LIMIT", &limit)?;
        }
        if let Some(rows) = lookup("INGEST_PREVIEW_ROWS") {
            self.preview_rows = parse_value("INGEST_PREVIEW_ROWS", &rows)?;
        }
        if let Some(flag) = lookup("INGEST_ALLOW_UNSAFE_RENAME") {
            self.allow_unsafe_rename = parse_value("INGEST_ALLOW_UNSAFE_RENAME", &flag)?;
        }
        if let Some(flag) = lookup("INGEST_MERGE_SCHEMA") {
            self.merge_schema = parse_value("INGEST_MERGE_SCHEMA", &flag)?;
        }
        Ok(self)
    }

    /// Reject configurations no invocation could succeed with
    pub fn validate(&self) -> Result<()> {
        if self.destination.trim().is_empty() {
            return Err(IngestError::Configuration(
                "destination must not be empty".to_string(),
            ));
        }
        if self.row_limit == 0 {
            return Err(IngestError::Configuration(
                "row_limit must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// S3 builder settings derived from the explicit overrides
    #[must_use]
    pub fn s3_options(&self) -> Vec<(String, String)> {
        let mut options = Vec::new();
        if let Some(region) = &self.region {
            options.push(("aws_region".to_string(), region.clone()));
        }
        if let Some(endpoint) = &self.endpoint {
            options.push(("aws_endpoint".to_string(), endpoint.clone()));
        }
        if self.allow_http {
            options.push(("aws_allow_http".to_string(), "true".to_string()));
        }
        options
    }

    /// Options passed to the table writer for the destination
    #[must_use]
    pub fn table_storage_options(&self) -> HashMap<String, String> {
        let mut options: HashMap<String, String> = self.s3_options().into_iter().collect();
        if self.allow_unsafe_rename {
            options.insert(ALLOW_UNSAFE_RENAME_KEY.to_string(), "true".to_string());
        }
        // Explicit storage options win over derived ones
        options.extend(self.storage_options.clone());
        options
    }
}

fn parse_value<T: std::str::FromStr>(name: &str, raw: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e| IngestError::Configuration(format!("{name}='{raw}': {e}")))
}
