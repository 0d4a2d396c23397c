// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Source format dispatch on the object key's extension

use crate::Result;
use crate::error::IngestError;
use std::fmt;
use std::str::FromStr;

/// Formats the handler knows how to read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceFormat {
    Parquet,
    Csv,
}

impl SourceFormat {
    /// Detect the format of an object from its key
    ///
    /// The tag is the final dot-delimited suffix of the key's last path
    /// segment, lower-cased. A key without a suffix has the empty tag.
    pub fn detect(key: &str) -> Result<Self> {
        format_tag(key).parse()
    }

    #[must_use]
    pub fn tag(self) -> &'static str {
        match self {
            SourceFormat::Parquet => "parquet",
            SourceFormat::Csv => "csv",
        }
    }
}

impl FromStr for SourceFormat {
    type Err = IngestError;

    fn from_str(tag: &str) -> Result<Self> {
        match tag.to_ascii_lowercase().as_str() {
            "parquet" => Ok(SourceFormat::Parquet),
            "csv" => Ok(SourceFormat::Csv),
            other => Err(IngestError::UnsupportedFormat(other.to_string())),
        }
    }
}

impl fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Extension of the key's last path segment, as spelled in the key
#[must_use]
pub fn extension(key: &str) -> &str {
    let file_name = key.rsplit('/').next().unwrap_or(key);
    file_name
        .rsplit_once('.')
        .map_or("", |(_, extension)| extension)
}

/// Lower-cased extension used for dispatch
#[must_use]
pub fn format_tag(key: &str) -> String {
    extension(key).to_ascii_lowercase()
}
