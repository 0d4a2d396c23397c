// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Reading source objects through DataFusion
//!
//! Each read runs in its own `SessionContext`. The bucket's object store is
//! registered on that session's runtime, then the object is scanned with the
//! reader chosen by [`SourceFormat`] and truncated to the row limit.

use crate::batch::ColumnarBatch;
use crate::error::IngestError;
use crate::format::{SourceFormat, extension};
use crate::notification::ObjectRef;
use crate::{IngestConfig, Result};
use datafusion::dataframe::DataFrame;
use datafusion::error::DataFusionError;
use datafusion::prelude::{CsvReadOptions, ParquetReadOptions, SessionConfig, SessionContext};
use object_store::ObjectStore;
use object_store::aws::{AmazonS3Builder, AmazonS3ConfigKey};
use object_store::local::LocalFileSystem;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

/// Supplies the object store holding a bucket's objects
pub trait SourceStores: Send + Sync {
    fn store_for_bucket(&self, bucket: &str) -> Result<Arc<dyn ObjectStore>>;
}

/// S3 buckets, credentials resolved from the hosting environment
///
/// Starts from `AmazonS3Builder::from_env`, which walks the usual chain:
/// environment variables, web identity, container and instance metadata.
/// No static keys are accepted here.
#[derive(Debug, Clone, Default)]
pub struct S3SourceStores {
    options: Vec<(String, String)>,
}

impl S3SourceStores {
    #[must_use]
    pub fn new(config: &IngestConfig) -> Self {
        Self {
            options: config.s3_options(),
        }
    }
}

impl SourceStores for S3SourceStores {
    fn store_for_bucket(&self, bucket: &str) -> Result<Arc<dyn ObjectStore>> {
        let mut builder = AmazonS3Builder::from_env().with_bucket_name(bucket);

        for (key, value) in &self.options {
            match AmazonS3ConfigKey::from_str(key) {
                Ok(config_key) => builder = builder.with_config(config_key, value),
                Err(_) => diagnostics::debug!("Ignoring unknown S3 option {key}", key: key.as_str()),
            }
        }

        let store = builder.build().map_err(|e| {
            IngestError::Configuration(format!("Failed to build S3 store for {bucket}: {e}"))
        })?;
        Ok(Arc::new(store))
    }
}

/// Buckets served from directories under a local root, `<root>/<bucket>/<key>`
#[derive(Debug, Clone)]
pub struct LocalSourceStores {
    root: PathBuf,
}

impl LocalSourceStores {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl SourceStores for LocalSourceStores {
    fn store_for_bucket(&self, bucket: &str) -> Result<Arc<dyn ObjectStore>> {
        let path = self.root.join(bucket);
        let store = LocalFileSystem::new_with_prefix(&path).map_err(|e| {
            IngestError::read(
                &format!("s3://{bucket}"),
                DataFusionError::External(Box::new(e)),
            )
        })?;
        Ok(Arc::new(store))
    }
}

/// Reads at most `row_limit` rows of one object
pub struct SourceReader {
    stores: Arc<dyn SourceStores>,
    row_limit: usize,
}

impl SourceReader {
    #[must_use]
    pub fn new(stores: Arc<dyn SourceStores>, row_limit: usize) -> Self {
        Self { stores, row_limit }
    }

    /// Fresh session for one invocation
    fn session() -> SessionContext {
        let mut cfg = SessionConfig::new();
        // View types have no Delta equivalent; keep plain Utf8/Binary columns.
        cfg.options_mut().execution.parquet.schema_force_view_types = false;
        SessionContext::new_with_config(cfg)
    }

    pub async fn read(&self, object: &ObjectRef, format: SourceFormat) -> Result<ColumnarBatch> {
        let location = object.location();
        let ctx = Self::session();

        let store = self.stores.store_for_bucket(&object.bucket)?;
        _ = ctx
            .runtime_env()
            .register_object_store(&object.bucket_url()?, store);

        diagnostics::debug!(
            "Reading {location} as {format}, limit {limit}",
            location: location.as_str(),
            format: format.tag(),
            limit: self.row_limit
        );

        let url = object.url()?;
        let df = Self::scan(&ctx, url.as_str(), format, object)
            .await
            .map_err(|e| IngestError::read(&location, e))?;

        let df = df
            .limit(0, Some(self.row_limit))
            .map_err(|e| IngestError::read(&location, e))?;
        let schema = Arc::clone(df.schema().inner());
        let batches = df
            .collect()
            .await
            .map_err(|e| IngestError::read(&location, e))?;

        ColumnarBatch::from_batches(schema, &batches)
    }

    async fn scan(
        ctx: &SessionContext,
        url: &str,
        format: SourceFormat,
        object: &ObjectRef,
    ) -> std::result::Result<DataFrame, DataFusionError> {
        // Listing filters on the extension, so pass it as spelled in the key
        let file_extension = format!(".{}", extension(&object.key));

        match format {
            SourceFormat::Parquet => {
                let options = ParquetReadOptions {
                    file_extension: &file_extension,
                    ..Default::default()
                };
                ctx.read_parquet(url, options).await
            }
            SourceFormat::Csv => {
                let options = CsvReadOptions::new()
                    .has_header(true)
                    .file_extension(&file_extension);
                ctx.read_csv(url, options).await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_local_csv_read_respects_limit() {
        let temp_dir = TempDir::new().unwrap();
        let bucket_dir = temp_dir.path().join("landing");
        std::fs::create_dir_all(bucket_dir.join("in")).unwrap();

        let mut csv = String::from("id,name\n");
        for i in 0..30 {
            csv.push_str(&format!("{i},name-{i}\n"));
        }
        std::fs::write(bucket_dir.join("in/people.csv"), csv).unwrap();

        let reader = SourceReader::new(Arc::new(LocalSourceStores::new(temp_dir.path())), 10);
        let object = ObjectRef::new("landing", "in/people.csv").unwrap();
        let batch = reader.read(&object, SourceFormat::Csv).await.unwrap();

        assert_eq!(batch.num_rows(), 10);
        assert_eq!(batch.schema().field(0).name(), "id");
    }

    #[tokio::test]
    async fn test_keys_with_url_reserved_characters() {
        let temp_dir = TempDir::new().unwrap();
        let bucket_dir = temp_dir.path().join("landing");
        std::fs::create_dir_all(bucket_dir.join("in")).unwrap();

        let keys = ["q?x.csv", "a#1.csv", "in/50% off.csv", "in/plain.csv"];
        for key in keys {
            std::fs::write(bucket_dir.join(key), "id,name\n1,alice\n2,bob\n").unwrap();
        }

        let reader = SourceReader::new(Arc::new(LocalSourceStores::new(temp_dir.path())), 10);
        for key in keys {
            let object = ObjectRef::new("landing", key).unwrap();
            let batch = reader.read(&object, SourceFormat::Csv).await.unwrap();
            assert_eq!(batch.num_rows(), 2, "{key}");
        }
    }

    #[tokio::test]
    async fn test_missing_object_is_read_failure() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::create_dir_all(temp_dir.path().join("landing")).unwrap();

        let reader = SourceReader::new(Arc::new(LocalSourceStores::new(temp_dir.path())), 10);
        let object = ObjectRef::new("landing", "absent.parquet").unwrap();
        let err = reader
            .read(&object, SourceFormat::Parquet)
            .await
            .unwrap_err();

        assert!(matches!(err, IngestError::ReadFailure { .. }));
    }

    #[test]
    fn test_s3_store_builds_without_static_keys() {
        let config = IngestConfig {
            region: Some("us-east-1".to_string()),
            endpoint: Some("http://localhost:9000".to_string()),
            allow_http: true,
            ..IngestConfig::default()
        };
        let stores = S3SourceStores::new(&config);
        assert!(stores.store_for_bucket("landing").is_ok());
    }
}
