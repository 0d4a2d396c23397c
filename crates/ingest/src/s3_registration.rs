// SPDX-FileCopyrightText: 2026 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Register s3:// table locations with Delta Lake without AWS SDK dependencies
//!
//! Stores are built with `object_store`'s own credential chain. Plain S3 has
//! no atomic rename, so the log store refuses to open unless the caller either
//! configures conditional puts or opts into unsafe renames. With unsafe
//! renames the commit files are written through [`UnsafeCommitStore`].

use crate::config::ALLOW_UNSAFE_RENAME_KEY;
use crate::unsafe_commit::UnsafeCommitStore;
use deltalake::logstore::{
    LogStore, LogStoreFactory, ObjectStoreFactory, ObjectStoreRef, StorageConfig, default_logstore,
    logstore_factories, object_store_factories,
};
use deltalake::{DeltaResult, DeltaTableError, Path};
use object_store::{ObjectStoreScheme, RetryConfig};
use object_store::aws::{AmazonS3Builder, AmazonS3ConfigKey};
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::{Arc, Once};
use url::Url;

static REGISTER: Once = Once::new();

#[derive(Clone, Default, Debug)]
pub struct S3StoreFactory {}

impl ObjectStoreFactory for S3StoreFactory {
    fn parse_url_opts(
        &self,
        url: &Url,
        raw: &HashMap<String, String>,
        _retry: &RetryConfig,
    ) -> DeltaResult<(ObjectStoreRef, Path)> {
        diagnostics::debug!("Building S3 table store for {url}", url: url.as_str());

        let mut builder = AmazonS3Builder::from_env().with_url(url.to_string());

        for (key, value) in raw {
            if let Ok(config_key) = AmazonS3ConfigKey::from_str(&key.to_ascii_lowercase()) {
                builder = builder.with_config(config_key, value.clone());
            } else {
                diagnostics::debug!("Ignoring non-store option {key}", key: key.as_str());
            }
        }

        let (_, path) =
            ObjectStoreScheme::parse(url).map_err(|e| DeltaTableError::GenericError {
                source: Box::new(e),
            })?;
        let prefix = Path::parse(path)?;

        let store = builder.build().map_err(|e| DeltaTableError::GenericError {
            source: Box::new(e),
        })?;

        Ok((Arc::new(store), prefix))
    }
}

/// How commit files reach the `_delta_log`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitMode {
    /// The store performs put-if-absent itself
    ConditionalPut,
    /// Check-then-write; concurrent writers may overwrite each other
    UnsafeRename,
}

/// Log store factory choosing the commit path from the storage options
#[derive(Clone, Default, Debug)]
pub struct S3LogStoreFactory {}

impl LogStoreFactory for S3LogStoreFactory {
    fn with_options(
        &self,
        prefixed_store: ObjectStoreRef,
        location: &Url,
        options: &StorageConfig,
    ) -> DeltaResult<Arc<dyn LogStore>> {
        match commit_mode(&options.raw) {
            Some(CommitMode::ConditionalPut) => Ok(default_logstore(
                prefixed_store,
                location,
                options,
            )),
            Some(CommitMode::UnsafeRename) => {
                diagnostics::warn!(
                    "Commits to {location} are not atomic",
                    location: location.as_str()
                );
                Ok(default_logstore(
                    Arc::new(UnsafeCommitStore::new(prefixed_store)),
                    location,
                    options,
                ))
            }
            None => Err(DeltaTableError::Generic(format!(
                "{location} has no atomic rename; set {ALLOW_UNSAFE_RENAME_KEY}=true \
                 or configure aws_conditional_put"
            ))),
        }
    }
}

/// Commit path for the given options, `None` when commits are not allowed
///
/// A configured conditional put wins over the unsafe-rename flag.
#[must_use]
pub fn commit_mode(options: &HashMap<String, String>) -> Option<CommitMode> {
    let mut unsafe_rename = false;
    for (key, value) in options {
        let key = key.to_ascii_lowercase();
        let value = value.trim();
        if (key == "aws_conditional_put" || key == "conditional_put")
            && !value.is_empty()
            && !value.eq_ignore_ascii_case("disabled")
        {
            return Some(CommitMode::ConditionalPut);
        }
        if key == ALLOW_UNSAFE_RENAME_KEY.to_ascii_lowercase() && value.eq_ignore_ascii_case("true")
        {
            unsafe_rename = true;
        }
    }
    unsafe_rename.then_some(CommitMode::UnsafeRename)
}

/// True when the options allow commits on a store without atomic rename
#[must_use]
pub fn commit_is_permitted(options: &HashMap<String, String>) -> bool {
    commit_mode(options).is_some()
}

/// Register table handlers for s3:// and s3a:// once per process
pub fn register_s3_handlers() {
    REGISTER.call_once(|| {
        let object_factory = Arc::new(S3StoreFactory::default());
        let log_factory = Arc::new(S3LogStoreFactory::default());

        for scheme in ["s3", "s3a"] {
            match Url::parse(&format!("{scheme}://")) {
                Ok(url) => {
                    object_store_factories().insert(url.clone(), object_factory.clone());
                    logstore_factories().insert(url, log_factory.clone());
                }
                Err(err) => diagnostics::error!(
                    "Cannot register {scheme} handlers: {err}",
                    scheme: scheme,
                    err
                ),
            }
        }
        diagnostics::debug!("Registered S3 table handlers");
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::unsafe_commit::test_store::NoConditionalPut;
    use arrow_array::{Int64Array, RecordBatch};
    use arrow_schema::{DataType, Field, Schema};
    use deltalake::{DeltaOps, DeltaTable, DeltaTableConfig};

    fn options(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    fn log_store(pairs: &[(&str, &str)]) -> DeltaResult<Arc<dyn LogStore>> {
        let store: ObjectStoreRef = Arc::new(NoConditionalPut::default());
        let location = Url::parse("s3://landing/delta-table").unwrap();
        let config = StorageConfig::parse_options(options(pairs))?;
        S3LogStoreFactory::default().with_options(store, &location, &config)
    }

    fn ids(values: Vec<i64>) -> RecordBatch {
        let schema = Arc::new(Schema::new(vec![Field::new("id", DataType::Int64, true)]));
        RecordBatch::try_new(schema, vec![Arc::new(Int64Array::from(values))]).unwrap()
    }

    #[test]
    fn test_commit_requires_opt_in() {
        assert!(!commit_is_permitted(&options(&[])));
        assert!(!commit_is_permitted(&options(&[(
            "AWS_S3_ALLOW_UNSAFE_RENAME",
            "false"
        )])));
        assert!(commit_is_permitted(&options(&[(
            "AWS_S3_ALLOW_UNSAFE_RENAME",
            "TRUE"
        )])));
        assert!(commit_is_permitted(&options(&[(
            "aws_conditional_put",
            "etag"
        )])));
        assert!(!commit_is_permitted(&options(&[(
            "aws_conditional_put",
            "disabled"
        )])));
    }

    #[test]
    fn test_commit_mode_selection() {
        assert_eq!(
            commit_mode(&options(&[
                ("AWS_S3_ALLOW_UNSAFE_RENAME", "true"),
                ("aws_conditional_put", "disabled"),
            ])),
            Some(CommitMode::UnsafeRename)
        );
        assert_eq!(
            commit_mode(&options(&[
                ("AWS_S3_ALLOW_UNSAFE_RENAME", "true"),
                ("aws_conditional_put", "etag"),
            ])),
            Some(CommitMode::ConditionalPut)
        );
    }

    #[test]
    fn test_log_store_refuses_without_commit_mode() {
        let err = log_store(&[]).err().unwrap();
        assert!(err.to_string().contains("no atomic rename"));

        let err = log_store(&[("AWS_S3_ALLOW_UNSAFE_RENAME", "false")])
            .err()
            .unwrap();
        assert!(err.to_string().contains(ALLOW_UNSAFE_RENAME_KEY));
    }

    #[tokio::test]
    async fn test_unsafe_rename_commits_without_conditional_put() {
        let log_store = log_store(&[
            ("AWS_S3_ALLOW_UNSAFE_RENAME", "true"),
            ("aws_conditional_put", "disabled"),
        ])
        .unwrap();
        let table = DeltaTable::new(log_store, DeltaTableConfig::default());

        let table = DeltaOps::from(table)
            .write(vec![ids(vec![1, 2, 3])])
            .await
            .unwrap();
        assert_eq!(table.version(), 0);

        let table = DeltaOps::from(table)
            .write(vec![ids(vec![4])])
            .await
            .unwrap();
        assert_eq!(table.version(), 1);

        let (_table, stream) = DeltaOps::from(table).load().await.unwrap();
        let batches = deltalake::operations::collect_sendable_stream(stream)
            .await
            .unwrap();
        let rows: usize = batches.iter().map(RecordBatch::num_rows).sum();
        assert_eq!(rows, 4);
    }

    #[test]
    fn test_register_is_idempotent() {
        register_s3_handlers();
        register_s3_handlers();
        let url = Url::parse("s3://").unwrap();
        assert!(object_store_factories().contains_key(&url));
        assert!(logstore_factories().contains_key(&url));
    }
}
