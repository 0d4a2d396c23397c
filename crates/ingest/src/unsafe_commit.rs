// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Object store wrapper for backends without put-if-absent
//!
//! Delta commits are written with `PutMode::Create`, which plain S3 rejects
//! unless conditional puts are configured. This wrapper performs the
//! create as an existence check followed by an overwrite. Two writers racing
//! on the same version can both succeed, so it is only used when unsafe
//! renames were explicitly allowed.

use async_trait::async_trait;
use futures::stream::BoxStream;
use object_store::path::Path;
use object_store::{
    Error as ObjectStoreError, GetOptions, GetResult, ListResult, MultipartUpload, ObjectMeta,
    ObjectStore, PutMode, PutMultipartOptions, PutOptions, PutPayload, PutResult,
    Result as ObjectStoreResult,
};
use std::fmt;
use std::sync::Arc;

/// Delegating store that turns atomic creates into check-then-overwrite
#[derive(Debug, Clone)]
pub struct UnsafeCommitStore {
    inner: Arc<dyn ObjectStore>,
}

impl UnsafeCommitStore {
    #[must_use]
    pub fn new(inner: Arc<dyn ObjectStore>) -> Self {
        Self { inner }
    }

    async fn ensure_absent(&self, location: &Path) -> ObjectStoreResult<()> {
        match self.inner.head(location).await {
            Ok(_) => Err(ObjectStoreError::AlreadyExists {
                path: location.to_string(),
                source: "object exists".into(),
            }),
            Err(ObjectStoreError::NotFound { .. }) => Ok(()),
            Err(e) => Err(e),
        }
    }
}

impl fmt::Display for UnsafeCommitStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UnsafeCommitStore({})", self.inner)
    }
}

#[async_trait]
impl ObjectStore for UnsafeCommitStore {
    async fn put_opts(
        &self,
        location: &Path,
        payload: PutPayload,
        opts: PutOptions,
    ) -> ObjectStoreResult<PutResult> {
        if opts.mode != PutMode::Create {
            return self.inner.put_opts(location, payload, opts).await;
        }

        self.ensure_absent(location).await?;
        diagnostics::debug!("Non-atomic create of {location}", location: location.as_ref());
        let opts = PutOptions {
            mode: PutMode::Overwrite,
            ..opts
        };
        self.inner.put_opts(location, payload, opts).await
    }

    async fn put_multipart_opts(
        &self,
        location: &Path,
        opts: PutMultipartOptions,
    ) -> ObjectStoreResult<Box<dyn MultipartUpload>> {
        self.inner.put_multipart_opts(location, opts).await
    }

    async fn get_opts(&self, location: &Path, options: GetOptions) -> ObjectStoreResult<GetResult> {
        self.inner.get_opts(location, options).await
    }

    async fn head(&self, location: &Path) -> ObjectStoreResult<ObjectMeta> {
        self.inner.head(location).await
    }

    async fn delete(&self, location: &Path) -> ObjectStoreResult<()> {
        self.inner.delete(location).await
    }

    fn list(&self, prefix: Option<&Path>) -> BoxStream<'static, ObjectStoreResult<ObjectMeta>> {
        self.inner.list(prefix)
    }

    fn list_with_offset(
        &self,
        prefix: Option<&Path>,
        offset: &Path,
    ) -> BoxStream<'static, ObjectStoreResult<ObjectMeta>> {
        self.inner.list_with_offset(prefix, offset)
    }

    async fn list_with_delimiter(&self, prefix: Option<&Path>) -> ObjectStoreResult<ListResult> {
        self.inner.list_with_delimiter(prefix).await
    }

    async fn copy(&self, from: &Path, to: &Path) -> ObjectStoreResult<()> {
        self.inner.copy(from, to).await
    }

    async fn copy_if_not_exists(&self, from: &Path, to: &Path) -> ObjectStoreResult<()> {
        self.ensure_absent(to).await?;
        self.inner.copy(from, to).await
    }
}


#[cfg(test)]
mod tests {
    use super::test_store::NoConditionalPut;
    use super::*;

    fn commit_path() -> Path {
        Path::from("_delta_log/00000000000000000000.json")
    }

    fn create() -> PutOptions {
        PutOptions {
            mode: PutMode::Create,
            ..PutOptions::default()
        }
    }

    #[tokio::test]
    async fn test_backend_rejects_atomic_create() {
        let backend = NoConditionalPut::default();
        let err = backend
            .put_opts(&commit_path(), PutPayload::from_static(b"{}"), create())
            .await
            .unwrap_err();
        assert!(matches!(err, ObjectStoreError::NotImplemented));
    }

    #[tokio::test]
    async fn test_create_succeeds_once_then_reports_existing() {
        let store = UnsafeCommitStore::new(Arc::new(NoConditionalPut::default()));

        store
            .put_opts(&commit_path(), PutPayload::from_static(b"{}"), create())
            .await
            .unwrap();
        let err = store
            .put_opts(&commit_path(), PutPayload::from_static(b"[]"), create())
            .await
            .unwrap_err();
        assert!(matches!(err, ObjectStoreError::AlreadyExists { .. }));

        let bytes = store.get(&commit_path()).await.unwrap().bytes().await.unwrap();
        assert_eq!(bytes.as_ref(), b"{}");
    }

    #[tokio::test]
    async fn test_copy_if_not_exists_refuses_existing_target() {
        let store = UnsafeCommitStore::new(Arc::new(NoConditionalPut::default()));
        let tmp = Path::from("_delta_log/_commit_tmp.json");
        store.put(&tmp, PutPayload::from_static(b"{}")).await.unwrap();

        store.copy_if_not_exists(&tmp, &commit_path()).await.unwrap();
        let err = store
            .copy_if_not_exists(&tmp, &commit_path())
            .await
            .unwrap_err();
        assert!(matches!(err, ObjectStoreError::AlreadyExists { .. }));
    }
}
