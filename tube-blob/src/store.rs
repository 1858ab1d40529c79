use std::path::Path;

use async_trait::async_trait;
use bytes::Bytes;

use crate::{BlobId, BlobResult, OpenedBlob, StoreOptions, StoredBlob};

/// Blob storage operations the application relies on.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Stream a file from disk into the store.
    async fn upload(
        &self,
        path: &Path,
        content_type: Option<&str>,
        options: &StoreOptions,
    ) -> BlobResult<StoredBlob>;

    /// Store an in-memory payload.
    async fn upload_bytes(
        &self,
        bytes: Bytes,
        content_type: Option<&str>,
        options: &StoreOptions,
    ) -> BlobResult<StoredBlob>;

    /// Fetch a whole blob.
    async fn get(&self, blob_id: &BlobId) -> BlobResult<Bytes>;

    /// Fetch a whole blob by its Sui object id.
    async fn get_by_object_id(&self, object_id: &str) -> BlobResult<Bytes>;

    /// Public read URL. Pure, no I/O.
    fn url(&self, blob_id: &BlobId) -> String;

    /// Start a streaming read, forwarding an HTTP `Range` header verbatim.
    async fn open(&self, blob_id: &BlobId, range: Option<&str>) -> BlobResult<OpenedBlob>;

    /// Returns whether the blob was deleted.
    async fn delete(&self, blob_id: &BlobId) -> BlobResult<bool>;
}
