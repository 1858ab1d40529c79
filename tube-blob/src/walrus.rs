use std::path::Path;

use async_trait::async_trait;
use bytes::Bytes;
use futures::TryStreamExt;
use reqwest::header::{CONTENT_LENGTH, CONTENT_RANGE, CONTENT_TYPE, RANGE};
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use tokio_util::io::ReaderStream;

use crate::{BlobError, BlobId, BlobResult, BlobStore, OpenedBlob, StoreOptions, StoredBlob, WalrusConfig};

const OCTET_STREAM: &str = "application/octet-stream";

/// [`BlobStore`] over the Walrus publisher and aggregator HTTP API.
///
/// Publisher calls and buffered reads are bounded by the whole-request
/// `timeout`. Streamed reads (`open`) use a second client bounded per read
/// instead, so a long playback is only cut when the aggregator goes quiet.
#[derive(Debug, Clone)]
pub struct WalrusStore {
    client: Client,
    streaming: Client,
    config: WalrusConfig,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PublisherResponse {
    newly_created: Option<NewlyCreated>,
    already_certified: Option<AlreadyCertified>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NewlyCreated {
    blob_object: BlobObject,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BlobObject {
    id: String,
    blob_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AlreadyCertified {
    blob_id: String,
}

/// Accepts both publisher answers: `newlyCreated` and `alreadyCertified`.
fn parse_publisher_response(body: &[u8], aggregator_url: &str) -> BlobResult<StoredBlob> {
    let parsed: PublisherResponse =
        serde_json::from_slice(body).map_err(|e| BlobError::unexpected(e.to_string()))?;

    let (blob_id, object_id, newly_created) = match (parsed.newly_created, parsed.already_certified) {
        (Some(created), _) => (created.blob_object.blob_id, Some(created.blob_object.id), true),
        (None, Some(certified)) => (certified.blob_id, None, false),
        (None, None) => {
            return Err(BlobError::unexpected(
                "neither newlyCreated nor alreadyCertified present",
            ))
        }
    };

    let blob_id = BlobId::new(blob_id);
    Ok(StoredBlob {
        url: blob_url(aggregator_url, &blob_id),
        blob_id,
        object_id,
        newly_created,
    })
}

fn blob_url(aggregator_url: &str, blob_id: &BlobId) -> String {
    format!("{aggregator_url}/v1/blobs/{blob_id}")
}

async fn upstream_error(resp: Response) -> BlobError {
    let status = resp.status().as_u16();
    let mut message = resp.text().await.unwrap_or_default();
    message.truncate(512);
    BlobError::Upstream { status, message }
}

fn header_str(resp: &Response, name: reqwest::header::HeaderName) -> Option<String> {
    resp.headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

impl WalrusStore {
    pub fn new(config: WalrusConfig) -> BlobResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| BlobError::transport("Failed to build HTTP client", e))?;
        let streaming = Client::builder()
            .connect_timeout(config.timeout)
            .read_timeout(config.timeout)
            .build()
            .map_err(|e| BlobError::transport("Failed to build HTTP client", e))?;

        Ok(Self {
            client,
            streaming,
            config,
        })
    }

    /// Use one caller-built client for every request.
    pub fn with_client(client: Client, config: WalrusConfig) -> Self {
        Self {
            streaming: client.clone(),
            client,
            config,
        }
    }

    pub fn config(&self) -> &WalrusConfig {
        &self.config
    }

    fn publish_query(&self, options: &StoreOptions) -> Vec<(&'static str, String)> {
        let mut query = Vec::with_capacity(2);
        if let Some(epochs) = options.epochs.or(self.config.default_epochs) {
            query.push(("epochs", epochs.to_string()));
        }
        if options.permanent {
            query.push(("permanent", "true".to_string()));
        } else {
            query.push(("deletable", "true".to_string()));
        }
        query
    }

    async fn publish(
        &self,
        body: reqwest::Body,
        len: u64,
        options: &StoreOptions,
    ) -> BlobResult<StoredBlob> {
        let url = format!("{}/v1/blobs", self.config.publisher_url);

        let resp = self
            .client
            .put(&url)
            .query(&self.publish_query(options))
            .header(CONTENT_TYPE, OCTET_STREAM)
            .header(CONTENT_LENGTH, len)
            .body(body)
            .send()
            .await
            .map_err(|e| BlobError::transport("Failed to upload blob", e))?;

        if !resp.status().is_success() {
            return Err(upstream_error(resp).await);
        }

        let body = resp
            .bytes()
            .await
            .map_err(|e| BlobError::transport("Failed to read publisher response", e))?;
        let stored = parse_publisher_response(&body, &self.config.aggregator_url)?;

        tracing::info!(
            blob_id = %stored.blob_id,
            newly_created = stored.newly_created,
            size = len,
            "blob stored on walrus"
        );
        Ok(stored)
    }

    async fn fetch(&self, url: &str, id: &str) -> BlobResult<Bytes> {
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| BlobError::transport("Failed to fetch blob", e))?;

        match resp.status() {
            StatusCode::NOT_FOUND => Err(BlobError::not_found(id)),
            s if s.is_success() => resp
                .bytes()
                .await
                .map_err(|e| BlobError::transport("Failed to read blob", e)),
            _ => Err(upstream_error(resp).await),
        }
    }
}

#[async_trait]
impl BlobStore for WalrusStore {
    async fn upload(
        &self,
        path: &Path,
        content_type: Option<&str>,
        options: &StoreOptions,
    ) -> BlobResult<StoredBlob> {
        let file = tokio::fs::File::open(path).await?;
        let len = file.metadata().await?.len();
        let body = reqwest::Body::wrap_stream(ReaderStream::new(file));

        tracing::debug!(path = %path.display(), size = len, ?content_type, "uploading file to walrus");
        self.publish(body, len, options).await
    }

    async fn upload_bytes(
        &self,
        bytes: Bytes,
        content_type: Option<&str>,
        options: &StoreOptions,
    ) -> BlobResult<StoredBlob> {
        let len = bytes.len() as u64;
        tracing::debug!(size = len, ?content_type, "uploading bytes to walrus");
        self.publish(reqwest::Body::from(bytes), len, options).await
    }

    async fn get(&self, blob_id: &BlobId) -> BlobResult<Bytes> {
        self.fetch(&self.url(blob_id), blob_id.as_str()).await
    }

    async fn get_by_object_id(&self, object_id: &str) -> BlobResult<Bytes> {
        let url = format!("{}/v1/blobs/by-object-id/{object_id}", self.config.aggregator_url);
        self.fetch(&url, object_id).await
    }

    fn url(&self, blob_id: &BlobId) -> String {
        blob_url(&self.config.aggregator_url, blob_id)
    }

    async fn open(&self, blob_id: &BlobId, range: Option<&str>) -> BlobResult<OpenedBlob> {
        let mut req = self.streaming.get(self.url(blob_id));
        if let Some(range) = range {
            req = req.header(RANGE, range);
        }

        let resp = req
            .send()
            .await
            .map_err(|e| BlobError::transport("Failed to open blob", e))?;

        let status = resp.status();
        if status == StatusCode::NOT_FOUND {
            return Err(BlobError::not_found(blob_id.as_str()));
        }
        if !status.is_success() {
            return Err(upstream_error(resp).await);
        }

        let content_type = header_str(&resp, CONTENT_TYPE);
        let content_length = header_str(&resp, CONTENT_LENGTH).and_then(|v| v.parse().ok());
        let content_range = header_str(&resp, CONTENT_RANGE);

        tracing::debug!(%blob_id, status = status.as_u16(), ?range, "blob opened");

        let stream = resp.bytes_stream().map_err(std::io::Error::other);
        Ok(OpenedBlob {
            status: status.as_u16(),
            content_type,
            content_length,
            content_range,
            stream: Box::pin(stream),
        })
    }

    async fn delete(&self, blob_id: &BlobId) -> BlobResult<bool> {
        // Deleting a deletable blob is an on-chain transaction signed by its owner.
        tracing::warn!(%blob_id, "walrus blob deletion requires a signed transaction; skipped");
        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn newly_created_carries_object_id() {
        let body = br#"{"newlyCreated":{"blobObject":{"id":"0xobj","blobId":"B1","size":10}},"cost":5}"#;
        let stored = parse_publisher_response(body, "http://agg").unwrap();

        assert_eq!(stored.blob_id, BlobId::new("B1"));
        assert_eq!(stored.object_id.as_deref(), Some("0xobj"));
        assert_eq!(stored.url, "http://agg/v1/blobs/B1");
        assert!(stored.newly_created);
    }

    #[test]
    fn already_certified_has_no_object_id() {
        let body = br#"{"alreadyCertified":{"blobId":"B2","endEpoch":40}}"#;
        let stored = parse_publisher_response(body, "http://agg").unwrap();

        assert_eq!(stored.blob_id.as_str(), "B2");
        assert!(stored.object_id.is_none());
        assert!(!stored.newly_created);
    }

    #[test]
    fn other_shapes_are_unexpected() {
        let err = parse_publisher_response(br#"{"error":"nope"}"#, "http://agg").unwrap_err();
        assert!(matches!(err, BlobError::UnexpectedResponse { .. }));

        let err = parse_publisher_response(b"not json", "http://agg").unwrap_err();
        assert!(matches!(err, BlobError::UnexpectedResponse { .. }));
        assert!(err.is_upstream());
    }

    #[test]
    fn publish_query_defaults_to_deletable() {
        let store = WalrusStore::new(WalrusConfig::new().with_default_epochs(2)).unwrap();

        assert_eq!(
            store.publish_query(&StoreOptions::new()),
            vec![("epochs", "2".to_string()), ("deletable", "true".to_string())]
        );
        assert_eq!(
            store.publish_query(&StoreOptions::new().with_epochs(5).permanent()),
            vec![("epochs", "5".to_string()), ("permanent", "true".to_string())]
        );
    }
}
