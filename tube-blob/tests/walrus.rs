use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::{Body, Bytes};
use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, put};
use axum::{Json, Router};
use futures::TryStreamExt;
use serde_json::json;
use tube_blob::prelude::*;

const PAYLOAD: &[u8] = b"0123456789abcdef";

#[derive(Clone, Default)]
struct Seen {
    puts: Arc<Mutex<Vec<(HashMap<String, String>, usize, Option<String>)>>>,
}

async fn publish(
    State(seen): State<Seen>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
    body: Bytes,
) -> impl IntoResponse {
    let ct = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    seen.puts.lock().unwrap().push((query, body.len(), ct));

    if body.as_ref() == b"seen-before" {
        return Json(json!({"alreadyCertified": {"blobId": "OLD", "endEpoch": 9}}));
    }
    Json(json!({"newlyCreated": {"blobObject": {"id": "0xobj", "blobId": "NEW", "size": body.len()}}}))
}

async fn read_blob(Path(id): Path<String>, headers: HeaderMap) -> axum::response::Response {
    if id != "NEW" {
        return (StatusCode::NOT_FOUND, "missing").into_response();
    }

    let range = headers.get(header::RANGE).and_then(|v| v.to_str().ok());
    match range {
        Some("bytes=0-3") => (
            StatusCode::PARTIAL_CONTENT,
            [
                (header::CONTENT_TYPE, "video/mp4"),
                (header::CONTENT_RANGE, "bytes 0-3/16"),
            ],
            &PAYLOAD[..4],
        )
            .into_response(),
        _ => (StatusCode::OK, PAYLOAD).into_response(),
    }
}

/// Three chunks, 600 ms apart.
async fn slow_blob() -> axum::response::Response {
    let chunks = futures::stream::unfold(0u8, |i| async move {
        if i == 3 {
            return None;
        }
        if i > 0 {
            tokio::time::sleep(Duration::from_millis(600)).await;
        }
        Some((Ok::<_, std::io::Error>(Bytes::from(vec![b'a' + i; 4])), i + 1))
    });
    (StatusCode::OK, Body::from_stream(chunks)).into_response()
}

async fn fake_walrus() -> (String, Seen) {
    let seen = Seen::default();
    let app = Router::new()
        .route("/v1/blobs", put(publish))
        .route("/v1/blobs/{id}", get(read_blob))
        .route("/v1/blobs/by-object-id/{id}", get(|Path(id): Path<String>| async move {
            if id == "0xobj" {
                (StatusCode::OK, PAYLOAD).into_response()
            } else {
                StatusCode::NOT_FOUND.into_response()
            }
        }))
        .route("/broken/v1/blobs", put(|| async { (StatusCode::SERVICE_UNAVAILABLE, "down") }))
        .route("/slow/v1/blobs/{id}", get(slow_blob))
        .with_state(seen.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{addr}"), seen)
}

fn store_for(base: &str) -> WalrusStore {
    WalrusStore::new(
        WalrusConfig::new()
            .with_publisher_url(base)
            .with_aggregator_url(base)
            .with_default_epochs(1),
    )
    .unwrap()
}

#[tokio::test]
async fn uploads_a_file_as_deletable_octet_stream() {
    let (base, seen) = fake_walrus().await;
    let store = store_for(&base);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("clip.mp4");
    tokio::fs::write(&path, PAYLOAD).await.unwrap();

    let stored = store.upload(&path, None, &StoreOptions::default()).await.unwrap();
    assert_eq!(stored.blob_id.as_str(), "NEW");
    assert_eq!(stored.object_id.as_deref(), Some("0xobj"));
    assert_eq!(stored.url, format!("{base}/v1/blobs/NEW"));

    let puts = seen.puts.lock().unwrap().clone();
    assert_eq!(puts.len(), 1);
    let (query, len, ct) = &puts[0];
    assert_eq!(query.get("epochs").map(String::as_str), Some("1"));
    assert_eq!(query.get("deletable").map(String::as_str), Some("true"));
    assert!(!query.contains_key("permanent"));
    assert_eq!(*len, PAYLOAD.len());
    assert_eq!(ct.as_deref(), Some("application/octet-stream"));
}

#[tokio::test]
async fn already_certified_bytes_resolve_to_existing_blob() {
    let (base, seen) = fake_walrus().await;
    let store = store_for(&base);

    let stored = store
        .upload_bytes(
            Bytes::from_static(b"seen-before"),
            Some("image/jpeg"),
            &StoreOptions::new().with_epochs(3).permanent(),
        )
        .await
        .unwrap();

    assert_eq!(stored.blob_id.as_str(), "OLD");
    assert!(stored.object_id.is_none());

    let puts = seen.puts.lock().unwrap().clone();
    let (query, _, ct) = &puts[0];
    assert_eq!(query.get("epochs").map(String::as_str), Some("3"));
    assert_eq!(query.get("permanent").map(String::as_str), Some("true"));
    assert_eq!(ct.as_deref(), Some("application/octet-stream"));
}

#[tokio::test]
async fn publisher_failure_is_an_upstream_error() {
    let (base, _) = fake_walrus().await;
    let store = WalrusStore::new(
        WalrusConfig::new()
            .with_publisher_url(format!("{base}/broken"))
            .with_aggregator_url(&base),
    )
    .unwrap();

    let err = store
        .upload_bytes(Bytes::from_static(b"x"), None, &StoreOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, BlobError::Upstream { status: 503, .. }));
}

#[tokio::test]
async fn open_forwards_range_and_reports_partial_content() {
    let (base, _) = fake_walrus().await;
    let store = store_for(&base);
    let id = BlobId::new("NEW");

    let opened = store.open(&id, Some("bytes=0-3")).await.unwrap();
    assert_eq!(opened.status, 206);
    assert!(opened.is_partial());
    assert_eq!(opened.content_range.as_deref(), Some("bytes 0-3/16"));
    assert_eq!(opened.content_type.as_deref(), Some("video/mp4"));
    let body: Vec<Bytes> = opened.stream.try_collect().await.unwrap();
    assert_eq!(body.concat(), b"0123".to_vec());

    let opened = store.open(&id, None).await.unwrap();
    assert_eq!(opened.status, 200);
    assert_eq!(opened.content_length, Some(16));
    assert!(opened.content_range.is_none());
}

#[tokio::test]
async fn reads_map_missing_blobs_to_not_found() {
    let (base, _) = fake_walrus().await;
    let store = store_for(&base);

    let err = store.open(&BlobId::new("nope"), None).await.unwrap_err();
    assert!(matches!(err, BlobError::NotFound { .. }));

    let err = store.get(&BlobId::new("nope")).await.unwrap_err();
    assert!(matches!(err, BlobError::NotFound { .. }));

    assert_eq!(store.get(&BlobId::new("NEW")).await.unwrap().as_ref(), PAYLOAD);
    assert_eq!(store.get_by_object_id("0xobj").await.unwrap().as_ref(), PAYLOAD);
    assert!(!store.delete(&BlobId::new("NEW")).await.unwrap());
}

#[tokio::test]
async fn slow_streams_outlive_the_request_timeout() {
    let (base, _) = fake_walrus().await;
    let store = WalrusStore::new(
        WalrusConfig::new()
            .with_aggregator_url(format!("{base}/slow"))
            .with_timeout(Duration::from_secs(1)),
    )
    .unwrap();

    let opened = store.open(&BlobId::new("NEW"), None).await.unwrap();
    let body: Vec<Bytes> = opened.stream.try_collect().await.unwrap();
    assert_eq!(body.concat(), b"aaaabbbbcccc".to_vec());
}
