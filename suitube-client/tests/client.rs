use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use std::collections::HashMap;
use suitube_client::{
    CacheConfig, ClientConfig, ClientError, SuiTubeClient, UploadForm, UploadMetadata, UploadState,
};
use tokio::sync::watch;

#[derive(Default)]
struct Hits {
    list: AtomicUsize,
    one: AtomicUsize,
    owner: AtomicUsize,
    upload: AtomicUsize,
    view: AtomicUsize,
    upload_bytes: AtomicUsize,
}

fn video(id: &str, views: u64) -> Value {
    json!({
        "id": id,
        "title": format!("title {id}"),
        "blobId": id,
        "owner": "0xabc",
        "views": views,
        "createdAt": 1,
        "videoUrl": format!("https://agg/v1/blobs/{id}"),
    })
}

async fn list(State(hits): State<Arc<Hits>>, Query(q): Query<HashMap<String, String>>) -> Json<Value> {
    hits.list.fetch_add(1, Ordering::SeqCst);
    let limit: usize = q.get("limit").and_then(|l| l.parse().ok()).unwrap_or(2);
    Json(Value::Array((0..limit).map(|i| video(&format!("V{i}"), 0)).collect()))
}

async fn one(State(hits): State<Arc<Hits>>, Path(id): Path<String>) -> (StatusCode, Json<Value>) {
    hits.one.fetch_add(1, Ordering::SeqCst);
    if id == "missing" {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({
                "name": "NotFound",
                "message": "Video not found: missing",
                "code": 404,
                "className": "not-found"
            })),
        );
    }
    (StatusCode::OK, Json(video(&id, 10)))
}

async fn owner(State(hits): State<Arc<Hits>>, Path(address): Path<String>) -> Json<Value> {
    hits.owner.fetch_add(1, Ordering::SeqCst);
    Json(json!([video(&format!("{address}-1"), 0)]))
}

async fn upload(State(hits): State<Arc<Hits>>, headers: HeaderMap, body: Bytes) -> (StatusCode, Json<Value>) {
    hits.upload.fetch_add(1, Ordering::SeqCst);
    hits.upload_bytes.store(body.len(), Ordering::SeqCst);

    let multipart = headers
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("multipart/form-data"));
    let text = String::from_utf8_lossy(&body);
    if !multipart || !text.contains("name=\"video\"") || !text.contains("name=\"title\"") {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"name": "BadRequest", "message": "No video file uploaded", "code": 400})),
        );
    }

    (
        StatusCode::OK,
        Json(json!({
            "success": true,
            "blobId": "NEW",
            "url": "https://agg/v1/blobs/NEW",
            "filename": "clip.mp4",
            "size": 20000,
            "message": "Video uploaded to Walrus"
        })),
    )
}

async fn view(
    State(hits): State<Arc<Hits>>,
    Path((id, _method)): Path<(String, String)>,
) -> (StatusCode, Json<Value>) {
    hits.view.fetch_add(1, Ordering::SeqCst);
    if id == "gone" {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({"name": "NotFound", "message": "Video not found: gone", "code": 404})),
        );
    }
    (StatusCode::OK, Json(json!({"videoId": id, "views": 42})))
}

async fn backend() -> (String, Arc<Hits>) {
    let hits = Arc::new(Hits::default());
    let app = Router::new()
        .route("/videos", get(list))
        .route("/videos/upload", post(upload))
        .route("/videos/{id}", get(one))
        .route("/videos/{id}/{method}", post(view))
        .route("/videos/owner/{address}", get(owner))
        .with_state(Arc::clone(&hits));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{addr}"), hits)
}

fn client(url: &str) -> SuiTubeClient {
    SuiTubeClient::new(ClientConfig::new(url)).unwrap()
}

fn clip(dir: &tempfile::TempDir) -> std::path::PathBuf {
    let path = dir.path().join("clip.mp4");
    std::fs::write(&path, vec![7u8; 20_000]).unwrap();
    path
}

#[tokio::test]
async fn single_videos_are_cached_lists_are_refetched() {
    let (url, hits) = backend().await;
    let client = client(&url);

    let a = client.video("B1").await.unwrap();
    let b = client.video("B1").await.unwrap();
    assert_eq!(a, b);
    assert_eq!(hits.one.load(Ordering::SeqCst), 1);

    client.list_videos(Some(3), None).await.unwrap();
    let videos = client.list_videos(Some(3), None).await.unwrap();
    assert_eq!(videos.len(), 3);
    assert_eq!(hits.list.load(Ordering::SeqCst), 2);

    client.videos_by_owner("0xabc", None).await.unwrap();
    let owned = client.videos_by_owner("0xabc", None).await.unwrap();
    assert_eq!(owned[0].id, "0xabc-1");
    assert_eq!(hits.owner.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn list_freshness_is_configurable() {
    let (url, hits) = backend().await;
    let cache = CacheConfig {
        videos: Duration::from_secs(60),
        ..CacheConfig::default()
    };
    let client = SuiTubeClient::new(ClientConfig::new(url).with_cache(cache)).unwrap();

    client.list_videos(None, None).await.unwrap();
    client.list_videos(None, None).await.unwrap();
    assert_eq!(hits.list.load(Ordering::SeqCst), 1);

    client.list_videos(None, Some(2)).await.unwrap();
    assert_eq!(hits.list.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn upload_reports_progress_and_drops_cached_lists() {
    let (url, hits) = backend().await;
    let client = client(&url);
    let dir = tempfile::tempdir().unwrap();
    let path = clip(&dir);

    client.videos_by_owner("0xabc", None).await.unwrap();
    client.video("B1").await.unwrap();

    let (tx, rx) = watch::channel(0u8);
    let meta = UploadMetadata::new("Clip").with_owner("0xabc");
    let res = client.upload_video(&path, &meta, tx).await.unwrap();

    assert_eq!(res.blob_id, "NEW");
    assert_eq!(*rx.borrow(), 100);
    assert!(hits.upload_bytes.load(Ordering::SeqCst) > 20_000);

    client.videos_by_owner("0xabc", None).await.unwrap();
    assert_eq!(hits.owner.load(Ordering::SeqCst), 2);
    client.video("B1").await.unwrap();
    assert_eq!(hits.one.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn upload_needs_a_title() {
    let (url, hits) = backend().await;
    let client = client(&url);
    let dir = tempfile::tempdir().unwrap();
    let path = clip(&dir);

    let (tx, _rx) = watch::channel(0u8);
    let err = client
        .upload_video(&path, &UploadMetadata::new("  "), tx)
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Invalid(_)));
    assert_eq!(hits.upload.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn track_view_reconciles_cached_count() {
    let (url, hits) = backend().await;
    let client = client(&url);

    assert_eq!(client.video("B1").await.unwrap().views, 10);

    let count = client.track_view("B1", Some("0xviewer")).await.unwrap();
    assert_eq!(count.views, 42);
    assert_eq!(client.video("B1").await.unwrap().views, 42);
    assert_eq!(hits.one.load(Ordering::SeqCst), 1);
    assert_eq!(hits.view.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn track_view_failure_rolls_back() {
    let (url, _hits) = backend().await;
    let client = client(&url);

    assert_eq!(client.video("gone").await.unwrap().views, 10);

    let err = client.track_view("gone", None).await.unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(client.video("gone").await.unwrap().views, 10);
}

#[tokio::test]
async fn server_error_bodies_surface() {
    let (url, _hits) = backend().await;
    let client = client(&url);

    match client.video("missing").await {
        Err(ClientError::Api(e)) => {
            assert_eq!(e.code, 404);
            assert_eq!(e.message, "Video not found: missing");
            assert_eq!(e.class_name.as_deref(), Some("not-found"));
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[tokio::test]
async fn form_walks_through_an_upload() {
    let (url, _hits) = backend().await;
    let client = client(&url);
    let dir = tempfile::tempdir().unwrap();

    let mut form = UploadForm::new();
    form.open().unwrap();
    form.choose_file(clip(&dir)).unwrap();
    form.metadata = UploadMetadata::new("Clip").with_description("first");

    let res = client.submit_form(&mut form).await.unwrap();
    assert_eq!(res.blob_id, "NEW");
    assert!(matches!(form.state(), UploadState::Success(r) if r.blob_id == "NEW"));
}

#[tokio::test]
async fn form_records_failures() {
    let (url, _hits) = backend().await;
    let client = client(&url);

    let mut form = UploadForm::new();
    form.open().unwrap();
    form.choose_file("/definitely/not/here.mp4").unwrap();
    form.metadata.title = "Clip".into();

    assert!(client.submit_form(&mut form).await.is_err());
    assert!(matches!(form.state(), UploadState::Error(_)));
}
