//! Routes on `/videos` that do not fit the JSON service surface: the
//! Range-aware blob proxy and the owner listing path.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::{OriginalUri, Path, Query, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::Response,
    routing::get,
    Json, Router,
};
use serde_json::Value;
use tube_axum::{params::RestParams, rest, TubeAxumError};
use tube_blob::{BlobError, BlobId, BlobStore};
use tube_core::{TubeApp, TubeError};

use crate::services::TubeParams;

use super::videos_shared::{self, blob_failure};

const FALLBACK_CONTENT_TYPE: &str = "video/mp4";

#[derive(Clone)]
struct StreamState {
    app: TubeApp<Value, TubeParams>,
    blobs: Arc<dyn BlobStore>,
}

pub fn routes(app: TubeApp<Value, TubeParams>, blobs: Arc<dyn BlobStore>) -> Router<()> {
    Router::new()
        .route("/{id}/stream", get(stream_video))
        .route("/owner/{address}", get(videos_by_owner))
        .with_state(StreamState { app, blobs })
}

fn params(headers: &HeaderMap, query: HashMap<String, String>, uri: &axum::http::Uri) -> TubeParams {
    RestParams::from_parts("rest", headers, query, "GET", uri)
}

async fn videos_by_owner(
    State(state): State<StreamState>,
    Path(address): Path<String>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
    OriginalUri(uri): OriginalUri,
) -> Result<Json<Value>, TubeAxumError> {
    let call = rest::call_context(&headers);
    let svc = state.app.service("videos")?;
    let res = svc
        .custom(call, videos_shared::OWNER, Some(&address), None, params(&headers, query, &uri))
        .await?;
    Ok(Json(res))
}

async fn stream_video(
    State(state): State<StreamState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
    OriginalUri(uri): OriginalUri,
) -> Result<Response, TubeAxumError> {
    let call = rest::call_context(&headers);
    let video = state
        .app
        .service("videos")?
        .get(call, &id, params(&headers, query, &uri))
        .await?;

    let Some(blob_id) = video.get("blobId").and_then(Value::as_str) else {
        return Err(TubeError::not_found(format!("Video has no blob: {id}")).into());
    };

    let range = headers.get(header::RANGE).and_then(|v| v.to_str().ok());
    let opened = state
        .blobs
        .open(&BlobId::new(blob_id), range)
        .await
        .map_err(|e| match e {
            BlobError::NotFound { .. } => TubeError::not_found("Video file not found on Walrus").into_anyhow(),
            other => blob_failure(other, "video stream"),
        })?;

    tracing::debug!(id = %id, blob_id, range = ?range, status = opened.status, "streaming video");

    let content_type = opened
        .content_type
        .as_deref()
        .map(str::trim)
        .filter(|ct| !ct.is_empty() && *ct != "application/octet-stream")
        .unwrap_or(FALLBACK_CONTENT_TYPE)
        .to_string();

    let mut res = Response::builder()
        .status(StatusCode::from_u16(opened.status).unwrap_or(StatusCode::OK))
        .header(header::CONTENT_TYPE, content_type)
        .header(header::ACCEPT_RANGES, "bytes")
        .header(header::ACCESS_CONTROL_ALLOW_ORIGIN, "*")
        .header(header::ACCESS_CONTROL_ALLOW_METHODS, "GET, HEAD, OPTIONS")
        .header(header::ACCESS_CONTROL_ALLOW_HEADERS, "Range");

    if let Some(len) = opened.content_length {
        res = res.header(header::CONTENT_LENGTH, HeaderValue::from(len));
    }
    if let Some(range) = opened.content_range.as_deref() {
        res = res.header(header::CONTENT_RANGE, range);
    }

    res.body(Body::from_stream(opened.stream))
        .map_err(|e| TubeAxumError::from(anyhow::Error::from(e)))
}
