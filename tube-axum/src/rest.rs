use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::rejection::JsonRejection,
    extract::{OriginalUri, Path, Query, State},
    http::HeaderMap,
    routing, Json, Router,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;
use tube_core::errors::TubeError;
use tube_core::{CallContext, TubeApp};

use crate::{
    params::{FromRestParams, RestParams},
    TubeAxumError, TubeAxumState,
};

pub const REQUEST_ID_HEADER: &str = "x-request-id";
pub const WALLET_HEADER: &str = "x-wallet-address";

fn map_json_rejection(rejection: JsonRejection) -> TubeAxumError {
    TubeError::bad_request("Failed to parse the request body as JSON")
        .with_errors(json!({"_schema": [rejection.to_string()]}))
        .into()
}

/// Custom methods accept an empty body; anything else must be valid JSON.
fn optional_body<R: DeserializeOwned>(body: &Bytes) -> Result<Option<R>, TubeAxumError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    serde_json::from_slice(body).map(Some).map_err(|e| {
        TubeError::bad_request("Failed to parse the request body as JSON")
            .with_errors(json!({"_schema": [e.to_string()]}))
            .into()
    })
}

pub fn call_context(headers: &HeaderMap) -> CallContext {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    };

    let mut ctx = CallContext::new();
    if let Some(id) = header(REQUEST_ID_HEADER) {
        ctx = ctx.with_request_id(id);
    }
    if let Some(wallet) = header(WALLET_HEADER) {
        ctx = ctx.with_wallet(wallet);
    }
    ctx
}

/// REST routes for one service:
///
/// | method | path            | service call                  |
/// |--------|-----------------|-------------------------------|
/// | GET    | `/`             | `find`                        |
/// | POST   | `/`             | `create`                      |
/// | GET    | `/{id}`         | `get`                         |
/// | DELETE | `/{id}`         | `remove`                      |
/// | POST   | `/{method}`     | `custom(method, None)`        |
/// | POST   | `/{id}/{method}`| `custom(method, Some(id))`    |
pub fn service_router<R, P>(service_name: Arc<String>, app: TubeApp<R, P>) -> Router<()>
where
    R: Serialize + DeserializeOwned + Send + Sync + 'static,
    P: FromRestParams + Send + Sync + Clone + 'static,
{
    let state = TubeAxumState { app };

    Router::new()
        .route(
            "/",
            routing::get({
                let service_name = Arc::clone(&service_name);
                move |State(state): State<TubeAxumState<R, P>>,
                      headers: HeaderMap,
                      Query(query): Query<HashMap<String, String>>,
                      OriginalUri(uri): OriginalUri| async move {
                    let call = call_context(&headers);

                    let params = RestParams::from_parts("rest", &headers, query, "GET", &uri);
                    let params = P::from_rest_params(params);

                    let svc = state.app.service(&service_name)?;
                    let res = svc.find(call, params).await?;
                    Ok::<_, TubeAxumError>(Json(res))
                }
            })
            .post({
                let service_name = Arc::clone(&service_name);
                move |State(state): State<TubeAxumState<R, P>>,
                      headers: HeaderMap,
                      Query(query): Query<HashMap<String, String>>,
                      OriginalUri(uri): OriginalUri,
                      data: Result<Json<R>, JsonRejection>| async move {
                    let call = call_context(&headers);

                    let Json(data) = data.map_err(map_json_rejection)?;

                    let params = RestParams::from_parts("rest", &headers, query, "POST", &uri);
                    let params = P::from_rest_params(params);

                    let svc = state.app.service(&service_name)?;
                    let res = svc.create(call, data, params).await?;
                    Ok::<_, TubeAxumError>(Json(res))
                }
            }),
        )
        .route(
            "/{id}",
            routing::get({
                let service_name = Arc::clone(&service_name);
                move |State(state): State<TubeAxumState<R, P>>,
                      headers: HeaderMap,
                      Query(query): Query<HashMap<String, String>>,
                      OriginalUri(uri): OriginalUri,
                      Path(id): Path<String>| async move {
                    let call = call_context(&headers);

                    let params = RestParams::from_parts("rest", &headers, query, "GET", &uri);
                    let params = P::from_rest_params(params);

                    let svc = state.app.service(&service_name)?;
                    let res = svc.get(call, &id, params).await?;
                    Ok::<_, TubeAxumError>(Json(res))
                }
            })
            .post({
                let service_name = Arc::clone(&service_name);
                move |State(state): State<TubeAxumState<R, P>>,
                      headers: HeaderMap,
                      Query(query): Query<HashMap<String, String>>,
                      OriginalUri(uri): OriginalUri,
                      Path(method): Path<String>,
                      body: Bytes| async move {
                    let call = call_context(&headers);

                    let data = optional_body::<R>(&body)?;

                    let params = RestParams::from_parts("rest", &headers, query, "POST", &uri);
                    let params = P::from_rest_params(params);

                    let svc = state.app.service(&service_name)?;
                    let res = svc.custom(call, &method, None, data, params).await?;
                    Ok::<_, TubeAxumError>(Json(res))
                }
            })
            .delete({
                let service_name = Arc::clone(&service_name);
                move |State(state): State<TubeAxumState<R, P>>,
                      headers: HeaderMap,
                      Query(query): Query<HashMap<String, String>>,
                      OriginalUri(uri): OriginalUri,
                      Path(id): Path<String>| async move {
                    let call = call_context(&headers);

                    let params = RestParams::from_parts("rest", &headers, query, "DELETE", &uri);
                    let params = P::from_rest_params(params);

                    let svc = state.app.service(&service_name)?;
                    let res = svc.remove(call, &id, params).await?;
                    Ok::<_, TubeAxumError>(Json(res))
                }
            }),
        )
        .route(
            "/{id}/{method}",
            routing::post({
                let service_name = Arc::clone(&service_name);
                move |State(state): State<TubeAxumState<R, P>>,
                      headers: HeaderMap,
                      Query(query): Query<HashMap<String, String>>,
                      OriginalUri(uri): OriginalUri,
                      Path((id, method)): Path<(String, String)>,
                      body: Bytes| async move {
                    let call = call_context(&headers);

                    let data = optional_body::<R>(&body)?;

                    let params = RestParams::from_parts("rest", &headers, query, "POST", &uri);
                    let params = P::from_rest_params(params);

                    let svc = state.app.service(&service_name)?;
                    let res = svc.custom(call, &method, Some(&id), data, params).await?;
                    Ok::<_, TubeAxumError>(Json(res))
                }
            }),
        )
        .with_state(state)
}
