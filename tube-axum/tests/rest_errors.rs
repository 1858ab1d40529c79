use std::sync::Arc;

use axum::body::Body;
use axum::http::HeaderValue;
use axum::http::Request;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;
use tube_axum::axum;
use tube_core::errors::TubeError;
use tube_core::{CallContext, ServiceCapabilities, ServiceMethodKind, TubeApp, TubeService};

struct UnprocessableOnCreate;

#[async_trait::async_trait]
impl TubeService<Value, ()> for UnprocessableOnCreate {
    fn capabilities(&self) -> ServiceCapabilities {
        ServiceCapabilities::from_methods(vec![ServiceMethodKind::Create])
    }

    async fn create(&self, _ctx: &CallContext, _data: Value, _params: ()) -> anyhow::Result<Value> {
        Err(TubeError::unprocessable("Invalid")
            .with_errors(json!({"title": ["required"]}))
            .into_anyhow())
    }
}

struct BoomOnCreate;

#[async_trait::async_trait]
impl TubeService<Value, ()> for BoomOnCreate {
    fn capabilities(&self) -> ServiceCapabilities {
        ServiceCapabilities::from_methods(vec![ServiceMethodKind::Create])
    }

    async fn create(&self, _ctx: &CallContext, _data: Value, _params: ()) -> anyhow::Result<Value> {
        Err(anyhow::anyhow!("boom"))
    }
}

/// Echoes what the custom-method routes hand to the service.
struct Views;

#[async_trait::async_trait]
impl TubeService<Value, ()> for Views {
    fn capabilities(&self) -> ServiceCapabilities {
        ServiceCapabilities::from_methods(vec![
            ServiceMethodKind::Get,
            ServiceMethodKind::Custom("view"),
            ServiceMethodKind::Custom("register"),
        ])
    }

    async fn get(&self, ctx: &CallContext, id: &str, _params: ()) -> anyhow::Result<Value> {
        Ok(json!({"id": id, "wallet": ctx.wallet}))
    }

    async fn custom(
        &self,
        _ctx: &CallContext,
        method: &str,
        id: Option<&str>,
        data: Option<Value>,
        _params: (),
    ) -> anyhow::Result<Value> {
        Ok(json!({"method": method, "id": id, "data": data}))
    }
}

async fn json_body(res: axum::response::Response) -> Value {
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn post(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn malformed_json_returns_bad_request() {
    let app: TubeApp<Value, ()> = TubeApp::new();
    let ax = axum(app).use_service("/posts", Arc::new(BoomOnCreate));

    let res = ax.router.oneshot(post("/posts", "{\"title\":\"x\"")).await.unwrap();

    assert_eq!(res.status().as_u16(), 400);
    assert!(res.headers().get("x-request-id").is_some());
    let body = json_body(res).await;
    assert_eq!(body["name"], "BadRequest");
    assert_eq!(body["code"], 400);
    assert_eq!(body["className"], "bad-request");
    assert!(body.get("errors").is_some());
}

#[tokio::test]
async fn request_id_is_preserved_when_provided() {
    let app: TubeApp<Value, ()> = TubeApp::new();
    let ax = axum(app).use_service("/posts", Arc::new(BoomOnCreate));

    let provided = HeaderValue::from_static("req-test-123");
    let mut req = post("/posts", "{\"title\":\"ok\"}");
    req.headers_mut().insert("x-request-id", provided.clone());

    let res = ax.router.oneshot(req).await.unwrap();

    assert_eq!(res.headers().get("x-request-id").unwrap(), &provided);
}

#[tokio::test]
async fn unprocessable_preserves_422_and_shape() {
    let app: TubeApp<Value, ()> = TubeApp::new();
    let ax = axum(app).use_service("/posts", Arc::new(UnprocessableOnCreate));

    let res = ax.router.oneshot(post("/posts", "{\"title\":\"ok\"}")).await.unwrap();

    assert_eq!(res.status().as_u16(), 422);
    let body = json_body(res).await;
    assert_eq!(body["name"], "Unprocessable");
    assert_eq!(body["code"], 422);
    assert_eq!(body["className"], "unprocessable");
    assert_eq!(body["errors"], json!({"title": ["required"]}));
}

#[tokio::test]
async fn foreign_errors_map_to_general_error_shape() {
    let app: TubeApp<Value, ()> = TubeApp::new();
    let ax = axum(app).use_service("/posts", Arc::new(BoomOnCreate));

    let res = ax.router.oneshot(post("/posts", "{\"title\":\"ok\"}")).await.unwrap();

    assert_eq!(res.status().as_u16(), 500);
    let body = json_body(res).await;
    assert_eq!(body["name"], "GeneralError");
    assert_eq!(body["code"], 500);
    assert_eq!(body["className"], "general-error");
    assert!(body["message"].as_str().unwrap().contains("boom"));
}

#[tokio::test]
async fn disallowed_method_is_405() {
    let app: TubeApp<Value, ()> = TubeApp::new();
    let ax = axum(app).use_service("/posts", Arc::new(BoomOnCreate));

    let res = ax
        .router
        .oneshot(Request::builder().uri("/posts").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(res.status().as_u16(), 405);
    let body = json_body(res).await;
    assert_eq!(body["name"], "MethodNotAllowed");
}

#[tokio::test]
async fn custom_methods_route_with_and_without_id() {
    let app: TubeApp<Value, ()> = TubeApp::new();
    let ax = axum(app).use_service("/videos", Arc::new(Views));

    let res = ax.router.clone().oneshot(post("/videos/abc/view", "")).await.unwrap();
    assert_eq!(res.status().as_u16(), 200);
    assert_eq!(
        json_body(res).await,
        json!({"method": "view", "id": "abc", "data": null})
    );

    let res = ax
        .router
        .clone()
        .oneshot(post("/videos/register", "{\"blobId\":\"b1\"}"))
        .await
        .unwrap();
    assert_eq!(
        json_body(res).await,
        json!({"method": "register", "id": null, "data": {"blobId": "b1"}})
    );

    let res = ax.router.clone().oneshot(post("/videos/explode", "")).await.unwrap();
    assert_eq!(res.status().as_u16(), 405);

    let res = ax
        .router
        .oneshot(
            Request::builder()
                .uri("/videos/abc")
                .header("x-wallet-address", "0xdead")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(json_body(res).await, json!({"id": "abc", "wallet": "0xdead"}));
}

#[tokio::test]
async fn plain_routes_and_extra_service_routes() {
    let app: TubeApp<Value, ()> = TubeApp::new();
    let ax = axum(app)
        .use_service_with("/videos", Arc::new(Views), |router| {
            router.route("/{id}/stream", axum::routing::get(|| async { "bytes" }))
        })
        .service("/health", || async { "ok" });

    let res = ax
        .router
        .clone()
        .oneshot(Request::builder().uri("/videos/abc/stream").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(res.status().as_u16(), 200);
    assert!(res.headers().get("x-request-id").is_some());

    let res = ax
        .into_router()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&bytes[..], b"ok");
}
