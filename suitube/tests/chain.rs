use std::sync::{Arc, Mutex};

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{json, Value};
use suitube::sui::{ChainError, ChainQuery, SuiConfig, SuiGraphQlClient};

#[derive(Clone)]
struct FakeSui {
    status: StatusCode,
    reply: Value,
    seen: Arc<Mutex<Vec<Value>>>,
}

async fn graphql(State(fake): State<FakeSui>, Json(body): Json<Value>) -> impl IntoResponse {
    fake.seen.lock().unwrap().push(body);
    (fake.status, Json(fake.reply.clone()))
}

async fn fake_sui(status: StatusCode, reply: Value) -> (String, Arc<Mutex<Vec<Value>>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let app = Router::new().route("/graphql", post(graphql)).with_state(FakeSui {
        status,
        reply,
        seen: seen.clone(),
    });

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{addr}/graphql"), seen)
}

fn client(url: &str, package_id: &str) -> SuiGraphQlClient {
    SuiGraphQlClient::new(SuiConfig {
        graphql_url: url.to_string(),
        package_id: package_id.to_string(),
        platform_id: "0xplatform".to_string(),
        ..SuiConfig::default()
    })
    .unwrap()
}

fn video_node(id: &str, cid: &str, views: &str) -> Value {
    json!({
        "id": id,
        "owner": {"__typename": "AddressOwner", "owner": "0xowner"},
        "data": {"content": {"fields": {"title": format!("video {id}"), "cid": cid, "views": views}}}
    })
}

#[tokio::test]
async fn list_videos_sends_paging_and_decodes_nodes() {
    let reply = json!({"data": {"videos": {"nodes": [video_node("0x1", "B1", "3"), {"id": "0x2"}]}}});
    let (url, seen) = fake_sui(StatusCode::OK, reply).await;

    let videos = client(&url, "0xpkg").list_videos(10, 5).await.unwrap();

    assert_eq!(videos.len(), 1);
    assert_eq!(videos[0].blob_id, "B1");
    assert_eq!(videos[0].views, 3);
    assert_eq!(videos[0].owner, "0xowner");

    let seen = seen.lock().unwrap();
    assert_eq!(seen[0]["variables"], json!({"limit": 10, "offset": 5}));
    assert!(seen[0]["query"]
        .as_str()
        .unwrap()
        .contains("0xpkg::VideoPlatform::Video"));
}

#[tokio::test]
async fn graphql_errors_and_bad_statuses_surface_as_chain_errors() {
    let (url, _) = fake_sui(
        StatusCode::OK,
        json!({"data": null, "errors": [{"message": "unknown type"}]}),
    )
    .await;
    match client(&url, "0xpkg").get_video("0x1").await {
        Err(ChainError::GraphQl(messages)) => assert_eq!(messages, vec!["unknown type"]),
        other => panic!("expected GraphQl error, got {other:?}"),
    }

    let (url, _) = fake_sui(StatusCode::BAD_GATEWAY, json!({})).await;
    match client(&url, "0xpkg").list_videos(1, 0).await {
        Err(ChainError::Status { status }) => assert_eq!(status, 502),
        other => panic!("expected Status error, got {other:?}"),
    }
}

#[tokio::test]
async fn undeployed_package_skips_the_network() {
    let (url, seen) = fake_sui(StatusCode::OK, json!({"data": {}})).await;
    let chain = client(&url, "");

    assert!(chain.list_videos(10, 0).await.unwrap().is_empty());
    assert!(chain.get_video("0x1").await.unwrap().is_none());
    assert!(chain.user_profile("0xabc").await.unwrap().is_none());
    assert!(seen.lock().unwrap().is_empty());
}

#[tokio::test]
async fn user_profile_and_platform_stats_decode() {
    let reply = json!({"data": {
        "user": {"nodes": [{"data": {"content": {"fields": {
            "wallet": "0xabc", "username": "ana", "is_verified": true,
            "subscribers": ["0x1"], "total_earnings": "90"
        }}}}]},
        "object": {"data": {"content": {"fields": {"video_count": "4", "platform_fee": 250}}}}
    }});
    let (url, _) = fake_sui(StatusCode::OK, reply).await;
    let chain = client(&url, "0xpkg");

    let profile = chain.user_profile("0xabc").await.unwrap().unwrap();
    assert_eq!(profile.username, "ana");
    assert!(profile.is_verified);
    assert_eq!(profile.total_earnings, 90);

    let stats = chain.platform_stats().await.unwrap();
    assert_eq!((stats.video_count, stats.platform_fee), (4, 250));
}
