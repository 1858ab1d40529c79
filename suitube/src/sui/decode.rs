//! Turn GraphQL object nodes into flat records.
//!
//! Move values arrive loosely typed: `u64` counters are often JSON strings,
//! `UID` fields are either a string or `{ "id": "0x.." }`. Missing fields
//! fall back to empty or zero.

use serde_json::Value;

use crate::models::{PlatformStats, UserProfile, Video, VideoSource};

fn fields(node: &Value) -> Option<&serde_json::Map<String, Value>> {
    node.pointer("/data/content/fields")?.as_object()
}

fn text(v: Option<&Value>) -> String {
    match v {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Object(o)) => o.get("id").and_then(Value::as_str).unwrap_or_default().to_string(),
        _ => String::new(),
    }
}

fn number(v: Option<&Value>) -> u64 {
    match v {
        Some(Value::Number(n)) => n.as_u64().unwrap_or(0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0),
        _ => 0,
    }
}

fn flag(v: Option<&Value>) -> bool {
    match v {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => s == "true",
        _ => false,
    }
}

fn strings(v: Option<&Value>) -> Vec<String> {
    v.and_then(Value::as_array)
        .map(|items| items.iter().filter_map(|i| i.as_str().map(str::to_string)).collect())
        .unwrap_or_default()
}

fn non_empty(s: String) -> Option<String> {
    (!s.is_empty()).then_some(s)
}

/// `None` when the node carries no `data.content.fields`.
pub fn video(node: &Value) -> Option<Video> {
    let f = fields(node)?;
    let node_id = text(node.get("id"));

    let owner = non_empty(text(f.get("owner")))
        .or_else(|| non_empty(text(node.pointer("/owner/owner"))))
        .unwrap_or_default();

    Some(Video {
        id: non_empty(text(f.get("id"))).unwrap_or_else(|| node_id.clone()),
        sui_object_id: non_empty(node_id),
        title: text(f.get("title")),
        description: text(f.get("description")),
        blob_id: text(f.get("cid")),
        owner,
        is_short: flag(f.get("is_short")),
        category: text(f.get("category")),
        tags: strings(f.get("tags")),
        tips: number(f.get("tips")),
        views: number(f.get("views")),
        likes: number(f.get("likes")),
        created_at: number(f.get("created_at")) as i64,
        updated_at: number(f.get("updated_at")) as i64,
        thumbnail_blob_id: None,
        thumbnail_url: None,
        source: VideoSource::Chain,
    })
}

pub fn videos(nodes: Option<&Value>) -> Vec<Video> {
    nodes
        .and_then(Value::as_array)
        .map(|nodes| nodes.iter().filter_map(video).collect())
        .unwrap_or_default()
}

pub fn user_profile(node: &Value) -> Option<UserProfile> {
    let f = fields(node)?;
    Some(UserProfile {
        wallet_address: text(f.get("wallet")),
        username: text(f.get("username")),
        is_verified: flag(f.get("is_verified")),
        subscribers: strings(f.get("subscribers")),
        subscribed_to: strings(f.get("subscribed_to")),
        total_earnings: number(f.get("total_earnings")),
        reputation_score: number(f.get("reputation_score")),
    })
}

pub fn platform_stats(node: Option<&Value>) -> PlatformStats {
    match node.and_then(fields) {
        Some(f) => PlatformStats {
            video_count: number(f.get("video_count")),
            platform_fee: number(f.get("platform_fee")),
        },
        None => PlatformStats::default(),
    }
}
