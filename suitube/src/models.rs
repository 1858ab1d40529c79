//! Records served by the API. JSON field names are camelCase.

use serde::{Deserialize, Serialize};

pub const ZERO_ADDRESS: &str = "0x0000000000000000000000000000000000000000";

/// Where a video record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum VideoSource {
    /// Uploaded through this backend, not yet indexed on chain.
    #[default]
    Walrus,
    Chain,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Video {
    /// Equals `blob_id` for registry records.
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sui_object_id: Option<String>,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub blob_id: String,
    pub owner: String,
    #[serde(default)]
    pub is_short: bool,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub tips: u64,
    #[serde(default)]
    pub views: u64,
    #[serde(default)]
    pub likes: u64,
    /// Unix milliseconds.
    #[serde(default)]
    pub created_at: i64,
    #[serde(default)]
    pub updated_at: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_blob_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    #[serde(default)]
    pub source: VideoSource,
}

/// Fields a caller supplies when registering an uploaded blob.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NewVideo {
    pub blob_id: String,
    pub title: String,
    pub description: String,
    pub owner: String,
    pub is_short: bool,
    pub thumbnail_blob_id: Option<String>,
    pub thumbnail_url: Option<String>,
}

impl Video {
    /// A fresh registry record: zero counters, both timestamps `now`.
    pub fn registered(new: NewVideo, now: i64) -> Self {
        Self {
            id: new.blob_id.clone(),
            sui_object_id: None,
            title: new.title,
            description: new.description,
            blob_id: new.blob_id,
            owner: new.owner,
            is_short: new.is_short,
            category: String::new(),
            tags: Vec::new(),
            tips: 0,
            views: 0,
            likes: 0,
            created_at: now,
            updated_at: now,
            thumbnail_blob_id: new.thumbnail_blob_id,
            thumbnail_url: new.thumbnail_url,
            source: VideoSource::Walrus,
        }
    }

    pub fn matches(&self, id: &str) -> bool {
        self.id == id || self.blob_id == id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub wallet_address: String,
    pub username: String,
    pub is_verified: bool,
    pub subscribers: Vec<String>,
    pub subscribed_to: Vec<String>,
    pub total_earnings: u64,
    pub reputation_score: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct PlatformStats {
    pub video_count: u64,
    pub platform_fee: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registered_video_uses_blob_id_as_identity() {
        let video = Video::registered(
            NewVideo {
                blob_id: "B1".into(),
                title: "Clip".into(),
                owner: ZERO_ADDRESS.into(),
                ..Default::default()
            },
            1_700_000_000_000,
        );

        assert_eq!(video.id, "B1");
        assert!(video.matches("B1"));
        assert_eq!(video.views, 0);
        assert_eq!(video.created_at, video.updated_at);

        let json = serde_json::to_value(&video).unwrap();
        assert_eq!(json["blobId"], "B1");
        assert_eq!(json["isShort"], false);
        assert_eq!(json["source"], "walrus");
        assert!(json.get("thumbnailUrl").is_none());
    }

    #[test]
    fn older_records_without_optional_fields_still_load() {
        let raw = r#"{"id":"B2","title":"t","blobId":"B2","owner":"0x1","views":3}"#;
        let video: Video = serde_json::from_str(raw).unwrap();

        assert_eq!(video.views, 3);
        assert_eq!(video.source, VideoSource::Walrus);
        assert!(video.tags.is_empty());
    }
}
