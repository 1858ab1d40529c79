use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use super::{decode, queries, ChainError, ChainQuery, ChainResult};
use crate::models::{PlatformStats, UserProfile, Video};

pub const TESTNET_GRAPHQL: &str = "https://sui-testnet.mystenlabs.com/graphql";

#[derive(Debug, Clone)]
pub struct SuiConfig {
    pub graphql_url: String,
    pub network: String,
    /// Package that defines `VideoPlatform`. Empty means not deployed yet.
    pub package_id: String,
    pub platform_id: String,
    pub timeout: Duration,
}

impl Default for SuiConfig {
    fn default() -> Self {
        Self {
            graphql_url: TESTNET_GRAPHQL.to_string(),
            network: "testnet".to_string(),
            package_id: String::new(),
            platform_id: String::new(),
            timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Deserialize)]
struct GraphQlResponse {
    data: Option<Value>,
    #[serde(default)]
    errors: Vec<GraphQlErrorItem>,
}

#[derive(Debug, Deserialize)]
struct GraphQlErrorItem {
    message: String,
}

pub struct SuiGraphQlClient {
    http: reqwest::Client,
    config: SuiConfig,
}

impl SuiGraphQlClient {
    pub fn new(config: SuiConfig) -> ChainResult<Self> {
        let http = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &SuiConfig {
        &self.config
    }

    fn deployed(&self) -> bool {
        if self.config.package_id.is_empty() {
            tracing::debug!("SUI_PACKAGE_ID not set; skipping chain query");
            return false;
        }
        true
    }

    async fn request(&self, query: &str, variables: Value) -> ChainResult<Value> {
        let resp = self
            .http
            .post(&self.config.graphql_url)
            .json(&json!({ "query": query, "variables": variables }))
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(ChainError::Status {
                status: status.as_u16(),
            });
        }

        let body: GraphQlResponse = resp.json().await?;
        match (body.data, body.errors.is_empty()) {
            (Some(data), true) => Ok(data),
            (Some(data), false) if !data.is_null() => {
                tracing::warn!(errors = body.errors.len(), "partial GraphQL response");
                Ok(data)
            }
            (_, false) => Err(ChainError::GraphQl(
                body.errors.into_iter().map(|e| e.message).collect(),
            )),
            (None, true) => Err(ChainError::Decode("missing data".to_string())),
        }
    }
}

#[async_trait]
impl ChainQuery for SuiGraphQlClient {
    async fn list_videos(&self, limit: usize, offset: usize) -> ChainResult<Vec<Video>> {
        if !self.deployed() {
            return Ok(Vec::new());
        }
        let query = queries::list_videos(&self.config.package_id);
        let data = self
            .request(&query, json!({ "limit": limit, "offset": offset }))
            .await?;
        Ok(decode::videos(data.pointer("/videos/nodes")))
    }

    async fn get_video(&self, id: &str) -> ChainResult<Option<Video>> {
        if !self.deployed() {
            return Ok(None);
        }
        let data = self.request(&queries::get_video(), json!({ "id": id })).await?;
        Ok(data.get("object").and_then(decode::video))
    }

    async fn list_videos_by_owner(&self, owner: &str, limit: usize) -> ChainResult<Vec<Video>> {
        if !self.deployed() {
            return Ok(Vec::new());
        }
        let query = queries::videos_by_owner(&self.config.package_id);
        let data = self
            .request(&query, json!({ "owner": owner, "limit": limit }))
            .await?;
        Ok(decode::videos(data.pointer("/videos/nodes")))
    }

    async fn user_profile(&self, address: &str) -> ChainResult<Option<UserProfile>> {
        if !self.deployed() {
            return Ok(None);
        }
        let query = queries::user_profile(&self.config.package_id);
        let data = self.request(&query, json!({ "address": address })).await?;
        Ok(data.pointer("/user/nodes/0").and_then(decode::user_profile))
    }

    async fn platform_stats(&self) -> ChainResult<PlatformStats> {
        if self.config.platform_id.is_empty() {
            return Ok(PlatformStats::default());
        }
        let data = self
            .request(queries::PLATFORM, json!({ "id": self.config.platform_id }))
            .await?;
        Ok(decode::platform_stats(data.get("object")))
    }
}
