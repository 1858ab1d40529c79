//! Read-only access to SuiTube objects through the Sui GraphQL API.
//!
//! [`SuiGraphQlClient`] reports every failure as a [`ChainError`]; callers
//! decide how to degrade.

mod client;
mod decode;
mod error;
mod queries;

use async_trait::async_trait;

use crate::models::{PlatformStats, UserProfile, Video};

pub use client::{SuiConfig, SuiGraphQlClient};
pub use error::{ChainError, ChainResult};

#[async_trait]
pub trait ChainQuery: Send + Sync {
    async fn list_videos(&self, limit: usize, offset: usize) -> ChainResult<Vec<Video>>;

    async fn get_video(&self, id: &str) -> ChainResult<Option<Video>>;

    async fn list_videos_by_owner(&self, owner: &str, limit: usize) -> ChainResult<Vec<Video>>;

    async fn user_profile(&self, address: &str) -> ChainResult<Option<UserProfile>>;

    async fn platform_stats(&self) -> ChainResult<PlatformStats>;
}
