//! # suitube-client
//!
//! Typed access to the SuiTube backend for front ends written in Rust.
//!
//! - Reads (`list_videos`, `video`, `videos_by_owner`) are cached per query
//!   key with a per-kind freshness window.
//! - `upload_video` streams a file as multipart and reports 0–100 progress on
//!   a [`tokio::sync::watch`] channel. A successful upload drops every cached
//!   list.
//! - `track_view` bumps the cached record right away and reconciles with the
//!   count the server returns.
//! - [`UploadForm`] models the upload dialog.
//!
//! ```rust,no_run
//! use suitube_client::{ClientConfig, SuiTubeClient};
//!
//! # async fn run() -> suitube_client::ClientResult<()> {
//! let client = SuiTubeClient::new(ClientConfig::new("http://localhost:3001"))?;
//! for video in client.list_videos(Some(20), None).await? {
//!     println!("{} {}", video.title, client.stream_url(&video.id));
//! }
//! # Ok(())
//! # }
//! ```

pub mod cache;
mod client;
mod error;
pub mod form;
mod types;

pub use cache::{CacheConfig, QueryCache, QueryKey};
pub use client::{ClientConfig, SuiTubeClient};
pub use error::{ClientError, ClientResult, ServerError};
pub use form::{UploadForm, UploadState};
pub use types::{UploadMetadata, UploadResponse, Video, ViewCount};
