//! # tube-blob: Walrus blob storage
//!
//! Uploads stream straight from disk to a Walrus publisher; reads go through
//! an aggregator, with the caller's `Range` header forwarded so video players
//! can scrub. Everything sits behind [`BlobStore`] so services can be tested
//! against a fake.
//!
//! ```text
//! ┌─────────────────┐
//! │   Your Service  │  ← business logic only
//! ├─────────────────┤
//! │   BlobStore     │  ← upload / get / open / url
//! ├─────────────────┤
//! │   WalrusStore   │  ← publisher + aggregator HTTP API
//! └─────────────────┘
//! ```
//!
//! ```rust,no_run
//! use tube_blob::prelude::*;
//!
//! # async fn run() -> BlobResult<()> {
//! let store = WalrusStore::new(WalrusConfig::default().with_default_epochs(1))?;
//! let stored = store
//!     .upload(std::path::Path::new("clip.mp4"), None, &StoreOptions::default())
//!     .await?;
//! println!("{} -> {}", stored.blob_id, stored.url);
//! # Ok(())
//! # }
//! ```

mod config;
mod error;
pub mod store;
mod types;
mod walrus;

pub use config::{WalrusConfig, TESTNET_AGGREGATOR, TESTNET_PUBLISHER};
pub use error::{BlobError, BlobResult};
pub use store::BlobStore;
pub use types::{BlobId, ByteStream, OpenedBlob, StoreOptions, StoredBlob};
pub use walrus::WalrusStore;

pub mod prelude {
    pub use crate::{
        BlobError, BlobId, BlobResult, BlobStore, OpenedBlob, StoreOptions, StoredBlob,
        WalrusConfig, WalrusStore,
    };
}
