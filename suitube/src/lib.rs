//! SuiTube backend.
//!
//! Videos are uploaded to Walrus through this server and kept in a local
//! registry until they are published on Sui; reads merge that registry
//! with `VideoPlatform` objects fetched over Sui GraphQL.

pub mod app;
pub mod config;
pub mod hooks;
pub mod models;
pub mod services;
pub mod sui;

use std::sync::Arc;

use anyhow::Result;
use serde_json::Value;
use tube_axum::{middlewares::MultipartToJson, AxumApp};
use tube_blob::{BlobStore, WalrusStore};
use tube_core::TubeApp;

pub use services::TubeParams;

use crate::services::adapters::VideoRegistry;
use crate::sui::{ChainQuery, SuiGraphQlClient};

/// Everything the services talk to outside the process.
#[derive(Clone)]
pub struct Backends {
    pub blobs: Arc<dyn BlobStore>,
    pub chain: Arc<dyn ChainQuery>,
    pub registry: Arc<VideoRegistry>,
}

impl Backends {
    /// Walrus, Sui GraphQL and the on-disk registry, as configured.
    pub async fn from_config(app: &TubeApp<Value, TubeParams>) -> Result<Self> {
        let blobs = WalrusStore::new(config::walrus_config(app))?;
        let chain = SuiGraphQlClient::new(config::sui_config(app))?;
        let registry = VideoRegistry::load(config::registry_path(app)).await;

        Ok(Self {
            blobs: Arc::new(blobs),
            chain: Arc::new(chain),
            registry: Arc::new(registry),
        })
    }
}

pub async fn build() -> Result<AxumApp<Value, TubeParams>> {
    let tube_app = app::suitube_app()?;
    let backends = Backends::from_config(&tube_app).await?;
    build_with(tube_app, backends)
}

/// Mount the services on `tube_app` using the given backends.
pub fn build_with(tube_app: TubeApp<Value, TubeParams>, backends: Backends) -> Result<AxumApp<Value, TubeParams>> {
    let svcs = services::configure(&tube_app, &backends)?;

    let extra = services::videos::stream::routes(tube_app.clone(), Arc::clone(&backends.blobs));
    let multipart = MultipartToJson::with_config(config::multipart_config(&tube_app));
    let cors = config::cors_layer(&tube_app);

    let mut ax = tube_axum::axum(tube_app)
        .use_service_with("/videos", svcs.videos, |router| router.merge(extra).layer(multipart))
        .use_service("/users", svcs.users)
        .use_service("/platform", svcs.platform)
        .service("/health", || async { "ok" });

    ax.router = ax.router.layer(cors);
    Ok(ax)
}
