use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use tube_core::{bail_tube, CallContext, ServiceCapabilities, ServiceMethodKind, TubeService};

use crate::services::TubeParams;
use crate::sui::ChainQuery;

pub const STATS: &str = "stats";

/// Read-only view of the shared `Platform` object. Only `GET /platform/stats`.
pub struct PlatformService {
    chain: Arc<dyn ChainQuery>,
}

impl PlatformService {
    pub fn new(chain: Arc<dyn ChainQuery>) -> Self {
        Self { chain }
    }
}

#[async_trait]
impl TubeService<Value, TubeParams> for PlatformService {
    fn capabilities(&self) -> ServiceCapabilities {
        ServiceCapabilities::from_methods(vec![ServiceMethodKind::Get])
    }

    async fn get(&self, _ctx: &CallContext, id: &str, _params: TubeParams) -> Result<Value> {
        if id != STATS {
            bail_tube!(not_found, "Unknown platform resource: {}", id);
        }

        let stats = self.chain.platform_stats().await.unwrap_or_else(|e| {
            tracing::warn!(error = %e, "platform stats unavailable, reporting zeros");
            Default::default()
        });
        Ok(serde_json::to_value(stats)?)
    }
}
