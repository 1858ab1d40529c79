use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use tube_core::{bail_tube, CallContext, ServiceCapabilities, ServiceMethodKind, TubeService};

use crate::services::TubeParams;
use crate::sui::ChainQuery;

/// `GET /users/{address}`: the on-chain `UserProfile` for a wallet.
pub struct UsersService {
    chain: Arc<dyn ChainQuery>,
}

impl UsersService {
    pub fn new(chain: Arc<dyn ChainQuery>) -> Self {
        Self { chain }
    }
}

#[async_trait]
impl TubeService<Value, TubeParams> for UsersService {
    fn capabilities(&self) -> ServiceCapabilities {
        ServiceCapabilities::from_methods(vec![ServiceMethodKind::Get])
    }

    async fn get(&self, _ctx: &CallContext, address: &str, _params: TubeParams) -> Result<Value> {
        let profile = match self.chain.user_profile(address).await {
            Ok(profile) => profile,
            Err(e) => {
                tracing::warn!(address, error = %e, "user profile lookup failed");
                None
            }
        };

        match profile {
            Some(profile) => Ok(serde_json::to_value(profile)?),
            None => bail_tube!(not_found, "User not found: {}", address),
        }
    }
}
