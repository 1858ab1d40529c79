use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use tube_core::hooks::{HookContext, Next, TubeAroundHook, TubeErrorHook};
use tube_core::{TubeApp, TubeError};

use crate::services::TubeParams;

/// One line per service call.
pub struct LogAround;

#[async_trait]
impl TubeAroundHook<Value, TubeParams> for LogAround {
    async fn run(&self, ctx: &mut HookContext<Value, TubeParams>, next: Next<Value, TubeParams>) -> Result<()> {
        let started = Instant::now();
        let res = next.run(ctx).await;

        tracing::info!(
            service = %ctx.service,
            method = ctx.method.name(),
            id = ctx.id.as_deref().unwrap_or(""),
            request_id = ctx.call.request_id.as_deref().unwrap_or(""),
            wallet = ctx.call.wallet.as_deref().unwrap_or(""),
            ok = res.is_ok(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "service call"
        );
        res
    }
}

/// Client errors at debug, everything else at error.
pub struct LogError;

#[async_trait]
impl TubeErrorHook<Value, TubeParams> for LogError {
    async fn run(&self, ctx: &mut HookContext<Value, TubeParams>) -> Result<()> {
        let Some(err) = ctx.error.as_ref() else {
            return Ok(());
        };

        match TubeError::find_in(err) {
            Some(e) if e.code() < 500 => {
                tracing::debug!(service = %ctx.service, method = ctx.method.name(), error = %e, "request rejected");
            }
            _ => {
                tracing::error!(service = %ctx.service, method = ctx.method.name(), error = ?err, "service call failed");
            }
        }
        Ok(())
    }
}

pub fn global_hooks(app: &TubeApp<Value, TubeParams>) {
    app.hooks(|h| {
        h.around_all(Arc::new(LogAround));
        h.error_all(Arc::new(LogError));
    });
}
