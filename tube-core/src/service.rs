use anyhow::Result;
use async_trait::async_trait;

use crate::context::CallContext;
use crate::errors::TubeError;

/// Service methods a transport may dispatch to.
///
/// Custom methods are declared via `Custom("methodName")` and are reached
/// over REST as `POST /{service}/{method}` or `POST /{service}/{id}/{method}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ServiceMethodKind {
    Find,
    Get,
    Create,
    Remove,
    Custom(&'static str),
}

impl ServiceMethodKind {
    pub fn name(&self) -> &'static str {
        match self {
            ServiceMethodKind::Find => "find",
            ServiceMethodKind::Get => "get",
            ServiceMethodKind::Create => "create",
            ServiceMethodKind::Remove => "remove",
            ServiceMethodKind::Custom(name) => name,
        }
    }
}

/// Which methods a service exposes to the outside world.
///
/// Adapters (like tube-axum) check this before dispatching.
#[derive(Debug, Clone)]
pub struct ServiceCapabilities {
    pub allowed_methods: Vec<ServiceMethodKind>,
}

impl ServiceCapabilities {
    /// `find` and `get` only.
    pub fn read_only() -> Self {
        use ServiceMethodKind::*;
        Self {
            allowed_methods: vec![Find, Get],
        }
    }

    pub fn from_methods(methods: Vec<ServiceMethodKind>) -> Self {
        Self {
            allowed_methods: methods,
        }
    }

    pub fn allows(&self, method: &ServiceMethodKind) -> bool {
        self.allowed_methods.contains(method)
    }

    /// Look up a custom method by the name that arrived on the wire.
    pub fn custom(&self, name: &str) -> Option<ServiceMethodKind> {
        self.allowed_methods.iter().find_map(|m| match m {
            ServiceMethodKind::Custom(n) if *n == name => Some(m.clone()),
            _ => None,
        })
    }
}

/// Core service trait.
///
/// - `find`   → list/query many
/// - `get`    → fetch one by id
/// - `create` → create one
/// - `remove` → delete one
/// - `custom` → named RPC-style method, optionally scoped to a record id
///
/// Every method defaults to `NotImplemented`, so a service only overrides
/// what it supports.
#[async_trait]
pub trait TubeService<R, P = ()>: Send + Sync
where
    R: Send + 'static,
    P: Send + 'static,
{
    fn capabilities(&self) -> ServiceCapabilities {
        ServiceCapabilities::read_only()
    }

    async fn find(&self, _ctx: &CallContext, _params: P) -> Result<Vec<R>> {
        Err(TubeError::not_implemented("Method not implemented: find").into_anyhow())
    }

    async fn get(&self, _ctx: &CallContext, _id: &str, _params: P) -> Result<R> {
        Err(TubeError::not_implemented("Method not implemented: get").into_anyhow())
    }

    async fn create(&self, _ctx: &CallContext, _data: R, _params: P) -> Result<R> {
        Err(TubeError::not_implemented("Method not implemented: create").into_anyhow())
    }

    async fn remove(&self, _ctx: &CallContext, _id: &str, _params: P) -> Result<R> {
        Err(TubeError::not_implemented("Method not implemented: remove").into_anyhow())
    }

    async fn custom(
        &self,
        _ctx: &CallContext,
        method: &str,
        _id: Option<&str>,
        _data: Option<R>,
        _params: P,
    ) -> Result<R> {
        Err(TubeError::method_not_allowed(format!("Unknown method: {method}")).into_anyhow())
    }
}
