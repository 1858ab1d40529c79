//! Hook pipeline.
//!
//! For every service call the app runs, in order:
//!
//! ```text
//! around (outermost first) → before → service → after (reverse order)
//! ```
//!
//! If anything fails, error hooks run with `ctx.error` set. An error hook
//! may clear `ctx.error` (and set `ctx.result`) to recover.
//!
//! Global hooks run before service hooks within each stage.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

use crate::config::TubeConfigSnapshot;
use crate::context::CallContext;
use crate::service::{ServiceMethodKind, TubeService};

/// Output slot of a call: `find` yields many, everything else one.
#[derive(Debug, Clone, PartialEq)]
pub enum HookResult<R> {
    One(R),
    Many(Vec<R>),
}

/// State shared by all hooks of a single call.
#[derive(Debug)]
pub struct HookContext<R, P> {
    pub call: CallContext,
    pub service: String,
    pub method: ServiceMethodKind,
    /// Record id for `get`, `remove` and id-scoped custom methods.
    pub id: Option<String>,
    pub params: P,
    /// Input payload (`create`, custom methods).
    pub data: Option<R>,
    pub result: Option<HookResult<R>>,
    pub error: Option<anyhow::Error>,
    pub config: TubeConfigSnapshot,
}

impl<R, P> HookContext<R, P> {
    pub fn new(
        call: CallContext,
        service: impl Into<String>,
        method: ServiceMethodKind,
        params: P,
        config: TubeConfigSnapshot,
    ) -> Self {
        Self {
            call,
            service: service.into(),
            method,
            id: None,
            params,
            data: None,
            result: None,
            error: None,
            config,
        }
    }

    /// Apply `f` to every record currently in `result`.
    pub fn map_result<F>(&mut self, mut f: F)
    where
        F: FnMut(R) -> R,
    {
        self.result = self.result.take().map(|res| match res {
            HookResult::One(v) => HookResult::One(f(v)),
            HookResult::Many(vs) => HookResult::Many(vs.into_iter().map(&mut f).collect()),
        });
    }
}

#[async_trait]
pub trait TubeAroundHook<R, P>: Send + Sync
where
    R: Send + 'static,
    P: Send + 'static,
{
    async fn run(&self, ctx: &mut HookContext<R, P>, next: Next<R, P>) -> Result<()>;
}

#[async_trait]
pub trait TubeBeforeHook<R, P>: Send + Sync
where
    R: Send + 'static,
    P: Send + 'static,
{
    async fn run(&self, ctx: &mut HookContext<R, P>) -> Result<()>;
}

#[async_trait]
pub trait TubeAfterHook<R, P>: Send + Sync
where
    R: Send + 'static,
    P: Send + 'static,
{
    async fn run(&self, ctx: &mut HookContext<R, P>) -> Result<()>;
}

#[async_trait]
pub trait TubeErrorHook<R, P>: Send + Sync
where
    R: Send + 'static,
    P: Send + 'static,
{
    async fn run(&self, ctx: &mut HookContext<R, P>) -> Result<()>;
}

type HookMap<T> = HashMap<ServiceMethodKind, Vec<Arc<T>>>;

/// Hooks registered either app-wide or for one service.
pub struct ServiceHooks<R, P>
where
    R: Send + 'static,
    P: Send + 'static,
{
    pub(crate) around_all: Vec<Arc<dyn TubeAroundHook<R, P>>>,
    pub(crate) around_by_method: HookMap<dyn TubeAroundHook<R, P>>,
    pub(crate) before_all: Vec<Arc<dyn TubeBeforeHook<R, P>>>,
    pub(crate) before_by_method: HookMap<dyn TubeBeforeHook<R, P>>,
    pub(crate) after_all: Vec<Arc<dyn TubeAfterHook<R, P>>>,
    pub(crate) after_by_method: HookMap<dyn TubeAfterHook<R, P>>,
    pub(crate) error_all: Vec<Arc<dyn TubeErrorHook<R, P>>>,
    pub(crate) error_by_method: HookMap<dyn TubeErrorHook<R, P>>,
}

impl<R, P> Default for ServiceHooks<R, P>
where
    R: Send + 'static,
    P: Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<R, P> ServiceHooks<R, P>
where
    R: Send + 'static,
    P: Send + 'static,
{
    pub fn new() -> Self {
        Self {
            around_all: Vec::new(),
            around_by_method: HashMap::new(),
            before_all: Vec::new(),
            before_by_method: HashMap::new(),
            after_all: Vec::new(),
            after_by_method: HashMap::new(),
            error_all: Vec::new(),
            error_by_method: HashMap::new(),
        }
    }

    pub fn around_all(&mut self, hook: Arc<dyn TubeAroundHook<R, P>>) -> &mut Self {
        self.around_all.push(hook);
        self
    }

    pub fn before_all(&mut self, hook: Arc<dyn TubeBeforeHook<R, P>>) -> &mut Self {
        self.before_all.push(hook);
        self
    }

    pub fn after_all(&mut self, hook: Arc<dyn TubeAfterHook<R, P>>) -> &mut Self {
        self.after_all.push(hook);
        self
    }

    pub fn error_all(&mut self, hook: Arc<dyn TubeErrorHook<R, P>>) -> &mut Self {
        self.error_all.push(hook);
        self
    }

    pub fn around(&mut self, method: ServiceMethodKind, hook: Arc<dyn TubeAroundHook<R, P>>) -> &mut Self {
        self.around_by_method.entry(method).or_default().push(hook);
        self
    }

    pub fn before(&mut self, method: ServiceMethodKind, hook: Arc<dyn TubeBeforeHook<R, P>>) -> &mut Self {
        self.before_by_method.entry(method).or_default().push(hook);
        self
    }

    pub fn after(&mut self, method: ServiceMethodKind, hook: Arc<dyn TubeAfterHook<R, P>>) -> &mut Self {
        self.after_by_method.entry(method).or_default().push(hook);
        self
    }

    pub fn error(&mut self, method: ServiceMethodKind, hook: Arc<dyn TubeErrorHook<R, P>>) -> &mut Self {
        self.error_by_method.entry(method).or_default().push(hook);
        self
    }

    pub fn before_find(&mut self, hook: Arc<dyn TubeBeforeHook<R, P>>) -> &mut Self {
        self.before(ServiceMethodKind::Find, hook)
    }

    pub fn after_find(&mut self, hook: Arc<dyn TubeAfterHook<R, P>>) -> &mut Self {
        self.after(ServiceMethodKind::Find, hook)
    }

    pub fn after_get(&mut self, hook: Arc<dyn TubeAfterHook<R, P>>) -> &mut Self {
        self.after(ServiceMethodKind::Get, hook)
    }
}

pub(crate) fn collect_method_hooks<T: ?Sized>(
    all: &[Arc<T>],
    by_method: &HookMap<T>,
    method: &ServiceMethodKind,
) -> Vec<Arc<T>> {
    let mut out: Vec<Arc<T>> = all.to_vec();
    if let Some(specific) = by_method.get(method) {
        out.extend(specific.iter().cloned());
    }
    out
}

/// Everything a single call needs once hooks are resolved.
pub(crate) struct Pipeline<R, P>
where
    R: Send + 'static,
    P: Send + 'static,
{
    pub(crate) around: Vec<Arc<dyn TubeAroundHook<R, P>>>,
    pub(crate) before: Vec<Arc<dyn TubeBeforeHook<R, P>>>,
    pub(crate) after: Vec<Arc<dyn TubeAfterHook<R, P>>>,
    pub(crate) error: Vec<Arc<dyn TubeErrorHook<R, P>>>,
    pub(crate) service: Arc<dyn TubeService<R, P>>,
}

impl<R, P> Pipeline<R, P>
where
    R: Send + 'static,
    P: Send + Clone + 'static,
{
    async fn run_inner(&self, ctx: &mut HookContext<R, P>) -> Result<()> {
        for h in &self.before {
            h.run(ctx).await?;
        }

        call_service(self.service.as_ref(), ctx).await?;

        for h in self.after.iter().rev() {
            h.run(ctx).await?;
        }

        Ok(())
    }
}

/// Dispatch on `ctx.method` and store the outcome in `ctx.result`.
async fn call_service<R, P>(svc: &dyn TubeService<R, P>, ctx: &mut HookContext<R, P>) -> Result<()>
where
    R: Send + 'static,
    P: Send + Clone + 'static,
{
    let params = ctx.params.clone();
    let result = match ctx.method.clone() {
        ServiceMethodKind::Find => HookResult::Many(svc.find(&ctx.call, params).await?),
        ServiceMethodKind::Get => {
            let id = require_id(ctx)?;
            HookResult::One(svc.get(&ctx.call, &id, params).await?)
        }
        ServiceMethodKind::Create => {
            let data = ctx
                .data
                .take()
                .ok_or_else(|| anyhow::anyhow!("create() requires ctx.data"))?;
            HookResult::One(svc.create(&ctx.call, data, params).await?)
        }
        ServiceMethodKind::Remove => {
            let id = require_id(ctx)?;
            HookResult::One(svc.remove(&ctx.call, &id, params).await?)
        }
        ServiceMethodKind::Custom(name) => {
            let data = ctx.data.take();
            let id = ctx.id.clone();
            HookResult::One(svc.custom(&ctx.call, name, id.as_deref(), data, params).await?)
        }
    };

    ctx.result = Some(result);
    Ok(())
}

fn require_id<R, P>(ctx: &HookContext<R, P>) -> Result<String> {
    ctx.id.clone().ok_or_else(|| {
        crate::TubeError::bad_request(format!("{}() requires an id", ctx.method.name())).into_anyhow()
    })
}

/// Continuation handed to around hooks. Calling `run` proceeds to the next
/// around hook, or to before → service → after when none are left.
pub struct Next<R, P>
where
    R: Send + 'static,
    P: Send + 'static,
{
    pipeline: Arc<Pipeline<R, P>>,
    index: usize,
}

impl<R, P> Next<R, P>
where
    R: Send + 'static,
    P: Send + Clone + 'static,
{
    pub(crate) fn start(pipeline: Arc<Pipeline<R, P>>) -> Self {
        Self { pipeline, index: 0 }
    }

    pub async fn run(self, ctx: &mut HookContext<R, P>) -> Result<()> {
        match self.pipeline.around.get(self.index).cloned() {
            Some(hook) => {
                let next = Next {
                    pipeline: Arc::clone(&self.pipeline),
                    index: self.index + 1,
                };
                hook.run(ctx, next).await
            }
            None => self.pipeline.run_inner(ctx).await,
        }
    }
}
