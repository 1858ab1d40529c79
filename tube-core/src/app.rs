use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use parking_lot::RwLock;

use crate::hooks::{collect_method_hooks, Pipeline};
use crate::{
    CallContext, HookContext, HookResult, Next, ServiceHooks, ServiceMethodKind, ServiceRegistry,
    TubeConfig, TubeConfigSnapshot, TubeError, TubeService,
};

struct TubeAppInner<R, P>
where
    R: Send + 'static,
    P: Send + Clone + 'static,
{
    registry: RwLock<ServiceRegistry<R, P>>,
    global_hooks: RwLock<ServiceHooks<R, P>>,
    service_hooks: RwLock<HashMap<String, ServiceHooks<R, P>>>,
    config: RwLock<TubeConfig>,
}

/// Central application container.
///
/// Holds the service registry, app-wide and per-service hooks, and config.
/// Cloning is cheap and every clone sees the same state.
pub struct TubeApp<R, P = ()>
where
    R: Send + 'static,
    P: Send + Clone + 'static,
{
    inner: Arc<TubeAppInner<R, P>>,
}

impl<R, P> Default for TubeApp<R, P>
where
    R: Send + 'static,
    P: Send + Clone + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<R, P> Clone for TubeApp<R, P>
where
    R: Send + 'static,
    P: Send + Clone + 'static,
{
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<R, P> TubeApp<R, P>
where
    R: Send + 'static,
    P: Send + Clone + 'static,
{
    pub fn new() -> Self {
        Self {
            inner: Arc::new(TubeAppInner {
                registry: RwLock::new(ServiceRegistry::new()),
                global_hooks: RwLock::new(ServiceHooks::new()),
                service_hooks: RwLock::new(HashMap::new()),
                config: RwLock::new(TubeConfig::new()),
            }),
        }
    }

    pub fn register_service<S>(&self, name: S, service: Arc<dyn TubeService<R, P>>)
    where
        S: Into<String>,
    {
        self.inner.registry.write().register(name, service);
    }

    /// App-wide hooks, applied to every service.
    pub fn hooks<F>(&self, f: F)
    where
        F: FnOnce(&mut ServiceHooks<R, P>),
    {
        let mut g = self.inner.global_hooks.write();
        f(&mut g);
    }

    pub(crate) fn configure_service_hooks<F>(&self, service_name: &str, f: F)
    where
        F: FnOnce(&mut ServiceHooks<R, P>),
    {
        let mut map = self.inner.service_hooks.write();
        let hooks = map.entry(service_name.to_string()).or_default();
        f(hooks);
    }

    pub fn service(&self, name: &str) -> Result<ServiceHandle<R, P>> {
        let svc = self
            .inner
            .registry
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| TubeError::not_found(format!("Service not found: {name}")).into_anyhow())?;

        Ok(ServiceHandle {
            app: self.clone(),
            name: name.to_string(),
            service: svc,
        })
    }

    pub fn set<K, V>(&self, key: K, value: V)
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.inner.config.write().set(key, value);
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.inner.config.read().get(key).map(|v| v.to_string())
    }

    pub fn config_snapshot(&self) -> TubeConfigSnapshot {
        self.inner.config.read().snapshot()
    }
}

/// A named service plus the app it lives in. All calls go through hooks.
pub struct ServiceHandle<R, P>
where
    R: Send + 'static,
    P: Send + Clone + 'static,
{
    app: TubeApp<R, P>,
    name: String,
    service: Arc<dyn TubeService<R, P>>,
}

impl<R, P> ServiceHandle<R, P>
where
    R: Send + 'static,
    P: Send + Clone + 'static,
{
    pub fn hooks<F>(self, f: F) -> Self
    where
        F: FnOnce(&mut ServiceHooks<R, P>),
    {
        self.app.configure_service_hooks(&self.name, f);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn inner(&self) -> &Arc<dyn TubeService<R, P>> {
        &self.service
    }

    /// Global hooks first, then this service's, per stage.
    fn pipeline_for(&self, method: &ServiceMethodKind) -> Pipeline<R, P> {
        let g = self.app.inner.global_hooks.read();
        let map = self.app.inner.service_hooks.read();

        let mut around = collect_method_hooks(&g.around_all, &g.around_by_method, method);
        let mut before = collect_method_hooks(&g.before_all, &g.before_by_method, method);
        let mut after = collect_method_hooks(&g.after_all, &g.after_by_method, method);
        let mut error = collect_method_hooks(&g.error_all, &g.error_by_method, method);

        if let Some(h) = map.get(&self.name) {
            around.extend(collect_method_hooks(&h.around_all, &h.around_by_method, method));
            before.extend(collect_method_hooks(&h.before_all, &h.before_by_method, method));
            after.extend(collect_method_hooks(&h.after_all, &h.after_by_method, method));
            error.extend(collect_method_hooks(&h.error_all, &h.error_by_method, method));
        }

        Pipeline {
            around,
            before,
            after,
            error,
            service: Arc::clone(&self.service),
        }
    }

    fn context(&self, call: CallContext, method: ServiceMethodKind, params: P) -> HookContext<R, P> {
        HookContext::new(call, self.name.clone(), method, params, self.app.config_snapshot())
    }

    async fn run(&self, mut ctx: HookContext<R, P>) -> Result<HookContext<R, P>> {
        if !self.service.capabilities().allows(&ctx.method) {
            return Err(TubeError::method_not_allowed(format!(
                "Method '{}' is not allowed on service '{}'",
                ctx.method.name(),
                self.name
            ))
            .into_anyhow());
        }

        let pipeline = Arc::new(self.pipeline_for(&ctx.method));

        if let Err(e) = Next::start(Arc::clone(&pipeline)).run(&mut ctx).await {
            ctx.error = Some(e);

            for h in &pipeline.error {
                // An error hook failing must not mask the original error.
                let _ = h.run(&mut ctx).await;
            }

            if let Some(err) = ctx.error.take() {
                return Err(err);
            }
        }

        Ok(ctx)
    }

    fn expect_one(ctx: HookContext<R, P>) -> Result<R> {
        match ctx.result {
            Some(HookResult::One(v)) => Ok(v),
            Some(HookResult::Many(_)) => Err(anyhow::anyhow!(
                "{}() produced HookResult::Many unexpectedly",
                ctx.method.name()
            )),
            None => Err(anyhow::anyhow!("{}() produced no result", ctx.method.name())),
        }
    }

    pub async fn find(&self, call: CallContext, params: P) -> Result<Vec<R>> {
        let ctx = self.context(call, ServiceMethodKind::Find, params);
        let ctx = self.run(ctx).await?;

        match ctx.result {
            Some(HookResult::Many(v)) => Ok(v),
            Some(HookResult::One(_)) => Err(anyhow::anyhow!(
                "find() produced HookResult::One unexpectedly"
            )),
            None => Ok(vec![]),
        }
    }

    pub async fn get(&self, call: CallContext, id: &str, params: P) -> Result<R> {
        let mut ctx = self.context(call, ServiceMethodKind::Get, params);
        ctx.id = Some(id.to_string());
        Self::expect_one(self.run(ctx).await?)
    }

    pub async fn create(&self, call: CallContext, data: R, params: P) -> Result<R> {
        let mut ctx = self.context(call, ServiceMethodKind::Create, params);
        ctx.data = Some(data);
        Self::expect_one(self.run(ctx).await?)
    }

    pub async fn remove(&self, call: CallContext, id: &str, params: P) -> Result<R> {
        let mut ctx = self.context(call, ServiceMethodKind::Remove, params);
        ctx.id = Some(id.to_string());
        Self::expect_one(self.run(ctx).await?)
    }

    /// Call a custom method by its wire name. Unknown names are rejected
    /// before any hook runs.
    pub async fn custom(
        &self,
        call: CallContext,
        method: &str,
        id: Option<&str>,
        data: Option<R>,
        params: P,
    ) -> Result<R> {
        let kind = self.service.capabilities().custom(method).ok_or_else(|| {
            TubeError::method_not_allowed(format!(
                "Method '{method}' is not allowed on service '{}'",
                self.name
            ))
            .into_anyhow()
        })?;

        let mut ctx = self.context(call, kind, params);
        ctx.id = id.map(str::to_string);
        ctx.data = data;
        Self::expect_one(self.run(ctx).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use parking_lot::Mutex;

    use crate::{ServiceCapabilities, TubeAfterHook, TubeAroundHook, TubeBeforeHook, TubeErrorHook};

    type Log = Arc<Mutex<Vec<String>>>;

    struct Echo {
        log: Log,
    }

    #[async_trait]
    impl TubeService<String, ()> for Echo {
        fn capabilities(&self) -> ServiceCapabilities {
            ServiceCapabilities::from_methods(vec![
                ServiceMethodKind::Find,
                ServiceMethodKind::Get,
                ServiceMethodKind::Custom("view"),
            ])
        }

        async fn find(&self, _ctx: &CallContext, _params: ()) -> Result<Vec<String>> {
            self.log.lock().push("service".into());
            Ok(vec!["a".into(), "b".into()])
        }

        async fn get(&self, _ctx: &CallContext, id: &str, _params: ()) -> Result<String> {
            if id == "missing" {
                return Err(TubeError::not_found("nope").into_anyhow());
            }
            Ok(id.to_string())
        }

        async fn custom(
            &self,
            _ctx: &CallContext,
            method: &str,
            id: Option<&str>,
            _data: Option<String>,
            _params: (),
        ) -> Result<String> {
            Ok(format!("{method}:{}", id.unwrap_or("-")))
        }
    }

    struct Tag(&'static str, Log);

    #[async_trait]
    impl TubeBeforeHook<String, ()> for Tag {
        async fn run(&self, _ctx: &mut HookContext<String, ()>) -> Result<()> {
            self.1.lock().push(self.0.to_string());
            Ok(())
        }
    }

    #[async_trait]
    impl TubeAfterHook<String, ()> for Tag {
        async fn run(&self, _ctx: &mut HookContext<String, ()>) -> Result<()> {
            self.1.lock().push(self.0.to_string());
            Ok(())
        }
    }

    #[async_trait]
    impl TubeAroundHook<String, ()> for Tag {
        async fn run(&self, ctx: &mut HookContext<String, ()>, next: Next<String, ()>) -> Result<()> {
            self.1.lock().push(format!("{}:in", self.0));
            let res = next.run(ctx).await;
            self.1.lock().push(format!("{}:out", self.0));
            res
        }
    }

    struct Recover;

    #[async_trait]
    impl TubeErrorHook<String, ()> for Recover {
        async fn run(&self, ctx: &mut HookContext<String, ()>) -> Result<()> {
            ctx.error = None;
            ctx.result = Some(HookResult::One("fallback".into()));
            Ok(())
        }
    }

    fn app_with_log() -> (TubeApp<String, ()>, Log) {
        let log: Log = Arc::new(Mutex::new(Vec::new()));
        let app = TubeApp::new();
        app.register_service("echo", Arc::new(Echo { log: log.clone() }));
        (app, log)
    }

    #[tokio::test]
    async fn hooks_run_in_pipeline_order() {
        let (app, log) = app_with_log();

        app.hooks(|h| {
            h.around_all(Arc::new(Tag("around", log.clone())));
            h.before_all(Arc::new(Tag("global-before", log.clone())));
        });

        let svc = app.service("echo").unwrap().hooks(|h| {
            h.before_find(Arc::new(Tag("before", log.clone())));
            h.after_find(Arc::new(Tag("after-1", log.clone())));
            h.after_find(Arc::new(Tag("after-2", log.clone())));
        });

        let out = svc.find(CallContext::new(), ()).await.unwrap();
        assert_eq!(out, vec!["a".to_string(), "b".to_string()]);

        assert_eq!(
            *log.lock(),
            vec![
                "around:in",
                "global-before",
                "before",
                "service",
                "after-2",
                "after-1",
                "around:out",
            ]
        );
    }

    #[tokio::test]
    async fn error_hook_can_recover() {
        let (app, _log) = app_with_log();
        let svc = app.service("echo").unwrap();

        let err = svc.get(CallContext::new(), "missing", ()).await.unwrap_err();
        assert_eq!(TubeError::find_in(&err).map(|e| e.code()), Some(404));

        let svc = svc.hooks(|h| {
            h.error(ServiceMethodKind::Get, Arc::new(Recover));
        });
        let out = svc.get(CallContext::new(), "missing", ()).await.unwrap();
        assert_eq!(out, "fallback");
    }

    #[tokio::test]
    async fn disallowed_and_unknown_methods_are_rejected() {
        let (app, _log) = app_with_log();
        let svc = app.service("echo").unwrap();

        let err = svc.remove(CallContext::new(), "x", ()).await.unwrap_err();
        assert_eq!(TubeError::find_in(&err).map(|e| e.code()), Some(405));

        let err = svc
            .custom(CallContext::new(), "explode", None, None, ())
            .await
            .unwrap_err();
        assert_eq!(TubeError::find_in(&err).map(|e| e.code()), Some(405));

        let out = svc
            .custom(CallContext::new(), "view", Some("v1"), None, ())
            .await
            .unwrap();
        assert_eq!(out, "view:v1");
    }

    #[test]
    fn unknown_service_is_not_found() {
        let app = TubeApp::<String, ()>::new();
        let err = app.service("nope").err().unwrap();
        assert_eq!(TubeError::find_in(&err).map(|e| e.code()), Some(404));
    }
}
