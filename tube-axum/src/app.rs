use std::sync::Arc;

use axum::handler::Handler;
use axum::routing::get;
use axum::Router;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::net::{TcpListener, ToSocketAddrs};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use tube_core::{TubeApp, TubeService};

use crate::params::FromRestParams;
use crate::rest;

/// A [`TubeApp`] plus the axum router its services are mounted on.
pub struct AxumApp<R, P = ()>
where
    R: Send + Sync + 'static,
    P: Send + Sync + Clone + 'static,
{
    pub app: TubeApp<R, P>,
    pub router: Router<()>,
}

impl<R, P> Clone for AxumApp<R, P>
where
    R: Send + Sync + 'static,
    P: Send + Sync + Clone + 'static,
{
    fn clone(&self) -> Self {
        Self {
            app: self.app.clone(),
            router: self.router.clone(),
        }
    }
}

/// `x-request-id` is generated when missing and echoed on the response.
fn with_request_id(router: Router<()>) -> Router<()> {
    router
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
}

impl<R, P> AxumApp<R, P>
where
    R: Send + Sync + 'static,
    P: Send + Sync + Clone + 'static,
{
    pub fn new(app: TubeApp<R, P>) -> Self {
        Self {
            app,
            router: Router::new(),
        }
    }

    pub fn use_router(mut self, path: &str, router: Router<()>) -> Self {
        self.router = self.router.nest(path, router);
        self
    }

    /// Plain GET route outside any service (health checks and the like).
    pub fn service<H, T>(mut self, path: &str, handler: H) -> Self
    where
        H: Handler<T, ()> + Clone + Send + Sync + 'static,
        T: 'static,
    {
        self.router = self.router.route(path, get(handler));
        self
    }

    pub fn use_service(self, path: &'static str, service: Arc<dyn TubeService<R, P>>) -> Self
    where
        R: Serialize + DeserializeOwned,
        P: FromRestParams,
    {
        self.use_service_with(path, service, |router| router)
    }

    /// Like [`use_service`](Self::use_service), but lets the caller extend
    /// the service router (extra routes, layers) before it is mounted.
    pub fn use_service_with<F>(
        mut self,
        path: &'static str,
        service: Arc<dyn TubeService<R, P>>,
        customize: F,
    ) -> Self
    where
        R: Serialize + DeserializeOwned,
        P: FromRestParams,
        F: FnOnce(Router<()>) -> Router<()>,
    {
        let name = path.trim_start_matches('/');
        self.app.register_service(name, service);

        let router = rest::service_router(Arc::new(name.to_string()), self.app.clone());
        let router = with_request_id(customize(router));

        tracing::debug!(service = name, path, "mounted service");
        self.router = self.router.nest(path, router);
        self
    }

    /// Final router with HTTP tracing applied.
    pub fn into_router(self) -> Router<()> {
        self.router.layer(TraceLayer::new_for_http())
    }

    pub async fn listen<A>(self, addr: A) -> anyhow::Result<()>
    where
        A: ToSocketAddrs,
    {
        let listener = TcpListener::bind(addr).await?;
        tracing::info!(addr = %listener.local_addr()?, "listening");
        axum::serve(listener, self.into_router()).await?;
        Ok(())
    }
}

pub fn axum<R, P>(app: TubeApp<R, P>) -> AxumApp<R, P>
where
    R: Send + Sync + 'static,
    P: Send + Sync + Clone + 'static,
{
    AxumApp::new(app)
}
