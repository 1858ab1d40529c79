//! tube-core: framework-agnostic core for the SuiTube backend.
//!
//! Services are registered by name on a [`TubeApp`] and called through a
//! hook pipeline (around → before → service → after, error hooks on failure).
//! Transports such as `tube-axum` only ever talk to the app.

pub mod app;
pub mod config;
pub mod context;
pub mod errors;
pub mod hooks;
pub mod registry;
pub mod service;

pub use app::{ServiceHandle, TubeApp};
pub use config::{TubeConfig, TubeConfigSnapshot};
pub use context::CallContext;
pub use errors::{ErrorKind, TubeError};
pub use hooks::{
    HookContext, HookResult, Next, ServiceHooks, TubeAfterHook, TubeAroundHook, TubeBeforeHook,
    TubeErrorHook,
};
pub use registry::ServiceRegistry;
pub use service::{ServiceCapabilities, ServiceMethodKind, TubeService};
