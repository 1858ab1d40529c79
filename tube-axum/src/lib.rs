//! tube-axum: Axum adapter for tube-core.
//!
//! Mounts every registered service as a REST router, maps errors to JSON and
//! ships the multipart middleware used for uploads.

pub mod app;
pub mod middlewares;
pub mod params;
pub mod rest;
pub mod state;
mod error;
pub use error::TubeAxumError;
pub use state::TubeAxumState;

pub use app::{axum, AxumApp};
pub use params::{FromRestParams, RestParams};
