use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use tube_core::errors::TubeError;

/// Handler error: any `anyhow::Error`, rendered as a Feathers-style JSON body.
#[derive(Debug)]
pub struct TubeAxumError(pub anyhow::Error);

impl From<anyhow::Error> for TubeAxumError {
    fn from(e: anyhow::Error) -> Self {
        Self(e)
    }
}

impl From<TubeError> for TubeAxumError {
    fn from(e: TubeError) -> Self {
        Self(e.into_anyhow())
    }
}

impl IntoResponse for TubeAxumError {
    fn into_response(self) -> Response {
        let safe = match TubeError::find_in(&self.0) {
            Some(tube) => tube.sanitize_for_client(),
            None => {
                tracing::error!(error = %format!("{:#}", self.0), "unhandled error");
                TubeError::general_error(self.0.to_string())
            }
        };

        let status = StatusCode::from_u16(safe.code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(safe.to_json())).into_response()
    }
}
