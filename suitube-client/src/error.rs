use serde::Deserialize;
use thiserror::Error;

pub type ClientResult<T> = Result<T, ClientError>;

/// Error body the server sends with every non-2xx response.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerError {
    pub name: String,
    pub message: String,
    pub code: u16,
    #[serde(default)]
    pub class_name: Option<String>,
}

impl ServerError {
    /// Parse the JSON error body, or describe the status when there is none.
    pub fn from_response(status: u16, body: &[u8]) -> Self {
        serde_json::from_slice(body).unwrap_or_else(|_| {
            let text = String::from_utf8_lossy(body).trim().to_string();
            Self {
                name: "HttpError".to_string(),
                message: if text.is_empty() {
                    format!("HTTP error! status: {status}")
                } else {
                    text
                },
                code: status,
                class_name: None,
            }
        })
    }
}

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("{} ({}): {}", .0.name, .0.code, .0.message)]
    Api(ServerError),

    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Invalid response body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cannot {action} while {state}")]
    InvalidTransition { action: &'static str, state: &'static str },

    #[error("Invalid input: {0}")]
    Invalid(String),
}

impl ClientError {
    /// HTTP status for server-side errors.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api(e) => Some(e.code),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}
