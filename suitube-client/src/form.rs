//! Upload dialog state.
//!
//! ```text
//! Idle → SelectingFile → Submitting{progress} → Success | Error
//!   ↑__________________ reset() ______________________|
//! ```
//!
//! Every transition not drawn above is rejected with
//! [`ClientError::InvalidTransition`] and leaves the state unchanged.

use std::path::{Path, PathBuf};

use crate::error::{ClientError, ClientResult};
use crate::types::{UploadMetadata, UploadResponse};

#[derive(Debug, Clone, PartialEq, Default)]
pub enum UploadState {
    #[default]
    Idle,
    SelectingFile {
        file: Option<PathBuf>,
    },
    Submitting {
        progress: u8,
    },
    Success(UploadResponse),
    Error(String),
}

impl UploadState {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::SelectingFile { .. } => "selecting a file",
            Self::Submitting { .. } => "submitting",
            Self::Success(_) => "done",
            Self::Error(_) => "failed",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct UploadForm {
    state: UploadState,
    file: Option<PathBuf>,
    pub metadata: UploadMetadata,
}

impl UploadForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &UploadState {
        &self.state
    }

    pub fn file(&self) -> Option<&Path> {
        self.file.as_deref()
    }

    fn reject<T>(&self, action: &'static str) -> ClientResult<T> {
        Err(ClientError::InvalidTransition {
            action,
            state: self.state.name(),
        })
    }

    /// Idle → SelectingFile.
    pub fn open(&mut self) -> ClientResult<()> {
        match self.state {
            UploadState::Idle => {
                self.state = UploadState::SelectingFile { file: None };
                Ok(())
            }
            _ => self.reject("open the form"),
        }
    }

    /// Pick (or re-pick) the file while selecting.
    pub fn choose_file(&mut self, path: impl Into<PathBuf>) -> ClientResult<()> {
        match self.state {
            UploadState::SelectingFile { .. } => {
                let path = path.into();
                self.file = Some(path.clone());
                self.state = UploadState::SelectingFile { file: Some(path) };
                Ok(())
            }
            _ => self.reject("choose a file"),
        }
    }

    /// SelectingFile → Submitting{0}. Needs a file and a non-blank title.
    pub fn submit(&mut self) -> ClientResult<PathBuf> {
        let UploadState::SelectingFile { file: Some(file) } = &self.state else {
            return self.reject("submit");
        };
        if self.metadata.title.trim().is_empty() {
            return Err(ClientError::Invalid("title is required".to_string()));
        }

        let file = file.clone();
        self.state = UploadState::Submitting { progress: 0 };
        Ok(file)
    }

    /// Progress never goes backwards and stops at 100.
    pub fn progress(&mut self, progress: u8) -> ClientResult<()> {
        match &mut self.state {
            UploadState::Submitting { progress: current } => {
                *current = (*current).max(progress.min(100));
                Ok(())
            }
            _ => self.reject("report progress"),
        }
    }

    pub fn succeed(&mut self, response: UploadResponse) -> ClientResult<()> {
        match self.state {
            UploadState::Submitting { .. } => {
                self.state = UploadState::Success(response);
                Ok(())
            }
            _ => self.reject("complete"),
        }
    }

    pub fn fail(&mut self, message: impl Into<String>) -> ClientResult<()> {
        match self.state {
            UploadState::Submitting { .. } => {
                self.state = UploadState::Error(message.into());
                Ok(())
            }
            _ => self.reject("fail"),
        }
    }

    /// Back to Idle from anywhere; file and metadata are cleared.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
