use thiserror::Error;
use twire::{DrawlistError, WireError};

/// Runtime error codes surfaced to hosts.
#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error("invalid props: {detail}")]
    InvalidProps { detail: String },

    #[error("drawlist build failed: {0}")]
    DrawlistBuild(#[from] DrawlistError),

    #[error("user code failed: {detail}")]
    UserCode { detail: String },

    #[error("backend unsupported: {0}")]
    BackendUnsupported(WireError),

    #[error("backend platform error: {detail}")]
    BackendPlatform { detail: String },

    #[error("internal error: {detail}")]
    Internal { detail: String },

    #[error("backend I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl RuntimeError {
    pub fn invalid_props(detail: impl Into<String>) -> Self {
        RuntimeError::InvalidProps {
            detail: detail.into(),
        }
    }

    pub fn internal(detail: impl Into<String>) -> Self {
        RuntimeError::Internal {
            detail: detail.into(),
        }
    }
}

impl From<WireError> for RuntimeError {
    fn from(err: WireError) -> Self {
        match err {
            WireError::Unsupported { .. } => RuntimeError::BackendUnsupported(err),
            other => RuntimeError::Internal {
                detail: other.to_string(),
            },
        }
    }
}

pub type Result<T> = std::result::Result<T, RuntimeError>;
