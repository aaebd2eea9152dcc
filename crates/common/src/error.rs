//! Error types shared across gimbal crates.

use std::path::PathBuf;

/// Top-level error type for gimbal operations.
#[derive(Debug, thiserror::Error)]
pub enum GimbalError {
    #[error("Device error: {message}")]
    Device { message: String },

    #[error("Detection error: {message}")]
    Detection { message: String },

    #[error("Actuator error: {message}")]
    Actuator { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("Unsupported operation: {message}")]
    Unsupported { message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias using GimbalError.
pub type GimbalResult<T> = Result<T, GimbalError>;

impl GimbalError {
    pub fn device(msg: impl Into<String>) -> Self {
        Self::Device {
            message: msg.into(),
        }
    }

    pub fn detection(msg: impl Into<String>) -> Self {
        Self::Detection {
            message: msg.into(),
        }
    }

    pub fn actuator(msg: impl Into<String>) -> Self {
        Self::Actuator {
            message: msg.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: msg.into(),
        }
    }

    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::Unsupported {
            message: msg.into(),
        }
    }

    /// Whether this error happened while acquiring hardware at startup.
    pub fn is_setup_failure(&self) -> bool {
        matches!(self, Self::Device { .. } | Self::FileNotFound { .. })
    }
}
