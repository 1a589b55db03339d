use thiserror::Error;

use crate::vault::VaultStatus;

pub type Result<T> = std::result::Result<T, VaultError>;

#[derive(Error, Debug)]
pub enum VaultError {
    #[error("Duration must be greater than zero")]
    InvalidDuration,

    #[error("Duration is locked by the restored backup")]
    DurationLocked,

    #[error("No image loaded")]
    NoImage,

    #[error("Image is {size} bytes, limit is {limit}")]
    ImageTooLarge { size: usize, limit: usize },

    #[error("Cannot {action} while {status}")]
    InvalidState {
        action: &'static str,
        status: VaultStatus,
    },

    #[error("Fate wheel unavailable: {0}")]
    WheelUnavailable(&'static str),

    #[error("Spin already in progress")]
    SpinInProgress,

    #[error("Backup integrity check failed: {0}")]
    Integrity(#[from] IntegrityError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Settings error: {0}")]
    Settings(String),
}

impl VaultError {
    pub fn invalid_state(action: &'static str, status: VaultStatus) -> Self {
        Self::InvalidState { action, status }
    }

    pub fn settings(msg: impl Into<String>) -> Self {
        Self::Settings(msg.into())
    }
}

/// Why a backup artifact could not be decoded
#[derive(Error, Debug)]
pub enum IntegrityError {
    #[error("artifact is not valid base64: {0}")]
    Encoding(#[from] base64::DecodeError),

    #[error("decoded bytes are not UTF-8")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("payload is not structured data: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("payload is missing `{0}`")]
    MissingField(&'static str),
}
