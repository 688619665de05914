//! Error types for capture, the backend boundary and the client flows

use thiserror::Error;

/// Failures of a capture session
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CaptureError {
    #[error("Audio input unavailable: {0}")]
    DeviceUnavailable(String),
    #[error("Capture session already started")]
    AlreadyStarted,
    #[error("Capture session already stopped")]
    AlreadyStopped,
    #[error("Failed to encode recording: {0}")]
    Encoding(String),
}

/// Failures crossing the backend boundary
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    #[error("Invalid backend url: {0}")]
    InvalidUrl(String),
    #[error("Transport error: {0}")]
    Transport(String),
    #[error("Backend returned {status}: {message}")]
    Status { status: u16, message: String },
    #[error("Failed to decode backend response: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for BackendError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            BackendError::Decode(e.to_string())
        } else {
            BackendError::Transport(e.to_string())
        }
    }
}

/// Failures of the client operations, one per capability
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    #[error("Similar song query failed: {0}")]
    QueryFailed(String),
    #[error("Song lookup failed: {0}")]
    LookupFailed(String),
    #[error("Song insert failed: {0}")]
    InsertFailed(String),
    #[error("Ingest failed: {0}")]
    IngestFailed(String),
    #[error("Song delete failed: {0}")]
    DeleteFailed(String),
    #[error("Song listing failed: {0}")]
    ListFailed(String),
    #[error("Backend unreachable: {0}")]
    BackendUnreachable(String),
}
