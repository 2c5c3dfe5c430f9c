//! Provider request/response types.

use serde::Serialize;
use thiserror::Error;

/// Errors that can occur when talking to a synthesis provider.
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Engine failed: {0}")]
    EngineFailed(String),

    #[error("Transcoding failed: {0}")]
    TranscodeFailed(String),

    #[error("Provider produced no audio")]
    EmptyAudio,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl BackendError {
    /// Classify a transport error from the HTTP client.
    pub(crate) fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            BackendError::Timeout(err.to_string())
        } else {
            BackendError::ConnectionFailed(err.to_string())
        }
    }
}

/// Gender label attached to a voice.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub enum Gender {
    Male,
    Female,
    Neutral,
}

/// A voice installed in the local synthesis engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineVoice {
    /// Engine-native identifier passed back on synthesis.
    pub id: String,
    pub name: String,
    pub gender: Gender,
}
