//! Error types shared by the verification pipeline, the upload client and the UI.

use thiserror::Error;

/// Errors surfaced to the user or carried across the worker/UI channels.
///
/// Every variant holds owned strings so the error is `Clone` and can be kept
/// in UI state after it has been reported.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UploaderError {
    /// The entry link is missing a parameter or carries an invalid one.
    #[error("{0}")]
    Session(String),

    /// Reading a picked file from disk failed.
    #[error("Failed to read {path}: {message}")]
    Io { path: String, message: String },

    /// The request never produced an HTTP response.
    #[error("Network error: {0}")]
    Transport(String),

    /// The server answered with a non-success status.
    #[error("Server rejected the request ({status}): {detail}")]
    Server { status: u16, detail: String },

    /// The response body did not line up with what was submitted.
    #[error("Unexpected server response: expected {expected} results, received {received}")]
    Protocol { expected: usize, received: usize },

    /// The response body could not be parsed.
    #[error("Malformed server response: {0}")]
    Decode(String),

    /// The background runtime could not be started.
    #[error("Background runtime error: {0}")]
    Runtime(String),
}

impl UploaderError {
    pub fn session(message: impl Into<String>) -> Self {
        Self::Session(message.into())
    }

    pub fn io(path: impl Into<String>, err: &std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            message: err.to_string(),
        }
    }
}

impl From<reqwest::Error> for UploaderError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for UploaderError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, UploaderError>;
