use thiserror::Error;

use crate::models::{BatchStatusResult, SendResult};

/// Result type alias for vivo push operations
pub type Result<T> = std::result::Result<T, VivoError>;

/// Failures below the gateway's result-code envelope
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// Connection refused, timeout, broken body stream
    #[error("Network failure: {0}")]
    Network(String),

    /// Round trip succeeded but the gateway answered with a non-200 status
    #[error("HTTP status code: {status}")]
    Status { status: u16, body: String },
}

impl TransportError {
    /// Only network failures are worth another attempt
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network(_))
    }
}

/// vivo push client error types
#[derive(Error, Debug)]
pub enum VivoError {
    /// Caller-supplied data violates a protocol constraint. Raised before any network call.
    #[error("Validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The gateway accepted the request but answered with a non-zero result code.
    ///
    /// `result` holds the decoded envelope when the operation hands it back for
    /// diagnostics (e.g. the task id of a failed list push).
    #[error("Gateway returned result code {code}: {body}")]
    Application {
        code: i32,
        body: String,
        result: Option<Box<SendResult>>,
    },

    #[error("Failed to decode gateway response: {0}")]
    Decode(#[from] serde_json::Error),

    /// Status query where some statistics entries could not be decoded.
    /// `result` keeps everything that did parse.
    #[error("Status response partially decoded ({failed} entries dropped): {reason}")]
    PartialStatus {
        result: Box<BatchStatusResult>,
        failed: usize,
        reason: String,
    },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl VivoError {
    /// Check if the transport retry loop retries this error
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport(e) if e.is_retryable())
    }

    /// HTTP status code of a transport-level failure, if any
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Transport(TransportError::Status { status, .. }) => Some(*status),
            _ => None,
        }
    }

    /// Decoded envelope carried alongside an application error
    pub fn send_result(&self) -> Option<&SendResult> {
        match self {
            Self::Application { result, .. } => result.as_deref(),
            _ => None,
        }
    }
}
