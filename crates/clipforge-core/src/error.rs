//! Error types module
//!
//! Every failure the client can surface is a `ClientError`. The variants follow
//! the taxonomy the dashboard exposes to users: local validation, transport,
//! HTTP error responses, job failure and the client-side polling timeout, plus
//! the plumbing errors (decode, state storage, IO) a native client adds.

use std::io;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like validation failures
    Debug,
    /// Warning level - for recoverable issues
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Metadata describing how an error should be presented to the user.
pub trait ErrorMetadata {
    /// Machine-readable error code (e.g., "TRANSPORT_ERROR")
    fn error_code(&self) -> &'static str;

    /// Whether retrying the same action may succeed
    fn is_recoverable(&self) -> bool;

    /// Human-readable message suitable for display
    fn client_message(&self) -> String;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Network error: {message}")]
    Transport { message: String },

    #[error("Request failed with status {status}: {message}")]
    Http {
        status: u16,
        /// Message extracted from the response body.
        message: String,
        /// Raw response body.
        body: String,
    },

    #[error("Invalid response: {0}")]
    Decode(String),

    #[error("Contract violation: {0}")]
    Contract(String),

    #[error("Job {job_id} failed: {message}")]
    JobFailed { job_id: i64, message: String },

    #[error("Timed out after {minutes} minutes")]
    Timeout { minutes: u64 },

    #[error("Canceled")]
    Canceled,

    #[error("State storage error: {0}")]
    Storage(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Result alias used across the client crates.
pub type ClientResult<T> = Result<T, ClientError>;

impl ClientError {
    /// HTTP status for `Http` errors.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_canceled(&self) -> bool {
        matches!(self, ClientError::Canceled)
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        ClientError::Decode(format!("JSON parsing error: {}", err))
    }
}

impl From<validator::ValidationErrors> for ClientError {
    fn from(err: validator::ValidationErrors) -> Self {
        ClientError::Validation(err.to_string())
    }
}

/// Transport failures whose text points at the browser-style "blocked request"
/// family (CORS, connection refused before a response). Matching is on the
/// message text because that is all the transport layer reports.
pub fn looks_like_cors_failure(message: &str) -> bool {
    const PATTERNS: [&str; 4] = [
        "failed to fetch",
        "networkerror",
        "cors",
        "error sending request",
    ];
    let lower = message.to_lowercase();
    PATTERNS.iter().any(|p| lower.contains(p))
}

impl ErrorMetadata for ClientError {
    fn error_code(&self) -> &'static str {
        match self {
            ClientError::Validation(_) => "VALIDATION_ERROR",
            ClientError::Transport { .. } => "TRANSPORT_ERROR",
            ClientError::Http { .. } => "HTTP_ERROR",
            ClientError::Decode(_) => "DECODE_ERROR",
            ClientError::Contract(_) => "CONTRACT_VIOLATION",
            ClientError::JobFailed { .. } => "JOB_FAILED",
            ClientError::Timeout { .. } => "TIMEOUT",
            ClientError::Canceled => "CANCELED",
            ClientError::Storage(_) => "STATE_STORAGE_ERROR",
            ClientError::Io(_) => "IO_ERROR",
        }
    }

    fn is_recoverable(&self) -> bool {
        match self {
            ClientError::Transport { .. } | ClientError::Timeout { .. } => true,
            ClientError::Http { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }

    fn client_message(&self) -> String {
        match self {
            ClientError::Validation(msg) => msg.clone(),
            ClientError::Transport { message } => message.clone(),
            ClientError::Http { message, .. } => message.clone(),
            ClientError::Decode(_) => "The server returned an unexpected response".to_string(),
            ClientError::Contract(msg) => msg.clone(),
            ClientError::JobFailed { message, .. } => message.clone(),
            ClientError::Timeout { .. } => "Timed out".to_string(),
            ClientError::Canceled => "Canceled".to_string(),
            ClientError::Storage(msg) => format!("Could not access local state: {}", msg),
            ClientError::Io(err) => err.to_string(),
        }
    }

    fn log_level(&self) -> LogLevel {
        match self {
            ClientError::Validation(_) | ClientError::Canceled => LogLevel::Debug,
            ClientError::Http { status, .. } if *status < 500 => LogLevel::Warn,
            ClientError::JobFailed { .. } | ClientError::Timeout { .. } => LogLevel::Warn,
            _ => LogLevel::Error,
        }
    }
}
