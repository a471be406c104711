use clipforge_core::{looks_like_cors_failure, truncate_string, ClientError, ErrorMetadata};
use serde::Serialize;
use std::fmt::{Display, Formatter, Result as FmtResult};

/// Storage error bodies are shown at most this many characters long.
pub const MAX_BODY_DETAIL: usize = 300;

pub const CORS_REMEDIATION: &str = "The storage bucket rejected the browser-style upload request. \
Its CORS policy must allow PUT from this origin with the Content-Type and x-amz-meta-* \
request headers, and expose the ETag response header.";

/// Step of the upload flow an error came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Validate,
    Presign,
    Transfer,
    Register,
    Poll,
}

/// User-facing title and detail for a failed upload.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct UploadFailure {
    pub title: String,
    pub detail: String,
}

impl Display for UploadFailure {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        if self.detail.is_empty() {
            write!(f, "{}", self.title)
        } else {
            write!(f, "{}: {}", self.title, self.detail)
        }
    }
}

impl UploadFailure {
    pub fn new(title: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            detail: detail.into(),
        }
    }

    /// Classify `err` raised during `stage`.
    pub fn classify(stage: Stage, err: &ClientError) -> Self {
        // Job failure and timeout read the same whichever step surfaced them.
        match err {
            ClientError::JobFailed { message, .. } => {
                return Self::new("Processing failed", message.clone())
            }
            ClientError::Timeout { minutes } => {
                return Self::new(
                    "Timed out",
                    format!("The job did not finish within {} minutes", minutes),
                )
            }
            ClientError::Validation(message) => {
                return Self::new("Cannot start upload", message.clone())
            }
            _ => {}
        }

        match stage {
            Stage::Transfer => match err {
                ClientError::Transport { message } if looks_like_cors_failure(message) => {
                    Self::new("Upload failed (CORS)", CORS_REMEDIATION)
                }
                ClientError::Http { status, body, .. } => Self::new(
                    format!("Upload failed (HTTP {})", status),
                    truncate_string(body.trim(), MAX_BODY_DETAIL),
                ),
                other => Self::new("Upload failed", other.client_message()),
            },
            Stage::Validate | Stage::Presign => Self::new("Upload failed", err.client_message()),
            Stage::Register => Self::new("Registration failed", err.client_message()),
            Stage::Poll => Self::new("Status check failed", err.client_message()),
        }
    }
}
