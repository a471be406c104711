use crate::failure::UploadFailure;
use clipforge_core::models::{Job, UploadSession};
use clipforge_core::{ClientError, ClientResult};
use serde::Serialize;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::path::{Path, PathBuf};

const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

/// Lifecycle of a single upload.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum UploadState {
    Idle,
    Selected,
    Uploading,
    Processing,
    Done,
    Error,
    Canceled,
}

impl UploadState {
    /// An upload or a polling loop is in flight.
    pub fn is_busy(&self) -> bool {
        matches!(self, UploadState::Uploading | UploadState::Processing)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            UploadState::Done | UploadState::Error | UploadState::Canceled
        )
    }
}

impl Display for UploadState {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let name = match self {
            UploadState::Idle => "idle",
            UploadState::Selected => "selected",
            UploadState::Uploading => "uploading",
            UploadState::Processing => "processing",
            UploadState::Done => "done",
            UploadState::Error => "error",
            UploadState::Canceled => "canceled",
        };
        f.pad(name)
    }
}

/// A local file chosen for upload.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SelectedFile {
    pub path: PathBuf,
    pub name: String,
    pub size: u64,
    pub content_type: String,
}

impl SelectedFile {
    /// Inspect `path`: it must be a regular, non-empty file.
    pub async fn inspect(path: impl AsRef<Path>) -> ClientResult<Self> {
        let path = path.as_ref();
        let metadata = tokio::fs::metadata(path).await?;

        if !metadata.is_file() {
            return Err(ClientError::Validation(format!(
                "{} is not a regular file",
                path.display()
            )));
        }
        if metadata.len() == 0 {
            return Err(ClientError::Validation(format!(
                "{} is empty",
                path.display()
            )));
        }

        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .filter(|n| !n.is_empty())
            .ok_or_else(|| {
                ClientError::Validation(format!("{} has no usable file name", path.display()))
            })?
            .to_string();

        Ok(Self {
            path: path.to_path_buf(),
            content_type: guess_content_type(&name),
            name,
            size: metadata.len(),
        })
    }
}

pub fn guess_content_type(file_name: &str) -> String {
    mime_guess::from_path(file_name)
        .first()
        .map(|mime| mime.essence_str().to_string())
        .unwrap_or_else(|| FALLBACK_CONTENT_TYPE.to_string())
}

/// Everything a renderer needs to draw the upload panel.
#[derive(Debug, Clone, Serialize)]
pub struct UploadSnapshot {
    pub state: UploadState,
    /// Overall progress, 0..=100.
    pub progress: u8,
    pub dragging: bool,
    pub file: Option<SelectedFile>,
    pub session: Option<UploadSession>,
    pub job: Option<Job>,
    pub failure: Option<UploadFailure>,
}

impl Default for UploadSnapshot {
    fn default() -> Self {
        Self {
            state: UploadState::Idle,
            progress: 0,
            dragging: false,
            file: None,
            session: None,
            job: None,
            failure: None,
        }
    }
}
