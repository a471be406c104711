use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use validator::Validate;

use super::job::JobStatus;
use super::settings::{AspectRatio, ResolvedOutputSettings};

/// Metadata header the signing service attaches itself; a client must never send it.
pub const FORBIDDEN_STORAGE_HEADER: &str = "x-amz-meta-user_id";

/// Request for a presigned upload target (`POST /storage/presign`).
#[derive(Debug, Clone, Serialize, Validate)]
pub struct PresignRequest {
    /// Original filename
    #[validate(length(
        min = 1,
        max = 255,
        message = "Filename must be between 1 and 255 characters"
    ))]
    pub filename: String,
    /// Content type (MIME type)
    #[validate(length(
        min = 1,
        max = 255,
        message = "Content type must be between 1 and 255 characters"
    ))]
    pub content_type: String,
    /// File size in bytes
    #[validate(range(min = 1, message = "File size must be at least 1 byte"))]
    pub content_length: u64,
}

/// Presigned upload target. Built through `decode::presign_response`, which
/// rejects responses without `required_headers`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PresignResponse {
    /// URL to PUT the raw bytes to
    pub put_url: String,
    /// Object key to pass to `/uploads/register`
    pub storage_key: String,
    /// Headers the PUT must carry exactly (the signature covers them)
    pub required_headers: BTreeMap<String, String>,
}

impl PresignResponse {
    /// Headers to send with the storage PUT: the signed set minus the
    /// server-owned user metadata header.
    pub fn upload_headers(&self) -> Vec<(String, String)> {
        self.required_headers
            .iter()
            .filter(|(name, _)| !name.eq_ignore_ascii_case(FORBIDDEN_STORAGE_HEADER))
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect()
    }
}

/// Body of `POST /uploads/register`.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct RegisterUploadRequest {
    pub original_filename: String,
    pub storage_key: String,
    pub aspect_ratio: AspectRatio,
    pub captions_enabled: bool,
    pub watermark_enabled: bool,
    pub caption_style: Option<String>,
}

impl RegisterUploadRequest {
    pub fn new(
        original_filename: impl Into<String>,
        storage_key: impl Into<String>,
        settings: &ResolvedOutputSettings,
    ) -> Self {
        Self {
            original_filename: original_filename.into(),
            storage_key: storage_key.into(),
            aspect_ratio: settings.aspect_ratio,
            captions_enabled: settings.captions_enabled,
            watermark_enabled: settings.watermark_enabled,
            caption_style: settings.caption_style.clone(),
        }
    }
}

/// Response of `POST /uploads/register`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RegisterUploadResponse {
    pub upload_id: i64,
    pub job_id: i64,
    pub status: JobStatus,
}
