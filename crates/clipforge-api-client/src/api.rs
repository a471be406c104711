//! Domain methods for the Clipforge API client.
//!
//! Request and response types live in `clipforge_core::models`. Inputs that the
//! dashboard validated before submitting are validated here too, so a bad form
//! never reaches the network.

use crate::ApiClient;
use clipforge_core::decode;
use clipforge_core::models::{
    Account, ChangePasswordRequest, Clip, Job, LoginRequest, MessageResponse, OkResponse,
    PresignRequest, PresignResponse, RegisterRequest, RegisterUploadRequest,
    RegisterUploadResponse, UploadGroup,
};
use clipforge_core::validation::validate_required;
use clipforge_core::ClientResult;
use validator::Validate;

impl ApiClient {
    /// Current account (email, plan, credits).
    pub async fn me(&self) -> ClientResult<Account> {
        self.get("/auth/me", &[]).await
    }

    /// Log in; the session cookie is kept by the client for later calls.
    pub async fn login(&self, request: &LoginRequest) -> ClientResult<OkResponse> {
        request.validate()?;
        self.post_json("/auth/login", request).await
    }

    /// Create an account.
    pub async fn register_account(&self, request: &RegisterRequest) -> ClientResult<MessageResponse> {
        request.validate()?;
        self.post_json("/auth/register", request).await
    }

    pub async fn logout(&self) -> ClientResult<()> {
        self.post_empty("/auth/logout").await
    }

    pub async fn change_password(
        &self,
        request: &ChangePasswordRequest,
    ) -> ClientResult<OkResponse> {
        request.validate()?;
        self.post_json("/auth/password", request).await
    }

    /// Request a presigned upload target. Fails with `ClientError::Contract`
    /// when the signing service omits `required_headers`.
    pub async fn presign(&self, request: &PresignRequest) -> ClientResult<PresignResponse> {
        request.validate()?;
        let value = self.post_value("/storage/presign", request).await?;
        let presign = decode::presign_response(value)?;

        tracing::debug!(
            storage_key = %presign.storage_key,
            header_count = presign.required_headers.len(),
            "Presigned upload target received"
        );

        Ok(presign)
    }

    /// Register an uploaded object; the backend creates the processing job.
    pub async fn register_upload(
        &self,
        request: &RegisterUploadRequest,
    ) -> ClientResult<RegisterUploadResponse> {
        validate_required("storage_key", &request.storage_key)?;
        validate_required("original_filename", &request.original_filename)?;
        self.post_json("/uploads/register", request).await
    }

    pub async fn get_job(&self, job_id: i64) -> ClientResult<Job> {
        self.get(&format!("/jobs/{}", job_id), &[]).await
    }

    /// Clips generated from one upload.
    pub async fn list_clips(&self, upload_id: i64) -> ClientResult<Vec<Clip>> {
        self.get("/clips", &[("upload_id", upload_id.to_string())])
            .await
    }

    /// All clips grouped by source upload.
    pub async fn list_grouped_clips(&self) -> ClientResult<Vec<UploadGroup>> {
        self.get("/clips", &[("grouped", "true".to_string())])
            .await
    }
}
