use async_trait::async_trait;
use clipforge_api_client::{ApiClient, ProgressFn};
use clipforge_core::models::{
    Job, PresignRequest, PresignResponse, RegisterUploadRequest, RegisterUploadResponse,
};
use clipforge_core::ClientResult;
use std::path::Path;
use tokio_util::sync::CancellationToken;

/// The remote operations an upload goes through. `ApiClient` is the production
/// implementation; tests substitute scripted fakes.
#[async_trait]
pub trait UploadBackend: Send + Sync {
    /// Request a presigned upload target.
    async fn presign(&self, request: &PresignRequest) -> ClientResult<PresignResponse>;

    /// PUT the file bytes to the presigned target, reporting byte progress.
    async fn put_object(
        &self,
        presign: &PresignResponse,
        path: &Path,
        content_length: u64,
        on_progress: ProgressFn,
        cancel: &CancellationToken,
    ) -> ClientResult<()>;

    /// Register the stored object and create the processing job.
    async fn register_upload(
        &self,
        request: &RegisterUploadRequest,
    ) -> ClientResult<RegisterUploadResponse>;

    async fn get_job(&self, job_id: i64) -> ClientResult<Job>;
}

#[async_trait]
impl UploadBackend for ApiClient {
    async fn presign(&self, request: &PresignRequest) -> ClientResult<PresignResponse> {
        ApiClient::presign(self, request).await
    }

    async fn put_object(
        &self,
        presign: &PresignResponse,
        path: &Path,
        content_length: u64,
        on_progress: ProgressFn,
        cancel: &CancellationToken,
    ) -> ClientResult<()> {
        self.put_file(presign, path, content_length, Some(on_progress), cancel)
            .await
    }

    async fn register_upload(
        &self,
        request: &RegisterUploadRequest,
    ) -> ClientResult<RegisterUploadResponse> {
        ApiClient::register_upload(self, request).await
    }

    async fn get_job(&self, job_id: i64) -> ClientResult<Job> {
        ApiClient::get_job(self, job_id).await
    }
}
