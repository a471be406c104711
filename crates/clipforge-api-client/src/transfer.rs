//! Presigned storage PUT with byte-level progress and cancellation.

use crate::{http_error, transport_error, ApiClient};
use clipforge_core::models::PresignResponse;
use clipforge_core::{ClientError, ClientResult};
use futures::StreamExt;
use reqwest::header::CONTENT_LENGTH;
use reqwest::Body;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::fs::File;
use tokio_util::io::ReaderStream;
use tokio_util::sync::CancellationToken;

/// Progress callback: `(bytes_sent, total_bytes)`.
pub type ProgressFn = Arc<dyn Fn(u64, u64) + Send + Sync>;

const CHUNK_SIZE: usize = 256 * 1024;

impl ApiClient {
    /// PUT the file at `path` to the presigned URL.
    ///
    /// Sends exactly the signed header set minus `x-amz-meta-user_id`, adding
    /// `Content-Length` when the signing service did not include it. The request
    /// goes through the storage client, which carries no cookies and no API
    /// credentials. Cancelling `cancel` drops the request mid-body and yields
    /// `ClientError::Canceled`.
    pub async fn put_file(
        &self,
        presign: &PresignResponse,
        path: &Path,
        content_length: u64,
        on_progress: Option<ProgressFn>,
        cancel: &CancellationToken,
    ) -> ClientResult<()> {
        let file = File::open(path).await?;
        let sent = Arc::new(AtomicU64::new(0));

        let counter = Arc::clone(&sent);
        let stream = ReaderStream::with_capacity(file, CHUNK_SIZE).map(move |chunk| {
            if let Ok(bytes) = &chunk {
                let total_sent =
                    counter.fetch_add(bytes.len() as u64, Ordering::Relaxed) + bytes.len() as u64;
                if let Some(callback) = &on_progress {
                    callback(total_sent.min(content_length), content_length);
                }
            }
            chunk
        });

        let mut request = self.storage_client.put(&presign.put_url);
        let headers = presign.upload_headers();
        let has_length = headers
            .iter()
            .any(|(name, _)| name.eq_ignore_ascii_case(CONTENT_LENGTH.as_str()));
        for (name, value) in &headers {
            request = request.header(name.as_str(), value.as_str());
        }
        if !has_length {
            request = request.header(CONTENT_LENGTH, content_length);
        }

        let started = Instant::now();
        tracing::info!(
            storage_key = %presign.storage_key,
            content_length = content_length,
            "Starting storage upload"
        );

        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::info!(
                    storage_key = %presign.storage_key,
                    bytes_sent = sent.load(Ordering::Relaxed),
                    "Storage upload canceled"
                );
                return Err(ClientError::Canceled);
            }
            result = request.body(Body::wrap_stream(stream)).send() => {
                result.map_err(transport_error)?
            }
        };

        let status = response.status();
        if !status.is_success() {
            let body = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(ClientError::Canceled),
                text = response.text() => text.unwrap_or_default(),
            };
            tracing::warn!(
                storage_key = %presign.storage_key,
                status = status.as_u16(),
                "Storage rejected upload"
            );
            return Err(http_error(status, body));
        }

        tracing::info!(
            storage_key = %presign.storage_key,
            bytes_sent = sent.load(Ordering::Relaxed),
            duration_ms = started.elapsed().as_millis() as u64,
            "Storage upload complete"
        );

        Ok(())
    }
}
