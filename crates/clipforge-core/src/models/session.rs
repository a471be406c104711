use serde::{Deserialize, Serialize};

use super::upload::RegisterUploadResponse;

/// Resume record for an in-progress upload, persisted client-side after a
/// successful registration and cleared once the job reaches a terminal state.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UploadSession {
    #[serde(default)]
    pub upload_id: Option<i64>,
    #[serde(default)]
    pub job_id: Option<i64>,
    #[serde(default)]
    pub storage_key: Option<String>,
    #[serde(default)]
    pub file_name: Option<String>,
}

impl UploadSession {
    pub fn from_registration(
        registered: &RegisterUploadResponse,
        storage_key: impl Into<String>,
        file_name: impl Into<String>,
    ) -> Self {
        Self {
            upload_id: Some(registered.upload_id),
            job_id: Some(registered.job_id),
            storage_key: Some(storage_key.into()),
            file_name: Some(file_name.into()),
        }
    }

    /// A session can be resumed when it names a job to poll.
    pub fn is_resumable(&self) -> bool {
        self.job_id.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::JobStatus;
    use serde_json::json;

    #[test]
    fn test_from_registration() {
        let registered = RegisterUploadResponse {
            upload_id: 42,
            job_id: 77,
            status: JobStatus::Queued,
        };
        let session = UploadSession::from_registration(&registered, "u/abc.mp4", "podcast.mp4");
        assert_eq!(session.upload_id, Some(42));
        assert_eq!(session.job_id, Some(77));
        assert!(session.is_resumable());

        let value = serde_json::to_value(&session).unwrap();
        assert_eq!(
            value,
            json!({
                "uploadId": 42,
                "jobId": 77,
                "storageKey": "u/abc.mp4",
                "fileName": "podcast.mp4"
            })
        );
    }

    #[test]
    fn test_partial_record_is_not_resumable() {
        let session: UploadSession = serde_json::from_value(json!({ "uploadId": 5 })).unwrap();
        assert!(!session.is_resumable());
    }
}
