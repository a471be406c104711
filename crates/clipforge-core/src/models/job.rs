use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use crate::decode::de_timestamp;

/// Processing status of a server-side job. Only ever moves forward:
/// `queued -> running -> {done | failed}`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Queued,
    Running,
    Done,
    Failed,
}

impl Display for JobStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            JobStatus::Queued => write!(f, "queued"),
            JobStatus::Running => write!(f, "running"),
            JobStatus::Done => write!(f, "done"),
            JobStatus::Failed => write!(f, "failed"),
        }
    }
}

impl FromStr for JobStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "queued" => Ok(JobStatus::Queued),
            "running" => Ok(JobStatus::Running),
            "done" => Ok(JobStatus::Done),
            "failed" => Ok(JobStatus::Failed),
            _ => Err(anyhow::anyhow!("Invalid job status: {}", s)),
        }
    }
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Done | JobStatus::Failed)
    }

    fn rank(&self) -> u8 {
        match self {
            JobStatus::Queued => 0,
            JobStatus::Running => 1,
            JobStatus::Done | JobStatus::Failed => 2,
        }
    }

    /// Whether observing `next` after `self` respects the forward-only lifecycle.
    pub fn can_advance_to(&self, next: JobStatus) -> bool {
        if self.is_terminal() {
            return *self == next;
        }
        next.rank() >= self.rank()
    }
}

/// Job as returned by `GET /jobs/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: i64,
    pub upload_id: i64,
    pub status: JobStatus,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default, deserialize_with = "de_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "de_timestamp")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Job {
    /// The backend-reported error as sent, or a generic message when the job
    /// failed without one.
    pub fn failure_message(&self) -> String {
        self.error
            .as_deref()
            .filter(|e| !e.trim().is_empty())
            .unwrap_or("Job failed")
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_status_round_trip_strings() {
        for status in [
            JobStatus::Queued,
            JobStatus::Running,
            JobStatus::Done,
            JobStatus::Failed,
        ] {
            assert_eq!(status.to_string().parse::<JobStatus>().unwrap(), status);
        }
        assert!("canceled".parse::<JobStatus>().is_err());
    }

    #[test]
    fn test_forward_only_transitions() {
        assert!(JobStatus::Queued.can_advance_to(JobStatus::Queued));
        assert!(JobStatus::Queued.can_advance_to(JobStatus::Running));
        assert!(JobStatus::Queued.can_advance_to(JobStatus::Done));
        assert!(JobStatus::Running.can_advance_to(JobStatus::Failed));
        assert!(!JobStatus::Running.can_advance_to(JobStatus::Queued));
        assert!(!JobStatus::Done.can_advance_to(JobStatus::Failed));
        assert!(JobStatus::Done.can_advance_to(JobStatus::Done));
    }

    #[test]
    fn test_job_deserializes_with_naive_timestamps() {
        let job: Job = serde_json::from_value(json!({
            "id": 77,
            "upload_id": 42,
            "status": "running",
            "error": null,
            "created_at": "2024-05-01T10:00:00.123456",
            "updated_at": "2024-05-01T10:00:05Z"
        }))
        .unwrap();
        assert_eq!(job.id, 77);
        assert_eq!(job.upload_id, 42);
        assert_eq!(job.status, JobStatus::Running);
        assert!(job.created_at.is_some());
        assert!(job.updated_at.is_some());
        assert!(!job.status.is_terminal());
    }

    #[test]
    fn test_failure_message() {
        let job: Job = serde_json::from_value(json!({
            "id": 1, "upload_id": 2, "status": "failed", "error": "ffmpeg exited with code 1"
        }))
        .unwrap();
        assert_eq!(job.failure_message(), "ffmpeg exited with code 1");

        let job: Job = serde_json::from_value(json!({
            "id": 1, "upload_id": 2, "status": "failed", "error": "  Decoder error:\n  stream 0 "
        }))
        .unwrap();
        assert_eq!(job.failure_message(), "  Decoder error:\n  stream 0 ");

        let job: Job = serde_json::from_value(json!({
            "id": 1, "upload_id": 2, "status": "failed", "error": "  "
        }))
        .unwrap();
        assert_eq!(job.failure_message(), "Job failed");
    }
}
