use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::decode::de_timestamp;

/// Generated clip (`GET /clips?upload_id=`). Fields the client does not model
/// are kept in `extra` so they survive a round trip to the terminal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Clip {
    pub id: i64,
    pub upload_id: i64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub duration_seconds: Option<f64>,
    #[serde(default, deserialize_with = "de_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Clips grouped by their source upload (`GET /clips?grouped=true`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadGroup {
    pub upload_id: i64,
    #[serde(default)]
    pub original_filename: Option<String>,
    #[serde(default, deserialize_with = "de_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub clips: Vec<Clip>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
