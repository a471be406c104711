//! Explicit decoding of loosely-typed API responses.
//!
//! The backend's JSON is not always uniform (timestamps with or without an
//! offset, header maps with non-string values, error bodies in several
//! shapes). These functions turn it into typed values or a `ClientError`
//! instead of leaving shape checks to call sites.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::error::ClientError;
use crate::models::PresignResponse;

const GENERIC_ERROR: &str = "Request failed";

/// Parse an RFC 3339 timestamp, or a naive ISO timestamp interpreted as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

/// Serde adapter for optional timestamps; unparseable values decode as `None`.
pub fn de_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(|raw| {
        let parsed = parse_timestamp(raw);
        if parsed.is_none() {
            tracing::debug!(value = %raw, "Ignoring unparseable timestamp");
        }
        parsed
    }))
}

/// Decode a JSON value into `T`, naming what was being decoded on failure.
pub fn from_value<T: DeserializeOwned>(value: Value, what: &str) -> Result<T, ClientError> {
    serde_json::from_value(value).map_err(|e| ClientError::Decode(format!("{}: {}", what, e)))
}

/// Extract a human-readable message from an error response body.
///
/// Precedence: `detail`, `message`, `error` fields of a JSON object; then the
/// JSON itself stringified; then the raw text; then a generic message.
pub fn error_message_from_body(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return GENERIC_ERROR.to_string();
    }

    match serde_json::from_str::<Value>(trimmed) {
        Ok(Value::Object(map)) => {
            let found = ["detail", "message", "error"]
                .iter()
                .filter_map(|key| map.get(*key))
                .find_map(message_from_field);
            found.unwrap_or_else(|| Value::Object(map).to_string())
        }
        Ok(Value::Null) => GENERIC_ERROR.to_string(),
        Ok(Value::String(s)) if !s.trim().is_empty() => s,
        Ok(other) => other.to_string(),
        Err(_) => trimmed.to_string(),
    }
}

fn message_from_field(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) if s.trim().is_empty() => None,
        Value::String(s) => Some(s.clone()),
        // Validation errors arrive as a list of {loc, msg} objects
        Value::Array(items) => {
            let messages: Vec<String> = items
                .iter()
                .filter_map(|item| match item {
                    Value::Object(obj) => obj
                        .get("msg")
                        .and_then(Value::as_str)
                        .map(String::from),
                    Value::String(s) => Some(s.clone()),
                    _ => None,
                })
                .collect();
            if messages.is_empty() {
                Some(value.to_string())
            } else {
                Some(messages.join("; "))
            }
        }
        other => Some(other.to_string()),
    }
}

/// Decode a presign response. `required_headers` must be present and
/// non-empty; scalar header values are stringified, nulls are skipped.
pub fn presign_response(value: Value) -> Result<PresignResponse, ClientError> {
    #[derive(Deserialize)]
    struct RawPresign {
        put_url: Option<String>,
        storage_key: Option<String>,
        #[serde(default)]
        required_headers: Option<BTreeMap<String, Value>>,
    }

    let raw: RawPresign = from_value(value, "presign response")?;

    let put_url = raw
        .put_url
        .filter(|u| !u.trim().is_empty())
        .ok_or_else(|| ClientError::Contract("Presign response is missing put_url".to_string()))?;
    let storage_key = raw
        .storage_key
        .filter(|k| !k.trim().is_empty())
        .ok_or_else(|| {
            ClientError::Contract("Presign response is missing storage_key".to_string())
        })?;

    let mut required_headers = BTreeMap::new();
    for (name, value) in raw.required_headers.unwrap_or_default() {
        let value = match value {
            Value::Null => {
                tracing::debug!(header = %name, "Skipping null presign header");
                continue;
            }
            Value::String(s) => s,
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            other => {
                return Err(ClientError::Contract(format!(
                    "Presign header {} has a non-scalar value: {}",
                    name, other
                )))
            }
        };
        required_headers.insert(name, value);
    }

    if required_headers.is_empty() {
        return Err(ClientError::Contract(
            "Presign response is missing required_headers".to_string(),
        ));
    }

    Ok(PresignResponse {
        put_url,
        storage_key,
        required_headers,
    })
}
