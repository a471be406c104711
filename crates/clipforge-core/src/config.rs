//! Configuration module
//!
//! Client configuration is read from the environment (after loading `.env`):
//! API location and credentials, where client-persisted state lives, and the
//! request timeout applied to API calls.

use std::env;
use std::path::PathBuf;

use crate::state_types::StateBackend;

const DEFAULT_API_URL: &str = "http://localhost:8000";
const DEFAULT_STATE_DIR: &str = ".clipforge";
const REQUEST_TIMEOUT_SECS: u64 = 60;

/// Client configuration
#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub api_url: String,
    /// Bearer token; when unset the client relies on the session cookie from `/auth/login`.
    pub api_token: Option<String>,
    pub state_backend: StateBackend,
    pub state_dir: PathBuf,
    /// Timeout for API calls. Storage PUTs are not bounded by it.
    pub request_timeout_secs: u64,
    pub log_format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            api_token: None,
            state_backend: StateBackend::File,
            state_dir: PathBuf::from(DEFAULT_STATE_DIR),
            request_timeout_secs: REQUEST_TIMEOUT_SECS,
            log_format: LogFormat::Pretty,
        }
    }
}

impl ClientConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        Self::from_vars(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    pub fn from_vars<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_url = lookup("CLIPFORGE_API_URL")
            .or_else(|| lookup("API_URL"))
            .unwrap_or_else(|| DEFAULT_API_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let api_token = lookup("CLIPFORGE_API_TOKEN").filter(|t| !t.trim().is_empty());

        let state_backend = match lookup("CLIPFORGE_STATE_BACKEND") {
            Some(value) => value.parse()?,
            None => StateBackend::File,
        };

        let state_dir = lookup("CLIPFORGE_STATE_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_STATE_DIR));

        let request_timeout_secs = lookup("CLIPFORGE_REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|| REQUEST_TIMEOUT_SECS.to_string())
            .parse()
            .map_err(|_| anyhow::anyhow!("CLIPFORGE_REQUEST_TIMEOUT_SECS must be a valid number"))?;

        let log_format = match lookup("CLIPFORGE_LOG_FORMAT")
            .unwrap_or_default()
            .to_lowercase()
            .as_str()
        {
            "json" => LogFormat::Json,
            _ => LogFormat::Pretty,
        };

        let config = Self {
            api_url,
            api_token,
            state_backend,
            state_dir,
            request_timeout_secs,
            log_format,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if !(self.api_url.starts_with("http://") || self.api_url.starts_with("https://")) {
            return Err(anyhow::anyhow!(
                "CLIPFORGE_API_URL must be an http:// or https:// URL, got '{}'",
                self.api_url
            ));
        }

        if self.request_timeout_secs == 0 {
            return Err(anyhow::anyhow!(
                "CLIPFORGE_REQUEST_TIMEOUT_SECS must be greater than zero"
            ));
        }

        Ok(())
    }
}
