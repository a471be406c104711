//! HTTP client for the Clipforge API.
//!
//! Provides a minimal client with configurable auth (session cookie or Bearer
//! token), generic GET/POST helpers that turn error responses into
//! `ClientError::Http` with the backend's message, domain methods (auth,
//! presign, register, jobs, clips) and the presigned storage PUT.

pub mod api;
pub mod transfer;

use clipforge_core::decode::{self, error_message_from_body};
use clipforge_core::{ClientConfig, ClientError, ClientResult};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::error::Error as StdError;
use std::time::Duration;

pub use transfer::ProgressFn;

/// Authentication strategy for the API.
#[derive(Clone, Debug)]
pub enum Auth {
    /// Rely on the session cookie set by `POST /auth/login`.
    Session,
    /// `Authorization: Bearer {token}`
    Bearer(String),
}

/// HTTP client for the Clipforge API.
#[derive(Clone, Debug)]
pub struct ApiClient {
    client: Client,
    /// Client for presigned storage URLs: no cookies, no API credentials, no timeout.
    storage_client: Client,
    base_url: String,
    auth: Auth,
}

impl ApiClient {
    pub fn new(base_url: String, auth: Auth, request_timeout: Duration) -> ClientResult<Self> {
        let client = Client::builder()
            .timeout(request_timeout)
            .cookie_store(true)
            .build()
            .map_err(|e| ClientError::Contract(format!("Failed to create HTTP client: {}", e)))?;

        let storage_client = Client::builder()
            .connect_timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| {
                ClientError::Contract(format!("Failed to create storage HTTP client: {}", e))
            })?;

        Ok(Self {
            client,
            storage_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            auth,
        })
    }

    /// Create client from configuration: Bearer auth when a token is configured,
    /// session cookie otherwise.
    pub fn from_config(config: &ClientConfig) -> ClientResult<Self> {
        let auth = match &config.api_token {
            Some(token) => Auth::Bearer(token.clone()),
            None => Auth::Session,
        };
        Self::new(
            config.api_url.clone(),
            auth,
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn build_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn apply_auth(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.auth {
            Auth::Session => request,
            Auth::Bearer(token) => request.bearer_auth(token),
        }
    }

    /// GET request with optional query parameters. Returns the JSON body.
    pub async fn get_value(&self, path: &str, query: &[(&str, String)]) -> ClientResult<Value> {
        let url = self.build_url(path);
        let mut request = self.apply_auth(self.client.get(&url));

        if !query.is_empty() {
            request = request.query(query);
        }

        let response = request.send().await.map_err(transport_error)?;
        read_json(response).await
    }

    /// GET and decode into `T`.
    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> ClientResult<T> {
        let value = self.get_value(path, query).await?;
        decode::from_value(value, path)
    }

    /// POST JSON body. Returns the JSON body (null for empty responses).
    pub async fn post_value<B: serde::Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> ClientResult<Value> {
        let url = self.build_url(path);
        let request = self.apply_auth(self.client.post(&url).json(body));

        let response = request.send().await.map_err(transport_error)?;
        read_json(response).await
    }

    /// POST JSON body and decode the response into `T`.
    pub async fn post_json<T: DeserializeOwned, B: serde::Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> ClientResult<T> {
        let value = self.post_value(path, body).await?;
        decode::from_value(value, path)
    }

    /// POST without a body, ignoring the response body. Returns Ok(()) on success.
    pub async fn post_empty(&self, path: &str) -> ClientResult<()> {
        let url = self.build_url(path);
        let request = self.apply_auth(self.client.post(&url));

        let response = request.send().await.map_err(transport_error)?;
        read_json(response).await.map(|_| ())
    }
}

/// Read a response: error statuses become `ClientError::Http` with the message
/// extracted from the body; success bodies are parsed as JSON.
async fn read_json(response: reqwest::Response) -> ClientResult<Value> {
    let status = response.status();
    let text = response.text().await.map_err(transport_error)?;

    if !status.is_success() {
        return Err(http_error(status, text));
    }

    if text.trim().is_empty() {
        return Ok(Value::Null);
    }

    serde_json::from_str(&text)
        .map_err(|e| ClientError::Decode(format!("Failed to parse response as JSON: {}", e)))
}

pub(crate) fn http_error(status: StatusCode, body: String) -> ClientError {
    ClientError::Http {
        status: status.as_u16(),
        message: error_message_from_body(&body),
        body,
    }
}

/// Map a reqwest failure into the client taxonomy. The message carries the
/// whole source chain so transport heuristics can see the root cause.
pub(crate) fn transport_error(err: reqwest::Error) -> ClientError {
    if err.is_builder() {
        return ClientError::Contract(format!("Invalid request: {}", error_chain(&err)));
    }
    if err.is_decode() {
        return ClientError::Decode(error_chain(&err));
    }
    ClientError::Transport {
        message: error_chain(&err),
    }
}

fn error_chain(err: &(dyn StdError + 'static)) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

// Re-export domain types for convenience.
pub use clipforge_core::models::{
    Account, Clip, Job, JobStatus, PresignResponse, RegisterUploadResponse, UploadGroup,
};

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Server;

    fn client_for(server: &Server) -> ApiClient {
        ApiClient::new(server.url(), Auth::Session, Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_error_status_extracts_detail() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/auth/me")
            .with_status(401)
            .with_header("content-type", "application/json")
            .with_body(r#"{"detail":"Not authenticated"}"#)
            .create_async()
            .await;

        let err = client_for(&server)
            .get_value("/auth/me", &[])
            .await
            .unwrap_err();
        match err {
            ClientError::Http {
                status, message, ..
            } => {
                assert_eq!(status, 401);
                assert_eq!(message, "Not authenticated");
            }
            other => panic!("unexpected error: {:?}", other),
        }
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_bearer_auth_header() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/auth/logout")
            .match_header("authorization", "Bearer tok_123")
            .with_status(204)
            .create_async()
            .await;

        let client =
            ApiClient::new(server.url(), Auth::Bearer("tok_123".into()), Duration::from_secs(5))
                .unwrap();
        client.post_empty("/auth/logout").await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_invalid_json_is_decode_error() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/auth/me")
            .with_status(200)
            .with_body("<html>ok</html>")
            .create_async()
            .await;

        let err = client_for(&server)
            .get_value("/auth/me", &[])
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Decode(_)));
    }

    #[tokio::test]
    async fn test_unreachable_host_is_transport_error() {
        // Port 9 (discard) is not expected to accept connections on test hosts
        let client = ApiClient::new(
            "http://127.0.0.1:9".to_string(),
            Auth::Session,
            Duration::from_secs(2),
        )
        .unwrap();
        let err = client.get_value("/auth/me", &[]).await.unwrap_err();
        assert!(matches!(err, ClientError::Transport { .. }), "got {:?}", err);
    }

    #[test]
    fn test_from_config_trims_base_url() {
        let config = ClientConfig {
            api_url: "http://localhost:8000/".to_string(),
            ..Default::default()
        };
        let client = ApiClient::from_config(&config).unwrap();
        assert_eq!(client.base_url(), "http://localhost:8000");
        assert_eq!(client.build_url("/jobs/1"), "http://localhost:8000/jobs/1");
    }
}
