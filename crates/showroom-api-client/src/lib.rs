//! Shared HTTP client for the showroom API.
//!
//! Provides a minimal client with configurable auth (Bearer token or X-API-Key),
//! generic GET/POST helpers, and the domain calls used by the photo upload
//! pipeline (record creation, presign negotiation, presigned PUT, multipart
//! fallback, record fetch).

pub mod api;

use anyhow::{Context, Result};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Authentication strategy for the API.
#[derive(Clone, Debug)]
pub enum Auth {
    /// `Authorization: Bearer {token}`
    Bearer(String),
    /// `X-API-Key: {key}`
    XApiKey(String),
}

/// Non-2xx response from the API or the storage backend.
///
/// Wrapped in `anyhow::Error`; callers that need the status code downcast to it.
#[derive(Debug, Clone, thiserror::Error)]
#[error("API request failed with status {status}: {body}")]
pub struct HttpStatusError {
    pub status: u16,
    pub body: String,
}

/// API prefix (e.g. "/api"). Set SHOWROOM_API_PREFIX to match the server.
pub fn api_prefix() -> String {
    std::env::var("SHOWROOM_API_PREFIX").unwrap_or_else(|_| "/api".to_string())
}

/// HTTP client for the showroom API with configurable auth.
#[derive(Clone, Debug)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    auth: Auth,
}

impl ApiClient {
    /// The client-wide timeout is only a backstop; upload attempts carry their own
    /// shorter deadline.
    pub fn new(base_url: String, auth: Auth) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(300))
            .connect_timeout(Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            auth,
        })
    }

    /// Create client from environment using Bearer token:
    /// SHOWROOM_API_URL (or API_URL), SHOWROOM_API_TOKEN (or API_TOKEN).
    pub fn from_env() -> Result<Self> {
        let base_url = std::env::var("SHOWROOM_API_URL")
            .or_else(|_| std::env::var("API_URL"))
            .unwrap_or_else(|_| "http://localhost:3000".to_string());

        let token = std::env::var("SHOWROOM_API_TOKEN")
            .or_else(|_| std::env::var("API_TOKEN"))
            .context("Missing token. Set SHOWROOM_API_TOKEN or API_TOKEN")?;

        Self::new(base_url, Auth::Bearer(token))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn build_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn apply_auth(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.auth {
            Auth::Bearer(token) => request.header("Authorization", format!("Bearer {}", token)),
            Auth::XApiKey(key) => request.header("X-API-Key", key.as_str()),
        }
    }

    /// Turn a non-2xx response into an [`HttpStatusError`].
    pub(crate) async fn ensure_success(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        Err(HttpStatusError {
            status: status.as_u16(),
            body,
        }
        .into())
    }

    /// Apply auth, send, and reject non-2xx responses.
    pub(crate) async fn send(&self, request: reqwest::RequestBuilder) -> Result<Response> {
        let request = self.apply_auth(request);
        let response = request.send().await.context("Failed to send request")?;
        Self::ensure_success(response).await
    }

    /// GET request with optional query parameters. Deserializes JSON response.
    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let url = self.build_url(path);
        let mut request = self.client.get(&url);

        if !query.is_empty() {
            request = request.query(query);
        }

        let response = self.send(request).await?;

        let body: T = response
            .json()
            .await
            .context("Failed to parse response as JSON")?;

        Ok(body)
    }

    /// POST JSON body and deserialize response.
    pub async fn post_json<T: DeserializeOwned, B: serde::Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let url = self.build_url(path);
        let response = self.send(self.client.post(&url).json(body)).await?;

        let body: T = response
            .json()
            .await
            .context("Failed to parse response as JSON")?;

        Ok(body)
    }

    /// POST multipart form. An empty or non-JSON success body yields `None`.
    pub async fn post_multipart<T: DeserializeOwned>(
        &self,
        path: &str,
        form: reqwest::multipart::Form,
    ) -> Result<Option<T>> {
        let url = self.build_url(path);
        let response = self.send(self.client.post(&url).multipart(form)).await?;

        let bytes = response
            .bytes()
            .await
            .context("Failed to read response body")?;

        Ok(parse_optional(&bytes))
    }

    /// Raw client for custom requests. Caller must apply auth via build_url and headers.
    pub fn client(&self) -> &Client {
        &self.client
    }
}

fn parse_optional<T: DeserializeOwned>(bytes: &[u8]) -> Option<T> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return None;
    }
    serde_json::from_slice(bytes).ok()
}

/// Status code carried by an error returned from this client, if any.
pub fn status_of(error: &anyhow::Error) -> Option<u16> {
    error
        .chain()
        .find_map(|cause| cause.downcast_ref::<HttpStatusError>())
        .map(|e| e.status)
}

// Re-export domain response types for convenience.
pub use api::{PhotoUploadResponse, PresignResponse};
