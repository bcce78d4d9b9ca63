//! HTTP plumbing behind the Gemini client.
//!
//! [`Transport`] is the single seam between request construction and the
//! network. [`ReqwestTransport`] is used by default; tests plug in stubs that
//! record what would have been sent.

use async_trait::async_trait;
use reqwest::Client;
use snafu::{ResultExt, Snafu};
use url::Url;

const API_KEY_HEADER: &str = "x-goog-api-key";

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum TransportError {
    #[snafu(display("failed to perform HTTP request to '{url}'"))]
    PerformRequest { source: reqwest::Error, url: Url },

    #[snafu(display("failed to read response body"))]
    ReadBody { source: reqwest::Error },

    /// Raised by non-HTTP transports, such as test doubles.
    #[snafu(display("transport unavailable: {message}"))]
    Unavailable { message: String },
}

/// A JSON POST ready to be sent.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub url: Url,
    pub api_key: String,
    pub body: serde_json::Value,
}

/// The raw status and body of an API reply.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
}

impl ApiResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[async_trait]
pub trait Transport: Send + Sync {
    /// Sends one JSON POST and returns whatever the server answered.
    ///
    /// Non-2xx statuses are not errors at this layer.
    async fn post_json(&self, request: ApiRequest) -> Result<ApiResponse, TransportError>;
}

/// [`Transport`] backed by a shared `reqwest::Client`.
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    http_client: Client,
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn post_json(&self, request: ApiRequest) -> Result<ApiResponse, TransportError> {
        let ApiRequest { url, api_key, body } = request;

        let response = self
            .http_client
            .post(url.clone())
            .header(API_KEY_HEADER, api_key)
            .json(&body)
            .send()
            .await
            .context(PerformRequestSnafu { url })?;

        let status = response.status().as_u16();
        let body = response.text().await.context(ReadBodySnafu)?;

        Ok(ApiResponse { status, body })
    }
}
