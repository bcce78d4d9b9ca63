use serde::Deserialize;
use snafu::{ResultExt, Snafu};
use std::{fmt, sync::Arc};
use tracing::{debug, instrument, warn};
use url::Url;

use crate::{
    generation::{ContentBuilder, GenerateContentRequest, GenerationResponse},
    report::ErrorKind,
    transport::{ApiRequest, ApiResponse, ReqwestTransport, Transport, TransportError},
};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/";

/// Environment variables consulted, in order, for the API key.
pub const API_KEY_ENV_VARS: &[&str] = &["GEMINI_API_KEY", "API_KEY"];

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    #[snafu(display("no API key configured; set one of {}", variables.join(", ")))]
    MissingApiKey { variables: Vec<String> },

    #[snafu(display("failed to parse base URL"))]
    InvalidBaseUrl { source: url::ParseError },

    #[snafu(display("failed to construct URL for endpoint '{endpoint}'"))]
    ConstructUrl {
        source: url::ParseError,
        endpoint: String,
    },

    #[snafu(display("failed to serialize request body"))]
    EncodeRequest { source: serde_json::Error },

    #[snafu(display("failed to reach the Gemini API"))]
    Transport { source: TransportError },

    #[snafu(display("bad response from server; code {code}; description: {description}"))]
    BadResponse {
        /// HTTP status code
        code: u16,
        /// Response body, or the message extracted from it
        description: String,
        /// `ErrorInfo.reason` from the Google error envelope, e.g. `API_KEY_INVALID`
        reason: Option<String>,
    },

    #[snafu(display("failed to deserialize JSON response"))]
    Deserialize { source: serde_json::Error },
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::MissingApiKey { .. } | Error::InvalidBaseUrl { .. } => ErrorKind::Configuration,
            Error::BadResponse { code, reason, .. } => {
                if reason.as_deref() == Some("API_KEY_INVALID") || matches!(*code, 401 | 403) {
                    ErrorKind::Configuration
                } else if matches!(*code, 400 | 413 | 415) {
                    ErrorKind::Media
                } else {
                    ErrorKind::Unexpected
                }
            }
            Error::ConstructUrl { .. }
            | Error::EncodeRequest { .. }
            | Error::Transport { .. }
            | Error::Deserialize { .. } => ErrorKind::Unexpected,
        }
    }
}

/// Gemini model identifiers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Model {
    #[default]
    Gemini25Flash,
    Gemini25FlashLite,
    Gemini25Pro,
    /// Any other model; stored with its `models/` prefix
    Custom(String),
}

impl Model {
    pub fn as_str(&self) -> &str {
        match self {
            Model::Gemini25Flash => "models/gemini-2.5-flash",
            Model::Gemini25FlashLite => "models/gemini-2.5-flash-lite",
            Model::Gemini25Pro => "models/gemini-2.5-pro",
            Model::Custom(name) => name,
        }
    }
}

impl From<String> for Model {
    fn from(name: String) -> Self {
        if name.starts_with("models/") {
            Model::Custom(name)
        } else {
            Model::Custom(format!("models/{name}"))
        }
    }
}

impl From<&str> for Model {
    fn from(name: &str) -> Self {
        Model::from(name.to_string())
    }
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where the API key comes from.
///
/// `Environment` is resolved on every request, so the key can be provided
/// or rotated after the client is built.
#[derive(Clone)]
pub enum Credential {
    Static(String),
    Environment(Vec<String>),
}

impl Credential {
    /// Reads [`API_KEY_ENV_VARS`] at call time.
    pub fn from_env() -> Self {
        Credential::Environment(API_KEY_ENV_VARS.iter().map(|v| v.to_string()).collect())
    }

    /// Returns the key, treating empty values as absent.
    pub fn resolve(&self) -> Result<String, Error> {
        let key = match self {
            Credential::Static(key) => Some(key.trim().to_string()),
            Credential::Environment(variables) => variables
                .iter()
                .filter_map(|name| std::env::var(name).ok())
                .map(|value| value.trim().to_string())
                .find(|value| !value.is_empty()),
        };

        match key {
            Some(key) if !key.is_empty() => Ok(key),
            _ => MissingApiKeySnafu {
                variables: match self {
                    Credential::Static(_) => vec!["an explicit API key".to_string()],
                    Credential::Environment(variables) => variables.clone(),
                },
            }
            .fail(),
        }
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credential::Static(_) => f.write_str("Credential::Static(<redacted>)"),
            Credential::Environment(variables) => {
                f.debug_tuple("Credential::Environment").field(variables).finish()
            }
        }
    }
}

impl From<String> for Credential {
    fn from(key: String) -> Self {
        Credential::Static(key)
    }
}

impl From<&str> for Credential {
    fn from(key: &str) -> Self {
        Credential::Static(key.to_string())
    }
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
    #[serde(default)]
    details: Vec<ErrorDetail>,
}

#[derive(Deserialize)]
struct ErrorDetail {
    reason: Option<String>,
}

/// Internal client for making requests to the Gemini API
#[derive(Clone)]
pub(crate) struct GeminiClient {
    transport: Arc<dyn Transport>,
    credential: Credential,
    pub model: Model,
    base_url: Url,
}

impl GeminiClient {
    /// Generate content
    #[instrument(skip_all, fields(model = %self.model))]
    pub(crate) async fn generate_content_raw(
        &self,
        request: GenerateContentRequest,
    ) -> Result<GenerationResponse, Error> {
        // Resolved before anything else so a missing key never reaches the network.
        let api_key = self.credential.resolve()?;
        let url = self.build_url("generateContent")?;
        let body = serde_json::to_value(&request).context(EncodeRequestSnafu)?;

        let response = self
            .transport
            .post_json(ApiRequest { url, api_key, body })
            .await
            .context(TransportSnafu)?;
        let response = Self::check_response(response)?;

        debug!(bytes = response.body.len(), "generateContent response received");
        serde_json::from_str(&response.body).context(DeserializeSnafu)
    }

    /// Turns a non-2xx reply into [`Error::BadResponse`]
    fn check_response(response: ApiResponse) -> Result<ApiResponse, Error> {
        if response.is_success() {
            return Ok(response);
        }

        let (description, reason) = match serde_json::from_str::<ErrorEnvelope>(&response.body) {
            Ok(envelope) => (
                envelope.error.message.unwrap_or_else(|| response.body.clone()),
                envelope.error.details.into_iter().find_map(|d| d.reason),
            ),
            Err(_) => (response.body.clone(), None),
        };

        warn!(code = response.status, reason = reason.as_deref(), "Gemini API rejected request");
        BadResponseSnafu {
            code: response.status,
            description,
            reason,
        }
        .fail()
    }

    /// Build a URL for the API
    fn build_url(&self, endpoint: &str) -> Result<Url, Error> {
        let url_str = format!("{}{}:{}", self.base_url, self.model, endpoint);
        Url::parse(&url_str).context(ConstructUrlSnafu {
            endpoint: endpoint.to_string(),
        })
    }
}

/// Client for the Gemini API
#[derive(Clone)]
pub struct Gemini {
    client: Arc<GeminiClient>,
}

impl Gemini {
    /// Create a new client with the specified API key and the default model
    pub fn new(api_key: impl Into<String>) -> Result<Self, Error> {
        Self::with_model(api_key, Model::default())
    }

    /// Create a new client that reads the API key from the environment on every call
    pub fn from_env() -> Result<Self, Error> {
        let base_url = Url::parse(DEFAULT_BASE_URL).context(InvalidBaseUrlSnafu)?;
        Ok(Self::with_model_and_base_url(
            Credential::from_env(),
            Model::default(),
            base_url,
        ))
    }

    /// Create a new client with the specified API key and model
    pub fn with_model(api_key: impl Into<String>, model: impl Into<Model>) -> Result<Self, Error> {
        let base_url = Url::parse(DEFAULT_BASE_URL).context(InvalidBaseUrlSnafu)?;
        Ok(Self::with_model_and_base_url(
            Credential::Static(api_key.into()),
            model,
            base_url,
        ))
    }

    /// Create a new client with the specified credential, model, and base URL
    pub fn with_model_and_base_url(
        credential: impl Into<Credential>,
        model: impl Into<Model>,
        base_url: Url,
    ) -> Self {
        let client = GeminiClient {
            transport: Arc::new(ReqwestTransport::default()),
            credential: credential.into(),
            model: model.into(),
            base_url,
        };
        Self {
            client: Arc::new(client),
        }
    }

    /// Replace the HTTP transport, e.g. with a custom `reqwest::Client` or a test double
    pub fn with_transport(self, transport: impl Transport + 'static) -> Self {
        let client = GeminiClient {
            transport: Arc::new(transport),
            ..GeminiClient::clone(&self.client)
        };
        Self {
            client: Arc::new(client),
        }
    }

    /// The model requests are sent to
    pub fn model(&self) -> &Model {
        &self.client.model
    }

    /// Start building a content generation request
    pub fn generate_content(&self) -> ContentBuilder {
        ContentBuilder::new(self.client.clone())
    }
}

impl fmt::Debug for Gemini {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Gemini")
            .field("model", &self.client.model)
            .field("base_url", &self.client.base_url.as_str())
            .field("credential", &self.client.credential)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn custom_model_names_get_models_prefix() {
        assert_eq!(Model::from("gemini-2.0-flash").as_str(), "models/gemini-2.0-flash");
        assert_eq!(
            Model::from("models/gemini-2.0-flash").as_str(),
            "models/gemini-2.0-flash"
        );
    }

    #[test]
    fn blank_static_key_is_missing() {
        let err = Credential::from("   ").resolve().unwrap_err();
        assert!(matches!(err, Error::MissingApiKey { .. }));
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn credential_debug_hides_key() {
        let rendered = format!("{:?}", Credential::from("secret-key"));
        assert!(!rendered.contains("secret-key"));
    }

    #[test]
    fn bad_response_extracts_reason_from_google_envelope() {
        let body = r#"{"error":{"code":400,"message":"API key not valid. Please pass a valid API key.","status":"INVALID_ARGUMENT","details":[{"@type":"type.googleapis.com/google.rpc.ErrorInfo","reason":"API_KEY_INVALID","domain":"googleapis.com"}]}}"#;
        let err = GeminiClient::check_response(ApiResponse {
            status: 400,
            body: body.to_string(),
        })
        .unwrap_err();

        match &err {
            Error::BadResponse {
                code,
                description,
                reason,
            } => {
                assert_eq!(*code, 400);
                assert!(description.starts_with("API key not valid"));
                assert_eq!(reason.as_deref(), Some("API_KEY_INVALID"));
            }
            other => panic!("expected BadResponse, got {other:?}"),
        }
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn bad_response_status_maps_to_kind() {
        let kind_for = |status| {
            GeminiClient::check_response(ApiResponse {
                status,
                body: "nope".to_string(),
            })
            .unwrap_err()
            .kind()
        };

        assert_eq!(kind_for(400), ErrorKind::Media);
        assert_eq!(kind_for(403), ErrorKind::Configuration);
        assert_eq!(kind_for(503), ErrorKind::Unexpected);
    }
}
