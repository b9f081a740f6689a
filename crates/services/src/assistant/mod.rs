//! The shopping-assistant gateway.
//!
//! Stateless bridge to the external text-generation API: serialize the
//! current catalog into a textual context, wrap the shopper's question in a
//! single prompt, forward it, and hand the reply text back verbatim. All
//! intelligence lives on the other side of the wire.
//!
//! Failures never retry automatically; each failure mode maps to a distinct
//! human-readable message (see [`AssistantError::user_message`]) that the
//! caller can show as the assistant's reply.

mod context;
mod error;

pub use context::{build_prompt, catalog_context};
pub use error::AssistantError;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::products::Product;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_MODEL: &str = "gemini-2.0-flash";

/// Assistant gateway configuration.
///
/// The API key is optional: without one the client still constructs, and
/// every request fails with the configuration guidance message instead of
/// crashing at startup.
#[derive(Clone)]
pub struct AssistantConfig {
    /// Text-generation API key, if configured.
    pub api_key: Option<SecretString>,
    /// Model identifier.
    pub model: String,
    /// Override for the API endpoint (tests); defaults to the hosted
    /// service.
    pub base_url: Option<String>,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_owned(),
            base_url: None,
        }
    }
}

impl std::fmt::Debug for AssistantConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssistantConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .finish()
    }
}

/// Client for the text-generation API.
#[derive(Debug, Clone)]
pub struct AssistantClient {
    client: reqwest::Client,
    config: AssistantConfig,
}

#[derive(Debug, Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    text: String,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Content,
}

#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

impl AssistantClient {
    /// Create a client from gateway configuration.
    #[must_use]
    pub fn new(config: AssistantConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    /// Answer a shopper's question against the current catalog.
    ///
    /// Returns the model's reply text verbatim.
    ///
    /// # Errors
    ///
    /// Returns an [`AssistantError`]; use
    /// [`AssistantError::user_message`] for the reply to show the shopper.
    /// No retry is attempted here.
    #[instrument(skip(self, question, catalog), fields(model = %self.config.model, products = catalog.len()))]
    pub async fn ask(&self, question: &str, catalog: &[Product]) -> Result<String, AssistantError> {
        let Some(api_key) = &self.config.api_key else {
            return Err(AssistantError::MissingApiKey);
        };

        let prompt = build_prompt(question, &catalog_context(catalog));
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.config
                .base_url
                .as_deref()
                .unwrap_or(DEFAULT_BASE_URL),
            self.config.model,
            api_key.expose_secret()
        );

        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(AssistantError::from_transport)?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(AssistantError::from_transport)?;

        if !status.is_success() {
            return Err(Self::map_status(status, &body));
        }

        let parsed: GenerateResponse =
            serde_json::from_str(&body).map_err(|e| AssistantError::Parse(e.to_string()))?;

        parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content.parts.into_iter().next())
            .map(|part| part.text)
            .ok_or_else(|| AssistantError::Parse("response carried no text".to_owned()))
    }

    fn map_status(status: reqwest::StatusCode, body: &str) -> AssistantError {
        let message = serde_json::from_str::<ApiErrorResponse>(body)
            .map(|parsed| parsed.error.message)
            .unwrap_or_else(|_| body.chars().take(200).collect());

        match status.as_u16() {
            401 | 403 => AssistantError::InvalidApiKey,
            429 => AssistantError::QuotaExceeded(message),
            _ => AssistantError::Api {
                status: status.as_u16(),
                message,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_api_key_short_circuits() {
        let client = AssistantClient::new(AssistantConfig::default());
        let err = client.ask("do you have rice?", &[]).await.expect_err("no key");
        assert!(matches!(err, AssistantError::MissingApiKey));
    }

    #[test]
    fn test_status_mapping() {
        let auth = AssistantClient::map_status(
            reqwest::StatusCode::FORBIDDEN,
            "{\"error\": {\"code\": 403, \"message\": \"API key not valid\"}}",
        );
        assert!(matches!(auth, AssistantError::InvalidApiKey));

        let quota = AssistantClient::map_status(
            reqwest::StatusCode::TOO_MANY_REQUESTS,
            "{\"error\": {\"code\": 429, \"message\": \"Resource exhausted\"}}",
        );
        assert!(matches!(quota, AssistantError::QuotaExceeded(_)));

        let other = AssistantClient::map_status(reqwest::StatusCode::BAD_GATEWAY, "oops");
        assert!(matches!(other, AssistantError::Api { status: 502, .. }));
    }

    #[test]
    fn test_response_shape_parses() {
        let body = r#"{
            "candidates": [
                {"content": {"parts": [{"text": "We have Basmati at ₹120/kg."}], "role": "model"}}
            ]
        }"#;
        let parsed: GenerateResponse = serde_json::from_str(body).expect("parse");
        let text = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content.parts.into_iter().next())
            .map(|p| p.text)
            .expect("text present");
        assert!(text.contains("Basmati"));
    }
}
