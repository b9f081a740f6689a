//! Identity-provider REST client.
//!
//! Authentication is delegated wholesale to the managed identity provider:
//! this client exchanges email/password credentials for the provider's
//! stable uid and echoes its typed error codes. No credential material is
//! stored on our side.

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::instrument;

use truesoul_core::UserId;

const DEFAULT_BASE_URL: &str = "https://identitytoolkit.googleapis.com/v1";

/// Errors from the identity provider.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// An account with this email already exists.
    #[error("an account with this email already exists")]
    EmailExists,

    /// Wrong email or password.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// The provider rejected the password as too weak.
    #[error("password too weak: {0}")]
    WeakPassword(String),

    /// Any other provider error code.
    #[error("identity provider error: {0}")]
    Provider(String),

    /// Failed to parse a provider response.
    #[error("parse error: {0}")]
    Parse(String),
}

/// Identity provider configuration.
///
/// Implements `Debug` manually to redact the API key.
#[derive(Clone)]
pub struct IdentityConfig {
    /// Provider API key.
    pub api_key: SecretString,
    /// Override for the provider endpoint (tests); defaults to the hosted
    /// service.
    pub base_url: Option<String>,
}

impl std::fmt::Debug for IdentityConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityConfig")
            .field("api_key", &"[REDACTED]")
            .field("base_url", &self.base_url)
            .finish()
    }
}

/// A signed-in identity as reported by the provider.
#[derive(Debug, Clone)]
pub struct IdentityUser {
    pub uid: UserId,
    pub email: String,
    pub display_name: Option<String>,
}

/// Client for the identity provider's accounts API.
#[derive(Debug, Clone)]
pub struct IdentityClient {
    client: reqwest::Client,
    api_key: SecretString,
    base_url: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CredentialsRequest<'a> {
    email: &'a str,
    password: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    display_name: Option<&'a str>,
    return_secure_token: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccountResponse {
    local_id: String,
    email: String,
    #[serde(default)]
    display_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProviderErrorResponse {
    error: ProviderError,
}

#[derive(Debug, Deserialize)]
struct ProviderError {
    message: String,
}

impl IdentityClient {
    /// Create a client from provider configuration.
    #[must_use]
    pub fn new(config: &IdentityConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: config.api_key.clone(),
            base_url: config
                .base_url
                .clone()
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_owned()),
        }
    }

    /// Register a new account.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError::EmailExists`] or [`IdentityError::WeakPassword`]
    /// on the matching provider codes, or a transport/parse error.
    #[instrument(skip(self, password, display_name), fields(email = %email))]
    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        display_name: Option<&str>,
    ) -> Result<IdentityUser, IdentityError> {
        self.account_call(
            "accounts:signUp",
            &CredentialsRequest {
                email,
                password,
                display_name,
                return_secure_token: true,
            },
        )
        .await
    }

    /// Sign in with email and password.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError::InvalidCredentials`] on the matching provider
    /// codes, or a transport/parse error.
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<IdentityUser, IdentityError> {
        self.account_call(
            "accounts:signInWithPassword",
            &CredentialsRequest {
                email,
                password,
                display_name: None,
                return_secure_token: true,
            },
        )
        .await
    }

    async fn account_call(
        &self,
        method: &str,
        request: &CredentialsRequest<'_>,
    ) -> Result<IdentityUser, IdentityError> {
        let url = format!(
            "{}/{method}?key={}",
            self.base_url,
            self.api_key.expose_secret()
        );

        let response = self.client.post(&url).json(request).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(map_provider_error(&body));
        }

        let account: AccountResponse =
            serde_json::from_str(&body).map_err(|e| IdentityError::Parse(e.to_string()))?;
        Ok(IdentityUser {
            uid: UserId::new(account.local_id),
            email: account.email,
            display_name: account.display_name.filter(|name| !name.is_empty()),
        })
    }
}

/// Translate the provider's error codes into typed errors.
fn map_provider_error(body: &str) -> IdentityError {
    let message = serde_json::from_str::<ProviderErrorResponse>(body)
        .map(|parsed| parsed.error.message)
        .unwrap_or_else(|_| body.chars().take(200).collect());

    // Codes may carry a suffix, e.g. "WEAK_PASSWORD : Password should be..."
    let code = message.split(':').next().unwrap_or("").trim();
    match code {
        "EMAIL_EXISTS" => IdentityError::EmailExists,
        "EMAIL_NOT_FOUND" | "INVALID_PASSWORD" | "INVALID_LOGIN_CREDENTIALS" => {
            IdentityError::InvalidCredentials
        }
        "WEAK_PASSWORD" => {
            let detail = message
                .split_once(':')
                .map_or("password should be at least 6 characters", |(_, rest)| {
                    rest.trim()
                });
            IdentityError::WeakPassword(detail.to_owned())
        }
        _ => IdentityError::Provider(message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider_body(message: &str) -> String {
        format!("{{\"error\": {{\"code\": 400, \"message\": \"{message}\"}}}}")
    }

    #[test]
    fn test_map_email_exists() {
        let err = map_provider_error(&provider_body("EMAIL_EXISTS"));
        assert!(matches!(err, IdentityError::EmailExists));
    }

    #[test]
    fn test_map_credential_codes() {
        for code in ["EMAIL_NOT_FOUND", "INVALID_PASSWORD", "INVALID_LOGIN_CREDENTIALS"] {
            let err = map_provider_error(&provider_body(code));
            assert!(matches!(err, IdentityError::InvalidCredentials), "{code}");
        }
    }

    #[test]
    fn test_map_weak_password_keeps_detail() {
        let err = map_provider_error(&provider_body(
            "WEAK_PASSWORD : Password should be at least 6 characters",
        ));
        match err {
            IdentityError::WeakPassword(detail) => {
                assert_eq!(detail, "Password should be at least 6 characters");
            }
            other => panic!("expected WeakPassword, got {other:?}"),
        }
    }

    #[test]
    fn test_map_unknown_code_passes_through() {
        let err = map_provider_error(&provider_body("OPERATION_NOT_ALLOWED"));
        assert!(matches!(err, IdentityError::Provider(_)));
    }

    #[test]
    fn test_map_unparseable_body() {
        let err = map_provider_error("<html>gateway timeout</html>");
        assert!(matches!(err, IdentityError::Provider(_)));
    }
}
