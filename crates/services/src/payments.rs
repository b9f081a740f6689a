//! Hosted payment-session client (optional checkout path).
//!
//! A thin wrapper over the payment provider's checkout-session endpoint: it
//! turns cart lines into hosted line items (amounts in paise) and returns
//! the session's redirect URL. It performs no order bookkeeping - the
//! messaging-handoff checkout owns order creation.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use thiserror::Error;
use tracing::instrument;

use truesoul_core::CartLine;

const BASE_URL: &str = "https://api.stripe.com/v1";

/// Errors from the payment provider.
#[derive(Debug, Error)]
pub enum PaymentError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider returned an error response.
    #[error("payment API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// A line amount could not be represented in paise.
    #[error("unrepresentable amount for {0}")]
    BadAmount(String),

    /// Failed to parse a provider response.
    #[error("parse error: {0}")]
    Parse(String),
}

/// Payment provider configuration.
///
/// Implements `Debug` manually to redact the secret key.
#[derive(Clone)]
pub struct PaymentConfig {
    /// Provider secret key.
    pub secret_key: SecretString,
    /// Where the provider redirects after a completed payment.
    pub success_url: String,
    /// Where the provider redirects after an abandoned payment.
    pub cancel_url: String,
}

impl std::fmt::Debug for PaymentConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaymentConfig")
            .field("secret_key", &"[REDACTED]")
            .field("success_url", &self.success_url)
            .field("cancel_url", &self.cancel_url)
            .finish()
    }
}

/// Client for the hosted checkout-session API.
#[derive(Debug, Clone)]
pub struct PaymentClient {
    client: reqwest::Client,
    config: PaymentConfig,
}

#[derive(Debug, Deserialize)]
struct SessionResponse {
    url: String,
}

#[derive(Debug, Deserialize)]
struct ProviderErrorResponse {
    error: ProviderError,
}

#[derive(Debug, Deserialize)]
struct ProviderError {
    message: String,
}

impl PaymentClient {
    /// Create a client from provider configuration.
    #[must_use]
    pub fn new(config: PaymentConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    /// Create a hosted checkout session for the cart and return its
    /// redirect URL.
    ///
    /// # Errors
    ///
    /// Returns a [`PaymentError`] if a line amount cannot be converted to
    /// paise or the provider rejects the request.
    #[instrument(skip(self, lines), fields(lines = lines.len(), email = %customer_email))]
    pub async fn create_checkout_session(
        &self,
        lines: &[CartLine],
        customer_email: &str,
    ) -> Result<String, PaymentError> {
        let mut form: Vec<(String, String)> = vec![
            ("mode".to_owned(), "payment".to_owned()),
            ("payment_method_types[0]".to_owned(), "card".to_owned()),
            ("customer_email".to_owned(), customer_email.to_owned()),
            ("success_url".to_owned(), self.config.success_url.clone()),
            ("cancel_url".to_owned(), self.config.cancel_url.clone()),
        ];

        for (i, line) in lines.iter().enumerate() {
            let paise = to_paise(line.product.price.amount())
                .ok_or_else(|| PaymentError::BadAmount(line.product.name.clone()))?;

            form.push((
                format!("line_items[{i}][price_data][currency]"),
                "inr".to_owned(),
            ));
            form.push((
                format!("line_items[{i}][price_data][unit_amount]"),
                paise.to_string(),
            ));
            form.push((
                format!("line_items[{i}][price_data][product_data][name]"),
                line.product.name.clone(),
            ));
            form.push((
                format!("line_items[{i}][quantity]"),
                line.quantity.to_string(),
            ));
        }

        let response = self
            .client
            .post(format!("{BASE_URL}/checkout/sessions"))
            .bearer_auth(self.config.secret_key.expose_secret())
            .form(&form)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<ProviderErrorResponse>(&body)
                .map(|parsed| parsed.error.message)
                .unwrap_or_else(|_| body.chars().take(200).collect());
            return Err(PaymentError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let session: SessionResponse =
            serde_json::from_str(&body).map_err(|e| PaymentError::Parse(e.to_string()))?;
        Ok(session.url)
    }
}

/// Convert a rupee amount to whole paise, rejecting anything that does not
/// round-trip exactly.
fn to_paise(rupees: Decimal) -> Option<i64> {
    let paise = rupees * Decimal::from(100);
    if paise.fract() != Decimal::ZERO {
        return None;
    }
    paise.to_i64()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_paise_whole_rupees() {
        assert_eq!(to_paise(Decimal::from(120)), Some(12_000));
    }

    #[test]
    fn test_to_paise_fractional_rupees() {
        assert_eq!(to_paise(Decimal::new(9950, 2)), Some(9_950));
    }

    #[test]
    fn test_to_paise_rejects_sub_paise_precision() {
        // 1.005 rupees is half a paisa
        assert_eq!(to_paise(Decimal::new(1005, 3)), None);
    }
}
