//! Error types for the assistant gateway.

use thiserror::Error;

/// Errors that can occur when calling the text-generation API.
#[derive(Debug, Error)]
pub enum AssistantError {
    /// No API key is configured.
    #[error("assistant API key not configured")]
    MissingApiKey,

    /// The API rejected the configured key.
    #[error("assistant API key rejected")]
    InvalidApiKey,

    /// Quota exhausted or rate limited.
    #[error("assistant quota exceeded: {0}")]
    QuotaExceeded(String),

    /// The request could not reach the API.
    #[error("network error: {0}")]
    Network(String),

    /// The request timed out.
    #[error("request timed out")]
    Timeout,

    /// Any other API error response.
    #[error("assistant API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Failed to parse a response.
    #[error("parse error: {0}")]
    Parse(String),
}

impl AssistantError {
    /// Classify a transport-level failure.
    #[must_use]
    pub fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::Network(err.to_string())
        }
    }

    /// The message shown to the shopper in place of a reply.
    ///
    /// Each failure mode gets distinct guidance; none of them read as a
    /// crash. The caller may invite a manual retry - the gateway never
    /// retries on its own.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::MissingApiKey => {
                "The shopping assistant is not configured yet. Please add an \
                 assistant API key to the server environment."
                    .to_owned()
            }
            Self::InvalidApiKey => {
                "The shopping assistant's API key was rejected. Please check the \
                 configured key."
                    .to_owned()
            }
            Self::QuotaExceeded(_) => {
                "The shopping assistant has hit its usage quota. Please try again \
                 in a few minutes, or check the plan's limits."
                    .to_owned()
            }
            Self::Network(_) => {
                "Could not reach the shopping assistant. Please check your \
                 connection and try again."
                    .to_owned()
            }
            Self::Timeout => {
                "The shopping assistant took too long to answer. Please try again \
                 in a moment."
                    .to_owned()
            }
            Self::Api { message, .. } => {
                format!("The shopping assistant ran into a problem: {message}. Please try again.")
            }
            Self::Parse(_) => {
                "The shopping assistant sent back something unreadable. Please try \
                 again."
                    .to_owned()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_each_failure_mode_has_distinct_guidance() {
        let errors = [
            AssistantError::MissingApiKey,
            AssistantError::InvalidApiKey,
            AssistantError::QuotaExceeded("exhausted".to_owned()),
            AssistantError::Network("refused".to_owned()),
            AssistantError::Timeout,
            AssistantError::Api {
                status: 500,
                message: "internal".to_owned(),
            },
            AssistantError::Parse("bad json".to_owned()),
        ];

        let messages: Vec<String> = errors.iter().map(AssistantError::user_message).collect();
        for (i, a) in messages.iter().enumerate() {
            for (j, b) in messages.iter().enumerate() {
                if i != j {
                    assert_ne!(a, b, "messages {i} and {j} collide");
                }
            }
        }
    }

    #[test]
    fn test_messages_read_as_replies_not_faults() {
        let message = AssistantError::MissingApiKey.user_message();
        assert!(!message.to_lowercase().contains("panic"));
        assert!(!message.to_lowercase().contains("error:"));
    }
}
