//! CLI command implementations.

pub mod admin;
pub mod seed;

use secrecy::SecretString;
use url::Url;

use truesoul_services::backend::{DocStoreConfig, HttpBackend};

/// Build the document store client from environment variables.
///
/// # Errors
///
/// Returns an error if `DOCSTORE_URL` is missing or invalid, or the client
/// cannot be built.
pub fn backend_from_env() -> Result<HttpBackend, Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let url = std::env::var("DOCSTORE_URL").map_err(|_| "DOCSTORE_URL not set")?;
    let config = DocStoreConfig {
        url: Url::parse(&url)?,
        prefix: std::env::var("DOCSTORE_PREFIX").unwrap_or_else(|_| "truesoul".to_owned()),
        username: std::env::var("DOCSTORE_USERNAME").ok(),
        password: std::env::var("DOCSTORE_PASSWORD").ok().map(SecretString::from),
    };

    Ok(HttpBackend::new(config)?)
}
