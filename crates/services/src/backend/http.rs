//! HTTP client for the hosted document database.
//!
//! Speaks the store's JSON REST dialect: one database per collection,
//! documents addressed as `/{database}/{id}`, revisions threaded through the
//! `_rev` field and the `rev` query parameter. A guarded write that loses a
//! revision race comes back as HTTP 409 and is surfaced as
//! [`StoreError::Conflict`] so callers can re-read and retry.

use std::time::Duration;

use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::Value;
use tracing::instrument;
use url::Url;

use super::{Document, DocumentBackend, Revision, collections};
use crate::error::StoreError;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Connection settings for the hosted document database.
///
/// Implements `Debug` manually to redact the password.
#[derive(Clone)]
pub struct DocStoreConfig {
    /// Base URL of the store, e.g. `https://db.truesoul.shop/`.
    pub url: Url,
    /// Database name prefix; collection `products` lives in
    /// `{prefix}-products`.
    pub prefix: String,
    /// Basic-auth username, if the store requires credentials.
    pub username: Option<String>,
    /// Basic-auth password.
    pub password: Option<SecretString>,
}

impl std::fmt::Debug for DocStoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocStoreConfig")
            .field("url", &self.url.as_str())
            .field("prefix", &self.prefix)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// Client for the hosted document database.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    config: DocStoreConfig,
}

#[derive(Debug, Deserialize)]
struct WriteAck {
    id: String,
    rev: String,
}

#[derive(Debug, Deserialize)]
struct AllDocsRow {
    id: String,
    doc: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct AllDocsResponse {
    rows: Vec<AllDocsRow>,
}

impl HttpBackend {
    /// Create a client from connection settings.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Internal`] if the HTTP client cannot be built.
    pub fn new(config: DocStoreConfig) -> Result<Self, StoreError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| StoreError::Internal(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client, config })
    }

    /// Create every collection database, ignoring those that already exist.
    ///
    /// Called by the CLI before seeding and safe to call repeatedly.
    ///
    /// # Errors
    ///
    /// Returns an error if the store rejects a creation for any reason other
    /// than the database already existing.
    pub async fn provision(&self) -> Result<(), StoreError> {
        for collection in collections::ALL {
            let url = self.collection_url(collection)?;
            let response = self
                .request(self.client.put(url))
                .send()
                .await
                .map_err(transport_error)?;

            // 412 means the database already exists
            if !response.status().is_success()
                && response.status() != StatusCode::PRECONDITION_FAILED
            {
                return Err(status_error(collection, response).await);
            }
        }
        Ok(())
    }

    fn database(&self, collection: &str) -> String {
        format!("{}-{collection}", self.config.prefix)
    }

    fn collection_url(&self, collection: &str) -> Result<Url, StoreError> {
        self.config
            .url
            .join(&self.database(collection))
            .map_err(|e| StoreError::Internal(format!("invalid store URL: {e}")))
    }

    fn doc_url(&self, collection: &str, id: &str) -> Result<Url, StoreError> {
        self.config
            .url
            .join(&format!(
                "{}/{}",
                self.database(collection),
                urlencoding::encode(id)
            ))
            .map_err(|e| StoreError::Internal(format!("invalid store URL: {e}")))
    }

    fn request(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match (&self.config.username, &self.config.password) {
            (Some(user), Some(pass)) => {
                builder.basic_auth(user, Some(pass.expose_secret().to_owned()))
            }
            (Some(user), None) => builder.basic_auth(user, None::<String>),
            _ => builder,
        }
    }

    /// Read the current revision of a document, for unguarded overwrites.
    async fn current_rev(&self, collection: &str, id: &str) -> Result<Option<Revision>, StoreError> {
        Ok(self.get(collection, id).await?.map(|doc| doc.rev))
    }
}

#[async_trait::async_trait]
impl DocumentBackend for HttpBackend {
    #[instrument(skip(self), fields(collection = %collection, id = %id))]
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        let url = self.doc_url(collection, id)?;
        let response = self
            .request(self.client.get(url))
            .send()
            .await
            .map_err(transport_error)?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(status_error(id, response).await);
        }

        let raw: Value = response.json().await.map_err(transport_error)?;
        Ok(Some(split_envelope(id, raw)?))
    }

    #[instrument(skip(self), fields(collection = %collection))]
    async fn list(&self, collection: &str) -> Result<Vec<Document>, StoreError> {
        let mut url = self
            .config
            .url
            .join(&format!("{}/_all_docs", self.database(collection)))
            .map_err(|e| StoreError::Internal(format!("invalid store URL: {e}")))?;
        url.set_query(Some("include_docs=true"));

        let response = self
            .request(self.client.get(url))
            .send()
            .await
            .map_err(transport_error)?;

        if response.status() == StatusCode::NOT_FOUND {
            // Collection not provisioned yet reads as empty
            return Ok(Vec::new());
        }
        if !response.status().is_success() {
            return Err(status_error(collection, response).await);
        }

        let listing: AllDocsResponse = response.json().await.map_err(transport_error)?;
        listing
            .rows
            .into_iter()
            .filter_map(|row| row.doc.map(|doc| split_envelope(&row.id, doc)))
            .collect()
    }

    #[instrument(skip(self, body), fields(collection = %collection))]
    async fn insert(&self, collection: &str, body: Value) -> Result<Document, StoreError> {
        let url = self.collection_url(collection)?;
        let response = self
            .request(self.client.post(url).json(&body))
            .send()
            .await
            .map_err(transport_error)?;

        if !response.status().is_success() {
            return Err(status_error(collection, response).await);
        }

        let ack: WriteAck = response.json().await.map_err(transport_error)?;
        Ok(Document {
            id: ack.id,
            rev: Revision::new(ack.rev),
            body,
        })
    }

    #[instrument(skip(self, body, expected), fields(collection = %collection, id = %id))]
    async fn put(
        &self,
        collection: &str,
        id: &str,
        body: Value,
        expected: Option<&Revision>,
    ) -> Result<Document, StoreError> {
        let mut url = self.doc_url(collection, id)?;

        // An unguarded overwrite still has to quote the live revision, so
        // resolve it first; last writer wins.
        let rev = match expected {
            Some(rev) => Some(rev.clone()),
            None => self.current_rev(collection, id).await?,
        };
        if let Some(rev) = &rev {
            url.set_query(Some(&format!("rev={}", urlencoding::encode(rev.as_str()))));
        }

        let response = self
            .request(self.client.put(url).json(&body))
            .send()
            .await
            .map_err(transport_error)?;

        if response.status() == StatusCode::CONFLICT {
            return Err(StoreError::Conflict(format!("{collection}/{id}")));
        }
        if !response.status().is_success() {
            return Err(status_error(id, response).await);
        }

        let ack: WriteAck = response.json().await.map_err(transport_error)?;
        Ok(Document {
            id: ack.id,
            rev: Revision::new(ack.rev),
            body,
        })
    }

    #[instrument(skip(self), fields(collection = %collection, id = %id))]
    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        let Some(rev) = self.current_rev(collection, id).await? else {
            return Ok(());
        };

        let mut url = self.doc_url(collection, id)?;
        url.set_query(Some(&format!("rev={}", urlencoding::encode(rev.as_str()))));

        let response = self
            .request(self.client.delete(url))
            .send()
            .await
            .map_err(transport_error)?;

        // A 404 means someone else already deleted it
        if !response.status().is_success() && response.status() != StatusCode::NOT_FOUND {
            return Err(status_error(id, response).await);
        }
        Ok(())
    }
}

/// Separate the store's bookkeeping fields (`_id`, `_rev`) from the body.
fn split_envelope(id: &str, raw: Value) -> Result<Document, StoreError> {
    let Value::Object(mut fields) = raw else {
        return Err(StoreError::Corrupt {
            id: id.to_owned(),
            message: "document body is not a JSON object".to_owned(),
        });
    };

    fields.remove("_id");
    let rev = fields
        .remove("_rev")
        .and_then(|v| v.as_str().map(ToOwned::to_owned))
        .ok_or_else(|| StoreError::Corrupt {
            id: id.to_owned(),
            message: "document has no revision".to_owned(),
        })?;

    Ok(Document {
        id: id.to_owned(),
        rev: Revision::new(rev),
        body: Value::Object(fields),
    })
}

fn transport_error(err: reqwest::Error) -> StoreError {
    if err.is_timeout() {
        StoreError::RemoteUnavailable("request timed out".to_owned())
    } else if err.is_connect() {
        StoreError::RemoteUnavailable(format!("connection failed: {err}"))
    } else {
        StoreError::RemoteUnavailable(err.to_string())
    }
}

async fn status_error(subject: &str, response: reqwest::Response) -> StoreError {
    let status = response.status();
    let detail = response.text().await.unwrap_or_default();
    let detail = detail.chars().take(200).collect::<String>();

    match status {
        StatusCode::NOT_FOUND => StoreError::NotFound(subject.to_owned()),
        StatusCode::TOO_MANY_REQUESTS => {
            StoreError::RemoteUnavailable("rate limited by store".to_owned())
        }
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            StoreError::RemoteUnavailable(format!("store rejected credentials: {detail}"))
        }
        _ => StoreError::RemoteUnavailable(format!("HTTP {status}: {detail}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_split_envelope_strips_bookkeeping() {
        let doc = split_envelope(
            "p1",
            json!({"_id": "p1", "_rev": "3-abc", "name": "rice", "stockQuantity": 5}),
        )
        .expect("well-formed");

        assert_eq!(doc.id, "p1");
        assert_eq!(doc.rev.as_str(), "3-abc");
        assert_eq!(doc.body, json!({"name": "rice", "stockQuantity": 5}));
    }

    #[test]
    fn test_split_envelope_requires_revision() {
        let result = split_envelope("p1", json!({"name": "rice"}));
        assert!(matches!(result, Err(StoreError::Corrupt { .. })));
    }

    #[test]
    fn test_split_envelope_rejects_non_object() {
        let result = split_envelope("p1", json!([1, 2, 3]));
        assert!(matches!(result, Err(StoreError::Corrupt { .. })));
    }

    #[test]
    fn test_config_debug_redacts_password() {
        let config = DocStoreConfig {
            url: Url::parse("https://db.example.com/").expect("valid url"),
            prefix: "truesoul".to_owned(),
            username: Some("svc".to_owned()),
            password: Some(SecretString::from("super-secret")),
        };

        let debug_output = format!("{config:?}");
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("super-secret"));
    }
}
