//! HTTP client for the ERP's remote record API.
//!
//! The remote service is an opaque JSON source: each entity collection is
//! served at `GET {base}/api/<entity>` as either a bare array or an object
//! wrapping the array under the entity name.

use reqwest::header::{ACCEPT, AUTHORIZATION};
use secrecy::{ExposeSecret as _, SecretString};
use serde_json::Value;
use url::Url;

use crate::error::{LedgerError, Result};

/// Entity collections served by the remote API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RemoteEntity {
    /// `GET /api/clients`.
    Clients,
    /// `GET /api/vehicles`.
    Vehicles,
    /// `GET /api/invoices`.
    Invoices,
    /// `GET /api/payments`.
    Payments,
}

impl RemoteEntity {
    /// Every remotely served entity.
    pub const ALL: [Self; 4] = [Self::Clients, Self::Vehicles, Self::Invoices, Self::Payments];

    /// Entity name, used both in the path and as the envelope key.
    #[inline]
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Clients => "clients",
            Self::Vehicles => "vehicles",
            Self::Invoices => "invoices",
            Self::Payments => "payments",
        }
    }

    /// Endpoint path relative to the base URL.
    #[inline]
    #[must_use]
    pub fn path(self) -> String {
        format!("api/{}", self.name())
    }
}

impl core::fmt::Display for RemoteEntity {
    #[inline]
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

/// A source of raw remote records.
///
/// Implemented by [`ErpClient`]; tests and offline mode provide their own.
pub trait RemoteSource: core::fmt::Debug + Send + Sync {
    /// Fetches the raw records of one entity collection.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, a non-success status or an
    /// unrecognized body.
    fn fetch(&self, entity: RemoteEntity) -> impl Future<Output = Result<Vec<Value>>> + Send;
}

/// Remote source that never has any records (local cache only).
#[derive(Debug, Clone, Copy, Default)]
pub struct Offline;

impl RemoteSource for Offline {
    #[inline]
    async fn fetch(&self, entity: RemoteEntity) -> Result<Vec<Value>> {
        tracing::trace!(entity = %entity, "offline, no remote records");
        Ok(Vec::new())
    }
}

/// Builder for constructing an [`ErpClient`].
#[derive(Debug, Default)]
pub struct ErpClientBuilder {
    /// API base URL.
    base_url: Option<String>,
    /// Optional bearer token.
    token: Option<SecretString>,
}

impl ErpClientBuilder {
    /// Sets the API base URL (e.g. `https://erp.example.com`).
    #[inline]
    #[must_use]
    pub fn base_url<T: Into<String>>(mut self, url: T) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Sets the bearer token sent with every request.
    #[inline]
    #[must_use]
    pub fn token<T: Into<String>>(mut self, token: T) -> Self {
        self.token = Some(SecretString::from(token.into()));
        self
    }

    /// Builds the client.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Validation`] if no base URL was provided,
    /// [`LedgerError::InvalidUrl`] if it does not parse, and
    /// [`LedgerError::Http`] if the HTTP client fails to build.
    #[inline]
    #[tracing::instrument(skip_all)]
    pub fn build(self) -> Result<ErpClient> {
        let raw = self
            .base_url
            .ok_or_else(|| LedgerError::Validation("remote base URL is required".to_owned()))?;
        let base_url = normalize_base(&raw)?;
        tracing::debug!(base_url = %base_url, "building client");
        let http = reqwest::Client::builder().build()?;
        Ok(ErpClient {
            http,
            base_url,
            token: self.token,
        })
    }
}

/// Parses a base URL, ensuring it ends with `/` so that endpoint paths
/// join beneath it.
fn normalize_base(raw: &str) -> Result<Url> {
    let mut base = Url::parse(raw.trim())?;
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    Ok(base)
}

/// Async client for the remote record API.
///
/// Use [`ErpClient::builder()`] to construct an instance.
#[derive(Debug)]
pub struct ErpClient {
    /// Underlying HTTP client.
    http: reqwest::Client,
    /// API base URL, always ending in `/`.
    base_url: Url,
    /// Bearer access token.
    token: Option<SecretString>,
}

impl ErpClient {
    /// Creates a new builder for configuring the client.
    #[inline]
    #[must_use]
    pub fn builder() -> ErpClientBuilder {
        ErpClientBuilder::default()
    }

    /// Returns the configured base URL.
    #[inline]
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Fetches the raw records of one entity collection.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails, the server answers with a
    /// non-success status, or the body is neither an array nor an
    /// `{ "<entity>": [...] }` envelope.
    #[inline]
    #[tracing::instrument(skip(self))]
    pub async fn fetch_collection(&self, entity: RemoteEntity) -> Result<Vec<Value>> {
        let url = self.base_url.join(&entity.path())?;
        tracing::trace!(url = %url, "sending GET request");
        let mut request = self.http.get(url).header(ACCEPT, "application/json");
        if let Some(token) = self.token.as_ref() {
            request = request.header(AUTHORIZATION, format!("Bearer {}", token.expose_secret()));
        }
        let response = request.send().await?;

        let status = response.status();
        tracing::debug!(status = %status, "received response");
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_owned());
            return Err(LedgerError::Api {
                status: status.as_u16(),
                message,
            });
        }
        let body = response.text().await?;
        let value: Value = serde_json::from_str(&body)?;
        unwrap_collection(entity, value).ok_or_else(|| LedgerError::Api {
            status: status.as_u16(),
            message: format!("unexpected response shape for {entity}"),
        })
    }
}

impl RemoteSource for ErpClient {
    #[inline]
    async fn fetch(&self, entity: RemoteEntity) -> Result<Vec<Value>> {
        self.fetch_collection(entity).await
    }
}

/// Extracts the record array from a bare array or an entity envelope.
fn unwrap_collection(entity: RemoteEntity, value: Value) -> Option<Vec<Value>> {
    if let Value::Array(items) = value {
        return Some(items);
    }
    if let Value::Object(mut map) = value
        && let Some(Value::Array(items)) = map.remove(entity.name())
    {
        return Some(items);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// Creates a client pointed at a mock server.
    fn client_for(server: &MockServer) -> ErpClient {
        ErpClient::builder().base_url(server.uri()).build().unwrap()
    }

    #[test]
    fn builder_requires_base_url() {
        let err = ErpClient::builder().build().unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn builder_rejects_malformed_url() {
        let err = ErpClient::builder().base_url("not a url").build().unwrap_err();
        assert!(matches!(err, LedgerError::InvalidUrl(_)));
    }

    #[test]
    fn base_url_gets_trailing_slash() {
        let client = ErpClient::builder()
            .base_url("https://erp.example.com/tenant")
            .build()
            .unwrap();
        assert_eq!(client.base_url().as_str(), "https://erp.example.com/tenant/");
        let joined = client.base_url().join(&RemoteEntity::Invoices.path()).unwrap();
        assert_eq!(joined.as_str(), "https://erp.example.com/tenant/api/invoices");
    }

    #[test]
    fn envelope_and_bare_array_are_accepted() {
        let bare = unwrap_collection(RemoteEntity::Clients, json!([{"id": 1}])).unwrap();
        assert_eq!(bare.len(), 1);
        let wrapped =
            unwrap_collection(RemoteEntity::Clients, json!({"clients": [{"id": 1}, {"id": 2}]}))
                .unwrap();
        assert_eq!(wrapped.len(), 2);
        assert!(unwrap_collection(RemoteEntity::Clients, json!({"vehicles": []})).is_none());
        assert!(unwrap_collection(RemoteEntity::Clients, json!("clients")).is_none());
    }

    #[tokio::test]
    async fn fetch_collection_sends_bearer_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/invoices"))
            .and(header("authorization", "Bearer secret-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "invoices": [{"invoiceNo": "CT0002", "totalAmount": 89625}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = ErpClient::builder()
            .base_url(server.uri())
            .token("secret-token")
            .build()
            .unwrap();
        let records = client.fetch_collection(RemoteEntity::Invoices).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["invoiceNo"], "CT0002");
    }

    #[tokio::test]
    async fn fetch_collection_maps_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/payments"))
            .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .fetch_collection(RemoteEntity::Payments)
            .await
            .unwrap_err();
        match err {
            LedgerError::Api { status, message } => {
                assert_eq!(status, 503);
                assert_eq!(message, "maintenance");
            }
            other => panic!("expected API error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn fetch_collection_rejects_malformed_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/clients"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .fetch_collection(RemoteEntity::Clients)
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::Serialization(_)));
    }

    #[tokio::test]
    async fn offline_source_is_empty() {
        let records = Offline.fetch(RemoteEntity::Vehicles).await.unwrap();
        assert!(records.is_empty());
    }
}
