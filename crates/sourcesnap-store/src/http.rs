//! HTTP object sink.
//!
//! # Design
//! - Each object is a `PUT {endpoint}/{container}/{key}` with the raw bytes as body.
//! - Key segments are percent-encoded individually; the key is taken literally, so
//!   `.` and `..` segments are rejected rather than resolved.
//! - Retries are left to the endpoint; a failed write fails the snapshot.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Url};
use sourcesnap_core::{BasePrefix, BoxError, ObjectKey, ObjectSink};
use tracing::debug;

use crate::error::{StoreError, StoreResult};

/// Default timeout for one object upload.
pub const DEFAULT_PUT_TIMEOUT: Duration = Duration::from_secs(60);

const CONTENT_TYPE_OBJECT: &str = "application/octet-stream";
const USER_AGENT: &str = concat!("sourcesnap/", env!("CARGO_PKG_VERSION"));

/// Sink that uploads objects to an HTTP bucket endpoint.
#[derive(Debug, Clone)]
pub struct HttpObjectSink {
    http: Client,
    endpoint: Url,
    container: String,
    token: Option<String>,
}

impl HttpObjectSink {
    /// Bind an endpoint and container, optionally authenticating with a bearer token.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidEndpoint`] when the endpoint cannot carry a path and
    /// [`StoreError::ClientBuild`] when the HTTP client cannot be constructed.
    pub fn new(
        endpoint: Url,
        container: impl Into<String>,
        token: Option<String>,
    ) -> StoreResult<Self> {
        if endpoint.cannot_be_a_base() {
            return Err(StoreError::InvalidEndpoint {
                value: endpoint.to_string(),
                reason: "cannot_be_a_base",
            });
        }
        let http = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|source| StoreError::ClientBuild { source })?;
        Ok(Self {
            http,
            endpoint,
            container: container.into(),
            token: token.filter(|value| !value.trim().is_empty()),
        })
    }

    /// URL an object key is uploaded to.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidKey`] when a key segment is `.` or `..`, which a URL
    /// path cannot carry literally, and [`StoreError::InvalidEndpoint`] when the endpoint
    /// cannot carry a path.
    pub fn object_url(&self, key: &ObjectKey) -> StoreResult<Url> {
        if key.segments().any(|segment| matches!(segment, "." | "..")) {
            return Err(StoreError::invalid_key("key", "dot_segment", key.as_str()));
        }
        self.url_for(key.segments())
    }

    fn url_for<'a>(&self, segments: impl IntoIterator<Item = &'a str>) -> StoreResult<Url> {
        let mut url = self.endpoint.clone();
        url.path_segments_mut()
            .map_err(|()| StoreError::InvalidEndpoint {
                value: self.endpoint.to_string(),
                reason: "cannot_be_a_base",
            })?
            .pop_if_empty()
            .push(&self.container)
            .extend(segments);
        Ok(url)
    }

    async fn put(&self, key: &ObjectKey, bytes: Vec<u8>) -> StoreResult<()> {
        let url = self.object_url(key)?;
        let size = bytes.len();
        let mut request = self
            .http
            .put(url.clone())
            .header(CONTENT_TYPE, CONTENT_TYPE_OBJECT)
            .timeout(DEFAULT_PUT_TIMEOUT)
            .body(bytes);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        let response = request
            .send()
            .await
            .map_err(|source| StoreError::Transport {
                url: url.to_string(),
                source,
            })?;
        let status = response.status();
        if !status.is_success() {
            return Err(StoreError::Status {
                url: url.to_string(),
                status,
            });
        }
        debug!(key = %key, url = %url, bytes = size, "object uploaded");
        Ok(())
    }
}

#[async_trait]
impl ObjectSink for HttpObjectSink {
    fn container(&self) -> &str {
        &self.container
    }

    fn location(&self, prefix: &BasePrefix) -> String {
        self.url_for(prefix.as_str().split('/'))
            .map_or_else(|_| format!("{}/{prefix}", self.endpoint), String::from)
    }

    async fn write(&self, key: &ObjectKey, bytes: Vec<u8>) -> Result<(), BoxError> {
        Ok(self.put(key, bytes).await?)
    }
}
