//! GitHub Contents API client.
//!
//! # Design
//! - One shared connection pool ([`GithubConnector`]) hands out per-credential clients.
//! - Listings and blobs hit the same endpoint and differ only in `Accept` and timeout.
//! - Retries wrap a whole attempt, including the body read.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, HeaderMap, RETRY_AFTER};
use reqwest::{Client, StatusCode, Url};
use sourcesnap_core::{BlobFetcher, BoxError, OriginRepo, TreeListing, TreeReader};
use tracing::debug;

use crate::error::{OriginError, OriginResult};
use crate::payload::decode_listing;
use crate::retry::RetryPolicy;

/// Public GitHub API base.
pub const DEFAULT_API_URL: &str = "https://api.github.com";
/// Default timeout for one listing request.
pub const DEFAULT_LIST_TIMEOUT: Duration = Duration::from_secs(10);
/// Default timeout for one blob request.
pub const DEFAULT_BLOB_TIMEOUT: Duration = Duration::from_secs(30);

const ACCEPT_LISTING: &str = "application/vnd.github.v3+json";
const ACCEPT_RAW: &str = "application/vnd.github.v3.raw";
const HEADER_RATELIMIT_REMAINING: &str = "x-ratelimit-remaining";
const USER_AGENT: &str = concat!("sourcesnap/", env!("CARGO_PKG_VERSION"));

/// Connection settings shared by every client.
#[derive(Debug, Clone)]
pub struct OriginSettings {
    /// API base URL.
    pub api_url: Url,
    /// Timeout for listing requests.
    pub list_timeout: Duration,
    /// Timeout for blob requests.
    pub blob_timeout: Duration,
    /// Retry policy for transient failures.
    pub retry: RetryPolicy,
}

impl OriginSettings {
    /// Default settings against the given API base.
    #[must_use]
    pub fn new(api_url: Url) -> Self {
        Self {
            api_url,
            list_timeout: DEFAULT_LIST_TIMEOUT,
            blob_timeout: DEFAULT_BLOB_TIMEOUT,
            retry: RetryPolicy::default(),
        }
    }
}

/// Shared HTTP pool producing per-credential [`GithubClient`]s.
#[derive(Clone)]
pub struct GithubConnector {
    http: Client,
    settings: Arc<OriginSettings>,
}

impl GithubConnector {
    /// Build the shared HTTP client.
    ///
    /// # Errors
    ///
    /// Returns [`OriginError::InvalidBaseUrl`] when the API base cannot carry a path and
    /// [`OriginError::ClientBuild`] when the TLS backend fails to initialise.
    pub fn new(settings: OriginSettings) -> OriginResult<Self> {
        if settings.api_url.cannot_be_a_base() {
            return Err(OriginError::InvalidBaseUrl {
                value: settings.api_url.to_string(),
                reason: "cannot_be_a_base",
            });
        }
        let http = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|source| OriginError::ClientBuild { source })?;
        Ok(Self {
            http,
            settings: Arc::new(settings),
        })
    }

    /// Settings every client inherits.
    #[must_use]
    pub fn settings(&self) -> &OriginSettings {
        &self.settings
    }

    /// Bind a credential.
    ///
    /// # Errors
    ///
    /// Returns [`OriginError::MissingCredential`] when `credential` is blank.
    pub fn connect(&self, credential: &str) -> OriginResult<GithubClient> {
        let token = credential.trim();
        if token.is_empty() {
            return Err(OriginError::MissingCredential);
        }
        Ok(GithubClient {
            http: self.http.clone(),
            settings: Arc::clone(&self.settings),
            token: token.to_string(),
        })
    }
}

/// Contents API client bound to one credential.
#[derive(Clone)]
pub struct GithubClient {
    http: Client,
    settings: Arc<OriginSettings>,
    token: String,
}

impl GithubClient {
    /// Convenience constructor for one-off clients.
    ///
    /// # Errors
    ///
    /// See [`GithubConnector::new`] and [`GithubConnector::connect`].
    pub fn new(credential: &str, settings: OriginSettings) -> OriginResult<Self> {
        GithubConnector::new(settings)?.connect(credential)
    }

    /// Contents endpoint for `path` at `git_ref`, with each segment percent-encoded.
    ///
    /// # Errors
    ///
    /// Returns [`OriginError::InvalidBaseUrl`] when the API base cannot carry a path.
    pub fn contents_url(
        &self,
        origin: &OriginRepo,
        path: &str,
        git_ref: &str,
    ) -> OriginResult<Url> {
        let mut url = self.settings.api_url.clone();
        url.path_segments_mut()
            .map_err(|()| OriginError::InvalidBaseUrl {
                value: self.settings.api_url.to_string(),
                reason: "cannot_be_a_base",
            })?
            .pop_if_empty()
            .extend(["repos", origin.owner.as_str(), origin.name.as_str(), "contents"])
            .extend(path.split('/').filter(|segment| !segment.is_empty()));
        url.query_pairs_mut().append_pair("ref", git_ref);
        Ok(url)
    }

    /// List `path` at `git_ref`.
    ///
    /// # Errors
    ///
    /// Returns a typed [`OriginError`] for non-success statuses, transport failures and
    /// undecodable bodies.
    pub async fn list(
        &self,
        origin: &OriginRepo,
        path: &str,
        git_ref: &str,
    ) -> OriginResult<TreeListing> {
        const OPERATION: &str = "list";
        let url = self.contents_url(origin, path, git_ref)?;
        let body = self
            .settings
            .retry
            .run(OPERATION, || {
                self.attempt(OPERATION, &url, ACCEPT_LISTING, self.settings.list_timeout)
            })
            .await?;
        let listing = decode_listing(&body).map_err(|source| OriginError::Decode {
            operation: OPERATION,
            url: url.to_string(),
            source,
        })?;
        debug!(origin = %origin, path, entries = listing.len(), "listed origin path");
        Ok(listing)
    }

    /// Fetch the raw bytes of `path` at `git_ref`.
    ///
    /// # Errors
    ///
    /// Returns a typed [`OriginError`] for non-success statuses and transport failures.
    pub async fn fetch(
        &self,
        origin: &OriginRepo,
        path: &str,
        git_ref: &str,
    ) -> OriginResult<Vec<u8>> {
        const OPERATION: &str = "fetch";
        let url = self.contents_url(origin, path, git_ref)?;
        self.settings
            .retry
            .run(OPERATION, || {
                self.attempt(OPERATION, &url, ACCEPT_RAW, self.settings.blob_timeout)
            })
            .await
    }

    async fn attempt(
        &self,
        operation: &'static str,
        url: &Url,
        accept: &'static str,
        timeout: Duration,
    ) -> OriginResult<Vec<u8>> {
        let transport = |source| OriginError::Transport {
            operation,
            url: url.to_string(),
            source,
        };
        let response = self
            .http
            .get(url.clone())
            .bearer_auth(&self.token)
            .header(ACCEPT, accept)
            .timeout(timeout)
            .send()
            .await
            .map_err(transport)?;

        if let Some(err) = classify_status(operation, url, response.status(), response.headers())
        {
            return Err(err);
        }
        let body = response.bytes().await.map_err(transport)?;
        Ok(body.to_vec())
    }
}

fn classify_status(
    operation: &'static str,
    url: &Url,
    status: StatusCode,
    headers: &HeaderMap,
) -> Option<OriginError> {
    if status.is_success() {
        return None;
    }
    let url = url.to_string();
    let exhausted = headers
        .get(HEADER_RATELIMIT_REMAINING)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.trim() == "0");
    let err = match status {
        StatusCode::UNAUTHORIZED => OriginError::Unauthorized { operation, url },
        StatusCode::NOT_FOUND => OriginError::NotFound { operation, url },
        StatusCode::TOO_MANY_REQUESTS => OriginError::RateLimited {
            operation,
            url,
            retry_after: retry_after(headers),
        },
        StatusCode::FORBIDDEN if exhausted => OriginError::RateLimited {
            operation,
            url,
            retry_after: retry_after(headers),
        },
        _ => OriginError::Status {
            operation,
            url,
            status,
        },
    };
    Some(err)
}

fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}

#[async_trait]
impl TreeReader for GithubClient {
    async fn list_children(
        &self,
        origin: &OriginRepo,
        path: &str,
        git_ref: &str,
    ) -> Result<TreeListing, BoxError> {
        Ok(self.list(origin, path, git_ref).await?)
    }
}

#[async_trait]
impl BlobFetcher for GithubClient {
    async fn fetch_bytes(
        &self,
        origin: &OriginRepo,
        path: &str,
        git_ref: &str,
    ) -> Result<Vec<u8>, BoxError> {
        Ok(self.fetch(origin, path, git_ref).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{Result, anyhow};
    use httpmock::MockServer;
    use httpmock::prelude::*;
    use serde_json::json;
    use sourcesnap_core::TreeNode;

    fn repo() -> OriginRepo {
        OriginRepo::new("octo", "demo")
    }

    fn settings(server: &MockServer, retry: RetryPolicy) -> Result<OriginSettings> {
        let api_url = server
            .base_url()
            .parse()
            .map_err(|_| anyhow!("valid URL"))?;
        Ok(OriginSettings {
            retry,
            ..OriginSettings::new(api_url)
        })
    }

    fn client(server: &MockServer) -> Result<GithubClient> {
        Ok(GithubClient::new(
            "secret-token",
            settings(server, RetryPolicy::disabled())?,
        )?)
    }

    #[test]
    fn contents_url_encodes_segments_and_ref() -> Result<()> {
        let settings = OriginSettings::new(
            "https://ghe.example/api/v3/"
                .parse()
                .map_err(|_| anyhow!("valid URL"))?,
        );
        let client = GithubClient::new("token", settings)?;
        let url = client.contents_url(&repo(), "docs/my file#1.md", "feature/x")?;
        assert_eq!(
            url.as_str(),
            "https://ghe.example/api/v3/repos/octo/demo/contents/docs/my%20file%231.md?ref=feature%2Fx"
        );

        let root = client.contents_url(&repo(), "", "main")?;
        assert_eq!(
            root.as_str(),
            "https://ghe.example/api/v3/repos/octo/demo/contents?ref=main"
        );
        Ok(())
    }

    #[test]
    fn blank_credential_is_rejected() -> Result<()> {
        let settings = OriginSettings::new(DEFAULT_API_URL.parse().map_err(|_| anyhow!("url"))?);
        let connector = GithubConnector::new(settings)?;
        assert!(matches!(
            connector.connect("  "),
            Err(OriginError::MissingCredential)
        ));
        assert!(connector.connect("token").is_ok());
        assert_eq!(connector.settings().list_timeout, DEFAULT_LIST_TIMEOUT);
        Ok(())
    }

    #[test]
    fn non_hierarchical_base_is_rejected() -> Result<()> {
        let settings =
            OriginSettings::new("mailto:ops@example.com".parse().map_err(|_| anyhow!("url"))?);
        assert!(matches!(
            GithubConnector::new(settings),
            Err(OriginError::InvalidBaseUrl { .. })
        ));
        Ok(())
    }

    #[tokio::test]
    async fn list_decodes_directory_listing() -> Result<()> {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/repos/octo/demo/contents/src")
                .query_param("ref", "main")
                .header("authorization", "Bearer secret-token")
                .header("accept", ACCEPT_LISTING);
            then.status(200)
                .header("content-type", "application/json")
                .json_body(json!([
                    {"type": "file", "path": "src/a.txt", "name": "a.txt"},
                    {"type": "dir", "path": "src/sub", "name": "sub"},
                    {"name": "broken"}
                ]));
        });

        let listing = client(&server)?.list(&repo(), "src", "main").await?;

        mock.assert();
        assert_eq!(
            listing,
            TreeListing::Children(vec![
                TreeNode::file("src/a.txt"),
                TreeNode::directory("src/sub"),
            ])
        );
        Ok(())
    }

    #[tokio::test]
    async fn list_returns_single_node_for_file_path() -> Result<()> {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(GET).path("/repos/octo/demo/contents/README.md");
            then.status(200)
                .json_body(json!({"type": "file", "path": "README.md", "encoding": "base64"}));
        });

        let listing = client(&server)?.list(&repo(), "README.md", "main").await?;

        mock.assert();
        assert_eq!(listing, TreeListing::Single(TreeNode::file("README.md")));
        Ok(())
    }

    #[tokio::test]
    async fn list_treats_unknown_shape_as_empty() -> Result<()> {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(GET).path("/repos/octo/demo/contents/odd");
            then.status(200).json_body(json!("surprise"));
        });

        let listing = client(&server)?.list(&repo(), "odd", "main").await?;

        mock.assert();
        assert_eq!(listing, TreeListing::Children(Vec::new()));
        Ok(())
    }

    #[tokio::test]
    async fn list_reports_undecodable_body() -> Result<()> {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/repos/octo/demo/contents/src");
            then.status(200).body("<html>");
        });

        let err = client(&server)?
            .list(&repo(), "src", "main")
            .await
            .err()
            .ok_or_else(|| anyhow!("expected decode failure"))?;
        assert!(matches!(err, OriginError::Decode { operation: "list", .. }));
        Ok(())
    }

    #[tokio::test]
    async fn statuses_map_to_typed_errors() -> Result<()> {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/repos/octo/demo/contents/missing");
            then.status(404).json_body(json!({"message": "Not Found"}));
        });
        server.mock(|when, then| {
            when.method(GET).path("/repos/octo/demo/contents/private");
            then.status(401).json_body(json!({"message": "Bad credentials"}));
        });
        server.mock(|when, then| {
            when.method(GET).path("/repos/octo/demo/contents/throttled");
            then.status(403)
                .header(HEADER_RATELIMIT_REMAINING, "0")
                .header("retry-after", "7");
        });
        server.mock(|when, then| {
            when.method(GET).path("/repos/octo/demo/contents/forbidden");
            then.status(403);
        });

        let client = client(&server)?;
        let missing = client.list(&repo(), "missing", "main").await;
        assert!(matches!(missing, Err(OriginError::NotFound { .. })));

        let private = client.fetch(&repo(), "private", "main").await;
        assert!(matches!(private, Err(OriginError::Unauthorized { .. })));

        let throttled = client
            .list(&repo(), "throttled", "main")
            .await
            .err()
            .ok_or_else(|| anyhow!("expected rate limit"))?;
        assert_eq!(throttled.retry_after(), Some(Duration::from_secs(7)));
        assert_eq!(throttled.status(), Some(StatusCode::TOO_MANY_REQUESTS));

        let forbidden = client.list(&repo(), "forbidden", "main").await;
        assert!(matches!(
            forbidden,
            Err(OriginError::Status {
                status: StatusCode::FORBIDDEN,
                ..
            })
        ));
        Ok(())
    }

    #[tokio::test]
    async fn server_errors_are_retried_then_surface() -> Result<()> {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/repos/octo/demo/contents/flaky");
            then.status(503);
        });
        let retry = RetryPolicy {
            max_retries: 2,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(5),
        };
        let client = GithubClient::new("secret-token", settings(&server, retry)?)?;

        let err = client
            .list(&repo(), "flaky", "main")
            .await
            .err()
            .ok_or_else(|| anyhow!("expected status failure"))?;

        assert!(matches!(
            err,
            OriginError::Status {
                status: StatusCode::SERVICE_UNAVAILABLE,
                ..
            }
        ));
        assert!(err.is_transient());
        Ok(())
    }

    #[tokio::test]
    async fn fetch_returns_raw_bytes() -> Result<()> {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/repos/octo/demo/contents/bin/logo.png")
                .query_param("ref", "v1.0")
                .header("accept", ACCEPT_RAW);
            then.status(200).body([0x89_u8, b'P', b'N', b'G', 0x00, 0xff]);
        });

        let bytes = client(&server)?
            .fetch(&repo(), "bin/logo.png", "v1.0")
            .await?;

        mock.assert();
        assert_eq!(bytes, vec![0x89, b'P', b'N', b'G', 0x00, 0xff]);
        Ok(())
    }

    #[tokio::test]
    async fn trait_impls_box_origin_errors() -> Result<()> {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/repos/octo/demo/contents/gone");
            then.status(404);
        });
        let client = client(&server)?;
        let reader: &dyn TreeReader = &client;

        let err = reader
            .list_children(&repo(), "gone", "main")
            .await
            .err()
            .ok_or_else(|| anyhow!("expected not found"))?;
        assert!(matches!(
            err.downcast_ref::<OriginError>(),
            Some(OriginError::NotFound { .. })
        ));
        Ok(())
    }
}
