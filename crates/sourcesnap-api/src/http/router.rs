//! Router construction and server host for the API.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    http::Request,
    routing::{get, post},
};
use sourcesnap_telemetry::{Metrics, build_sha};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::{Span, info};

use crate::error::{ApiServerError, ApiServerResult};
use crate::http::constants::{HEADER_REQUEST_ID, ROUTE_HEALTH, ROUTE_METRICS, ROUTE_SNAPSHOTS};
use crate::http::health::{health, metrics};
use crate::http::snapshots::create_snapshot;
use crate::http::telemetry::HttpMetricsLayer;
use crate::service::SnapshotService;
use crate::state::ApiState;

/// Axum router wrapper that hosts the snapshot API.
pub struct ApiServer {
    router: Router,
}

impl ApiServer {
    /// Construct the API with its snapshot service and metrics registry.
    #[must_use]
    pub fn new(snapshots: Arc<dyn SnapshotService>, telemetry: Metrics) -> Self {
        let state = Arc::new(ApiState::new(snapshots, telemetry.clone()));
        let trace_layer = TraceLayer::new_for_http()
            .make_span_with(|request: &Request<_>| {
                let request_id = request
                    .headers()
                    .get(HEADER_REQUEST_ID)
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("")
                    .to_string();

                tracing::info_span!(
                    "http.request",
                    method = %request.method(),
                    route = %request.uri().path(),
                    request_id = %request_id,
                    build_sha = %build_sha(),
                    status_code = tracing::field::Empty,
                    latency_ms = tracing::field::Empty
                )
            })
            .on_request(|_request: &Request<_>, _span: &Span| {})
            .on_response(
                |response: &axum::response::Response, latency: Duration, span: &Span| {
                    span.record("status_code", response.status().as_u16());
                    let latency_ms = u64::try_from(latency.as_millis()).unwrap_or(u64::MAX);
                    span.record("latency_ms", latency_ms);
                },
            );
        let layered = ServiceBuilder::new()
            .layer(sourcesnap_telemetry::propagate_request_id_layer())
            .layer(sourcesnap_telemetry::set_request_id_layer())
            .layer(trace_layer)
            .layer(HttpMetricsLayer::new(telemetry));

        let router = Router::new()
            .route(ROUTE_SNAPSHOTS, post(create_snapshot))
            .route(ROUTE_HEALTH, get(health))
            .route(ROUTE_METRICS, get(metrics))
            .route_layer(layered)
            .with_state(state);

        Self { router }
    }

    /// Serve the API on the supplied address until the process is stopped.
    ///
    /// # Errors
    ///
    /// Returns an error if the listener fails to bind or the server terminates unexpectedly.
    pub async fn serve(self, addr: SocketAddr) -> ApiServerResult<()> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ApiServerError::Bind { addr, source })?;
        info!(addr = %addr, "API listener bound");
        axum::serve(listener, self.router.into_make_service())
            .await
            .map_err(|source| ApiServerError::Serve { source })
    }

    #[cfg(test)]
    pub(crate) fn router(&self) -> Router {
        self.router.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use async_trait::async_trait;
    use axum::body::{Body, to_bytes};
    use axum::http::{HeaderMap, StatusCode, header::CONTENT_TYPE};
    use serde_json::{Value, json};
    use sourcesnap_core::{SnapshotError, SnapshotOutcome, SnapshotRequest, SnapshotResult};
    use sourcesnap_origin::OriginError;
    use std::sync::{Mutex, PoisonError};
    use tower::ServiceExt;

    use crate::http::constants::{
        HEADER_CALLER_ID, HEADER_ORIGIN_TOKEN, PROBLEM_BAD_REQUEST, PROBLEM_CONFIG_INVALID,
        PROBLEM_NOT_FOUND, PROBLEM_UNAUTHORIZED,
    };

    type Responder =
        Box<dyn Fn(&SnapshotRequest) -> SnapshotOutcome<SnapshotResult> + Send + Sync>;

    struct StubSnapshots {
        respond: Responder,
        configured: bool,
        seen: Mutex<Vec<(SnapshotRequest, String)>>,
    }

    impl StubSnapshots {
        fn succeeding() -> Self {
            Self::responding(|request| {
                let prefix = request.base_prefix();
                let location = format!("memory://bucket/{prefix}");
                Ok(SnapshotResult::new("bucket", prefix, 2, location))
            })
        }

        fn failing(make: impl Fn() -> SnapshotError + Send + Sync + 'static) -> Self {
            Self::responding(move |_| Err(make()))
        }

        fn responding(
            respond: impl Fn(&SnapshotRequest) -> SnapshotOutcome<SnapshotResult>
            + Send
            + Sync
            + 'static,
        ) -> Self {
            Self {
                respond: Box::new(respond),
                configured: true,
                seen: Mutex::new(Vec::new()),
            }
        }

        fn seen(&self) -> Vec<(SnapshotRequest, String)> {
            self.seen
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone()
        }
    }

    #[async_trait]
    impl SnapshotService for StubSnapshots {
        async fn snapshot(
            &self,
            request: SnapshotRequest,
            origin_token: &str,
        ) -> SnapshotOutcome<SnapshotResult> {
            let outcome = (self.respond)(&request);
            self.seen
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push((request, origin_token.to_string()));
            outcome
        }

        fn store_configured(&self) -> bool {
            self.configured
        }
    }

    struct Harness {
        server: ApiServer,
        stub: Arc<StubSnapshots>,
    }

    impl Harness {
        fn new(stub: StubSnapshots) -> Result<Self> {
            let stub = Arc::new(stub);
            let service: Arc<dyn SnapshotService> = stub.clone();
            Ok(Self {
                server: ApiServer::new(service, Metrics::new()?),
                stub,
            })
        }

        async fn send(&self, request: Request<Body>) -> Result<(StatusCode, HeaderMap, Value)> {
            let response = self.server.router().oneshot(request).await?;
            let status = response.status();
            let headers = response.headers().clone();
            let bytes = to_bytes(response.into_body(), usize::MAX).await?;
            let body = serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));
            Ok((status, headers, body))
        }
    }

    fn body() -> Value {
        json!({
            "project_id": "p1",
            "tmp_id": 7,
            "owner": "octo",
            "repo": "demo",
            "branch": "main",
            "source_path": "/src/"
        })
    }

    fn post_snapshot(
        payload: &Value,
        caller: Option<&str>,
        token: Option<&str>,
    ) -> Result<Request<Body>> {
        let mut builder = Request::builder()
            .method("POST")
            .uri(ROUTE_SNAPSHOTS)
            .header(CONTENT_TYPE, "application/json");
        if let Some(caller) = caller {
            builder = builder.header(HEADER_CALLER_ID, caller);
        }
        if let Some(token) = token {
            builder = builder.header(HEADER_ORIGIN_TOKEN, token);
        }
        Ok(builder.body(Body::from(serde_json::to_vec(payload)?))?)
    }

    fn get(uri: &str) -> Result<Request<Body>> {
        Ok(Request::builder().uri(uri).body(Body::empty())?)
    }

    #[tokio::test]
    async fn create_snapshot_returns_created_result() -> Result<()> {
        let harness = Harness::new(StubSnapshots::succeeding())?;

        let (status, headers, body) = harness
            .send(post_snapshot(&body(), Some("u-1"), Some("gh-token"))?)
            .await?;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(
            body,
            json!({
                "container": "bucket",
                "prefix": "user/u-1/p1/7",
                "file_count": 2,
                "url": "memory://bucket/user/u-1/p1/7"
            })
        );
        assert!(headers.contains_key(HEADER_REQUEST_ID));

        let seen = harness.stub.seen();
        assert_eq!(seen.len(), 1);
        let (request, token) = &seen[0];
        assert_eq!(token, "gh-token");
        assert_eq!(request.identity(), ["u-1", "p1", "7"]);
        assert_eq!(request.root_path(), "src");
        assert_eq!(request.git_ref(), "main");
        Ok(())
    }

    #[tokio::test]
    async fn source_path_defaults_to_whole_tree() -> Result<()> {
        let harness = Harness::new(StubSnapshots::succeeding())?;
        let mut payload = body();
        if let Some(object) = payload.as_object_mut() {
            object.remove("source_path");
        }

        let (status, _, _) = harness
            .send(post_snapshot(&payload, Some("u-1"), Some("gh-token"))?)
            .await?;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(harness.stub.seen()[0].0.root_path(), "");
        Ok(())
    }

    #[tokio::test]
    async fn missing_caller_is_unauthorized() -> Result<()> {
        let harness = Harness::new(StubSnapshots::succeeding())?;

        let (status, _, body) = harness
            .send(post_snapshot(&body(), None, Some("gh-token"))?)
            .await?;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["type"], PROBLEM_UNAUTHORIZED);
        assert!(harness.stub.seen().is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn missing_origin_token_is_bad_request() -> Result<()> {
        let harness = Harness::new(StubSnapshots::succeeding())?;

        let (status, _, body) = harness
            .send(post_snapshot(&body(), Some("u-1"), Some("   "))?)
            .await?;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["type"], PROBLEM_BAD_REQUEST);
        assert_eq!(body["invalid_params"][0]["pointer"], HEADER_ORIGIN_TOKEN);
        assert!(harness.stub.seen().is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn invalid_bodies_are_bad_requests() -> Result<()> {
        let harness = Harness::new(StubSnapshots::succeeding())?;

        let mut missing_branch = body();
        if let Some(object) = missing_branch.as_object_mut() {
            object.remove("branch");
        }
        let (status, _, problem) = harness
            .send(post_snapshot(&missing_branch, Some("u-1"), Some("t"))?)
            .await?;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(problem["type"], PROBLEM_BAD_REQUEST);

        let mut blank_owner = body();
        blank_owner["owner"] = json!(" ");
        let (status, _, problem) = harness
            .send(post_snapshot(&blank_owner, Some("u-1"), Some("t"))?)
            .await?;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(problem["invalid_params"][0]["pointer"], "/owner");

        assert!(harness.stub.seen().is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn snapshot_failures_become_problems() -> Result<()> {
        let not_found = Harness::new(StubSnapshots::failing(|| {
            SnapshotError::tree_read("failed to list octo/demo:src@main").with_source(
                OriginError::NotFound {
                    operation: "list",
                    url: String::new(),
                },
            )
        }))?;
        let (status, _, body) = not_found
            .send(post_snapshot(&body(), Some("u-1"), Some("t"))?)
            .await?;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["type"], PROBLEM_NOT_FOUND);
        assert_eq!(body["detail"], "failed to list octo/demo:src@main");

        let unconfigured = Harness::new(StubSnapshots::failing(|| {
            SnapshotError::configuration("destination store is not configured")
        }))?;
        let (status, _, body) = unconfigured
            .send(post_snapshot(&self::body(), Some("u-1"), Some("t"))?)
            .await?;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["type"], PROBLEM_CONFIG_INVALID);
        assert_eq!(body["status"], 500);
        Ok(())
    }

    #[tokio::test]
    async fn health_reports_store_state() -> Result<()> {
        let mut stub = StubSnapshots::succeeding();
        stub.configured = false;
        let harness = Harness::new(stub)?;

        let (status, _, body) = harness.send(get(ROUTE_HEALTH)?).await?;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["store_configured"], false);
        assert!(body["build"].is_string());
        Ok(())
    }

    #[tokio::test]
    async fn metrics_count_requests_by_route() -> Result<()> {
        let harness = Harness::new(StubSnapshots::succeeding())?;
        harness.send(get(ROUTE_HEALTH)?).await?;

        let (status, headers, body) = harness.send(get(ROUTE_METRICS)?).await?;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            headers.get(CONTENT_TYPE).and_then(|value| value.to_str().ok()),
            Some("text/plain; version=0.0.4")
        );
        let text = body.as_str().unwrap_or_default();
        assert!(text.contains("http_requests_total{code=\"200\",route=\"/health\"} 1"));
        Ok(())
    }
}
