//! RFC9457-style API error wrapper.

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sourcesnap_core::{RequestError, SnapshotError, SnapshotStage};
use sourcesnap_origin::OriginError;

use crate::http::constants::{
    PROBLEM_BAD_REQUEST, PROBLEM_CONFIG_INVALID, PROBLEM_INTERNAL, PROBLEM_NOT_FOUND,
    PROBLEM_ORIGIN_UNAVAILABLE, PROBLEM_RATE_LIMITED, PROBLEM_STORE_UNAVAILABLE, PROBLEM_TIMEOUT,
    PROBLEM_UNAUTHORIZED,
};
use crate::models::{ProblemDetails, ProblemInvalidParam};

/// Structured API error with optional RFC9457 fields.
#[derive(Debug)]
pub(crate) struct ApiError {
    pub(crate) status: StatusCode,
    pub(crate) kind: &'static str,
    title: &'static str,
    detail: Option<String>,
    pub(crate) invalid_params: Option<Vec<ProblemInvalidParam>>,
}

impl ApiError {
    const fn new(status: StatusCode, kind: &'static str, title: &'static str) -> Self {
        Self {
            status,
            kind,
            title,
            detail: None,
            invalid_params: None,
        }
    }

    pub(crate) fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub(crate) fn with_invalid_param(
        mut self,
        pointer: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        self.invalid_params
            .get_or_insert_with(Vec::new)
            .push(ProblemInvalidParam {
                pointer: pointer.into(),
                message: message.into(),
            });
        self
    }

    pub(crate) fn internal(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            PROBLEM_INTERNAL,
            "internal server error",
        )
        .with_detail(message)
    }

    pub(crate) fn unauthorized(detail: impl Into<String>) -> Self {
        Self::new(
            StatusCode::UNAUTHORIZED,
            PROBLEM_UNAUTHORIZED,
            "authentication required",
        )
        .with_detail(detail)
    }

    pub(crate) fn bad_request(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, PROBLEM_BAD_REQUEST, "bad request").with_detail(detail)
    }

    fn not_found(detail: impl Into<String>) -> Self {
        Self::new(
            StatusCode::NOT_FOUND,
            PROBLEM_NOT_FOUND,
            "resource not found",
        )
        .with_detail(detail)
    }

    fn config_invalid(detail: impl Into<String>) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            PROBLEM_CONFIG_INVALID,
            "configuration invalid",
        )
        .with_detail(detail)
    }

    fn too_many_requests(detail: impl Into<String>) -> Self {
        Self::new(
            StatusCode::TOO_MANY_REQUESTS,
            PROBLEM_RATE_LIMITED,
            "rate limit exceeded",
        )
        .with_detail(detail)
    }

    fn origin_unavailable(detail: impl Into<String>) -> Self {
        Self::new(
            StatusCode::BAD_GATEWAY,
            PROBLEM_ORIGIN_UNAVAILABLE,
            "origin unavailable",
        )
        .with_detail(detail)
    }

    fn store_unavailable(detail: impl Into<String>) -> Self {
        Self::new(
            StatusCode::BAD_GATEWAY,
            PROBLEM_STORE_UNAVAILABLE,
            "store unavailable",
        )
        .with_detail(detail)
    }

    fn timeout(detail: impl Into<String>) -> Self {
        Self::new(
            StatusCode::GATEWAY_TIMEOUT,
            PROBLEM_TIMEOUT,
            "snapshot timed out",
        )
        .with_detail(detail)
    }

    /// Map a validation failure onto a 400 that points at the offending field.
    pub(crate) fn from_request(err: &RequestError) -> Self {
        let pointer = match err.field() {
            "ref" => "/branch".to_string(),
            "identity" => "/project_id".to_string(),
            field => format!("/{field}"),
        };
        let message = match err {
            RequestError::MissingField { .. } => "must not be blank",
            RequestError::InvalidField { reason, .. } => reason,
        };
        Self::bad_request("snapshot request is invalid").with_invalid_param(pointer, message)
    }

    /// Map a body that failed to deserialize onto a 400.
    pub(crate) fn from_json_rejection(rejection: &JsonRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }

    /// Map a snapshot failure onto its HTTP status.
    ///
    /// Origin failures keep the origin's own 401/404/429 semantics; anything else the
    /// origin does is a bad gateway.
    pub(crate) fn from_snapshot(err: &SnapshotError) -> Self {
        let detail = err.message().to_string();
        match err.stage() {
            SnapshotStage::Configuration => Self::config_invalid(detail),
            SnapshotStage::TreeRead | SnapshotStage::BlobFetch => {
                match err.cause::<OriginError>() {
                    Some(OriginError::NotFound { .. }) => Self::not_found(detail),
                    Some(OriginError::Unauthorized { .. } | OriginError::MissingCredential) => {
                        Self::unauthorized(detail)
                    }
                    Some(OriginError::RateLimited { .. }) => Self::too_many_requests(detail),
                    _ => Self::origin_unavailable(detail),
                }
            }
            SnapshotStage::StoreWrite => Self::store_unavailable(detail),
            SnapshotStage::Cancelled => Self::timeout(detail),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ProblemDetails {
            kind: self.kind.to_string(),
            title: self.title.to_string(),
            status: self.status.as_u16(),
            detail: self.detail,
            invalid_params: self.invalid_params,
        };
        (self.status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    fn origin(err: OriginError) -> SnapshotError {
        SnapshotError::tree_read("failed to list octo/demo:src@main").with_source(err)
    }

    #[test]
    fn snapshot_stages_map_to_statuses() {
        let cases = [
            (
                SnapshotError::configuration("destination store is not configured"),
                StatusCode::INTERNAL_SERVER_ERROR,
                PROBLEM_CONFIG_INVALID,
            ),
            (
                origin(OriginError::NotFound {
                    operation: "list",
                    url: String::new(),
                }),
                StatusCode::NOT_FOUND,
                PROBLEM_NOT_FOUND,
            ),
            (
                origin(OriginError::Unauthorized {
                    operation: "list",
                    url: String::new(),
                }),
                StatusCode::UNAUTHORIZED,
                PROBLEM_UNAUTHORIZED,
            ),
            (
                SnapshotError::blob_fetch("failed to fetch").with_source(
                    OriginError::RateLimited {
                        operation: "fetch",
                        url: String::new(),
                        retry_after: None,
                    },
                ),
                StatusCode::TOO_MANY_REQUESTS,
                PROBLEM_RATE_LIMITED,
            ),
            (
                origin(OriginError::Status {
                    operation: "list",
                    url: String::new(),
                    status: StatusCode::SERVICE_UNAVAILABLE,
                }),
                StatusCode::BAD_GATEWAY,
                PROBLEM_ORIGIN_UNAVAILABLE,
            ),
            (
                SnapshotError::tree_read("listing node outside root")
                    .with_source(io::Error::other("outside")),
                StatusCode::BAD_GATEWAY,
                PROBLEM_ORIGIN_UNAVAILABLE,
            ),
            (
                SnapshotError::store_write("failed to write"),
                StatusCode::BAD_GATEWAY,
                PROBLEM_STORE_UNAVAILABLE,
            ),
            (
                SnapshotError::cancelled("deadline elapsed"),
                StatusCode::GATEWAY_TIMEOUT,
                PROBLEM_TIMEOUT,
            ),
        ];
        for (err, status, kind) in cases {
            let mapped = ApiError::from_snapshot(&err);
            assert_eq!(mapped.status, status, "{err}");
            assert_eq!(mapped.kind, kind, "{err}");
        }
    }

    #[test]
    fn request_errors_point_at_body_fields() {
        let mapped = ApiError::from_request(&RequestError::MissingField { field: "ref" });
        assert_eq!(mapped.status, StatusCode::BAD_REQUEST);
        assert_eq!(
            mapped.invalid_params,
            Some(vec![ProblemInvalidParam {
                pointer: "/branch".to_string(),
                message: "must not be blank".to_string(),
            }])
        );

        let mapped = ApiError::from_request(&RequestError::InvalidField {
            field: "identity",
            reason: "empty_segment",
            value: None,
        });
        assert_eq!(
            mapped.invalid_params.map(|params| params[0].pointer.clone()),
            Some("/project_id".to_string())
        );
    }
}
