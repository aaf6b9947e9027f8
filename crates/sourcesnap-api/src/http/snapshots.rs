//! `POST /source-snapshots` handler.

use std::sync::Arc;

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::{HeaderMap, StatusCode},
};
use sourcesnap_core::{OriginRepo, SnapshotRequest};
use tracing::{info, warn};

use crate::http::constants::{HEADER_CALLER_ID, HEADER_ORIGIN_TOKEN};
use crate::http::errors::ApiError;
use crate::models::{CreateSnapshotRequest, SnapshotCreatedResponse};
use crate::state::ApiState;

pub(crate) async fn create_snapshot(
    State(state): State<Arc<ApiState>>,
    headers: HeaderMap,
    body: Result<Json<CreateSnapshotRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<SnapshotCreatedResponse>), ApiError> {
    let caller_id = header_value(&headers, HEADER_CALLER_ID).ok_or_else(|| {
        ApiError::unauthorized("caller identity is required")
            .with_invalid_param(HEADER_CALLER_ID, "missing")
    })?;
    let origin_token = header_value(&headers, HEADER_ORIGIN_TOKEN).ok_or_else(|| {
        ApiError::bad_request("origin access token not found")
            .with_invalid_param(HEADER_ORIGIN_TOKEN, "missing")
    })?;
    let Json(payload) = body.map_err(|rejection| ApiError::from_json_rejection(&rejection))?;

    let request = SnapshotRequest::new(
        OriginRepo::new(payload.owner, payload.repo),
        payload.branch,
        &payload.source_path,
        [caller_id, payload.project_id, payload.tmp_id.to_string()],
    )
    .map_err(|err| ApiError::from_request(&err))?;

    match state.snapshots.snapshot(request, &origin_token).await {
        Ok(result) => {
            info!(
                container = result.container(),
                prefix = %result.prefix(),
                file_count = result.file_count(),
                "snapshot created"
            );
            Ok((
                StatusCode::CREATED,
                Json(SnapshotCreatedResponse::from(&result)),
            ))
        }
        Err(err) => {
            warn!(stage = %err.stage(), error = %err, "snapshot request failed");
            Err(ApiError::from_snapshot(&err))
        }
    }
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}
