//! Shared handler state.

use std::sync::Arc;

use sourcesnap_telemetry::Metrics;

use crate::service::SnapshotService;

pub(crate) struct ApiState {
    pub(crate) snapshots: Arc<dyn SnapshotService>,
    pub(crate) telemetry: Metrics,
}

impl ApiState {
    pub(crate) fn new(snapshots: Arc<dyn SnapshotService>, telemetry: Metrics) -> Self {
        Self {
            snapshots,
            telemetry,
        }
    }
}
