// ── Pull-snapshot fetching ──
//
// One poll issues the three read endpoints concurrently. Partial
// failure is isolated per endpoint: a failed fetch is logged and
// surfaced as `None`, and the monitor keeps the previous in-memory
// value for that slice of state. No inline retry -- the next tick or
// debounce covers it.

use std::sync::Arc;

use tracing::{debug, warn};

use gatewatch_api::{
    AccessLogEntry, ApiClient, CameraStatusResponse, DetectionStatsResponse,
};

/// Result of one poll cycle.
///
/// Carries the monotonic sequence number the poll was issued with so
/// the monitor can discard stale responses: a poll issued before a
/// newer one but resolving after it must not overwrite the newer
/// one's state.
#[derive(Debug)]
pub struct PollOutcome {
    pub seq: u64,
    pub logs: Option<Vec<AccessLogEntry>>,
    pub camera: Option<CameraStatusResponse>,
    pub stats: Option<DetectionStatsResponse>,
}

impl PollOutcome {
    /// True when every endpoint failed -- nothing to apply.
    pub fn is_empty(&self) -> bool {
        self.logs.is_none() && self.camera.is_none() && self.stats.is_none()
    }
}

/// Issues pull requests against the backend's read endpoints.
pub struct SnapshotFetcher {
    client: Arc<ApiClient>,
}

impl SnapshotFetcher {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    /// Fetch all three read endpoints concurrently.
    ///
    /// Always returns an outcome; per-endpoint failures are logged and
    /// show up as `None`. Applying the same outcome twice cannot
    /// double-count: logs replace wholesale, stats merge via max, and
    /// camera status overwrites.
    pub async fn poll_once(&self, seq: u64) -> PollOutcome {
        debug!(seq, "poll cycle starting");

        let (logs, camera, stats) = tokio::join!(
            self.client.list_access_logs(),
            self.client.camera_status(),
            self.client.detection_stats(),
        );

        let logs = logs
            .inspect_err(|e| warn!(seq, error = %e, "access_logs poll failed"))
            .ok();
        let camera = camera
            .inspect_err(|e| warn!(seq, error = %e, "camera_status poll failed"))
            .ok();
        let stats = stats
            .inspect_err(|e| warn!(seq, error = %e, "detection_stats poll failed"))
            .ok();

        PollOutcome {
            seq,
            logs,
            camera,
            stats,
        }
    }
}
