// ── Dashboard projection ──
//
// The read-only composition handed to presentation. Pure view: every
// field is a snapshot of state the monitor already published, so
// capturing one is cheap (Arc clones) and never blocks the update path.

use std::sync::Arc;

use crate::model::{AccessEvent, CameraStatus, DetectionAlert, DetectionStats};
use crate::supervisor::ConnectionState;

/// One coherent view of the dashboard state.
///
/// Captured atomically with respect to the update loop: each trigger
/// publishes all of its effects before the next is processed, so a
/// snapshot never mixes halves of two updates.
#[derive(Debug, Clone)]
pub struct DashboardSnapshot {
    pub connection: ConnectionState,
    /// Display order, most-recent-first, capped at the store capacity.
    pub events: Arc<Vec<Arc<AccessEvent>>>,
    /// Most-recent-first, capped at the ring capacity.
    pub alerts: Arc<Vec<DetectionAlert>>,
    pub stats: DetectionStats,
    pub camera: CameraStatus,
    /// Whether a live camera frame has been received.
    pub has_live_frame: bool,
}
