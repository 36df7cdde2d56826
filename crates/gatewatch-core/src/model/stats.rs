// ── Aggregate statistics ──

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Fallback peak-hour label shown before any event has been observed.
pub(crate) const INITIAL_PEAK_HOUR: &str = "09:00";

/// Point-in-time aggregate over today's events.
///
/// Derived -- never the store of truth. Every field except `peak_hour`
/// is recomputable from the current `EventStore` content alone;
/// `peak_hour` is sticky across recomputations when the day-scoped set
/// is empty, so the dashboard never flickers back to a default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectionStats {
    pub total_detections: u64,
    pub granted: u64,
    pub denied: u64,
    pub license_plates: u64,
    pub faces: u64,
    pub student_ids: u64,
    /// Distinct plate values among today's license-plate events.
    /// Local derivation only -- the backend does not report it.
    pub unique_vehicles: u64,
    /// Sparse histogram keyed by zero-padded `"HH:00"` labels.
    /// Hours with no detections are absent, not zero -- callers that
    /// need a dense series zero-fill for display.
    pub hourly_distribution: BTreeMap<String, u64>,
    pub peak_hour: String,
}

impl Default for DetectionStats {
    fn default() -> Self {
        Self {
            total_detections: 0,
            granted: 0,
            denied: 0,
            license_plates: 0,
            faces: 0,
            student_ids: 0,
            unique_vehicles: 0,
            hourly_distribution: BTreeMap::new(),
            peak_hour: INITIAL_PEAK_HOUR.to_owned(),
        }
    }
}
