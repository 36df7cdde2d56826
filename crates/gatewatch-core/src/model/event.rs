// ── Access event domain types ──

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// What the detector recognized. Closed set -- any other wire value is
/// a malformed-input error, never a silent default.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DetectionKind {
    LicensePlate,
    Face,
    StudentId,
}

/// The access decision attached to a detection.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AccessStatus {
    Granted,
    Denied,
}

/// One observed access decision -- the canonical record everything
/// else (alerts, stats) is a view of.
///
/// Immutable after creation; evicted only when retention capacity is
/// exceeded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessEvent {
    pub timestamp: DateTime<Utc>,
    pub kind: DetectionKind,
    /// Plate text, scanned code, or face-match identifier.
    pub detected_value: String,
    pub subject_id: Option<String>,
    pub subject_name: Option<String>,
    pub status: AccessStatus,
    /// Detector confidence in 0..=1, when the upstream reports one.
    pub confidence: Option<f64>,
}

impl AccessEvent {
    /// Case-insensitive substring match over the searchable fields.
    pub fn matches(&self, needle_lower: &str) -> bool {
        let hit = |s: &str| s.to_lowercase().contains(needle_lower);
        hit(&self.detected_value)
            || self.subject_name.as_deref().is_some_and(hit)
            || self.subject_id.as_deref().is_some_and(hit)
    }
}

/// A transient notification derived from a detection.
///
/// `received_at` is assigned when the push message arrives, not taken
/// from the underlying event -- alerts are ephemeral UX, not an audit
/// trail, and are never reconstructed from pull snapshots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionAlert {
    pub kind: DetectionKind,
    pub message: String,
    pub status: AccessStatus,
    pub received_at: DateTime<Utc>,
}

/// Camera pipeline status as last reported by the backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CameraStatus {
    pub camera_active: bool,
    pub detection_active: bool,
    pub camera_available: bool,
}
