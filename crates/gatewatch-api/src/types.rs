// Wire-shaped response types for the pull endpoints.
//
// These stay loosely typed on purpose: the backend is inconsistent
// about field presence, and strings carry enum-ish values. Strict
// validation (closed enums, timestamp parsing) happens in
// gatewatch-core's conversion layer, where a malformed record can be
// rejected with a proper diagnostic instead of a serde error that
// would poison the whole response.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One row from `GET /api/access_logs`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessLogEntry {
    /// RFC 3339 timestamp; the backend sometimes omits the UTC offset.
    pub timestamp: String,
    pub detection_type: String,
    pub detected_value: String,
    #[serde(default)]
    pub student_id: Option<String>,
    #[serde(default)]
    pub student_name: Option<String>,
    pub status: String,
    #[serde(default)]
    pub confidence: Option<f64>,
}

/// Response from `GET /api/camera_status`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CameraStatusResponse {
    #[serde(default)]
    pub camera_active: bool,
    #[serde(default)]
    pub detection_active: bool,
    #[serde(default)]
    pub camera_available: bool,
}

/// Response from `GET /api/detection_stats`.
///
/// `hourly_distribution` keys are zero-padded `"HH:00"` labels; hours
/// with no detections are absent, not zero.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DetectionStatsResponse {
    #[serde(default)]
    pub total_detections: u64,
    #[serde(default)]
    pub granted: u64,
    #[serde(default)]
    pub denied: u64,
    #[serde(default)]
    pub license_plates: u64,
    #[serde(default)]
    pub faces: u64,
    #[serde(default)]
    pub student_ids: u64,
    #[serde(default)]
    pub hourly_distribution: BTreeMap<String, u64>,
}

/// Response from the POST control endpoints
/// (`start_camera`, `stop_camera`, `toggle_detection`, `import_csv`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionResponse {
    #[serde(default)]
    pub message: String,
}

/// Payload of a `detection_alert` push message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionAlertMessage {
    #[serde(rename = "type")]
    pub alert_type: String,
    pub message: String,
    pub status: String,
}
