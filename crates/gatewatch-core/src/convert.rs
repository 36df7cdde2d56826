// ── Wire-to-domain conversions ──
//
// Bridges loosely-typed `gatewatch_api` payloads into canonical domain
// types. Conversion is strict: a missing required field or an
// out-of-enum string rejects the whole record with a typed error --
// records are never stored null-filled. Callers log the rejection so
// it stays observable for diagnostics.

use std::str::FromStr;

use chrono::{DateTime, NaiveDateTime, Utc};

use gatewatch_api::{AccessLogEntry, CameraStatusResponse, DetectionAlertMessage};

use crate::error::CoreError;
use crate::model::{AccessEvent, AccessStatus, CameraStatus, DetectionAlert, DetectionKind};

/// Parse a backend timestamp.
///
/// The backend emits RFC 3339, but frequently without a UTC offset
/// (`2026-08-07T09:15:00.123`). Offset-less values are taken as UTC.
pub(crate) fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, CoreError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(|_| CoreError::MalformedRecord {
            field: "timestamp",
            value: raw.to_owned(),
        })
}

fn parse_kind(raw: &str) -> Result<DetectionKind, CoreError> {
    DetectionKind::from_str(raw).map_err(|_| CoreError::MalformedRecord {
        field: "detection_type",
        value: raw.to_owned(),
    })
}

fn parse_status(raw: &str) -> Result<AccessStatus, CoreError> {
    AccessStatus::from_str(raw).map_err(|_| CoreError::MalformedRecord {
        field: "status",
        value: raw.to_owned(),
    })
}

impl TryFrom<AccessLogEntry> for AccessEvent {
    type Error = CoreError;

    fn try_from(entry: AccessLogEntry) -> Result<Self, Self::Error> {
        Ok(Self {
            timestamp: parse_timestamp(&entry.timestamp)?,
            kind: parse_kind(&entry.detection_type)?,
            detected_value: entry.detected_value,
            subject_id: entry.student_id,
            subject_name: entry.student_name,
            status: parse_status(&entry.status)?,
            confidence: entry.confidence,
        })
    }
}

/// Build a [`DetectionAlert`] from a push message, stamping it with the
/// receipt time rather than any upstream timestamp.
pub(crate) fn alert_from_push(
    msg: DetectionAlertMessage,
    received_at: DateTime<Utc>,
) -> Result<DetectionAlert, CoreError> {
    Ok(DetectionAlert {
        kind: parse_kind(&msg.alert_type)?,
        message: msg.message,
        status: parse_status(&msg.status)?,
        received_at,
    })
}

impl From<CameraStatusResponse> for CameraStatus {
    fn from(resp: CameraStatusResponse) -> Self {
        Self {
            camera_active: resp.camera_active,
            detection_active: resp.detection_active,
            camera_available: resp.camera_available,
        }
    }
}
