// ── Canonical domain model ──

pub mod event;
pub mod stats;

pub use event::{AccessEvent, AccessStatus, CameraStatus, DetectionAlert, DetectionKind};
pub use stats::DetectionStats;
