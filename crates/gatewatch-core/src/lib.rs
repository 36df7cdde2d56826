// gatewatch-core: event ingestion, bounded retention, and statistics
// aggregation behind the gate dashboard. Reconciles the push channel
// against pull snapshots into one consistent in-memory view.

pub mod aggregate;
pub mod config;
pub mod convert;
pub mod error;
pub mod fetch;
pub mod model;
pub mod monitor;
pub mod store;
pub mod supervisor;
pub mod view;

// ── Primary re-exports ──────────────────────────────────────────────
pub use aggregate::StatsAggregator;
pub use config::MonitorConfig;
pub use error::CoreError;
pub use fetch::{PollOutcome, SnapshotFetcher};
pub use monitor::Monitor;
pub use store::{AlertRing, EventStore};
pub use supervisor::{ConnectionState, ConnectionSupervisor};
pub use view::DashboardSnapshot;

// Re-export model types at the crate root for ergonomics.
pub use model::{
    AccessEvent, AccessStatus, CameraStatus, DetectionAlert, DetectionKind, DetectionStats,
};
