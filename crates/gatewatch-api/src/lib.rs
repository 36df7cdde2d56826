//! Async wire client for the campus gate backend.
//!
//! Two surfaces:
//! - [`ApiClient`] -- pull endpoints (access logs, camera status,
//!   detection stats, control actions) over HTTP/JSON.
//! - [`push::PushHandle`] -- the push channel, a WebSocket stream of
//!   live frames with automatic reconnection.
//!
//! This crate is wire-level only: responses keep their backend shape
//! and enum-ish fields stay as strings. `gatewatch-core` owns strict
//! validation, retention, and aggregation.

pub mod client;
pub mod error;
pub mod push;
pub mod transport;
pub mod types;

pub use client::ApiClient;
pub use error::Error;
pub use push::{PushFrame, PushHandle, ReconnectConfig};
pub use transport::TransportConfig;
pub use types::{
    AccessLogEntry, ActionResponse, CameraStatusResponse, DetectionAlertMessage,
    DetectionStatsResponse,
};
