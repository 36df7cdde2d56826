// ── Core error types ──
//
// Consumer-facing errors from gatewatch-core. These are NOT wire-specific --
// the presentation layer never sees HTTP status codes or JSON parse
// failures directly. The `From<gatewatch_api::Error>` impl translates
// transport-layer errors into domain-appropriate variants.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot reach backend at {url}: {reason}")]
    BackendUnreachable { url: String, reason: String },

    #[error("Backend request timed out")]
    Timeout,

    /// The monitor has been shut down; no further triggers are accepted.
    #[error("Monitor stopped")]
    MonitorStopped,

    // ── Data errors ──────────────────────────────────────────────────
    /// A push or pull record failed strict validation and was dropped.
    #[error("Malformed record: {field} = {value:?}")]
    MalformedRecord { field: &'static str, value: String },

    // ── Operation errors ─────────────────────────────────────────────
    /// The backend rejected a control action (non-2xx), with its message.
    #[error("Backend rejected the request: {message}")]
    Rejected { message: String, status: Option<u16> },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

// ── Conversion from wire-layer errors ────────────────────────────────

impl From<gatewatch_api::Error> for CoreError {
    fn from(err: gatewatch_api::Error) -> Self {
        match err {
            gatewatch_api::Error::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout
                } else if e.is_connect() {
                    CoreError::BackendUnreachable {
                        url: e
                            .url()
                            .map(ToString::to_string)
                            .unwrap_or_else(|| "<unknown>".into()),
                        reason: e.to_string(),
                    }
                } else {
                    CoreError::Rejected {
                        message: e.to_string(),
                        status: e.status().map(|s| s.as_u16()),
                    }
                }
            }
            gatewatch_api::Error::Timeout { .. } => CoreError::Timeout,
            gatewatch_api::Error::Api { status, message } => CoreError::Rejected {
                message,
                status: Some(status),
            },
            gatewatch_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            gatewatch_api::Error::PushConnect(reason) => CoreError::BackendUnreachable {
                url: String::new(),
                reason: format!("push channel connection failed: {reason}"),
            },
            gatewatch_api::Error::PushClosed { code, reason } => CoreError::BackendUnreachable {
                url: String::new(),
                reason: format!("push channel closed (code {code}): {reason}"),
            },
            gatewatch_api::Error::Deserialization { message, body: _ } => {
                CoreError::Internal(format!("Deserialization error: {message}"))
            }
        }
    }
}
