// ── Runtime monitor configuration ──
//
// Describes *how* to reach the gate backend and how the in-memory view
// is bounded. The embedding application constructs a `MonitorConfig`
// and hands it in -- core never reads config files.

use std::time::Duration;

use url::Url;

use crate::error::CoreError;

/// Configuration for a single [`Monitor`](crate::Monitor).
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Backend root URL (e.g. `http://127.0.0.1:5000`).
    pub base_url: Url,
    /// Push channel URL. `None` derives `<base>/ws/events` with the
    /// scheme mapped http→ws / https→wss.
    pub push_url: Option<Url>,
    /// Enable the push channel. Disabled, the monitor is pull-only.
    pub push_enabled: bool,
    /// Request timeout for pull endpoints.
    pub timeout: Duration,
    /// Steady-state poll interval. Zero disables the periodic timer.
    pub poll_interval: Duration,
    /// Quiet period after a push-delivered event before re-polling,
    /// so a burst settles into one pull.
    pub debounce: Duration,
    /// Most-recent events retained by the `EventStore`.
    pub event_capacity: usize,
    /// Most-recent alerts retained by the `AlertRing`.
    pub alert_capacity: usize,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            // The backend default bind address; embedding apps override.
            base_url: Url::parse("http://127.0.0.1:5000").expect("static URL"),
            push_url: None,
            push_enabled: true,
            timeout: Duration::from_secs(10),
            poll_interval: Duration::from_secs(5),
            debounce: Duration::from_millis(100),
            event_capacity: 100,
            alert_capacity: 10,
        }
    }
}

impl MonitorConfig {
    /// Resolve the push channel URL, deriving it from `base_url` when
    /// not set explicitly.
    pub fn resolved_push_url(&self) -> Result<Url, CoreError> {
        if let Some(ref url) = self.push_url {
            return Ok(url.clone());
        }

        let mut url = self.base_url.join("/ws/events").map_err(|e| CoreError::Config {
            message: format!("cannot derive push URL: {e}"),
        })?;
        let scheme = match url.scheme() {
            "https" | "wss" => "wss",
            _ => "ws",
        };
        url.set_scheme(scheme).map_err(|()| CoreError::Config {
            message: format!("cannot set push URL scheme on {url}"),
        })?;
        Ok(url)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn push_url_derived_from_base() {
        let config = MonitorConfig {
            base_url: Url::parse("http://10.0.0.7:5000").unwrap(),
            ..MonitorConfig::default()
        };
        let url = config.resolved_push_url().unwrap();
        assert_eq!(url.as_str(), "ws://10.0.0.7:5000/ws/events");
    }

    #[test]
    fn push_url_https_maps_to_wss() {
        let config = MonitorConfig {
            base_url: Url::parse("https://gate.campus.edu").unwrap(),
            ..MonitorConfig::default()
        };
        let url = config.resolved_push_url().unwrap();
        assert_eq!(url.scheme(), "wss");
    }

    #[test]
    fn explicit_push_url_wins() {
        let config = MonitorConfig {
            push_url: Some(Url::parse("ws://other:9000/stream").unwrap()),
            ..MonitorConfig::default()
        };
        let url = config.resolved_push_url().unwrap();
        assert_eq!(url.as_str(), "ws://other:9000/stream");
    }
}
