//! Push channel with auto-reconnect.
//!
//! Connects to the gate backend's WebSocket endpoint and streams parsed
//! frames through a [`tokio::sync::broadcast`] channel. Handles
//! reconnection with exponential backoff + jitter automatically.
//!
//! The channel carries two kinds of traffic: lifecycle signals
//! ([`PushFrame::Up`] / [`PushFrame::Down`]) synthesized by the loop
//! itself as the socket comes and goes, and backend messages parsed
//! from JSON text frames of the shape `{ "event": ..., "data": ... }`.
//!
//! # Example
//!
//! ```rust,ignore
//! use gatewatch_api::push::{PushHandle, ReconnectConfig};
//! use tokio_util::sync::CancellationToken;
//! use url::Url;
//!
//! let cancel = CancellationToken::new();
//! let ws_url = Url::parse("ws://127.0.0.1:5000/ws/events")?;
//!
//! let handle = PushHandle::connect(ws_url, ReconnectConfig::default(), cancel.clone());
//! let mut rx = handle.subscribe();
//!
//! while let Ok(frame) = rx.recv().await {
//!     println!("{frame:?}");
//! }
//!
//! handle.shutdown();
//! ```

use std::time::Duration;

use futures_util::StreamExt;
use serde::Deserialize;
use tokio::sync::broadcast;
use tokio_tungstenite::tungstenite;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::error::Error;
use crate::types::{AccessLogEntry, DetectionAlertMessage};

const FRAME_CHANNEL_CAPACITY: usize = 256;

// ── PushFrame ────────────────────────────────────────────────────────

/// A frame delivered by the push channel.
#[derive(Debug, Clone)]
pub enum PushFrame {
    /// The socket is open; live delivery has (re)started.
    Up,
    /// The socket dropped; events produced while down are never
    /// delivered here -- the pull path compensates.
    Down,
    /// A base64-encoded JPEG frame for the live camera view.
    CameraFrame { image: String },
    /// A transient detection notification.
    DetectionAlert(DetectionAlertMessage),
    /// A freshly recorded access decision.
    NewAccessLog(AccessLogEntry),
}

// ── ReconnectConfig ──────────────────────────────────────────────────

/// Exponential backoff configuration for push-channel reconnection.
#[derive(Debug, Clone)]
pub struct ReconnectConfig {
    /// Delay before the first reconnection attempt. Default: 1s.
    pub initial_delay: Duration,

    /// Upper bound on backoff delay. Default: 30s.
    pub max_delay: Duration,

    /// Maximum reconnection attempts before giving up.
    /// `None` means retry forever.
    pub max_retries: Option<u32>,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            max_retries: None,
        }
    }
}

// ── PushHandle ───────────────────────────────────────────────────────

/// Handle to a running push-channel stream.
///
/// Subscribe for frames; call [`shutdown`](Self::shutdown) (or cancel
/// the token passed to `connect`) to tear down the background task.
pub struct PushHandle {
    frame_rx: broadcast::Receiver<PushFrame>,
    cancel: CancellationToken,
}

impl PushHandle {
    /// Spawn the reconnection loop against the given WebSocket URL.
    ///
    /// Returns immediately; the first connection attempt happens
    /// asynchronously. Subscribe to the receiver to consume frames.
    pub fn connect(ws_url: Url, reconnect: ReconnectConfig, cancel: CancellationToken) -> Self {
        let (frame_tx, frame_rx) = broadcast::channel(FRAME_CHANNEL_CAPACITY);

        let task_cancel = cancel.clone();
        tokio::spawn(async move {
            push_loop(ws_url, frame_tx, reconnect, task_cancel).await;
        });

        Self { frame_rx, cancel }
    }

    /// Get a new broadcast receiver for the frame stream.
    ///
    /// Multiple consumers can subscribe concurrently. A consumer that
    /// falls behind receives [`broadcast::error::RecvError::Lagged`].
    pub fn subscribe(&self) -> broadcast::Receiver<PushFrame> {
        self.frame_rx.resubscribe()
    }

    /// Signal the background task to shut down gracefully.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }
}

// ── Background reconnection loop ─────────────────────────────────────

/// Main loop: connect → read → on error, backoff → reconnect.
async fn push_loop(
    ws_url: Url,
    frame_tx: broadcast::Sender<PushFrame>,
    reconnect: ReconnectConfig,
    cancel: CancellationToken,
) {
    let mut attempt: u32 = 0;

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            result = connect_and_read(&ws_url, &frame_tx, &cancel) => {
                let _ = frame_tx.send(PushFrame::Down);

                match result {
                    // Clean disconnect (server close frame or stream ended).
                    // Reset the attempt counter and reconnect immediately.
                    Ok(()) => {
                        tracing::info!("push channel disconnected cleanly, reconnecting");
                        attempt = 0;
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, attempt, "push channel error");

                        if let Some(max) = reconnect.max_retries {
                            if attempt >= max {
                                tracing::error!(
                                    max_retries = max,
                                    "push channel reconnection limit reached, giving up"
                                );
                                break;
                            }
                        }

                        let delay = calculate_backoff(attempt, &reconnect);
                        tracing::info!(
                            delay_ms = delay.as_millis() as u64,
                            attempt,
                            "waiting before reconnect"
                        );

                        tokio::select! {
                            biased;
                            _ = cancel.cancelled() => break,
                            _ = tokio::time::sleep(delay) => {}
                        }

                        attempt += 1;
                    }
                }
            }
        }
    }
}

// ── Single connection lifecycle ──────────────────────────────────────

/// Establish one WebSocket connection and read frames until it drops.
async fn connect_and_read(
    url: &Url,
    frame_tx: &broadcast::Sender<PushFrame>,
    cancel: &CancellationToken,
) -> Result<(), Error> {
    tracing::info!(url = %url, "connecting to push channel");

    let (ws_stream, _response) = tokio_tungstenite::connect_async(url.as_str())
        .await
        .map_err(|e| Error::PushConnect(e.to_string()))?;

    tracing::info!("push channel connected");
    let _ = frame_tx.send(PushFrame::Up);

    let (_write, mut read) = ws_stream.split();

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Ok(()),
            frame = read.next() => {
                match frame {
                    Some(Ok(tungstenite::Message::Text(text))) => {
                        if let Some(parsed) = parse_frame(&text) {
                            // Send errors just mean no active subscribers.
                            let _ = frame_tx.send(parsed);
                        }
                    }
                    Some(Ok(tungstenite::Message::Ping(_))) => {
                        // tungstenite handles pong replies automatically
                        tracing::trace!("push channel ping");
                    }
                    Some(Ok(tungstenite::Message::Close(frame))) => {
                        if let Some(ref cf) = frame {
                            tracing::info!(
                                code = %cf.code,
                                reason = %cf.reason,
                                "push channel close frame received"
                            );
                        } else {
                            tracing::info!("push channel close frame received (no payload)");
                        }
                        return Ok(());
                    }
                    Some(Err(e)) => {
                        return Err(Error::PushConnect(e.to_string()));
                    }
                    None => {
                        tracing::info!("push channel stream ended");
                        return Ok(());
                    }
                    _ => {
                        // Binary, Pong, Frame -- ignore
                    }
                }
            }
        }
    }
}

// ── Message parsing ──────────────────────────────────────────────────

/// Envelope the backend sends over the socket.
#[derive(Debug, Deserialize)]
struct WireFrame {
    event: String,
    #[serde(default)]
    data: serde_json::Value,
}

/// Parse one text frame into a [`PushFrame`].
///
/// Unknown event names and malformed payloads are logged and skipped;
/// the stream never fails on one bad frame.
fn parse_frame(text: &str) -> Option<PushFrame> {
    let wire: WireFrame = match serde_json::from_str(text) {
        Ok(w) => w,
        Err(e) => {
            tracing::debug!(error = %e, "failed to parse push envelope");
            return None;
        }
    };

    match wire.event.as_str() {
        "camera_frame" => {
            let image = wire.data.get("image")?.as_str()?.to_owned();
            Some(PushFrame::CameraFrame { image })
        }
        "detection_alert" => match serde_json::from_value(wire.data) {
            Ok(alert) => Some(PushFrame::DetectionAlert(alert)),
            Err(e) => {
                tracing::debug!(error = %e, "malformed detection_alert payload");
                None
            }
        },
        "new_access_log" => match serde_json::from_value(wire.data) {
            Ok(entry) => Some(PushFrame::NewAccessLog(entry)),
            Err(e) => {
                tracing::debug!(error = %e, "malformed new_access_log payload");
                None
            }
        },
        other => {
            tracing::debug!(event = other, "unknown push event, skipping");
            None
        }
    }
}

// ── Backoff calculation ──────────────────────────────────────────────

/// Exponential backoff with jitter.
///
/// `delay = min(initial * 2^attempt, max) + jitter`
///
/// Jitter is +-25% to spread out reconnection storms when several
/// dashboards share one backend.
fn calculate_backoff(attempt: u32, config: &ReconnectConfig) -> Duration {
    let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
    let base = config.initial_delay.as_secs_f64() * 2.0_f64.powi(exponent);
    let capped = base.min(config.max_delay.as_secs_f64());

    // Deterministic "jitter" seeded from the attempt number.
    // Not cryptographically random, but good enough for backoff spread.
    let jitter_factor = 1.0 + 0.25 * (f64::from(attempt) * 7.3).sin();
    let with_jitter = (capped * jitter_factor).max(0.0);

    Duration::from_secs_f64(with_jitter)
}

// ── Tests ────────────────────────────────────────────────────────────
