// ── Monitor: the single-threaded update path ──
//
// Owns every mutable structure (EventStore, AlertRing, StatsAggregator,
// ConnectionSupervisor, camera state) inside one update loop draining
// an explicit trigger queue. The enumerated trigger sources are push
// frames, the periodic timer, debounce expiry, poll outcomes, and user
// actions; each trigger is processed as one atomic
// mutate-then-recompute-then-publish cycle, so no observer ever sees a
// partially applied update.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{mpsc, watch, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use gatewatch_api::{ApiClient, PushFrame, PushHandle, ReconnectConfig, TransportConfig};

use crate::aggregate::StatsAggregator;
use crate::config::MonitorConfig;
use crate::convert::alert_from_push;
use crate::error::CoreError;
use crate::fetch::{PollOutcome, SnapshotFetcher};
use crate::model::{AccessEvent, CameraStatus, DetectionAlert, DetectionStats};
use crate::store::{filter_events, AlertRing, EventStore};
use crate::supervisor::{ConnectionState, ConnectionSupervisor};
use crate::view::DashboardSnapshot;

const TRIGGER_CHANNEL_SIZE: usize = 256;

// ── Triggers ─────────────────────────────────────────────────────────

/// Everything that can enter the update path.
enum Trigger {
    /// A frame from the push channel.
    Push(PushFrame),
    /// The steady-state poll timer fired.
    PollTick,
    /// A user action requested an immediate poll.
    PollNow,
    /// An outstanding poll resolved.
    Poll(PollOutcome),
    /// User action: empty the alert ring.
    ClearAlerts,
}

// ── Monitor ──────────────────────────────────────────────────────────

/// The main entry point for consumers.
///
/// Cheaply cloneable via `Arc`. [`start`](Self::start) spawns the
/// update loop, the poll timer, and the push pump;
/// [`shutdown`](Self::shutdown) tears them down. All reads go through
/// `watch` receivers, so the presentation layer subscribes to
/// snapshots -- it never owns state.
#[derive(Clone)]
pub struct Monitor {
    inner: Arc<MonitorInner>,
}

struct MonitorInner {
    config: MonitorConfig,
    client: Arc<ApiClient>,
    trigger_tx: mpsc::Sender<Trigger>,
    trigger_rx: Mutex<Option<mpsc::Receiver<Trigger>>>,
    state: Mutex<Option<UpdateState>>,
    cancel: CancellationToken,
    task_handles: Mutex<Vec<JoinHandle<()>>>,

    // Read surface -- receivers for the state the update loop publishes.
    connection_rx: watch::Receiver<ConnectionState>,
    events_rx: watch::Receiver<Arc<Vec<Arc<AccessEvent>>>>,
    alerts_rx: watch::Receiver<Arc<Vec<DetectionAlert>>>,
    stats_rx: watch::Receiver<DetectionStats>,
    camera_rx: watch::Receiver<CameraStatus>,
    frame_rx: watch::Receiver<Option<Arc<String>>>,
}

impl Monitor {
    /// Build a monitor from configuration. Does NOT touch the network --
    /// call [`start()`](Self::start) to begin ingesting.
    pub fn new(config: MonitorConfig) -> Result<Self, CoreError> {
        let transport = TransportConfig {
            timeout: config.timeout,
        };
        let client = Arc::new(ApiClient::new(config.base_url.clone(), &transport)?);

        let store = EventStore::new(config.event_capacity);
        let ring = AlertRing::new(config.alert_capacity);
        let stats = StatsAggregator::new();
        let supervisor = ConnectionSupervisor::new();
        let (camera_tx, camera_rx) = watch::channel(CameraStatus::default());
        let (frame_tx, frame_rx) = watch::channel(None);

        let events_rx = store.subscribe();
        let alerts_rx = ring.subscribe();
        let stats_rx = stats.subscribe();
        let connection_rx = supervisor.subscribe();

        let state = UpdateState {
            store,
            ring,
            stats,
            supervisor,
            camera_tx,
            frame_tx,
            next_seq: 0,
            last_applied_seq: 0,
            rejected: 0,
        };

        let (trigger_tx, trigger_rx) = mpsc::channel(TRIGGER_CHANNEL_SIZE);

        Ok(Self {
            inner: Arc::new(MonitorInner {
                config,
                client,
                trigger_tx,
                trigger_rx: Mutex::new(Some(trigger_rx)),
                state: Mutex::new(Some(state)),
                cancel: CancellationToken::new(),
                task_handles: Mutex::new(Vec::new()),
                connection_rx,
                events_rx,
                alerts_rx,
                stats_rx,
                camera_rx,
                frame_rx,
            }),
        })
    }

    /// Access the monitor configuration.
    pub fn config(&self) -> &MonitorConfig {
        &self.inner.config
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    /// Start ingesting: spawn the update loop, connect the push channel,
    /// arm the steady-state poll timer, and queue the initial poll.
    pub async fn start(&self) -> Result<(), CoreError> {
        let state = self
            .inner
            .state
            .lock()
            .await
            .take()
            .ok_or_else(|| CoreError::Internal("monitor already started".into()))?;
        let rx = self
            .inner
            .trigger_rx
            .lock()
            .await
            .take()
            .ok_or_else(|| CoreError::Internal("monitor already started".into()))?;

        let fetcher = Arc::new(SnapshotFetcher::new(Arc::clone(&self.inner.client)));
        let mut handles = self.inner.task_handles.lock().await;

        handles.push(tokio::spawn(update_loop(
            state,
            rx,
            self.inner.trigger_tx.clone(),
            fetcher,
            self.inner.cancel.clone(),
            self.inner.config.debounce,
        )));

        if self.inner.config.poll_interval > Duration::ZERO {
            handles.push(tokio::spawn(poll_timer(
                self.inner.trigger_tx.clone(),
                self.inner.config.poll_interval,
                self.inner.cancel.clone(),
            )));
        }

        if self.inner.config.push_enabled {
            let push_url = self.inner.config.resolved_push_url()?;
            let handle = PushHandle::connect(
                push_url,
                ReconnectConfig::default(),
                self.inner.cancel.clone(),
            );
            handles.push(tokio::spawn(push_pump(
                handle,
                self.inner.trigger_tx.clone(),
                self.inner.cancel.clone(),
            )));
        }

        drop(handles);

        // Initial data load.
        self.send(Trigger::PollNow).await?;

        info!("monitor started");
        Ok(())
    }

    /// Tear down: stop the push channel, the timer, and the update loop.
    ///
    /// In-flight polls are allowed to complete; their outcomes land on
    /// a closed queue and are dropped.
    pub async fn shutdown(&self) {
        self.inner.cancel.cancel();

        let mut handles = self.inner.task_handles.lock().await;
        for handle in handles.drain(..) {
            let _ = handle.await;
        }

        debug!("monitor stopped");
    }

    // ── User actions ─────────────────────────────────────────────────

    /// Request an immediate poll (e.g. a refresh button).
    pub async fn refresh(&self) -> Result<(), CoreError> {
        self.send(Trigger::PollNow).await
    }

    /// Empty the alert ring.
    pub async fn clear_alerts(&self) -> Result<(), CoreError> {
        self.send(Trigger::ClearAlerts).await
    }

    /// Start the camera pipeline; polls for fresh status on success.
    pub async fn start_camera(&self) -> Result<String, CoreError> {
        let resp = self.inner.client.start_camera().await?;
        let _ = self.send(Trigger::PollNow).await;
        Ok(resp.message)
    }

    /// Stop the camera pipeline; polls for fresh status on success.
    pub async fn stop_camera(&self) -> Result<String, CoreError> {
        let resp = self.inner.client.stop_camera().await?;
        let _ = self.send(Trigger::PollNow).await;
        Ok(resp.message)
    }

    /// Toggle detection; polls for fresh status on success.
    pub async fn toggle_detection(&self) -> Result<String, CoreError> {
        let resp = self.inner.client.toggle_detection().await?;
        let _ = self.send(Trigger::PollNow).await;
        Ok(resp.message)
    }

    /// Trigger a server-side roster import, then re-pull immediately so
    /// the dashboard reflects the imported data.
    pub async fn import_csv(&self) -> Result<String, CoreError> {
        let resp = self.inner.client.import_csv().await?;
        let _ = self.send(Trigger::PollNow).await;
        Ok(resp.message)
    }

    // ── Read surface ─────────────────────────────────────────────────

    /// Subscribe to push-channel connection state.
    pub fn connection(&self) -> watch::Receiver<ConnectionState> {
        self.inner.connection_rx.clone()
    }

    /// Subscribe to the event snapshot (display order, most-recent-first).
    pub fn events(&self) -> watch::Receiver<Arc<Vec<Arc<AccessEvent>>>> {
        self.inner.events_rx.clone()
    }

    /// Subscribe to the alert ring snapshot.
    pub fn alerts(&self) -> watch::Receiver<Arc<Vec<DetectionAlert>>> {
        self.inner.alerts_rx.clone()
    }

    /// Subscribe to the aggregated statistics.
    pub fn stats(&self) -> watch::Receiver<DetectionStats> {
        self.inner.stats_rx.clone()
    }

    /// Subscribe to camera pipeline status.
    pub fn camera(&self) -> watch::Receiver<CameraStatus> {
        self.inner.camera_rx.clone()
    }

    /// Subscribe to the latest camera frame (display-only buffer).
    pub fn last_frame(&self) -> watch::Receiver<Option<Arc<String>>> {
        self.inner.frame_rx.clone()
    }

    /// Case-insensitive search over the current event snapshot.
    pub fn search(&self, needle: &str) -> Vec<Arc<AccessEvent>> {
        let snapshot = self.inner.events_rx.borrow().clone();
        filter_events(&snapshot, needle)
    }

    /// Compose the full read-only view for presentation.
    pub fn dashboard(&self) -> DashboardSnapshot {
        DashboardSnapshot {
            connection: *self.inner.connection_rx.borrow(),
            events: self.inner.events_rx.borrow().clone(),
            alerts: self.inner.alerts_rx.borrow().clone(),
            stats: self.inner.stats_rx.borrow().clone(),
            camera: *self.inner.camera_rx.borrow(),
            has_live_frame: self.inner.frame_rx.borrow().is_some(),
        }
    }

    async fn send(&self, trigger: Trigger) -> Result<(), CoreError> {
        self.inner
            .trigger_tx
            .send(trigger)
            .await
            .map_err(|_| CoreError::MonitorStopped)
    }
}

// ── Update state ─────────────────────────────────────────────────────

/// The mutable heart of the monitor, owned exclusively by the update
/// loop. No locking: single-threaded mutation, `watch` snapshots out.
struct UpdateState {
    store: EventStore,
    ring: AlertRing,
    stats: StatsAggregator,
    supervisor: ConnectionSupervisor,
    camera_tx: watch::Sender<CameraStatus>,
    frame_tx: watch::Sender<Option<Arc<String>>>,
    /// Sequence stamped on the next outgoing poll.
    next_seq: u64,
    /// Highest poll sequence already applied; anything at or below is
    /// stale and discarded.
    last_applied_seq: u64,
    /// Malformed records dropped so far (diagnostics).
    rejected: u64,
}

impl UpdateState {
    /// Stamp the next outgoing poll.
    fn issue_seq(&mut self) -> u64 {
        self.next_seq += 1;
        self.next_seq
    }

    /// Apply one push frame. Returns `true` when the frame should arm
    /// the debounced re-poll (a freshly delivered access log).
    fn apply_push(&mut self, frame: PushFrame, now: DateTime<Utc>) -> bool {
        match frame {
            PushFrame::Up => {
                self.supervisor.channel_up();
                false
            }
            PushFrame::Down => {
                self.supervisor.channel_down();
                false
            }
            PushFrame::CameraFrame { image } => {
                self.frame_tx.send_replace(Some(Arc::new(image)));
                false
            }
            PushFrame::DetectionAlert(msg) => {
                match alert_from_push(msg, now) {
                    Ok(alert) => self.ring.push(alert),
                    Err(e) => {
                        self.rejected += 1;
                        warn!(error = %e, "rejected malformed detection alert");
                    }
                }
                false
            }
            PushFrame::NewAccessLog(entry) => match AccessEvent::try_from(entry) {
                Ok(event) => {
                    if self.store.ingest(event) {
                        self.stats.recompute(&self.store.latest(), now);
                    }
                    true
                }
                Err(e) => {
                    self.rejected += 1;
                    warn!(error = %e, "rejected malformed access log from push");
                    false
                }
            },
        }
    }

    /// Apply a resolved poll, discarding stale outcomes by sequence.
    fn apply_poll(&mut self, outcome: PollOutcome, now: DateTime<Utc>) {
        if outcome.seq <= self.last_applied_seq {
            debug!(
                seq = outcome.seq,
                applied = self.last_applied_seq,
                "discarding stale poll outcome"
            );
            return;
        }
        self.last_applied_seq = outcome.seq;

        if outcome.is_empty() {
            debug!(seq = outcome.seq, "poll cycle returned nothing to apply");
            return;
        }

        if let Some(entries) = outcome.logs {
            let mut events = Vec::with_capacity(entries.len());
            for entry in entries {
                match AccessEvent::try_from(entry) {
                    Ok(event) => events.push(event),
                    Err(e) => {
                        self.rejected += 1;
                        warn!(error = %e, "rejected malformed access log from pull");
                    }
                }
            }
            self.store.replace_all(events);
            self.stats.recompute(&self.store.latest(), now);
        }

        if let Some(ref server) = outcome.stats {
            self.stats.merge(server);
        }

        if let Some(camera) = outcome.camera {
            self.camera_tx.send_replace(camera.into());
        }
    }

    fn clear_alerts(&mut self) {
        self.ring.clear();
    }
}

// ── Background tasks ─────────────────────────────────────────────────

/// Drain the trigger queue, one atomic update cycle per trigger.
async fn update_loop(
    mut state: UpdateState,
    mut rx: mpsc::Receiver<Trigger>,
    tx: mpsc::Sender<Trigger>,
    fetcher: Arc<SnapshotFetcher>,
    cancel: CancellationToken,
    debounce: Duration,
) {
    // Armed after a push-delivered event; a burst keeps pushing the
    // deadline out so one pull covers the whole burst.
    let mut deadline: Option<tokio::time::Instant> = None;

    loop {
        // `async move` copies the (Copy) deadline so the handlers below
        // can re-arm it without fighting the borrow checker.
        let debounce_fire = async move {
            match deadline {
                Some(at) => tokio::time::sleep_until(at).await,
                None => std::future::pending().await,
            }
        };

        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            () = debounce_fire => {
                deadline = None;
                issue_poll(&mut state, &fetcher, &tx);
            }
            trigger = rx.recv() => {
                let Some(trigger) = trigger else { break };
                match trigger {
                    Trigger::Push(frame) => {
                        if state.apply_push(frame, Utc::now()) {
                            deadline = Some(tokio::time::Instant::now() + debounce);
                        }
                    }
                    Trigger::PollTick | Trigger::PollNow => {
                        // An explicit poll supersedes a pending debounce.
                        deadline = None;
                        issue_poll(&mut state, &fetcher, &tx);
                    }
                    Trigger::Poll(outcome) => state.apply_poll(outcome, Utc::now()),
                    Trigger::ClearAlerts => state.clear_alerts(),
                }
            }
        }
    }

    debug!("update loop exiting");
}

/// Stamp a sequence and run the poll on its own task so slow I/O never
/// blocks push processing. The outcome re-enters the trigger queue; if
/// the monitor shut down meanwhile, the queue is closed and the
/// outcome is dropped.
fn issue_poll(state: &mut UpdateState, fetcher: &Arc<SnapshotFetcher>, tx: &mpsc::Sender<Trigger>) {
    let seq = state.issue_seq();
    let fetcher = Arc::clone(fetcher);
    let tx = tx.clone();
    tokio::spawn(async move {
        let outcome = fetcher.poll_once(seq).await;
        let _ = tx.send(Trigger::Poll(outcome)).await;
    });
}

/// Steady-state refresh cadence.
async fn poll_timer(tx: mpsc::Sender<Trigger>, interval: Duration, cancel: CancellationToken) {
    let mut ticker = tokio::time::interval(interval);
    ticker.tick().await; // consume the immediate first tick

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {
                if tx.send(Trigger::PollTick).await.is_err() {
                    break;
                }
            }
        }
    }
}

/// Forward push frames into the trigger queue.
async fn push_pump(
    handle: PushHandle,
    tx: mpsc::Sender<Trigger>,
    cancel: CancellationToken,
) {
    let mut rx = handle.subscribe();

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            frame = rx.recv() => {
                match frame {
                    Ok(frame) => {
                        if tx.send(Trigger::Push(frame)).await.is_err() {
                            break;
                        }
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                        // Dropped frames are compensated by the next pull.
                        warn!(skipped, "push pump lagged behind the channel");
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                }
            }
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────────
