// ── Push-channel connection supervision ──
//
// Tracks whether the push channel is live. No intermediate
// "connecting" state: the transport's reconnect loop is a black box
// that eventually re-emits open/close signals. Events produced while
// disconnected are never delivered via push -- the pull path
// compensates on its next successful poll, so nothing is buffered here.

use tokio::sync::watch;

/// Connection state observable by consumers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connected,
}

/// Owns the [`ConnectionState`] and transitions it on explicit channel
/// lifecycle signals.
pub struct ConnectionSupervisor {
    state: watch::Sender<ConnectionState>,
}

impl ConnectionSupervisor {
    pub fn new() -> Self {
        let (state, _) = watch::channel(ConnectionState::Disconnected);
        Self { state }
    }

    /// The channel opened (or reopened).
    pub fn channel_up(&self) {
        if self.transition(ConnectionState::Connected) {
            tracing::info!("push channel up");
        }
    }

    /// The channel closed or the transport failed.
    pub fn channel_down(&self) {
        if self.transition(ConnectionState::Disconnected) {
            tracing::info!("push channel down");
        }
    }

    /// Apply a transition, notifying subscribers only on an actual
    /// change. Redundant signals from the transport are no-ops.
    fn transition(&self, next: ConnectionState) -> bool {
        self.state.send_if_modified(|state| {
            if *state == next {
                false
            } else {
                *state = next;
                true
            }
        })
    }

    pub fn current(&self) -> ConnectionState {
        *self.state.borrow()
    }

    /// Subscribe to state transitions.
    pub fn subscribe(&self) -> watch::Receiver<ConnectionState> {
        self.state.subscribe()
    }
}

impl Default for ConnectionSupervisor {
    fn default() -> Self {
        Self::new()
    }
}
