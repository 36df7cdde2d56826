// ── Bounded alert ring ──
//
// Transient detection notifications with push-only provenance: alerts
// are never reconstructed from pull snapshots, so an alert that
// happened before the dashboard opened simply never appears. Separate
// retention policy from the EventStore on purpose.

use std::collections::VecDeque;
use std::sync::Arc;

use tokio::sync::watch;

use crate::model::DetectionAlert;

/// Small bounded ring of the most recent [`DetectionAlert`]s.
///
/// No deduplication: each detection is a distinct occurrence even when
/// the payload looks identical.
pub struct AlertRing {
    alerts: VecDeque<DetectionAlert>,
    capacity: usize,
    snapshot: watch::Sender<Arc<Vec<DetectionAlert>>>,
}

impl AlertRing {
    pub fn new(capacity: usize) -> Self {
        let (snapshot, _) = watch::channel(Arc::new(Vec::new()));
        Self {
            alerts: VecDeque::with_capacity(capacity),
            capacity,
            snapshot,
        }
    }

    /// Prepend an alert; the oldest is evicted silently at capacity.
    pub fn push(&mut self, alert: DetectionAlert) {
        self.alerts.push_front(alert);
        self.alerts.truncate(self.capacity);
        self.publish();
    }

    /// Empty the ring immediately. The next `push` starts a fresh
    /// sequence of length 1.
    pub fn clear(&mut self) {
        self.alerts.clear();
        self.publish();
    }

    /// The current snapshot, most-recent-first.
    pub fn latest(&self) -> Arc<Vec<DetectionAlert>> {
        self.snapshot.borrow().clone()
    }

    /// Subscribe to snapshot changes.
    pub fn subscribe(&self) -> watch::Receiver<Arc<Vec<DetectionAlert>>> {
        self.snapshot.subscribe()
    }

    pub fn len(&self) -> usize {
        self.alerts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.alerts.is_empty()
    }

    fn publish(&self) {
        let snapshot: Vec<_> = self.alerts.iter().cloned().collect();
        self.snapshot.send_modify(|snap| *snap = Arc::new(snapshot));
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::model::{AccessStatus, DetectionKind};

    fn alert(message: &str) -> DetectionAlert {
        DetectionAlert {
            kind: DetectionKind::Face,
            message: message.into(),
            status: AccessStatus::Denied,
            received_at: Utc.with_ymd_and_hms(2026, 8, 7, 10, 0, 0).unwrap(),
        }
    }

    #[test]
    fn push_at_capacity_evicts_oldest() {
        let mut ring = AlertRing::new(5);
        for i in 0..5 {
            ring.push(alert(&format!("a{i}")));
        }
        ring.push(alert("a5"));

        assert_eq!(ring.len(), 5);
        let snap = ring.latest();
        assert_eq!(snap[0].message, "a5");
        // a0 (the oldest) is gone
        assert!(snap.iter().all(|a| a.message != "a0"));
    }

    #[test]
    fn clear_then_push_leaves_exactly_one() {
        let mut ring = AlertRing::new(5);
        for i in 0..4 {
            ring.push(alert(&format!("a{i}")));
        }
        ring.clear();
        assert!(ring.is_empty());

        ring.push(alert("fresh"));
        let snap = ring.latest();
        assert_eq!(snap.len(), 1);
        assert_eq!(snap[0].message, "fresh");
    }

    #[test]
    fn identical_payloads_are_distinct_occurrences() {
        let mut ring = AlertRing::new(5);
        ring.push(alert("same"));
        ring.push(alert("same"));
        assert_eq!(ring.len(), 2);
    }

    #[test]
    fn subscribers_see_clear() {
        let mut ring = AlertRing::new(5);
        let rx = ring.subscribe();
        ring.push(alert("x"));
        assert_eq!(rx.borrow().len(), 1);
        ring.clear();
        assert!(rx.borrow().is_empty());
    }
}
