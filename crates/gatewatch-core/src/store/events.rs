// ── Bounded access-event store ──
//
// The single source of read truth for the UI. Receipt order IS display
// order: push delivery order is the only ordering guarantee available,
// so a late-arriving event with an older timestamp is not re-sorted.

use std::collections::VecDeque;
use std::sync::Arc;

use tokio::sync::watch;

use crate::model::AccessEvent;

/// Bounded, ordered store of the most recent [`AccessEvent`]s.
///
/// Not internally synchronized -- a single owner mutates it and
/// publishes an `Arc` snapshot through a `watch` channel after every
/// change. Readers clone the `Arc`, which is wait-free.
pub struct EventStore {
    events: VecDeque<Arc<AccessEvent>>,
    capacity: usize,
    snapshot: watch::Sender<Arc<Vec<Arc<AccessEvent>>>>,
}

impl EventStore {
    pub fn new(capacity: usize) -> Self {
        let (snapshot, _) = watch::channel(Arc::new(Vec::new()));
        Self {
            events: VecDeque::with_capacity(capacity),
            capacity,
            snapshot,
        }
    }

    /// Insert a freshly delivered event at the head of the display
    /// order, evicting the oldest entry once capacity is exceeded.
    ///
    /// Push delivery is at-most-occasionally-duplicated; an event equal
    /// to the current head is treated as a duplicate delivery and
    /// dropped. Returns `true` if the store changed.
    pub fn ingest(&mut self, event: AccessEvent) -> bool {
        if self.events.front().is_some_and(|head| **head == event) {
            tracing::debug!(value = %event.detected_value, "duplicate push delivery dropped");
            return false;
        }

        self.events.push_front(Arc::new(event));
        self.events.truncate(self.capacity);
        self.publish();
        true
    }

    /// Replace the entire sequence from a pull snapshot, then re-apply
    /// the capacity cap (the snapshot may exceed or undershoot it).
    pub fn replace_all(&mut self, events: Vec<AccessEvent>) {
        self.events = events.into_iter().map(Arc::new).collect();
        self.events.truncate(self.capacity);
        self.publish();
    }

    /// Case-insensitive substring search over detected value, subject
    /// name, and subject id. Returns a filtered view in display order;
    /// the store itself is untouched.
    pub fn query(&self, needle: &str) -> Vec<Arc<AccessEvent>> {
        let snapshot: Vec<_> = self.events.iter().cloned().collect();
        filter_events(&snapshot, needle)
    }

    /// The current snapshot, most-recent-first (cheap `Arc` clone).
    pub fn latest(&self) -> Arc<Vec<Arc<AccessEvent>>> {
        self.snapshot.borrow().clone()
    }

    /// Subscribe to snapshot changes.
    pub fn subscribe(&self) -> watch::Receiver<Arc<Vec<Arc<AccessEvent>>>> {
        self.snapshot.subscribe()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Rebuild the snapshot vec and broadcast to subscribers.
    fn publish(&self) {
        let snapshot: Vec<_> = self.events.iter().cloned().collect();
        // `send_modify` updates unconditionally, even with zero receivers.
        self.snapshot.send_modify(|snap| *snap = Arc::new(snapshot));
    }
}

/// Shared filter used by [`EventStore::query`] and by monitor-level
/// searches over an already-published snapshot.
pub fn filter_events(events: &[Arc<AccessEvent>], needle: &str) -> Vec<Arc<AccessEvent>> {
    let needle_lower = needle.to_lowercase();
    if needle_lower.is_empty() {
        return events.to_vec();
    }
    events
        .iter()
        .filter(|e| e.matches(&needle_lower))
        .cloned()
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::model::{AccessStatus, DetectionKind};

    fn event(value: &str, minute: u32) -> AccessEvent {
        AccessEvent {
            timestamp: Utc.with_ymd_and_hms(2026, 8, 7, 9, minute, 0).unwrap(),
            kind: DetectionKind::LicensePlate,
            detected_value: value.into(),
            subject_id: Some(format!("STU-{value}")),
            subject_name: Some("Priya Sharma".into()),
            status: AccessStatus::Granted,
            confidence: None,
        }
    }

    #[test]
    fn ingest_prepends_most_recent_first() {
        let mut store = EventStore::new(10);
        assert!(store.ingest(event("AAA", 1)));
        assert!(store.ingest(event("BBB", 2)));

        let snap = store.latest();
        assert_eq!(snap[0].detected_value, "BBB");
        assert_eq!(snap[1].detected_value, "AAA");
    }

    #[test]
    fn capacity_keeps_most_recently_ingested() {
        let mut store = EventStore::new(3);
        for (i, v) in ["A", "B", "C", "D", "E"].iter().enumerate() {
            store.ingest(event(v, u32::try_from(i).unwrap()));
        }

        assert_eq!(store.len(), 3);
        let values: Vec<_> = store
            .latest()
            .iter()
            .map(|e| e.detected_value.clone())
            .collect();
        assert_eq!(values, ["E", "D", "C"]);
    }

    #[test]
    fn receipt_order_is_not_resorted_by_timestamp() {
        let mut store = EventStore::new(10);
        store.ingest(event("NEWER", 30));
        // Late push delivery of an older event stays at the head.
        store.ingest(event("OLDER", 5));

        let snap = store.latest();
        assert_eq!(snap[0].detected_value, "OLDER");
        assert_eq!(snap[1].detected_value, "NEWER");
    }

    #[test]
    fn duplicate_head_delivery_is_dropped() {
        let mut store = EventStore::new(10);
        assert!(store.ingest(event("AAA", 1)));
        assert!(!store.ingest(event("AAA", 1)));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn replace_all_truncates_oversized_snapshot() {
        let mut store = EventStore::new(3);
        let batch: Vec<_> = (0..8).map(|i| event(&format!("V{i}"), i)).collect();
        store.replace_all(batch);

        assert_eq!(store.len(), 3);
        assert_eq!(store.latest()[0].detected_value, "V0");
    }

    #[test]
    fn replace_all_accepts_undersized_snapshot() {
        let mut store = EventStore::new(100);
        store.ingest(event("OLD", 1));
        store.replace_all(vec![event("ONLY", 2)]);

        assert_eq!(store.len(), 1);
        assert_eq!(store.latest()[0].detected_value, "ONLY");
    }

    #[test]
    fn query_is_case_insensitive_across_fields() {
        let mut store = EventStore::new(10);
        store.ingest(event("MH-12-AB-5678", 1));
        store.ingest(event("DL-01-XY-3456", 2));

        assert_eq!(store.query("mh-12").len(), 1);
        assert_eq!(store.query("priya").len(), 2);
        assert_eq!(store.query("stu-dl").len(), 1);
        assert_eq!(store.query("nobody").len(), 0);
        // Empty needle returns everything, order untouched.
        let all = store.query("");
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].detected_value, "DL-01-XY-3456");
    }

    #[test]
    fn subscribers_see_mutations() {
        let mut store = EventStore::new(10);
        let rx = store.subscribe();
        store.ingest(event("AAA", 1));
        assert_eq!(rx.borrow().len(), 1);
    }
}
