// ── Rolling statistics aggregation ──
//
// Derives today's figures from the EventStore content and reconciles
// them with server-reported snapshots. Recomputation is a pure
// function of (events, now) plus the sticky peak-hour label: identical
// inputs yield identical output no matter how often or in what order
// it runs, which is what keeps bursty push delivery safe.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Timelike, Utc};
use tokio::sync::watch;

use gatewatch_api::DetectionStatsResponse;

use crate::model::{AccessEvent, AccessStatus, DetectionKind, DetectionStats};

/// Aggregates [`DetectionStats`] and publishes them through a `watch`
/// channel. Owned by the monitor's update loop; the current instant is
/// always passed in, never read from the wall clock.
pub struct StatsAggregator {
    current: DetectionStats,
    snapshot: watch::Sender<DetectionStats>,
}

impl StatsAggregator {
    pub fn new() -> Self {
        let current = DetectionStats::default();
        let (snapshot, _) = watch::channel(current.clone());
        Self { current, snapshot }
    }

    /// Recompute all figures from the given events, scoped to the
    /// calendar day of `now` (UTC).
    ///
    /// The peak hour keeps its previous value when the day-scoped set
    /// is empty, so the dashboard never flickers back to a default.
    pub fn recompute(&mut self, events: &[Arc<AccessEvent>], now: DateTime<Utc>) {
        self.current = derive(events, now, &self.current.peak_hour);
        self.publish();
    }

    /// Reconcile a server-reported snapshot into the local figures.
    ///
    /// The two sources skew in time (local is instantaneous, the server
    /// may lag or lead the polling cadence), and undercounting is a
    /// worse failure than transient over-reporting -- so every
    /// server-reported numeric field resolves to `max(local, server)`.
    /// The hourly histogram merges per-label max over the union of
    /// labels, and the peak hour is re-derived from the merged
    /// histogram. `unique_vehicles` is a local-only derivation and is
    /// left untouched.
    pub fn merge(&mut self, server: &DetectionStatsResponse) {
        let local = &mut self.current;

        local.total_detections = local.total_detections.max(server.total_detections);
        local.granted = local.granted.max(server.granted);
        local.denied = local.denied.max(server.denied);
        local.license_plates = local.license_plates.max(server.license_plates);
        local.faces = local.faces.max(server.faces);
        local.student_ids = local.student_ids.max(server.student_ids);

        for (label, count) in &server.hourly_distribution {
            let entry = local.hourly_distribution.entry(label.clone()).or_insert(0);
            *entry = (*entry).max(*count);
        }

        local.peak_hour = peak_of(&local.hourly_distribution)
            .unwrap_or_else(|| local.peak_hour.clone());

        self.publish();
    }

    /// The current aggregate.
    pub fn latest(&self) -> &DetectionStats {
        &self.current
    }

    /// Subscribe to aggregate changes.
    pub fn subscribe(&self) -> watch::Receiver<DetectionStats> {
        self.snapshot.subscribe()
    }

    fn publish(&self) {
        let current = self.current.clone();
        self.snapshot.send_modify(|snap| *snap = current);
    }
}

impl Default for StatsAggregator {
    fn default() -> Self {
        Self::new()
    }
}

// ── Pure derivation ──────────────────────────────────────────────────

/// Derive a [`DetectionStats`] from scratch.
///
/// `prior_peak` is carried forward when no event falls on the calendar
/// day of `now`.
fn derive(events: &[Arc<AccessEvent>], now: DateTime<Utc>, prior_peak: &str) -> DetectionStats {
    let today = now.date_naive();

    let mut stats = DetectionStats {
        peak_hour: prior_peak.to_owned(),
        ..DetectionStats::default()
    };
    let mut plates_seen: HashSet<&str> = HashSet::new();

    for event in events {
        if event.timestamp.date_naive() != today {
            continue;
        }

        stats.total_detections += 1;
        match event.status {
            AccessStatus::Granted => stats.granted += 1,
            AccessStatus::Denied => stats.denied += 1,
        }
        match event.kind {
            DetectionKind::LicensePlate => {
                stats.license_plates += 1;
                plates_seen.insert(event.detected_value.as_str());
            }
            DetectionKind::Face => stats.faces += 1,
            DetectionKind::StudentId => stats.student_ids += 1,
        }

        *stats
            .hourly_distribution
            .entry(hour_label(event.timestamp))
            .or_insert(0) += 1;
    }

    stats.unique_vehicles = u64::try_from(plates_seen.len()).unwrap_or(u64::MAX);
    if let Some(peak) = peak_of(&stats.hourly_distribution) {
        stats.peak_hour = peak;
    }

    stats
}

/// Zero-padded `"HH:00"` bucket label for a timestamp.
fn hour_label(ts: DateTime<Utc>) -> String {
    format!("{:02}:00", ts.hour())
}

/// The label with the maximum count; ties break to the earliest hour.
/// Lexical comparison suffices because labels are zero-padded, and
/// `BTreeMap` iteration is already in label order.
fn peak_of(distribution: &BTreeMap<String, u64>) -> Option<String> {
    let mut best: Option<(&str, u64)> = None;
    for (label, &count) in distribution {
        match best {
            Some((_, max)) if count <= max => {}
            _ => best = Some((label.as_str(), count)),
        }
    }
    best.map(|(label, _)| label.to_owned())
}
