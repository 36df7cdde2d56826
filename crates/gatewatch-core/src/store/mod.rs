// ── Bounded in-memory stores ──
//
// Owned exclusively by the monitor's update loop; observers read
// through `watch` snapshots, never through shared mutation.

mod alerts;
mod events;

pub use alerts::AlertRing;
pub use events::{filter_events, EventStore};
