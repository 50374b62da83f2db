//! Snapshot cache: single writer, many readers, swap by `Arc`.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use parking_lot::RwLock;

use crate::domain::OpportunitiesSnapshot;

/// Holds the most recent successful scan's snapshot.
///
/// The orchestrator replaces the whole snapshot atomically; readers clone the
/// `Arc` and never observe a partial scan.
pub struct SnapshotCache {
    current: RwLock<Option<Arc<OpportunitiesSnapshot>>>,
    ttl: Duration,
}

impl SnapshotCache {
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            current: RwLock::new(None),
            ttl,
        }
    }

    pub fn publish(&self, snapshot: OpportunitiesSnapshot) {
        *self.current.write() = Some(Arc::new(snapshot));
    }

    #[must_use]
    pub fn get(&self) -> Option<Arc<OpportunitiesSnapshot>> {
        self.current.read().clone()
    }

    /// Whether the cached snapshot is younger than the TTL.
    #[must_use]
    pub fn is_fresh(&self) -> bool {
        self.get().is_some_and(|snapshot| {
            let age = Utc::now() - snapshot.scanned_at;
            age.to_std().map_or(false, |age| age < self.ttl)
        })
    }
}
