//! # Bounded in-memory report index.
//!
//! Insertion-ordered working set mirrored by an id-keyed map, used for live lookups.
//!
//! ## Architecture
//! ```text
//! insert(report)
//!     ├─► order.push_back(id)          VecDeque<ReportId>   (oldest … newest)
//!     ├─► by_id.insert(id, report)     HashMap<ReportId, Arc<Report>>
//!     └─► len > capacity?
//!            └─► pop_front() ─► by_id.remove(oldest)
//! ```
//!
//! ## Rules
//! - Both structures always hold exactly the same ids.
//! - Eviction is FIFO, one entry per insert.
//! - Not durable; see [`PersistentLog`](crate::PersistentLog) for that.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use crate::reports::{Report, ReportId};

#[derive(Debug)]
pub struct ReportIndex {
    capacity: usize,
    order: VecDeque<ReportId>,
    by_id: HashMap<ReportId, Arc<Report>>,
}

impl ReportIndex {
    /// Creates an empty index. Capacity is clamped to a minimum of 1.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            order: VecDeque::with_capacity(capacity + 1),
            by_id: HashMap::with_capacity(capacity + 1),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Appends a report, evicting the oldest entry when over capacity.
    ///
    /// Returns the evicted report, if any. Re-inserting an id already present replaces
    /// the stored report and moves it to the newest position.
    pub fn insert(&mut self, report: Arc<Report>) -> Option<Arc<Report>> {
        let id = report.id.clone();
        if self.by_id.insert(id.clone(), report).is_some() {
            self.order.retain(|existing| existing != &id);
        }
        self.order.push_back(id);

        if self.order.len() > self.capacity {
            let oldest = self.order.pop_front()?;
            return self.by_id.remove(&oldest);
        }
        None
    }

    pub fn get(&self, id: &str) -> Option<Arc<Report>> {
        self.by_id.get(id).cloned()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.by_id.contains_key(id)
    }

    /// Removes one report from both structures.
    pub fn remove(&mut self, id: &str) -> Option<Arc<Report>> {
        let removed = self.by_id.remove(id)?;
        self.order.retain(|existing| existing.as_str() != id);
        Some(removed)
    }

    pub fn clear(&mut self) {
        self.order.clear();
        self.by_id.clear();
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Reports from oldest to newest.
    pub fn snapshot(&self) -> Vec<Arc<Report>> {
        self.order
            .iter()
            .filter_map(|id| self.by_id.get(id).cloned())
            .collect()
    }
}
