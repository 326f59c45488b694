//! # Persistent report log.
//!
//! A capped JSON array of reports kept under a single key of a host
//! [`KeyValueStore`].
//!
//! ## Append cycle
//! ```text
//! append(report)
//!     ├─► get(key)            missing / corrupt ─► []
//!     ├─► push(report)
//!     ├─► drain front while len > capacity
//!     └─► set(key, json)      whole array rewritten
//! ```
//!
//! ## Rules
//! - Storage failures are logged and swallowed: the report is simply not durable.
//! - No per-id removal; [`clear`](PersistentLog::clear) removes the key.
//! - Appends and clears through one `PersistentLog` are serialized, so threads sharing a
//!   pipeline never lose each other's reports.
//! - Across independent logs sharing the same backing store the read-modify-write is not
//!   atomic; they can lose each other's appends.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, warn};

use crate::error::StorageError;
use crate::reports::Report;
use crate::storage::KeyValueStore;

pub struct PersistentLog {
    store: Arc<dyn KeyValueStore>,
    key: String,
    capacity: usize,
    write: Mutex<()>,
}

impl PersistentLog {
    /// Creates a log over `store` under `key`. Capacity is clamped to a minimum of 1.
    pub fn new(store: Arc<dyn KeyValueStore>, key: impl Into<String>, capacity: usize) -> Self {
        Self {
            store,
            key: key.into(),
            capacity: capacity.max(1),
            write: Mutex::new(()),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Appends one report. Returns `false` if the write did not happen.
    pub fn append(&self, report: &Report) -> bool {
        match self.try_append(report) {
            Ok(()) => true,
            Err(e) => {
                warn!(
                    store = self.store.name(),
                    key = %self.key,
                    report_id = %report.id,
                    error = e.as_label(),
                    detail = %e.as_message(),
                    "report not persisted"
                );
                false
            }
        }
    }

    /// All persisted reports, oldest first. Missing or unreadable contents read as empty.
    pub fn read_all(&self) -> Vec<Report> {
        match self.try_read() {
            Ok(reports) => reports,
            Err(e) => {
                debug!(
                    store = self.store.name(),
                    key = %self.key,
                    error = e.as_label(),
                    "persisted log unreadable; treating as empty"
                );
                Vec::new()
            }
        }
    }

    /// Removes the whole log. Returns `false` if the store refused.
    pub fn clear(&self) -> bool {
        let _write = self.write_lock();
        match self.store.remove(&self.key) {
            Ok(()) => true,
            Err(e) => {
                warn!(
                    store = self.store.name(),
                    key = %self.key,
                    error = e.as_label(),
                    "persisted log not cleared"
                );
                false
            }
        }
    }

    fn try_read(&self) -> Result<Vec<Report>, StorageError> {
        match self.store.get(&self.key)? {
            Some(raw) => Ok(serde_json::from_str(&raw)?),
            None => Ok(Vec::new()),
        }
    }

    fn write_lock(&self) -> MutexGuard<'_, ()> {
        self.write.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn try_append(&self, report: &Report) -> Result<(), StorageError> {
        let _write = self.write_lock();
        let mut reports = self.read_all();
        reports.push(report.clone());
        if reports.len() > self.capacity {
            let excess = reports.len() - self.capacity;
            reports.drain(..excess);
        }
        let raw = serde_json::to_string(&reports)?;
        self.store.set(&self.key, &raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::SessionEnvironment;
    use crate::reports::{ReportOptions, normalize};
    use crate::storage::{FileStore, MemoryStore};

    fn report(msg: &str) -> Report {
        normalize(msg.into(), &ReportOptions::new(), &SessionEnvironment::new())
    }

    fn log_over(store: Arc<dyn KeyValueStore>) -> PersistentLog {
        PersistentLog::new(store, "faultwatch.reports", 50)
    }

    #[test]
    fn keeps_insertion_order_under_capacity() {
        let log = log_over(Arc::new(MemoryStore::new()));
        let reports: Vec<_> = (0..20).map(|i| report(&format!("r{i}"))).collect();
        for r in &reports {
            assert!(log.append(r));
        }
        assert_eq!(log.read_all(), reports);
    }

    #[test]
    fn trims_to_last_fifty() {
        let log = log_over(Arc::new(MemoryStore::new()));
        let reports: Vec<_> = (0..60).map(|i| report(&format!("r{i}"))).collect();
        for r in &reports {
            log.append(r);
            assert!(log.read_all().len() <= 50);
        }
        assert_eq!(log.read_all(), reports[10..].to_vec());
    }

    #[test]
    fn corrupt_contents_read_as_empty_and_are_overwritten() {
        let store = Arc::new(MemoryStore::new());
        store.set("faultwatch.reports", "{not json").unwrap();
        let log = log_over(store.clone());

        assert!(log.read_all().is_empty());
        let r = report("fresh");
        assert!(log.append(&r));
        assert_eq!(log.read_all(), vec![r]);
    }

    #[test]
    fn storage_failures_are_swallowed() {
        let store = Arc::new(MemoryStore::new());
        let log = log_over(store.clone());
        log.append(&report("kept"));

        store.set_available(false);
        assert!(!log.append(&report("lost")));
        assert!(log.read_all().is_empty());
        assert!(!log.clear());

        store.set_available(true);
        assert_eq!(log.read_all().len(), 1);
    }

    #[test]
    fn quota_exceeded_keeps_previous_contents() {
        let store = Arc::new(MemoryStore::with_quota(4_096));
        let log = log_over(store);
        let big = report(&"x".repeat(8_192));
        let small = report("small");

        assert!(log.append(&small));
        assert!(!log.append(&big));
        assert_eq!(log.read_all(), vec![small]);
    }

    #[test]
    fn clear_removes_everything() {
        let log = log_over(Arc::new(MemoryStore::new()));
        log.append(&report("a"));
        assert!(log.clear());
        assert!(log.read_all().is_empty());
    }

    fn concurrent_appends(log: Arc<PersistentLog>, threads: usize, per_thread: usize) {
        let workers: Vec<_> = (0..threads)
            .map(|t| {
                let log = Arc::clone(&log);
                std::thread::spawn(move || {
                    for i in 0..per_thread {
                        assert!(log.append(&report(&format!("t{t}-r{i}"))));
                    }
                })
            })
            .collect();
        for worker in workers {
            worker.join().unwrap();
        }
    }

    #[test]
    fn concurrent_appends_are_not_lost() {
        let log = Arc::new(log_over(Arc::new(MemoryStore::new())));
        concurrent_appends(Arc::clone(&log), 8, 5);
        assert_eq!(log.read_all().len(), 40);

        concurrent_appends(Arc::clone(&log), 8, 5);
        assert_eq!(log.read_all().len(), 50);
    }

    #[test]
    fn concurrent_appends_on_file_store_are_not_lost() {
        let tmp = tempfile::TempDir::new().unwrap();
        let log = Arc::new(log_over(Arc::new(FileStore::new(tmp.path()).unwrap())));
        concurrent_appends(Arc::clone(&log), 8, 5);
        assert_eq!(log.read_all().len(), 40);
    }

    #[test]
    fn survives_reopen_on_file_store() {
        let tmp = tempfile::TempDir::new().unwrap();
        let r = report("durable");
        {
            let log = log_over(Arc::new(FileStore::new(tmp.path()).unwrap()));
            log.append(&r);
        }
        let reopened = log_over(Arc::new(FileStore::new(tmp.path()).unwrap()));
        assert_eq!(reopened.read_all(), vec![r]);
    }
}
