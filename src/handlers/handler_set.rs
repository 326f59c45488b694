//! # Isolated fan-out to registered handlers.
//!
//! Provides [`HandlerSet`], the registry of [`ReportHandler`]s and the isolating
//! dispatch loop.
//!
//! ## Architecture
//! ```text
//! dispatch(report)
//!     │  snapshot handlers (lock released before any call)
//!     ├──► handler1.on_report() ──► Ok
//!     ├──► handler2.on_report() ──► Err  → warn!, continue
//!     ├──► handler3.on_report() ──► panic → catch_unwind, warn!, continue
//!     └──► handlerN.on_report()
//! ```
//!
//! ## Rules
//! - **Identity**: handlers compare by `Arc` pointer; registering the same `Arc` twice is a no-op
//! - **Order**: registration order
//! - **Isolation**: an `Err` or panic in one handler never reaches siblings or the caller
//! - **Re-entrancy**: no lock is held during calls, so a handler may use the telemetry API
//!
//! **Warning**: `AssertUnwindSafe` is used, which can leave a handler's own shared state
//! inconsistent if it panics while holding a lock.

use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, PoisonError, RwLock};

use tracing::warn;

use super::ReportHandler;
use crate::reports::Report;

/// Result of delivering one report to every registered handler.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchOutcome {
    /// Handlers that returned `Ok`.
    pub delivered: usize,
    /// Handlers that returned `Err` or panicked.
    pub failed: usize,
}

#[derive(Default)]
pub struct HandlerSet {
    handlers: RwLock<Vec<Arc<dyn ReportHandler>>>,
}

impl HandlerSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a handler. Returns `false` if this exact `Arc` is already registered.
    pub fn register(&self, handler: Arc<dyn ReportHandler>) -> bool {
        let mut handlers = self.write();
        if handlers.iter().any(|h| Arc::ptr_eq(h, &handler)) {
            return false;
        }
        handlers.push(handler);
        true
    }

    /// Unregisters a handler by identity. Returns `false` if it was not registered.
    pub fn unregister(&self, handler: &Arc<dyn ReportHandler>) -> bool {
        let mut handlers = self.write();
        let before = handlers.len();
        handlers.retain(|h| !Arc::ptr_eq(h, handler));
        handlers.len() != before
    }

    pub fn clear(&self) {
        self.write().clear();
    }

    pub fn len(&self) -> usize {
        self.handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Calls every registered handler once, isolating failures.
    pub fn dispatch(&self, report: &Report) -> DispatchOutcome {
        let snapshot: Vec<Arc<dyn ReportHandler>> = self
            .handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        let mut outcome = DispatchOutcome::default();
        for handler in snapshot {
            match panic::catch_unwind(AssertUnwindSafe(|| handler.on_report(report))) {
                Ok(Ok(())) => outcome.delivered += 1,
                Ok(Err(e)) => {
                    outcome.failed += 1;
                    warn!(
                        handler = handler.name(),
                        report_id = %report.id,
                        error = e.as_label(),
                        detail = %e.as_message(),
                        "report handler failed"
                    );
                }
                Err(panic_err) => {
                    outcome.failed += 1;
                    warn!(
                        handler = handler.name(),
                        report_id = %report.id,
                        panic = %panic_message(&*panic_err),
                        "report handler panicked"
                    );
                }
            }
        }
        outcome
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Vec<Arc<dyn ReportHandler>>> {
        self.handlers.write().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Extracts a readable message from a panic payload.
pub(crate) fn panic_message(any: &(dyn std::any::Any + Send)) -> String {
    if let Some(msg) = any.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = any.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
