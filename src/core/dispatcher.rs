//! # Dispatcher: fan-out of one surviving report.
//!
//! ## Order
//! ```text
//! dispatch(report, flags)
//!     ├─► 1. index.insert()                      (always)
//!     ├─► 2. console (tracing)                   (!skip_logging && development)
//!     ├─► 3. log.append()                        (!skip_storage; failures swallowed)
//!     ├─► 4. handlers.dispatch()                 (each isolated)
//!     └─► 5. escalation.escalate()               (!skip_remote && severity >= High)
//! ```
//!
//! ## Rules
//! - Only reports that passed the severity filter get here.
//! - No lock is held while handlers or escalation run.
//! - While a dispatch runs, the current thread is marked so that faults raised from inside
//!   a sink (e.g. a panicking handler) are not re-ingested by the interceptor.

use std::cell::Cell;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, error, info, trace, warn};

use super::escalation::Escalate;
use crate::handlers::{HandlerSet, panic_message};
use crate::host::HostEnvironment;
use crate::reports::{Report, ReportOptions, Severity};
use crate::stores::{PersistentLog, ReportIndex};

thread_local! {
    static DISPATCH_DEPTH: Cell<usize> = const { Cell::new(0) };
}

/// True while a dispatch is running on the current thread.
pub(crate) fn dispatch_in_progress() -> bool {
    DISPATCH_DEPTH.with(Cell::get) > 0
}

struct DispatchScope;

impl DispatchScope {
    fn enter() -> Self {
        DISPATCH_DEPTH.with(|d| d.set(d.get() + 1));
        DispatchScope
    }
}

impl Drop for DispatchScope {
    fn drop(&mut self) {
        DISPATCH_DEPTH.with(|d| d.set(d.get().saturating_sub(1)));
    }
}

/// Per-report sink gates, taken from [`ReportOptions`].
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct SinkFlags {
    pub skip_logging: bool,
    pub skip_storage: bool,
    pub skip_remote: bool,
}

impl From<&ReportOptions> for SinkFlags {
    fn from(opts: &ReportOptions) -> Self {
        Self {
            skip_logging: opts.skip_logging,
            skip_storage: opts.skip_storage,
            skip_remote: opts.skip_remote,
        }
    }
}

pub(crate) struct Dispatcher {
    index: Mutex<ReportIndex>,
    log: PersistentLog,
    handlers: HandlerSet,
    escalation: Arc<dyn Escalate>,
    env: Arc<dyn HostEnvironment>,
}

impl Dispatcher {
    pub(crate) fn new(
        index: ReportIndex,
        log: PersistentLog,
        handlers: HandlerSet,
        escalation: Arc<dyn Escalate>,
        env: Arc<dyn HostEnvironment>,
    ) -> Self {
        Self {
            index: Mutex::new(index),
            log,
            handlers,
            escalation,
            env,
        }
    }

    pub(crate) fn index(&self) -> MutexGuard<'_, ReportIndex> {
        self.index.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn log(&self) -> &PersistentLog {
        &self.log
    }

    pub(crate) fn handlers(&self) -> &HandlerSet {
        &self.handlers
    }

    /// Runs every sink for one admitted report.
    pub(crate) fn dispatch(&self, report: Report, flags: SinkFlags) {
        let _scope = DispatchScope::enter();
        let report = Arc::new(report);

        if let Some(evicted) = self.index().insert(Arc::clone(&report)) {
            trace!(evicted = %evicted.id, "index full; evicted oldest report");
        }

        if !flags.skip_logging && self.env.is_development() {
            emit_console(&report);
        }

        if !flags.skip_storage {
            self.log.append(&report);
        }

        let outcome = self.handlers.dispatch(&report);
        if outcome.failed > 0 {
            debug!(
                report_id = %report.id,
                delivered = outcome.delivered,
                failed = outcome.failed,
                "report delivered with handler failures"
            );
        }

        if !flags.skip_remote && report.severity.is_escalated() {
            self.escalate(&report);
        }
    }

    fn escalate(&self, report: &Report) {
        let escalation = &self.escalation;
        if let Err(panic_err) = panic::catch_unwind(AssertUnwindSafe(|| escalation.escalate(report)))
        {
            warn!(
                escalation = escalation.name(),
                report_id = %report.id,
                panic = %panic_message(&*panic_err),
                "escalation panicked"
            );
        }
    }

    /// Clears handler registrations and the in-memory index. The persistent log is kept.
    pub(crate) fn reset(&self) {
        self.handlers.clear();
        self.index().clear();
    }
}

/// Development console sink.
fn emit_console(report: &Report) {
    let stack = report.stack.as_deref().unwrap_or("");
    match report.severity {
        Severity::Critical | Severity::High => error!(
            target: "faultwatch::console",
            report_id = %report.id,
            source = %report.source,
            severity = %report.severity,
            route = %report.location.route,
            stack,
            "{}",
            report.message
        ),
        Severity::Medium => warn!(
            target: "faultwatch::console",
            report_id = %report.id,
            source = %report.source,
            route = %report.location.route,
            stack,
            "{}",
            report.message
        ),
        Severity::Low => info!(
            target: "faultwatch::console",
            report_id = %report.id,
            source = %report.source,
            route = %report.location.route,
            "{}",
            report.message
        ),
    }
}
