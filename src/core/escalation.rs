//! # Escalation hook.
//!
//! [`Escalate`] is where remote delivery of high/critical reports would plug in. The
//! pipeline ships no transport: [`ConsoleEscalation`] only re-emits the report as an
//! error-level `tracing` event under the `faultwatch::escalation` target.

use tracing::error;

use crate::reports::Report;

/// Receives every surviving report with severity `High` or `Critical`,
/// unless the caller passed `skip_remote`.
///
/// Called synchronously from the dispatcher; panics are caught and logged.
pub trait Escalate: Send + Sync + 'static {
    fn escalate(&self, report: &Report);

    /// Name used in logs.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// Placeholder escalation: logs instead of sending.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleEscalation;

impl Escalate for ConsoleEscalation {
    fn escalate(&self, report: &Report) {
        error!(
            target: "faultwatch::escalation",
            report_id = %report.id,
            severity = %report.severity,
            source = %report.source,
            route = %report.location.route,
            "escalation pending remote transport: {}",
            report.message
        );
    }

    fn name(&self) -> &'static str {
        "console"
    }
}
