//! # Global interceptor.
//!
//! Routes the host's uncaught-failure channels into the normal ingestion path.
//!
//! ```text
//! HostFaults ── ScriptError ──► report_script_fault() ──► prevent_default()
//!            └─ Rejection   ──► report_rejection()    ──► prevent_default()
//! ```
//!
//! ## Rules
//! - Exactly one listener per channel per attachment; the [`ListenerId`]s are retained so
//!   `destroy` can detach them.
//! - Listeners hold a `Weak` reference; a dropped pipeline leaves the host default in place.
//! - Faults raised while a dispatch is running on the same thread are left to the host.

use std::sync::Weak;

use tracing::debug;

use super::dispatcher::dispatch_in_progress;
use super::telemetry::Telemetry;
use crate::host::{FaultChannel, HostFaults, ListenerId, UncaughtFault};

/// Subscription handles of one attachment.
#[derive(Debug)]
pub(crate) struct Interceptor {
    script: ListenerId,
    rejection: ListenerId,
}

impl Interceptor {
    pub(crate) fn attach(host: &HostFaults, telemetry: Weak<Telemetry>) -> Self {
        let weak = telemetry.clone();
        let script = host.add_listener(FaultChannel::ScriptError, move |event| {
            if dispatch_in_progress() {
                return;
            }
            let Some(telemetry) = weak.upgrade() else {
                return;
            };
            let UncaughtFault::ScriptError(fault) = event.fault() else {
                return;
            };
            let id = telemetry.report_script_fault(fault.clone());
            debug!(report_id = %id, "captured uncaught script error");
            event.prevent_default();
        });

        let weak = telemetry;
        let rejection = host.add_listener(FaultChannel::Rejection, move |event| {
            if dispatch_in_progress() {
                return;
            }
            let Some(telemetry) = weak.upgrade() else {
                return;
            };
            let UncaughtFault::Rejection(rejection) = event.fault() else {
                return;
            };
            let id = telemetry.report_rejection(rejection.clone());
            debug!(report_id = %id, "captured unhandled rejection");
            event.prevent_default();
        });

        Self { script, rejection }
    }

    pub(crate) fn detach(self, host: &HostFaults) {
        host.remove_listener(self.script);
        host.remove_listener(self.rejection);
    }
}
