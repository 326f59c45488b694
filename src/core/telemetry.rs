//! # Telemetry: the pipeline context object.
//!
//! [`Telemetry`] owns the severity filter, the dispatcher (index, persistent log,
//! handlers, escalation) and the lifecycle state. Build one with
//! [`Telemetry::builder`] at startup and share the returned `Arc` with every consumer.
//!
//! ## High-level architecture
//! ```text
//! caller ──► report*(failure, opts) ──► normalize() ──► [patch line/column]
//!                                                            │
//!                                                   SeverityFilter::admits?
//!                                                  ┌─────────┴─────────┐
//!                                                  ▼ no                ▼ yes
//!                                          return id (kept nowhere)   Dispatcher::dispatch()
//!                                                                      ├─► ReportIndex
//!                                                                      ├─► console (dev)
//!                                                                      ├─► PersistentLog
//!                                                                      ├─► HandlerSet
//!                                                                      └─► Escalate (high+)
//!
//! initialize() ──► Interceptor::attach(HostFaults)  (+ production threshold)
//! destroy()    ──► Interceptor::detach, handlers.clear(), index.clear()
//! ```
//!
//! ## Example
//! ```rust
//! use faultwatch::{Config, ReportOptions, Severity, Telemetry};
//!
//! let telemetry = Telemetry::builder(Config::default()).build();
//! telemetry.initialize();
//!
//! let id = telemetry.report("checkout failed", ReportOptions::new().with_severity(Severity::High));
//! assert_eq!(telemetry.get_report(id.as_str()).unwrap().message, "checkout failed");
//!
//! let id = telemetry.report_network_fault("/api/x", 503, None);
//! assert_eq!(telemetry.get_report(id.as_str()).unwrap().severity, Severity::High);
//!
//! telemetry.destroy();
//! ```

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde_json::Value;
use tracing::{debug, info, trace};

use super::builder::TelemetryBuilder;
use super::config::Config;
use super::dispatcher::{Dispatcher, SinkFlags};
use super::filter::SeverityFilter;
use super::interceptor::Interceptor;
use crate::handlers::ReportHandler;
use crate::host::{HostEnvironment, HostFaults, Rejection, ScriptError};
use crate::reports::{
    Failure, FaultSource, Report, ReportContext, ReportId, ReportOptions, Severity, normalize,
};

/// Lifecycle state of the pipeline.
#[derive(Debug)]
enum Lifecycle {
    Uninitialized,
    Initialized(Interceptor),
}

/// The failure-telemetry pipeline.
pub struct Telemetry {
    cfg: Config,
    env: Arc<dyn HostEnvironment>,
    host: Arc<HostFaults>,
    filter: SeverityFilter,
    dispatcher: Dispatcher,
    lifecycle: Mutex<Lifecycle>,
}

impl Telemetry {
    /// Starts building a pipeline.
    pub fn builder(cfg: Config) -> TelemetryBuilder {
        TelemetryBuilder::new(cfg)
    }

    pub(crate) fn new_internal(
        cfg: Config,
        env: Arc<dyn HostEnvironment>,
        host: Arc<HostFaults>,
        dispatcher: Dispatcher,
    ) -> Self {
        Self {
            filter: SeverityFilter::new(cfg.threshold),
            cfg,
            env,
            host,
            dispatcher,
            lifecycle: Mutex::new(Lifecycle::Uninitialized),
        }
    }

    pub fn config(&self) -> &Config {
        &self.cfg
    }

    /// Host channels the interceptor attaches to.
    pub fn host(&self) -> &Arc<HostFaults> {
        &self.host
    }

    // ---------------------------
    // Ingestion
    // ---------------------------

    /// Reports a failure or message. Always returns an id, even if the report is dropped
    /// by the severity filter.
    pub fn report(&self, failure: impl Into<Failure>, opts: ReportOptions) -> ReportId {
        self.ingest(failure.into(), opts, |_| {})
    }

    /// Like [`report`](Self::report), merging `context` into the options' context.
    pub fn report_with_context(
        &self,
        failure: impl Into<Failure>,
        context: ReportContext,
        opts: ReportOptions,
    ) -> ReportId {
        self.ingest(failure.into(), opts.with_context(context), |_| {})
    }

    /// Uncaught synchronous fault. Severity `High`; line and column are patched onto the
    /// report location after normalization.
    pub fn report_script_fault(&self, fault: ScriptError) -> ReportId {
        let mut context = ReportContext::new();
        if let Some(filename) = &fault.filename {
            context = context.with_extra("filename", filename.as_str());
        }
        if let Some(line) = fault.line {
            context = context.with_extra("line", line);
        }
        if let Some(column) = fault.column {
            context = context.with_extra("column", column);
        }
        let opts = ReportOptions::new()
            .with_severity(Severity::High)
            .with_source(FaultSource::ScriptFault)
            .with_context(context);

        let (line, column) = (fault.line, fault.column);
        let failure = fault.error.unwrap_or(Failure::Message(fault.message));
        self.ingest(failure, opts, |report| {
            report.location.line = line;
            report.location.column = column;
        })
    }

    /// Failed asynchronous operation nobody handled. Severity `High`.
    pub fn report_rejection(&self, rejection: Rejection) -> ReportId {
        let opts = ReportOptions::new()
            .with_severity(Severity::High)
            .with_source(FaultSource::RejectedAsyncOperation)
            .with_context(ReportContext::new().with_extra("reason", rejection.reason.as_str()));
        let failure = rejection
            .error
            .unwrap_or(Failure::Message(rejection.reason));
        self.ingest(failure, opts, |_| {})
    }

    /// A UI component failed to render. Severity `High`.
    pub fn report_render_fault(
        &self,
        error: impl Into<Failure>,
        component: &str,
        component_stack: Option<&str>,
    ) -> ReportId {
        let mut opts = ReportOptions::new()
            .with_severity(Severity::High)
            .with_source(FaultSource::UiRenderFault)
            .with_context(ReportContext::new().with_component(component));
        if let Some(stack) = component_stack {
            opts = opts.with_additional("component_stack", stack);
        }
        self.ingest(error.into(), opts, |_| {})
    }

    /// A network request failed. Severity `High` for status `>= 500`, `Medium` otherwise.
    pub fn report_network_fault(
        &self,
        url: &str,
        status: u16,
        error: Option<Failure>,
    ) -> ReportId {
        let severity = if status >= 500 {
            Severity::High
        } else {
            Severity::Medium
        };
        let opts = ReportOptions::new()
            .with_severity(severity)
            .with_source(FaultSource::NetworkFault)
            .with_additional("url", url)
            .with_additional("status", status);
        let failure = error.unwrap_or_else(|| {
            if status == 0 {
                Failure::Message(format!("Network request failed: {url}"))
            } else {
                Failure::Message(format!("HTTP {status} for {url}"))
            }
        });
        self.ingest(failure, opts, |_| {})
    }

    /// An image failed to load. Severity `Low`; an explicit error only contributes its
    /// stack and causes.
    pub fn report_image_fault(&self, image_url: &str, error: Option<Failure>) -> ReportId {
        let opts = ReportOptions::new()
            .with_severity(Severity::Low)
            .with_source(FaultSource::ImageLoadFault)
            .with_additional("image_url", image_url);
        let message = format!("Failed to load image: {image_url}");
        let failure = match error {
            Some(Failure::Error(mut info)) => {
                info.message = message;
                Failure::Error(info)
            }
            _ => Failure::Message(message),
        };
        self.ingest(failure, opts, |_| {})
    }

    /// Input validation failed. Severity `Low`.
    pub fn report_validation_fault(
        &self,
        field: &str,
        value: impl Into<Value>,
        rule: &str,
    ) -> ReportId {
        let opts = ReportOptions::new()
            .with_severity(Severity::Low)
            .with_source(FaultSource::Validation)
            .with_additional("field", field)
            .with_additional("value", value)
            .with_additional("rule", rule);
        self.ingest(
            Failure::Message(format!("Validation failed for {field}: {rule}")),
            opts,
            |_| {},
        )
    }

    /// A performance budget was exceeded. Severity `Medium` at twice the budget or more,
    /// `Low` otherwise.
    pub fn report_performance_issue(
        &self,
        metric: &str,
        observed: Duration,
        budget: Duration,
    ) -> ReportId {
        let severity = if observed >= budget.saturating_mul(2) {
            Severity::Medium
        } else {
            Severity::Low
        };
        let observed_ms = u64::try_from(observed.as_millis()).unwrap_or(u64::MAX);
        let budget_ms = u64::try_from(budget.as_millis()).unwrap_or(u64::MAX);
        let opts = ReportOptions::new()
            .with_severity(severity)
            .with_source(FaultSource::Performance)
            .with_additional("metric", metric)
            .with_additional("observed_ms", observed_ms)
            .with_additional("budget_ms", budget_ms);
        self.ingest(
            Failure::Message(format!(
                "{metric} took {observed_ms}ms (budget {budget_ms}ms)"
            )),
            opts,
            |_| {},
        )
    }

    /// A user-triggered action failed. Severity `Medium`.
    pub fn report_user_action(&self, action: &str, failure: impl Into<Failure>) -> ReportId {
        let opts = ReportOptions::new()
            .with_severity(Severity::Medium)
            .with_source(FaultSource::UserAction)
            .with_context(ReportContext::new().with_action(action));
        self.ingest(failure.into(), opts, |_| {})
    }

    fn ingest(
        &self,
        failure: Failure,
        opts: ReportOptions,
        patch: impl FnOnce(&mut Report),
    ) -> ReportId {
        let mut report = normalize(failure, &opts, self.env.as_ref());
        patch(&mut report);
        let id = report.id.clone();

        if !self.filter.admits(report.severity) {
            trace!(
                report_id = %id,
                severity = %report.severity,
                threshold = %self.filter.threshold(),
                "report below threshold; dropped"
            );
            return id;
        }

        self.dispatcher.dispatch(report, SinkFlags::from(&opts));
        id
    }

    // ---------------------------
    // Management
    // ---------------------------

    /// Every report in the persistent log, oldest first.
    pub fn persisted_reports(&self) -> Vec<Report> {
        self.dispatcher.log().read_all()
    }

    /// Looks a report up in the in-memory index.
    pub fn get_report(&self, id: &str) -> Option<Arc<Report>> {
        self.dispatcher.index().get(id)
    }

    /// Reports in the in-memory index, oldest first.
    pub fn recent_reports(&self) -> Vec<Arc<Report>> {
        self.dispatcher.index().snapshot()
    }

    /// Removes the persistent log. The in-memory index is untouched.
    pub fn clear_persisted(&self) -> bool {
        self.dispatcher.log().clear()
    }

    /// Removes one report from the in-memory index. The persistent log is untouched.
    pub fn clear_report(&self, id: &str) -> bool {
        self.dispatcher.index().remove(id).is_some()
    }

    // ---------------------------
    // Configuration
    // ---------------------------

    /// Registers a handler. Returns `false` if this exact `Arc` is already registered.
    pub fn register_handler(&self, handler: Arc<dyn ReportHandler>) -> bool {
        self.dispatcher.handlers().register(handler)
    }

    /// Unregisters a handler by identity.
    pub fn unregister_handler(&self, handler: &Arc<dyn ReportHandler>) -> bool {
        self.dispatcher.handlers().unregister(handler)
    }

    pub fn handler_count(&self) -> usize {
        self.dispatcher.handlers().len()
    }

    pub fn set_threshold(&self, threshold: Severity) {
        self.filter.set(threshold);
    }

    pub fn threshold(&self) -> Severity {
        self.filter.threshold()
    }

    // ---------------------------
    // Lifecycle
    // ---------------------------

    /// Attaches the interceptor and, in production, tightens the threshold.
    ///
    /// Returns `false` (and does nothing) if already initialized.
    pub fn initialize(self: &Arc<Self>) -> bool {
        let mut state = self.lifecycle();
        if matches!(*state, Lifecycle::Initialized(_)) {
            debug!("telemetry already initialized");
            return false;
        }

        let interceptor = Interceptor::attach(&self.host, Arc::downgrade(self));
        if self.env.is_production() {
            self.filter.tighten(self.cfg.production_threshold);
        }
        *state = Lifecycle::Initialized(interceptor);
        info!(threshold = %self.filter.threshold(), "telemetry initialized");
        true
    }

    /// Detaches the interceptor, clears handlers and the in-memory index.
    ///
    /// The persistent log survives. Returns `false` if it was not initialized (handlers and
    /// index are cleared regardless).
    pub fn destroy(&self) -> bool {
        let previous = std::mem::replace(&mut *self.lifecycle(), Lifecycle::Uninitialized);
        self.dispatcher.reset();
        match previous {
            Lifecycle::Initialized(interceptor) => {
                interceptor.detach(&self.host);
                info!("telemetry destroyed");
                true
            }
            Lifecycle::Uninitialized => false,
        }
    }

    pub fn is_initialized(&self) -> bool {
        matches!(*self.lifecycle(), Lifecycle::Initialized(_))
    }

    fn lifecycle(&self) -> MutexGuard<'_, Lifecycle> {
        self.lifecycle.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::error::HandlerError;
    use crate::handlers::FnHandler;
    use crate::host::{FaultChannel, PanicHookGuard, SessionEnvironment};
    use crate::reports::ErrorInfo;
    use crate::storage::{FileStore, MemoryStore};

    struct Fixture {
        telemetry: Arc<Telemetry>,
        env: Arc<SessionEnvironment>,
        store: Arc<MemoryStore>,
    }

    fn fixture(environment: &str) -> Fixture {
        let env = Arc::new(
            SessionEnvironment::new()
                .with_build_version("1.0.0")
                .with_environment(environment),
        );
        env.navigate("https://site/blog", "/blog");
        let store = Arc::new(MemoryStore::new());
        let telemetry = Telemetry::builder(Config::default())
            .with_environment(env.clone())
            .with_storage(store.clone())
            .build();
        Fixture {
            telemetry,
            env,
            store,
        }
    }

    fn counting_handler(hits: Arc<AtomicUsize>) -> Arc<dyn ReportHandler> {
        FnHandler::arc("counter", move |_: &Report| {
            hits.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
    }

    #[test]
    fn below_threshold_is_dropped_everywhere_but_returns_an_id() {
        let f = fixture("development");
        let hits = Arc::new(AtomicUsize::new(0));
        f.telemetry.register_handler(counting_handler(hits.clone()));
        f.telemetry.set_threshold(Severity::High);

        let id = f.telemetry.report_validation_fault("email", "", "required");

        assert!(!id.as_str().is_empty());
        assert!(f.telemetry.get_report(id.as_str()).is_none());
        assert!(f.telemetry.recent_reports().is_empty());
        assert!(f.telemetry.persisted_reports().is_empty());
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn server_error_is_high_and_lands_in_both_stores() {
        let f = fixture("development");
        let id = f.telemetry.report_network_fault("/api/x", 503, None);

        let indexed = f.telemetry.get_report(id.as_str()).unwrap();
        assert_eq!(indexed.severity, Severity::High);
        assert_eq!(indexed.source, FaultSource::NetworkFault);
        assert_eq!(indexed.message, "HTTP 503 for /api/x");
        assert_eq!(indexed.additional["status"], 503);

        let persisted = f.telemetry.persisted_reports();
        assert_eq!(persisted.len(), 1);
        assert_eq!(persisted[0].id, id);
    }

    #[test]
    fn client_error_is_medium() {
        let f = fixture("development");
        let id = f.telemetry.report_network_fault("/api/y", 404, None);
        assert_eq!(
            f.telemetry.get_report(id.as_str()).unwrap().severity,
            Severity::Medium
        );
    }

    #[test]
    fn image_fault_is_low_with_fixed_message() {
        let f = fixture("development");
        let id = f.telemetry.report_image_fault("/img/a.png", None);

        let report = f.telemetry.get_report(id.as_str()).unwrap();
        assert_eq!(report.severity, Severity::Low);
        assert_eq!(report.source, FaultSource::ImageLoadFault);
        assert_eq!(report.message, "Failed to load image: /img/a.png");

        let id = f.telemetry.report_image_fault(
            "/img/b.png",
            Some(ErrorInfo::new("decode error").with_stack("at decode").into()),
        );
        let report = f.telemetry.get_report(id.as_str()).unwrap();
        assert_eq!(report.message, "Failed to load image: /img/b.png");
        assert_eq!(report.stack.as_deref(), Some("at decode"));
    }

    #[test]
    fn failing_handler_does_not_stop_the_next_one() {
        let f = fixture("development");
        let hits = Arc::new(AtomicUsize::new(0));
        f.telemetry.register_handler(FnHandler::arc("broken", |_: &Report| {
            Err(HandlerError::failed("boom"))
        }));
        f.telemetry.register_handler(counting_handler(hits.clone()));

        f.telemetry.report("x", ReportOptions::new());
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn handlers_can_reenter_the_api() {
        let f = fixture("development");
        let weak = Arc::downgrade(&f.telemetry);
        let found = Arc::new(AtomicUsize::new(0));
        let counter = found.clone();
        f.telemetry.register_handler(FnHandler::arc("lookup", move |report: &Report| {
            let telemetry = weak.upgrade().ok_or_else(|| HandlerError::failed("gone"))?;
            if telemetry.get_report(report.id.as_str()).is_some() {
                counter.fetch_add(1, Ordering::SeqCst);
            }
            Ok(())
        }));

        f.telemetry.report("x", ReportOptions::new());
        assert_eq!(found.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn skip_flags_gate_their_sinks_only() {
        let f = fixture("development");
        let hits = Arc::new(AtomicUsize::new(0));
        f.telemetry.register_handler(counting_handler(hits.clone()));

        let id = f.telemetry.report(
            "quiet",
            ReportOptions::new()
                .skip_storage()
                .skip_logging()
                .skip_remote(),
        );
        assert!(f.telemetry.get_report(id.as_str()).is_some());
        assert!(f.telemetry.persisted_reports().is_empty());
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn stores_are_capped_independently() {
        let f = fixture("development");
        let ids: Vec<ReportId> = (0..120)
            .map(|i| f.telemetry.report(format!("r{i}"), ReportOptions::new()))
            .collect();

        let recent = f.telemetry.recent_reports();
        assert_eq!(recent.len(), 100);
        assert_eq!(recent[0].id, ids[20]);

        let persisted = f.telemetry.persisted_reports();
        assert_eq!(persisted.len(), 50);
        assert_eq!(persisted[0].id, ids[70]);
        assert_eq!(persisted[49].id, ids[119]);
    }

    #[test]
    fn clearing_one_store_leaves_the_other() {
        let f = fixture("development");
        let id = f.telemetry.report("x", ReportOptions::new());

        assert!(f.telemetry.clear_report(id.as_str()));
        assert!(!f.telemetry.clear_report(id.as_str()));
        assert!(f.telemetry.get_report(id.as_str()).is_none());
        assert_eq!(f.telemetry.persisted_reports().len(), 1);

        let id = f.telemetry.report("y", ReportOptions::new());
        assert!(f.telemetry.clear_persisted());
        assert!(f.telemetry.persisted_reports().is_empty());
        assert!(f.telemetry.get_report(id.as_str()).is_some());
    }

    #[test]
    fn storage_failure_does_not_affect_other_sinks() {
        let f = fixture("development");
        let hits = Arc::new(AtomicUsize::new(0));
        f.telemetry.register_handler(counting_handler(hits.clone()));
        f.store.set_available(false);

        let id = f.telemetry.report("x", ReportOptions::new());
        assert!(f.telemetry.get_report(id.as_str()).is_some());
        assert!(f.telemetry.persisted_reports().is_empty());
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn environment_snapshot_is_taken_per_report() {
        let f = fixture("development");
        let first = f.telemetry.report("a", ReportOptions::new());
        f.env.navigate("https://site/about", "/about");
        let second = f.telemetry.report("b", ReportOptions::new());

        let first = f.telemetry.get_report(first.as_str()).unwrap();
        let second = f.telemetry.get_report(second.as_str()).unwrap();
        assert_eq!(first.location.route, "/blog");
        assert_eq!(second.location.route, "/about");
        assert_eq!(first.environment.build_version, "1.0.0");
    }

    #[test]
    fn script_fault_patches_position_and_context() {
        let f = fixture("development");
        let id = f
            .telemetry
            .report_script_fault(ScriptError::new("boom").at("app.js", 10, 4));

        let report = f.telemetry.get_report(id.as_str()).unwrap();
        assert_eq!(report.severity, Severity::High);
        assert_eq!(report.source, FaultSource::ScriptFault);
        assert_eq!(report.location.line, Some(10));
        assert_eq!(report.location.column, Some(4));
        let context = report.context.as_ref().unwrap();
        assert_eq!(context.extra["filename"], "app.js");
    }

    #[test]
    fn render_validation_and_user_action_shapes() {
        let f = fixture("development");

        let id = f
            .telemetry
            .report_render_fault("render failed", "Gallery", Some("in Gallery\nin Page"));
        let r = f.telemetry.get_report(id.as_str()).unwrap();
        assert_eq!(r.source, FaultSource::UiRenderFault);
        assert_eq!(r.context.as_ref().unwrap().component.as_deref(), Some("Gallery"));
        assert_eq!(r.additional["component_stack"], "in Gallery\nin Page");

        let id = f.telemetry.report_validation_fault("email", "nope", "format");
        let r = f.telemetry.get_report(id.as_str()).unwrap();
        assert_eq!(r.severity, Severity::Low);
        assert_eq!(r.message, "Validation failed for email: format");
        assert_eq!(r.additional["value"], "nope");

        let id = f.telemetry.report_user_action("subscribe", "newsletter API down");
        let r = f.telemetry.get_report(id.as_str()).unwrap();
        assert_eq!(r.source, FaultSource::UserAction);
        assert_eq!(r.context.as_ref().unwrap().action.as_deref(), Some("subscribe"));
    }

    #[test]
    fn performance_severity_scales_with_overrun() {
        let f = fixture("development");
        let mild = f.telemetry.report_performance_issue(
            "lcp",
            Duration::from_millis(3_000),
            Duration::from_millis(2_500),
        );
        let severe = f.telemetry.report_performance_issue(
            "lcp",
            Duration::from_millis(6_000),
            Duration::from_millis(2_500),
        );
        assert_eq!(
            f.telemetry.get_report(mild.as_str()).unwrap().severity,
            Severity::Low
        );
        let severe = f.telemetry.get_report(severe.as_str()).unwrap();
        assert_eq!(severe.severity, Severity::Medium);
        assert_eq!(severe.message, "lcp took 6000ms (budget 2500ms)");
    }

    #[test]
    fn report_with_context_merges() {
        let f = fixture("development");
        let id = f.telemetry.report_with_context(
            "x",
            ReportContext::new().with_request_id("req-9"),
            ReportOptions::new().with_context(ReportContext::new().with_component("Cart")),
        );
        let r = f.telemetry.get_report(id.as_str()).unwrap();
        let ctx = r.context.as_ref().unwrap();
        assert_eq!(ctx.component.as_deref(), Some("Cart"));
        assert_eq!(ctx.request_id.as_deref(), Some("req-9"));
    }

    #[test]
    fn initialize_twice_attaches_once() {
        let f = fixture("development");
        assert!(f.telemetry.initialize());
        assert!(!f.telemetry.initialize());

        let host = f.telemetry.host();
        assert_eq!(host.listener_count(FaultChannel::ScriptError), 1);
        assert_eq!(host.listener_count(FaultChannel::Rejection), 1);

        assert!(host.raise(ScriptError::new("uncaught").at("main.js", 1, 1)));
        assert_eq!(f.telemetry.recent_reports().len(), 1);

        assert!(host.raise(Rejection::new("timeout")));
        let recent = f.telemetry.recent_reports();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[1].source, FaultSource::RejectedAsyncOperation);
        assert_eq!(recent[1].context.as_ref().unwrap().extra["reason"], "timeout");
    }

    #[test]
    fn destroy_detaches_and_clears() {
        let f = fixture("development");
        let hits = Arc::new(AtomicUsize::new(0));
        f.telemetry.register_handler(counting_handler(hits.clone()));
        f.telemetry.initialize();
        f.telemetry.report("kept on disk", ReportOptions::new());

        assert!(f.telemetry.destroy());
        assert!(!f.telemetry.destroy());
        assert!(!f.telemetry.is_initialized());
        assert_eq!(f.telemetry.handler_count(), 0);
        assert!(f.telemetry.recent_reports().is_empty());
        assert_eq!(f.telemetry.persisted_reports().len(), 1);

        let host = f.telemetry.host();
        assert_eq!(host.listener_count(FaultChannel::ScriptError), 0);
        assert!(!host.raise(ScriptError::new("after destroy")));
        assert!(f.telemetry.recent_reports().is_empty());

        assert!(f.telemetry.initialize());
        assert!(host.raise(ScriptError::new("after re-init")));
        assert_eq!(f.telemetry.recent_reports().len(), 1);
    }

    #[test]
    fn production_initialize_tightens_threshold() {
        let f = fixture("production");
        assert_eq!(f.telemetry.threshold(), Severity::Low);
        f.telemetry.initialize();
        assert_eq!(f.telemetry.threshold(), Severity::Medium);

        let id = f.telemetry.report_image_fault("/img/a.png", None);
        assert!(f.telemetry.get_report(id.as_str()).is_none());
    }

    #[test]
    fn development_initialize_keeps_threshold() {
        let f = fixture("development");
        f.telemetry.initialize();
        assert_eq!(f.telemetry.threshold(), Severity::Low);
    }

    #[test]
    fn interceptor_skips_faults_raised_inside_a_dispatch() {
        let f = fixture("development");
        f.telemetry.initialize();
        let host = Arc::clone(f.telemetry.host());
        let prevented = Arc::new(AtomicUsize::new(0));
        let counter = prevented.clone();
        f.telemetry.register_handler(FnHandler::arc("raiser", move |_: &Report| {
            if host.raise(ScriptError::new("nested")) {
                counter.fetch_add(1, Ordering::SeqCst);
            }
            Ok(())
        }));

        f.telemetry.report("outer", ReportOptions::new());
        assert_eq!(prevented.load(Ordering::SeqCst), 0);
        assert_eq!(f.telemetry.recent_reports().len(), 1);
    }

    #[test]
    fn dropped_pipeline_leaves_host_default() {
        let f = fixture("development");
        f.telemetry.initialize();
        let host = Arc::clone(f.telemetry.host());
        drop(f);
        assert!(!host.raise(ScriptError::new("orphan")));
    }

    #[tokio::test]
    async fn watched_failure_becomes_one_rejection_report() {
        let f = fixture("development");
        f.telemetry.initialize();
        let host = Arc::clone(f.telemetry.host());

        let job = host.spawn_watched(async { Err::<(), _>("lease lost") });
        assert_eq!(job.await.unwrap(), None);

        let recent = f.telemetry.recent_reports();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].source, FaultSource::RejectedAsyncOperation);
        assert_eq!(recent[0].severity, Severity::High);
        assert_eq!(recent[0].message, "lease lost");
        assert_eq!(f.telemetry.persisted_reports().len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn panics_reach_the_pipeline_through_the_hook() {
        let f = fixture("development");
        f.telemetry.initialize();
        let host = Arc::clone(f.telemetry.host());
        let _hook = PanicHookGuard::install(&host);

        let job = host.spawn_watched(async {
            tokio::task::yield_now().await;
            let shards: Vec<u32> = Vec::new();
            Ok::<u32, String>(shards[3])
        });
        assert_eq!(job.await.unwrap(), None);

        let worker = std::thread::spawn(|| panic!("worker lost its cache"));
        assert!(worker.join().is_err());

        let recent = f.telemetry.recent_reports();
        let watched: Vec<_> = recent
            .iter()
            .filter(|r| r.message.contains("index out of bounds"))
            .collect();
        assert_eq!(watched.len(), 1);
        assert_eq!(watched[0].source, FaultSource::RejectedAsyncOperation);

        let thread: Vec<_> = recent
            .iter()
            .filter(|r| r.message == "worker lost its cache")
            .collect();
        assert_eq!(thread.len(), 1);
        assert_eq!(thread[0].source, FaultSource::ScriptFault);
        assert!(thread[0].location.line.is_some());
    }

    #[test]
    fn concurrent_reports_all_persist() {
        let f = fixture("development");
        let workers: Vec<_> = (0..8)
            .map(|t| {
                let telemetry = Arc::clone(&f.telemetry);
                std::thread::spawn(move || {
                    for i in 0..5 {
                        telemetry.report(format!("t{t}-r{i}"), ReportOptions::new());
                    }
                })
            })
            .collect();
        for worker in workers {
            worker.join().unwrap();
        }

        assert_eq!(f.telemetry.recent_reports().len(), 40);
        assert_eq!(f.telemetry.persisted_reports().len(), 40);
    }

    #[test]
    fn concurrent_reports_on_file_store_keep_the_last_fifty() {
        let tmp = tempfile::TempDir::new().unwrap();
        let telemetry = Telemetry::builder(Config::default())
            .with_environment(Arc::new(SessionEnvironment::new()))
            .with_storage(Arc::new(FileStore::new(tmp.path()).unwrap()))
            .build();
        let workers: Vec<_> = (0..8)
            .map(|t| {
                let telemetry = Arc::clone(&telemetry);
                std::thread::spawn(move || {
                    for i in 0..10 {
                        telemetry.report(format!("t{t}-r{i}"), ReportOptions::new());
                    }
                })
            })
            .collect();
        for worker in workers {
            worker.join().unwrap();
        }

        assert_eq!(telemetry.recent_reports().len(), 80);
        assert_eq!(telemetry.persisted_reports().len(), 50);
    }
}
