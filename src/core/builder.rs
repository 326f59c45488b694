use std::sync::Arc;

use super::{
    config::Config,
    dispatcher::Dispatcher,
    escalation::{ConsoleEscalation, Escalate},
    telemetry::Telemetry,
};
use crate::{
    handlers::{HandlerSet, ReportHandler},
    host::{HostEnvironment, HostFaults, SessionEnvironment},
    storage::{KeyValueStore, MemoryStore},
    stores::{PersistentLog, ReportIndex},
};

/// Builder for constructing a [`Telemetry`] pipeline.
///
/// Every collaborator has a default:
/// - environment: [`SessionEnvironment::from_env`]
/// - storage: an in-process [`MemoryStore`]
/// - host channels: a fresh [`HostFaults`]
/// - escalation: [`ConsoleEscalation`]
pub struct TelemetryBuilder {
    cfg: Config,
    env: Option<Arc<dyn HostEnvironment>>,
    storage: Option<Arc<dyn KeyValueStore>>,
    host: Option<Arc<HostFaults>>,
    escalation: Option<Arc<dyn Escalate>>,
    handlers: Vec<Arc<dyn ReportHandler>>,
}

impl TelemetryBuilder {
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: Config) -> Self {
        Self {
            cfg,
            env: None,
            storage: None,
            host: None,
            escalation: None,
            handlers: Vec::new(),
        }
    }

    /// Sets the source of build, environment and location snapshots.
    pub fn with_environment(mut self, env: Arc<dyn HostEnvironment>) -> Self {
        self.env = Some(env);
        self
    }

    /// Sets the key-value storage backing the persistent log.
    pub fn with_storage(mut self, storage: Arc<dyn KeyValueStore>) -> Self {
        self.storage = Some(storage);
        self
    }

    /// Shares host fault channels with other components (e.g. a panic hook).
    pub fn with_host(mut self, host: Arc<HostFaults>) -> Self {
        self.host = Some(host);
        self
    }

    /// Replaces the escalation hook for high and critical reports.
    pub fn with_escalation(mut self, escalation: Arc<dyn Escalate>) -> Self {
        self.escalation = Some(escalation);
        self
    }

    /// Registers handlers up front, in order.
    pub fn with_handlers(mut self, handlers: Vec<Arc<dyn ReportHandler>>) -> Self {
        self.handlers = handlers;
        self
    }

    /// Builds the pipeline. It starts uninitialized; call [`Telemetry::initialize`] to
    /// attach the interceptor.
    pub fn build(self) -> Arc<Telemetry> {
        let env = self
            .env
            .unwrap_or_else(|| Arc::new(SessionEnvironment::from_env()));
        let storage = self
            .storage
            .unwrap_or_else(|| Arc::new(MemoryStore::new()));
        let host = self.host.unwrap_or_else(|| Arc::new(HostFaults::new()));
        let escalation = self
            .escalation
            .unwrap_or_else(|| Arc::new(ConsoleEscalation));

        let handlers = HandlerSet::new();
        for handler in self.handlers {
            handlers.register(handler);
        }

        let dispatcher = Dispatcher::new(
            ReportIndex::new(self.cfg.index_capacity_clamped()),
            PersistentLog::new(
                storage,
                self.cfg.storage_key.clone(),
                self.cfg.log_capacity_clamped(),
            ),
            handlers,
            escalation,
            Arc::clone(&env),
        );

        Arc::new(Telemetry::new_internal(self.cfg, env, host, dispatcher))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::FnHandler;
    use crate::reports::{Report, ReportOptions, Severity};

    #[test]
    fn applies_config_and_initial_handlers() {
        let cfg = Config {
            threshold: Severity::Medium,
            index_capacity: 2,
            ..Config::default()
        };
        let telemetry = TelemetryBuilder::new(cfg)
            .with_environment(Arc::new(SessionEnvironment::new()))
            .with_handlers(vec![
                FnHandler::arc("a", |_: &Report| Ok(())),
                FnHandler::arc("b", |_: &Report| Ok(())),
            ])
            .build();

        assert_eq!(telemetry.threshold(), Severity::Medium);
        assert_eq!(telemetry.handler_count(), 2);
        assert!(!telemetry.is_initialized());

        for i in 0..3 {
            telemetry.report(format!("r{i}"), ReportOptions::new());
        }
        assert_eq!(telemetry.recent_reports().len(), 2);
    }

    #[test]
    fn shared_host_is_used() {
        let host = Arc::new(HostFaults::new());
        let telemetry = TelemetryBuilder::new(Config::default())
            .with_environment(Arc::new(SessionEnvironment::new()))
            .with_host(Arc::clone(&host))
            .build();
        assert!(Arc::ptr_eq(telemetry.host(), &host));
    }
}
