//! # faultwatch
//!
//! **Faultwatch** is an embeddable failure-telemetry pipeline for Rust applications.
//!
//! It turns failures from anywhere in an application (explicit reports, uncaught panics,
//! failed background futures, network/render/validation faults) into uniform [`Report`]s,
//! drops the ones below a severity threshold, and fans the rest out to a bounded
//! in-memory index, a bounded persistent log, registered handlers and an escalation hook.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!   explicit calls              HostFaults (uncaught channels)
//!   report_*(..)                 ScriptError     Rejection
//!        │                          │                │
//!        │                          └──► Interceptor ◄┘
//!        │                                   │
//!        ▼                                   ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Telemetry (pipeline context object)                              │
//! │  - normalize()      failure + options + environment ─► Report     │
//! │  - SeverityFilter   drop below threshold (id still returned)      │
//! │  - Dispatcher       fan-out of surviving reports                  │
//! └──────┬──────────────┬──────────────┬──────────────┬───────────────┘
//!        ▼              ▼              ▼              ▼
//!   ReportIndex    console (dev)  PersistentLog   HandlerSet ──► handler1..N
//!   (FIFO, 100)    (tracing)      (KeyValueStore,               │
//!                                  last 50)                     ▼
//!                                                       Escalate (high+)
//! ```
//!
//! ### Lifecycle
//! ```text
//! Telemetry::builder(cfg).build()      ─► Uninitialized (reports accepted)
//!     │
//!     ├─► initialize()  attach interceptor, tighten threshold in production
//!     │       └─ second call is a no-op
//!     │
//!     └─► destroy()     detach interceptor, clear handlers + index
//!                       (persistent log and threshold survive)
//! ```
//!
//! ## Features
//! | Area              | Description                                                  | Key types / traits                          |
//! |-------------------|--------------------------------------------------------------|---------------------------------------------|
//! | **Reports**       | Normalized failure records and caller options.               | [`Report`], [`ReportOptions`], [`Failure`]  |
//! | **Pipeline**      | Filtering, dispatch, lifecycle.                              | [`Telemetry`], [`TelemetryBuilder`]         |
//! | **Handlers**      | Subscribe to surviving reports, isolated from each other.    | [`ReportHandler`], [`FnHandler`]            |
//! | **Stores**        | Bounded in-memory index and persistent log.                  | [`ReportIndex`], [`PersistentLog`]          |
//! | **Host**          | Environment snapshots and uncaught-failure channels.         | [`HostEnvironment`], [`HostFaults`]         |
//! | **Storage**       | Key/value backends for the persistent log.                   | [`KeyValueStore`], [`MemoryStore`], [`FileStore`] |
//! | **Errors**        | Typed storage and handler errors.                            | [`StorageError`], [`HandlerError`]          |
//! | **Configuration** | Thresholds, capacities, storage key.                         | [`Config`]                                  |
//!
//! ## Optional features
//! - `logging`: exports a simple built-in [`LogWriter`] handler _(demo/reference only)_.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use faultwatch::{Config, FnHandler, Report, ReportOptions, SessionEnvironment, Severity, Telemetry};
//!
//! let env = Arc::new(SessionEnvironment::new().with_environment("development"));
//! env.navigate("https://shop.example/cart", "/cart");
//!
//! let telemetry = Telemetry::builder(Config::default())
//!     .with_environment(env)
//!     .build();
//! telemetry.initialize();
//!
//! telemetry.register_handler(FnHandler::arc("stdout", |report: &Report| {
//!     println!("[{}] {}", report.severity, report.message);
//!     Ok(())
//! }));
//!
//! telemetry.set_threshold(Severity::Medium);
//! telemetry.report_validation_fault("email", "", "required"); // dropped
//! let id = telemetry.report_network_fault("/api/cart", 503, None);
//!
//! assert_eq!(telemetry.recent_reports().len(), 1);
//! assert_eq!(telemetry.persisted_reports()[0].id, id);
//! ```
mod core;
mod error;
mod handlers;
mod host;
mod reports;
mod storage;
mod stores;

// ---- Public re-exports ----

pub use crate::core::{Config, ConsoleEscalation, Escalate, Telemetry, TelemetryBuilder};
pub use error::{HandlerError, StorageError};
pub use handlers::{DispatchOutcome, FnHandler, HandlerSet, ReportHandler};
pub use host::{
    DEVELOPMENT, FaultChannel, HostEnvironment, HostFaults, ListenerId, PRODUCTION, Rejection,
    ScriptError, SessionEnvironment, UncaughtEvent, UncaughtFault,
};
pub use reports::{
    EnvironmentSnapshot, ErrorInfo, Failure, FaultSource, Location, Report, ReportContext,
    ReportId, ReportOptions, Severity, generate_id, normalize,
};
pub use storage::{FileStore, KeyValueStore, MemoryStore};
pub use stores::{PersistentLog, ReportIndex};

// Optional: expose a simple built-in logging handler (demo/reference).
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use handlers::LogWriter;
