//! Pipeline core: filtering, dispatch and lifecycle.
//!
//! The public API from this module is [`Telemetry`] (built through [`TelemetryBuilder`]),
//! its [`Config`], and the [`Escalate`] hook.
//!
//! Internal modules:
//! - [`filter`]: severity threshold applied right after normalization;
//! - [`dispatcher`]: fan-out of a surviving report to the stores, console, handlers and escalation;
//! - [`interceptor`]: routes the host's uncaught-failure channels into ingestion;
//! - [`telemetry`]: ingestion entry points, management queries and lifecycle.

mod builder;
mod config;
mod dispatcher;
mod escalation;
mod filter;
mod interceptor;
mod telemetry;

pub use builder::TelemetryBuilder;
pub use config::Config;
pub use escalation::{ConsoleEscalation, Escalate};
pub use telemetry::Telemetry;
