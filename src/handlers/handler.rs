//! # Report handler trait.
//!
//! Provides [`ReportHandler`], the extension point for in-process consumers of reports
//! that survived the severity filter.
//!
//! ## Rules
//! - Called synchronously, once per surviving report, in registration order.
//! - A handler returning `Err` or panicking does not affect other handlers or the caller.
//! - Handlers must not block. Asynchronous follow-up work should be spawned through
//!   [`HostFaults::spawn_watched`](crate::HostFaults::spawn_watched) so its failure is
//!   still observed.
//!
//! ## Example
//! ```rust
//! use faultwatch::{HandlerError, Report, ReportHandler, Severity};
//!
//! struct Pager;
//!
//! impl ReportHandler for Pager {
//!     fn on_report(&self, report: &Report) -> Result<(), HandlerError> {
//!         if report.severity == Severity::Critical {
//!             // page someone
//!         }
//!         Ok(())
//!     }
//!
//!     fn name(&self) -> &'static str { "pager" }
//! }
//! ```

use crate::error::HandlerError;
use crate::reports::Report;

/// In-process consumer of surviving reports.
pub trait ReportHandler: Send + Sync + 'static {
    /// Processes a single report.
    fn on_report(&self, report: &Report) -> Result<(), HandlerError>;

    /// Returns the handler name used in logs.
    ///
    /// The default uses `type_name::<Self>()`, which can be verbose; override it when possible.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// Adapter turning a closure into a [`ReportHandler`].
///
/// ```rust
/// use std::sync::Arc;
/// use faultwatch::{FnHandler, ReportHandler};
///
/// let handler: Arc<dyn ReportHandler> = FnHandler::arc("audit", |report: &faultwatch::Report| {
///     println!("{} {}", report.id, report.message);
///     Ok(())
/// });
/// assert_eq!(handler.name(), "audit");
/// ```
pub struct FnHandler<F> {
    name: &'static str,
    f: F,
}

impl<F> FnHandler<F>
where
    F: Fn(&Report) -> Result<(), HandlerError> + Send + Sync + 'static,
{
    pub fn new(name: &'static str, f: F) -> Self {
        Self { name, f }
    }

    /// Creates the handler already wrapped in an `Arc`, ready for registration.
    pub fn arc(name: &'static str, f: F) -> std::sync::Arc<Self> {
        std::sync::Arc::new(Self::new(name, f))
    }
}

impl<F> ReportHandler for FnHandler<F>
where
    F: Fn(&Report) -> Result<(), HandlerError> + Send + Sync + 'static,
{
    fn on_report(&self, report: &Report) -> Result<(), HandlerError> {
        (self.f)(report)
    }

    fn name(&self) -> &'static str {
        self.name
    }
}
