//! # Report handlers.
//!
//! This module provides the [`ReportHandler`] trait, the closure adapter [`FnHandler`],
//! and the [`HandlerSet`] registry that fans surviving reports out to them.
//!
//! ## Architecture
//! ```text
//! Dispatcher ── dispatch(&Report) ──► HandlerSet
//!                                        │
//!                                   ┌────┴────┬─────────┬───────┐
//!                                   ▼         ▼         ▼       ▼
//!                               LogWriter   Pager    Custom    ...
//! ```
//!
//! With the `logging` feature, [`LogWriter`] prints one line per report (demo/debug).

#[cfg(feature = "logging")]
mod embedded;
mod handler;
mod handler_set;

#[cfg(feature = "logging")]
pub use embedded::LogWriter;
pub use handler::{FnHandler, ReportHandler};
pub use handler_set::{DispatchOutcome, HandlerSet};

pub(crate) use handler_set::panic_message;
