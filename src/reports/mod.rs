//! Report data model and normalization.
//!
//! ## Contents
//! - [`Report`], [`Severity`], [`FaultSource`], [`ReportContext`] the record shape
//! - [`Failure`], [`ErrorInfo`] raw input accepted by ingestion
//! - [`ReportOptions`] per-call options bag
//! - [`normalize`] raw input → complete report

mod failure;
mod normalize;
mod options;
mod report;

pub use failure::{ErrorInfo, Failure};
pub use normalize::{generate_id, normalize};
pub use options::ReportOptions;
pub use report::{
    EnvironmentSnapshot, FaultSource, Location, Report, ReportContext, ReportId, Severity,
};
