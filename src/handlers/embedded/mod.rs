//! # Built-in handlers
//!
//! Small, self-contained handlers useful for demos.
//!
//! - [`LogWriter`]: prints reports in a human-readable form (demo/debug).

mod log;

pub use log::LogWriter;
