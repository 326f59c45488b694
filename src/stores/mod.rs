//! Report stores.
//!
//! Two deliberately separate tiers with separate capacities and eviction:
//! - [`ReportIndex`] bounded in-memory working set for lookups by id (FIFO, one at a time)
//! - [`PersistentLog`] capped durable log in host storage (bulk trim from the front)
//!
//! They are not reconciled: removing a report from one leaves the other untouched.

mod index;
mod log;

pub use index::ReportIndex;
pub use log::PersistentLog;
