//! Host integration seams.
//!
//! The pipeline reads everything it needs from its host through this module:
//! - [`HostEnvironment`] ambient inputs (build, environment name, location, user agent)
//! - [`HostFaults`] the two uncaught-failure channels the interceptor subscribes to
//!
//! Host key/value storage lives in [`crate::storage`].

mod environment;
mod faults;

pub use environment::{DEVELOPMENT, HostEnvironment, PRODUCTION, SessionEnvironment};
pub use faults::{
    FaultChannel, HostFaults, ListenerId, Rejection, ScriptError, UncaughtEvent, UncaughtFault,
};

#[cfg(test)]
pub(crate) use faults::PanicHookGuard;
