//! # Host-level uncaught-failure channels.
//!
//! [`HostFaults`] is the host side of the global interceptor: a synchronous listener
//! registry with two channels, plus adapters that feed real Rust failures into them.
//!
//! ## Architecture
//! ```text
//! panic!()          ──► panic hook ─────────┐
//!                                           ├──► notify(ScriptError) ──► listeners
//! host code         ──► raise(fault) ───────┤                               │
//!                                           │                    prevent_default()?
//! spawn_watched(fut) ─► Err / panic ────────┴──► notify(Rejection)          │
//!                                                                ┌──────────┴──────────┐
//!                                                                ▼                     ▼
//!                                                          prevented: done    default surfacing
//!                                                                             (error! / previous hook)
//! ```
//!
//! ## Rules
//! - Listeners run synchronously, in registration order, on the raising thread.
//! - A panicking listener is isolated; remaining listeners still run.
//! - Each [`ListenerId`] is unique; removing it detaches exactly that listener.
//! - A panic inside a future started with [`spawn_watched`](HostFaults::spawn_watched) is
//!   reported on the rejection channel only, never also as a script error.

use std::backtrace::{Backtrace, BacktraceStatus};
use std::cell::Cell;
use std::fmt;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::task::{Context, Poll};

use futures::FutureExt;
use tokio::task::JoinHandle;
use tracing::{error, warn};

use crate::handlers::panic_message;
use crate::reports::{ErrorInfo, Failure};

/// The two uncaught-failure channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FaultChannel {
    /// Synchronous faults (panics, script errors).
    ScriptError,
    /// Failed asynchronous operations nobody handled.
    Rejection,
}

/// An uncaught synchronous fault.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptError {
    pub message: String,
    pub filename: Option<String>,
    pub line: Option<u32>,
    pub column: Option<u32>,
    /// Underlying error, when the host has one.
    pub error: Option<Failure>,
}

impl ScriptError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            filename: None,
            line: None,
            column: None,
            error: None,
        }
    }

    /// Sets the originating file and position.
    pub fn at(mut self, filename: impl Into<String>, line: u32, column: u32) -> Self {
        self.filename = Some(filename.into());
        self.line = Some(line);
        self.column = Some(column);
        self
    }

    pub fn with_error(mut self, error: impl Into<Failure>) -> Self {
        self.error = Some(error.into());
        self
    }
}

/// A failed asynchronous operation with no handler attached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    /// Stringified rejection reason.
    pub reason: String,
    pub error: Option<Failure>,
}

impl Rejection {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
            error: None,
        }
    }

    pub fn with_error(mut self, error: impl Into<Failure>) -> Self {
        self.error = Some(error.into());
        self
    }
}

/// One occurrence on a host channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UncaughtFault {
    ScriptError(ScriptError),
    Rejection(Rejection),
}

impl UncaughtFault {
    pub fn channel(&self) -> FaultChannel {
        match self {
            UncaughtFault::ScriptError(_) => FaultChannel::ScriptError,
            UncaughtFault::Rejection(_) => FaultChannel::Rejection,
        }
    }
}

impl From<ScriptError> for UncaughtFault {
    fn from(e: ScriptError) -> Self {
        UncaughtFault::ScriptError(e)
    }
}

impl From<Rejection> for UncaughtFault {
    fn from(r: Rejection) -> Self {
        UncaughtFault::Rejection(r)
    }
}

/// A fault being delivered to listeners.
///
/// Any listener may call [`prevent_default`](Self::prevent_default) to tell the host not
/// to surface the fault through its own default channel.
#[derive(Debug)]
pub struct UncaughtEvent {
    fault: UncaughtFault,
    default_prevented: bool,
}

impl UncaughtEvent {
    pub fn new(fault: UncaughtFault) -> Self {
        Self {
            fault,
            default_prevented: false,
        }
    }

    pub fn fault(&self) -> &UncaughtFault {
        &self.fault
    }

    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented
    }
}

/// Handle returned by [`HostFaults::add_listener`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener = Arc<dyn Fn(&mut UncaughtEvent) + Send + Sync>;

struct Registration {
    id: ListenerId,
    channel: FaultChannel,
    listener: Listener,
}

/// Host uncaught-failure channels.
pub struct HostFaults {
    listeners: Mutex<Vec<Registration>>,
    next_id: AtomicU64,
}

impl fmt::Debug for HostFaults {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostFaults")
            .field("script_listeners", &self.listener_count(FaultChannel::ScriptError))
            .field("rejection_listeners", &self.listener_count(FaultChannel::Rejection))
            .finish()
    }
}

impl Default for HostFaults {
    fn default() -> Self {
        Self::new()
    }
}

impl HostFaults {
    pub fn new() -> Self {
        Self {
            listeners: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Subscribes `listener` to `channel`.
    pub fn add_listener<F>(&self, channel: FaultChannel, listener: F) -> ListenerId
    where
        F: Fn(&mut UncaughtEvent) + Send + Sync + 'static,
    {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.lock().push(Registration {
            id,
            channel,
            listener: Arc::new(listener),
        });
        id
    }

    /// Detaches one listener. Returns `false` if it was already gone.
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        let mut listeners = self.lock();
        let before = listeners.len();
        listeners.retain(|r| r.id != id);
        listeners.len() != before
    }

    pub fn listener_count(&self, channel: FaultChannel) -> usize {
        self.lock().iter().filter(|r| r.channel == channel).count()
    }

    /// Delivers `fault` to the listeners of its channel and returns the event afterwards.
    ///
    /// Performs no default surfacing; see [`raise`](Self::raise).
    pub fn notify(&self, fault: impl Into<UncaughtFault>) -> UncaughtEvent {
        let mut event = UncaughtEvent::new(fault.into());
        let channel = event.fault().channel();
        let snapshot: Vec<Listener> = self
            .lock()
            .iter()
            .filter(|r| r.channel == channel)
            .map(|r| Arc::clone(&r.listener))
            .collect();

        for listener in snapshot {
            if let Err(panic_err) = panic::catch_unwind(AssertUnwindSafe(|| listener(&mut event))) {
                warn!(
                    channel = ?channel,
                    panic = %panic_message(&*panic_err),
                    "fault listener panicked"
                );
            }
        }
        event
    }

    /// Delivers `fault` and, unless a listener prevented it, surfaces it as an error event.
    ///
    /// Returns `true` if the default surfacing was prevented.
    pub fn raise(&self, fault: impl Into<UncaughtFault>) -> bool {
        let event = self.notify(fault);
        if event.default_prevented() {
            return true;
        }
        match event.fault() {
            UncaughtFault::ScriptError(e) => error!(
                target: "faultwatch::host",
                fault = %e.message,
                filename = e.filename.as_deref().unwrap_or("unknown"),
                line = e.line.unwrap_or(0),
                column = e.column.unwrap_or(0),
                "uncaught script error"
            ),
            UncaughtFault::Rejection(r) => error!(
                target: "faultwatch::host",
                reason = %r.reason,
                "unhandled rejection"
            ),
        }
        false
    }

    /// Routes panics to the script-error channel.
    ///
    /// The previously installed hook still runs for panics no listener prevented. The hook
    /// holds a weak reference: once this `HostFaults` is dropped it only forwards.
    pub fn install_panic_hook(self: &Arc<Self>) {
        let host = Arc::downgrade(self);
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            if in_watched_poll() {
                // reported on the rejection channel once the unwind is caught
                return;
            }
            let prevented = match host.upgrade() {
                Some(host) => {
                    let message = panic_message(info.payload());
                    let mut script = ScriptError::new(message.clone());
                    if let Some(loc) = info.location() {
                        script = script.at(loc.file(), loc.line(), loc.column());
                    }
                    let backtrace = Backtrace::capture();
                    let mut error = ErrorInfo::new(message);
                    if backtrace.status() == BacktraceStatus::Captured {
                        error = error.with_stack(backtrace.to_string());
                    }
                    host.notify(script.with_error(error)).default_prevented()
                }
                None => false,
            };
            if !prevented {
                previous(info);
            }
        }));
    }

    /// Spawns a fallible future; an `Err` or panic is raised on the rejection channel.
    ///
    /// Resolves to `Some(value)` on success and `None` once the failure was raised.
    /// Must be called within a tokio runtime.
    pub fn spawn_watched<F, T, E>(self: &Arc<Self>, fut: F) -> JoinHandle<Option<T>>
    where
        F: Future<Output = Result<T, E>> + Send + 'static,
        T: Send + 'static,
        E: fmt::Display + Send + 'static,
    {
        let host = Arc::clone(self);
        tokio::spawn(async move {
            match AssertUnwindSafe(Watched::new(fut)).catch_unwind().await {
                Ok(Ok(value)) => Some(value),
                Ok(Err(e)) => {
                    let reason = e.to_string();
                    host.raise(Rejection::new(reason.clone()).with_error(ErrorInfo::new(reason)));
                    None
                }
                Err(panic_err) => {
                    let reason = panic_message(&*panic_err);
                    host.raise(Rejection::new(reason.clone()).with_error(ErrorInfo::new(reason)));
                    None
                }
            }
        })
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Registration>> {
        self.listeners.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

thread_local! {
    static WATCHED_POLL: Cell<bool> = const { Cell::new(false) };
}

fn in_watched_poll() -> bool {
    WATCHED_POLL.with(Cell::get)
}

/// Marks the current thread while a watched future is being polled.
struct Watched<F> {
    inner: Pin<Box<F>>,
}

impl<F> Watched<F> {
    fn new(inner: F) -> Self {
        Self {
            inner: Box::pin(inner),
        }
    }
}

struct PollGuard(bool);

impl Drop for PollGuard {
    fn drop(&mut self) {
        WATCHED_POLL.with(|flag| flag.set(self.0));
    }
}

impl<F: Future> Future for Watched<F> {
    type Output = F::Output;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let _guard = PollGuard(WATCHED_POLL.with(|flag| flag.replace(true)));
        self.inner.as_mut().poll(cx)
    }
}

#[cfg(test)]
type PanicHook = Box<dyn Fn(&panic::PanicHookInfo<'_>) + Send + Sync + 'static>;

/// Installs the panic hook for the duration of a test and restores the previous hook on
/// drop. Hook installs are serialized across the test binary.
#[cfg(test)]
pub(crate) struct PanicHookGuard {
    saved: Option<PanicHook>,
    _serial: std::sync::MutexGuard<'static, ()>,
}

#[cfg(test)]
impl PanicHookGuard {
    pub(crate) fn install(host: &Arc<HostFaults>) -> Self {
        let serial = Self::serialize();
        let saved = panic::take_hook();
        host.install_panic_hook();
        Self {
            saved: Some(saved),
            _serial: serial,
        }
    }

    /// Holds the hook lock without installing anything.
    pub(crate) fn serialize() -> std::sync::MutexGuard<'static, ()> {
        static HOOK: Mutex<()> = Mutex::new(());
        HOOK.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
impl Drop for PanicHookGuard {
    fn drop(&mut self) {
        if let Some(saved) = self.saved.take() {
            panic::set_hook(saved);
        }
    }
}
