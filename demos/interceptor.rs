//! # Example: interceptor
//!
//! Demonstrates capture of uncaught failures.
//!
//! Shows how to:
//! - Route panics into the pipeline with [`HostFaults::install_panic_hook`].
//! - Turn failed or panicking background futures into rejections with
//!   [`HostFaults::spawn_watched`].
//! - Print every surviving report with the built-in [`LogWriter`].
//!
//! ## Flow
//! ```text
//! panic!() ──► panic hook ──► ScriptError channel ──┐
//! spawn_watched(Err | panic) ──► Rejection channel ─┴─► Interceptor ──► Telemetry
//! ```
//!
//! ## Run
//! Requires the `logging` feature to export [`LogWriter`].
//! ```bash
//! cargo run --example interceptor --features logging
//! ```

use std::sync::Arc;

use faultwatch::{Config, HostFaults, LogWriter, ReportHandler, SessionEnvironment, Telemetry};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let host = Arc::new(HostFaults::new());
    host.install_panic_hook();

    let env = Arc::new(SessionEnvironment::from_env());
    env.navigate("app://main", "/");

    let telemetry = Telemetry::builder(Config::default())
        .with_environment(env)
        .with_host(Arc::clone(&host))
        .with_handlers(vec![Arc::new(LogWriter::new()) as Arc<dyn ReportHandler>])
        .build();
    telemetry.initialize();

    // Err from a background job: rejection channel.
    let failed = host.spawn_watched(async { Err::<(), _>("sync job lost its lease") });
    // Panic in a background job: rejection channel, not reported twice.
    let panicked = host.spawn_watched(async {
        let shards: Vec<u32> = Vec::new();
        Ok::<u32, String>(shards[3])
    });
    failed.await?;
    panicked.await?;

    // Panic on a plain thread: script-error channel via the panic hook.
    let worker = std::thread::spawn(|| panic!("worker thread crashed"));
    let _ = worker.join();

    println!("captured {} report(s)", telemetry.recent_reports().len());

    telemetry.destroy();
    Ok(())
}
