//! # Example: basic
//!
//! Demonstrates explicit reporting through the pipeline.
//!
//! Shows how to:
//! - Build a [`Telemetry`] with a file-backed persistent log.
//! - Register a [`ReportHandler`] that counts reports by severity.
//! - Raise the threshold and observe that low reports are dropped everywhere.
//!
//! ## Flow
//! ```text
//! report_*() ──► normalize ──► filter ──► index ──► console ──► FileStore ──► handlers
//! ```
//!
//! ## Run
//! ```bash
//! RUST_LOG=faultwatch=debug cargo run --example basic
//! ```

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use faultwatch::{
    Config, FileStore, HandlerError, Report, ReportContext, ReportHandler, ReportOptions,
    SessionEnvironment, Severity, Telemetry,
};
use tracing_subscriber::EnvFilter;

/// Counts reports per severity.
#[derive(Default)]
struct SeverityCounter {
    counts: Mutex<BTreeMap<Severity, usize>>,
}

impl ReportHandler for SeverityCounter {
    fn on_report(&self, report: &Report) -> Result<(), HandlerError> {
        let mut counts = self
            .counts
            .lock()
            .map_err(|_| HandlerError::failed("counter poisoned"))?;
        *counts.entry(report.severity).or_default() += 1;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "severity-counter"
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let dir = std::env::temp_dir().join("faultwatch-basic");
    let env = Arc::new(
        SessionEnvironment::new()
            .with_build_version(env!("CARGO_PKG_VERSION"))
            .with_environment("development"),
    );
    env.navigate("https://blog.example/posts/1", "/posts/:id");

    let telemetry = Telemetry::builder(Config::default())
        .with_environment(env.clone())
        .with_storage(Arc::new(FileStore::new(&dir)?))
        .build();
    telemetry.initialize();

    let counter = Arc::new(SeverityCounter::default());
    telemetry.register_handler(counter.clone());

    telemetry.report(
        "comment form submit failed",
        ReportOptions::new().with_context(ReportContext::new().with_component("CommentForm")),
    );
    telemetry.report_network_fault("/api/comments", 503, None);
    telemetry.report_image_fault("/img/cover.png", None);
    telemetry.report_performance_issue(
        "largest-contentful-paint",
        Duration::from_millis(5_400),
        Duration::from_millis(2_500),
    );

    env.navigate("https://blog.example/about", "/about");
    telemetry.set_threshold(Severity::High);
    telemetry.report_validation_fault("email", "", "required");
    telemetry.report_render_fault("team grid crashed", "TeamGrid", None);

    println!("recent reports:");
    for report in telemetry.recent_reports() {
        println!(
            "  {} [{}] {} ({})",
            report.id, report.severity, report.message, report.location.route
        );
    }
    println!("by severity: {:?}", counter.counts.lock().map(|c| c.clone()));
    println!(
        "persisted in {}: {}",
        dir.display(),
        telemetry.persisted_reports().len()
    );

    telemetry.destroy();
    Ok(())
}
