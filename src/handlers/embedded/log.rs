//! # LogWriter: simple report printer
//!
//! A minimal handler that prints incoming [`Report`]s to stdout.
//! Use it for test or demo.
//!
//! ## Example output
//! ```text
//! [high] network-fault id=err_mk2…_3_q81zr0 route=/blog msg="HTTP 503 for /api/x" status=503
//! [low] image-load-fault id=err_mk2…_4_0cj2ka route=/blog msg="Failed to load image: /img/a.png"
//! [high] script-fault id=err_mk2…_5_m1x9dd route=/ msg="boom" at=app.rs:10:5
//! ```

use crate::error::HandlerError;
use crate::handlers::ReportHandler;
use crate::reports::{FaultSource, Report};

/// Report writer handler.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    fn render(report: &Report) -> String {
        let mut line = format!(
            "[{}] {} id={} route={} msg={:?}",
            report.severity,
            report.source,
            report.id,
            if report.location.route.is_empty() {
                "-"
            } else {
                report.location.route.as_str()
            },
            report.message,
        );

        match report.source {
            FaultSource::ScriptFault => {
                let file = report
                    .context
                    .as_ref()
                    .and_then(|c| c.extra.get("filename"))
                    .and_then(|v| v.as_str())
                    .unwrap_or("unknown");
                line.push_str(&format!(
                    " at={}:{}:{}",
                    file,
                    report.location.line.unwrap_or(0),
                    report.location.column.unwrap_or(0)
                ));
            }
            FaultSource::NetworkFault => {
                if let Some(status) = report.additional.get("status") {
                    line.push_str(&format!(" status={status}"));
                }
            }
            _ => {}
        }
        line
    }
}

impl ReportHandler for LogWriter {
    fn on_report(&self, report: &Report) -> Result<(), HandlerError> {
        println!("{}", Self::render(report));
        Ok(())
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}
