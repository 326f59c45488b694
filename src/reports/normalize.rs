//! # Normalizer: raw failure + options → complete [`Report`].
//!
//! Stamps identity, timestamp and a fresh environment snapshot. Never fails: missing
//! values fall back to defaults.
//!
//! ## Defaults
//! - message: `"Unknown error"` when empty
//! - severity: [`Severity::Medium`]
//! - source: [`FaultSource::Manual`]
//! - build version / environment / user agent: `"unknown"`
//! - url / route: empty string
//!
//! ## Identity
//! `err_<unix millis, base36>_<sequence, base36>_<6 random base36 chars>`.
//! The sequence comes from a process-wide counter, so ids never repeat within a process
//! even if the clock stalls.

use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};

use chrono::Utc;
use rand::Rng;

use super::failure::Failure;
use super::options::ReportOptions;
use super::report::{EnvironmentSnapshot, Location, Report, ReportId};
use crate::host::HostEnvironment;

/// Global sequence counter for report ids.
static REPORT_SEQ: AtomicU64 = AtomicU64::new(0);

pub(crate) const UNKNOWN_MESSAGE: &str = "Unknown error";
pub(crate) const UNKNOWN: &str = "unknown";

const ALPHABET: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Generates a new, process-unique report id.
pub fn generate_id() -> ReportId {
    let millis = u64::try_from(Utc::now().timestamp_millis()).unwrap_or_default();
    let seq = REPORT_SEQ.fetch_add(1, AtomicOrdering::Relaxed);
    let mut rng = rand::rng();
    let suffix: String = (0..6)
        .map(|_| ALPHABET[rng.random_range(0..ALPHABET.len())] as char)
        .collect();
    ReportId::new(format!("err_{}_{}_{}", base36(millis), base36(seq), suffix))
}

fn base36(mut n: u64) -> String {
    if n == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::new();
    while n > 0 {
        digits.push(ALPHABET[(n % 36) as usize]);
        n /= 36;
    }
    digits.reverse();
    String::from_utf8(digits).unwrap_or_default()
}

fn or_default(value: Option<String>, default: &str) -> String {
    value
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

/// Builds a complete report. The environment is read on every call.
pub fn normalize(failure: Failure, opts: &ReportOptions, env: &dyn HostEnvironment) -> Report {
    let (message, stack, causes) = match failure {
        Failure::Message(message) => (message, None, Vec::new()),
        Failure::Error(info) => (info.message, info.stack, info.causes),
    };
    let message = if message.is_empty() {
        UNKNOWN_MESSAGE.to_string()
    } else {
        message
    };

    Report {
        id: generate_id(),
        message,
        source: opts.source.unwrap_or_default(),
        severity: opts.severity.unwrap_or_default(),
        timestamp: Utc::now(),
        stack,
        causes,
        location: Location {
            url: env.current_url().unwrap_or_default(),
            route: env.current_route().unwrap_or_default(),
            line: None,
            column: None,
        },
        environment: EnvironmentSnapshot {
            build_version: or_default(env.build_version(), UNKNOWN),
            environment: or_default(env.environment_name(), UNKNOWN),
            user_agent: or_default(env.user_agent(), UNKNOWN),
        },
        context: opts.context.clone(),
        additional: opts.additional.clone(),
    }
}
