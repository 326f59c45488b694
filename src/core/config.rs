//! # Pipeline configuration.
//!
//! Provides [`Config`], centralized settings consumed by
//! [`TelemetryBuilder`](crate::TelemetryBuilder).
//!
//! ## Sentinel values
//! - `index_capacity = 0` / `log_capacity = 0` → clamped to 1 by the stores

use crate::reports::Severity;

/// Configuration for the telemetry pipeline.
///
/// ## Field semantics
/// - `threshold`: minimum severity kept (`Low` = accept everything)
/// - `production_threshold`: threshold applied by `initialize` in production
/// - `index_capacity`: in-memory index size (FIFO eviction)
/// - `log_capacity`: persistent log size (front trimmed on append)
/// - `storage_key`: host storage key holding the persisted JSON array
///
/// ## Notes
/// All fields are public for flexibility. Prefer the clamping accessors to sprinkling
/// `max(1)` across the codebase.
#[derive(Clone, Debug)]
pub struct Config {
    /// Initial severity threshold.
    ///
    /// Can be changed at runtime via `Telemetry::set_threshold`.
    pub threshold: Severity,

    /// Threshold applied by `Telemetry::initialize` when the environment is `"production"`.
    ///
    /// Only ever tightens: an explicitly stricter threshold is kept.
    pub production_threshold: Severity,

    /// Maximum number of reports held in the in-memory index.
    pub index_capacity: usize,

    /// Maximum number of reports kept in the persistent log.
    pub log_capacity: usize,

    /// Host storage key for the persistent log.
    pub storage_key: String,
}

impl Config {
    /// Index capacity clamped to a minimum of 1.
    #[inline]
    pub fn index_capacity_clamped(&self) -> usize {
        self.index_capacity.max(1)
    }

    /// Log capacity clamped to a minimum of 1.
    #[inline]
    pub fn log_capacity_clamped(&self) -> usize {
        self.log_capacity.max(1)
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `threshold = Low` (keep everything)
    /// - `production_threshold = Medium`
    /// - `index_capacity = 100`
    /// - `log_capacity = 50`
    /// - `storage_key = "faultwatch.reports"`
    fn default() -> Self {
        Self {
            threshold: Severity::Low,
            production_threshold: Severity::Medium,
            index_capacity: 100,
            log_capacity: 50,
            storage_key: "faultwatch.reports".to_string(),
        }
    }
}
