//! # Per-call report options.
//!
//! [`ReportOptions`] is the options bag every ingestion call accepts. Unset fields fall
//! back to the normalizer defaults (`Medium`, `Manual`, no context). The three skip flags
//! gate individual sinks; none of them affects the in-memory index.
//!
//! ```rust
//! use faultwatch::{FaultSource, ReportOptions, Severity};
//!
//! let opts = ReportOptions::new()
//!     .with_severity(Severity::High)
//!     .with_source(FaultSource::UserAction)
//!     .skip_storage();
//! assert!(opts.skip_storage);
//! assert!(!opts.skip_logging);
//! ```

use std::collections::BTreeMap;

use serde_json::Value;

use super::report::{FaultSource, ReportContext, Severity};

#[derive(Debug, Clone, Default)]
pub struct ReportOptions {
    pub severity: Option<Severity>,
    pub source: Option<FaultSource>,
    pub context: Option<ReportContext>,
    /// Source-specific extras copied into [`Report::additional`](crate::Report::additional).
    pub additional: BTreeMap<String, Value>,
    /// Do not emit to the development console.
    pub skip_logging: bool,
    /// Do not append to the persistent log.
    pub skip_storage: bool,
    /// Do not escalate, even for high/critical reports.
    pub skip_remote: bool,
}

impl ReportOptions {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = Some(severity);
        self
    }

    #[inline]
    pub fn with_source(mut self, source: FaultSource) -> Self {
        self.source = Some(source);
        self
    }

    /// Sets the context, merging with any context already present.
    #[inline]
    pub fn with_context(mut self, context: ReportContext) -> Self {
        self.context = Some(match self.context.take() {
            Some(existing) => existing.merge(context),
            None => context,
        });
        self
    }

    #[inline]
    pub fn with_additional(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.additional.insert(key.into(), value.into());
        self
    }

    #[inline]
    pub fn skip_logging(mut self) -> Self {
        self.skip_logging = true;
        self
    }

    #[inline]
    pub fn skip_storage(mut self) -> Self {
        self.skip_storage = true;
        self
    }

    #[inline]
    pub fn skip_remote(mut self) -> Self {
        self.skip_remote = true;
        self
    }
}
