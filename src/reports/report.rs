//! # Normalized fault report.
//!
//! The [`Report`] struct is the single record shape every ingestion path produces.
//! [`Severity`] and [`FaultSource`] are closed enumerations; [`ReportContext`] carries
//! a few well-known keys plus an opaque extension map.
//!
//! ## Persisted shape
//! ```text
//! {
//!   "id": "err_lx3k9a_1_k2j4h1",
//!   "message": "HTTP 503 for /api/x",
//!   "source": "network-fault",
//!   "severity": "high",
//!   "timestamp": "2026-10-19T08:15:00Z",
//!   "location": { "url": "https://site/blog", "route": "/blog" },
//!   "environment": { "build_version": "1.4.2", "environment": "production", "user_agent": "..." },
//!   "additional": { "url": "/api/x", "status": 503 }
//! }
//! ```

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Ordered report severity: `Low < Medium < High < Critical`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    /// Default when the caller does not specify one.
    #[default]
    Medium,
    High,
    Critical,
}

impl Severity {
    /// Returns the lowercase label used in logs and in the persisted JSON.
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }

    /// True for `High` and `Critical`, the severities that are escalated.
    #[inline]
    pub fn is_escalated(&self) -> bool {
        *self >= Severity::High
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a failure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FaultSource {
    /// Uncaught synchronous fault (a panic, a script error).
    ScriptFault,
    /// Fallible async operation that failed with nobody awaiting it.
    RejectedAsyncOperation,
    /// A UI component failed to render.
    UiRenderFault,
    /// A network request failed or returned an error status.
    NetworkFault,
    /// An image resource failed to load.
    ImageLoadFault,
    /// A performance budget was exceeded.
    Performance,
    /// A user-triggered action failed.
    UserAction,
    /// Input validation failed.
    Validation,
    /// Raised explicitly by application code (default).
    #[default]
    Manual,
}

impl FaultSource {
    /// Returns the kebab-case label used in logs and in the persisted JSON.
    pub fn as_str(&self) -> &'static str {
        match self {
            FaultSource::ScriptFault => "script-fault",
            FaultSource::RejectedAsyncOperation => "rejected-async-operation",
            FaultSource::UiRenderFault => "ui-render-fault",
            FaultSource::NetworkFault => "network-fault",
            FaultSource::ImageLoadFault => "image-load-fault",
            FaultSource::Performance => "performance",
            FaultSource::UserAction => "user-action",
            FaultSource::Validation => "validation",
            FaultSource::Manual => "manual",
        }
    }
}

impl fmt::Display for FaultSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Report identifier. Assigned once at creation, never reused within a process.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReportId(String);

impl ReportId {
    pub(crate) fn new(raw: String) -> Self {
        Self(raw)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ReportId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ReportId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::borrow::Borrow<str> for ReportId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Where the failure happened.
///
/// `line` / `column` are only known for script faults and are patched onto the
/// record after the normalizer built it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    /// Full URL of the page at creation time.
    pub url: String,
    /// Route path at creation time.
    pub route: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<u32>,
}

/// Ambient environment captured when the report was created. Never refreshed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentSnapshot {
    pub build_version: String,
    pub environment: String,
    pub user_agent: String,
}

/// Structured caller context.
///
/// A closed set of well-known keys plus one opaque extension map for ad hoc annotation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportContext {
    /// UI component involved, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component: Option<String>,
    /// User action being performed, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    /// Correlation id of the request that failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    /// Free-form extension data.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, Value>,
}

impl ReportContext {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn with_component(mut self, component: impl Into<String>) -> Self {
        self.component = Some(component.into());
        self
    }

    #[inline]
    pub fn with_action(mut self, action: impl Into<String>) -> Self {
        self.action = Some(action.into());
        self
    }

    #[inline]
    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    #[inline]
    pub fn with_session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    /// Adds one entry to the extension map.
    #[inline]
    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// Merges `other` into `self`; fields set in `other` win.
    pub fn merge(mut self, other: ReportContext) -> Self {
        if other.component.is_some() {
            self.component = other.component;
        }
        if other.action.is_some() {
            self.action = other.action;
        }
        if other.request_id.is_some() {
            self.request_id = other.request_id;
        }
        if other.session_id.is_some() {
            self.session_id = other.session_id;
        }
        self.extra.extend(other.extra);
        self
    }
}

/// One normalized failure record.
///
/// Immutable by convention once it leaves the normalizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub id: ReportId,
    pub message: String,
    pub source: FaultSource,
    pub severity: Severity,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
    /// Causal chain, outermost cause first.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub causes: Vec<String>,
    pub location: Location,
    pub environment: EnvironmentSnapshot,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<ReportContext>,
    /// Source-specific extras (status code, image url, validation rule, ...).
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub additional: BTreeMap<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_is_ordered() {
        assert!(Severity::Low < Severity::Medium);
        assert!(Severity::Medium < Severity::High);
        assert!(Severity::High < Severity::Critical);
        assert!(!Severity::Medium.is_escalated());
        assert!(Severity::Critical.is_escalated());
    }

    #[test]
    fn enums_serialize_to_their_labels() {
        let json = serde_json::to_string(&FaultSource::RejectedAsyncOperation).unwrap();
        assert_eq!(json, "\"rejected-async-operation\"");
        assert_eq!(serde_json::to_string(&Severity::High).unwrap(), "\"high\"");

        let parsed: FaultSource = serde_json::from_str("\"image-load-fault\"").unwrap();
        assert_eq!(parsed, FaultSource::ImageLoadFault);
        assert!(serde_json::from_str::<Severity>("\"urgent\"").is_err());
    }

    #[test]
    fn context_merge_prefers_newer_fields() {
        let base = ReportContext::new()
            .with_component("Header")
            .with_extra("a", 1);
        let merged = base.merge(
            ReportContext::new()
                .with_request_id("req-1")
                .with_extra("b", 2),
        );
        assert_eq!(merged.component.as_deref(), Some("Header"));
        assert_eq!(merged.request_id.as_deref(), Some("req-1"));
        assert_eq!(merged.extra.len(), 2);
    }
}
