//! Error types used by the faultwatch pipeline and its collaborators.
//!
//! This module defines two main error enums:
//!
//! - [`StorageError`]: failures of the host key/value store behind the persistent log.
//! - [`HandlerError`]: failures returned by a registered [`ReportHandler`](crate::ReportHandler).
//!
//! Neither ever escapes the public ingestion API: storage errors are swallowed at the
//! persistent log boundary and handler errors are caught per handler. Both types provide
//! helper methods (`as_label`, `as_message`) for the `tracing` events emitted when that happens.

use thiserror::Error;

/// # Errors produced by a host key/value store.
///
/// Returned by [`KeyValueStore`](crate::KeyValueStore) implementations. The persistent log
/// treats every variant the same way: the report is simply not durable.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum StorageError {
    /// Storage is switched off or not reachable (private browsing, disabled quota, etc.).
    #[error("storage unavailable: {reason}")]
    Unavailable {
        /// Why the store refused the operation.
        reason: String,
    },

    /// Writing the value would exceed the store's byte quota.
    #[error("storage quota exceeded: need {needed} bytes, limit {limit}")]
    QuotaExceeded {
        /// Total bytes the store would hold after the write.
        needed: usize,
        /// Configured quota in bytes.
        limit: usize,
    },

    /// Underlying filesystem failure.
    #[error("storage io: {0}")]
    Io(#[from] std::io::Error),

    /// Stored contents could not be encoded or decoded.
    #[error("storage contents corrupt: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl StorageError {
    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use faultwatch::StorageError;
    ///
    /// let err = StorageError::QuotaExceeded { needed: 10, limit: 5 };
    /// assert_eq!(err.as_label(), "storage_quota_exceeded");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            StorageError::Unavailable { .. } => "storage_unavailable",
            StorageError::QuotaExceeded { .. } => "storage_quota_exceeded",
            StorageError::Io(_) => "storage_io",
            StorageError::Serialize(_) => "storage_corrupt",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            StorageError::Unavailable { reason } => format!("unavailable: {reason}"),
            StorageError::QuotaExceeded { needed, limit } => {
                format!("quota exceeded: {needed}/{limit} bytes")
            }
            StorageError::Io(e) => format!("io: {e}"),
            StorageError::Serialize(e) => format!("corrupt: {e}"),
        }
    }
}

/// # Errors returned by report handlers.
///
/// A handler returning an error never affects sibling handlers or the caller;
/// the dispatcher logs it and moves on.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum HandlerError {
    /// Handler attempted to process the report and failed.
    #[error("handler failed: {error}")]
    Failed {
        /// The underlying error message.
        error: String,
    },

    /// Handler declined the report (e.g. unsupported source).
    #[error("handler rejected report: {reason}")]
    Rejected {
        /// Why the report was declined.
        reason: String,
    },
}

impl HandlerError {
    /// Convenience constructor for [`HandlerError::Failed`].
    pub fn failed(error: impl Into<String>) -> Self {
        HandlerError::Failed {
            error: error.into(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use faultwatch::HandlerError;
    ///
    /// assert_eq!(HandlerError::failed("boom").as_label(), "handler_failed");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            HandlerError::Failed { .. } => "handler_failed",
            HandlerError::Rejected { .. } => "handler_rejected",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            HandlerError::Failed { error } => format!("error: {error}"),
            HandlerError::Rejected { reason } => format!("rejected: {reason}"),
        }
    }
}
