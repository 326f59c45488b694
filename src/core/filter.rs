//! # Severity filter.
//!
//! All-or-nothing gate applied once, right after normalization: a report strictly below
//! the threshold reaches no sink at all.

use std::sync::{PoisonError, RwLock};

use crate::reports::Severity;

#[derive(Debug)]
pub(crate) struct SeverityFilter {
    threshold: RwLock<Severity>,
}

impl SeverityFilter {
    pub(crate) fn new(threshold: Severity) -> Self {
        Self {
            threshold: RwLock::new(threshold),
        }
    }

    pub(crate) fn threshold(&self) -> Severity {
        *self.threshold.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn set(&self, threshold: Severity) {
        *self.threshold.write().unwrap_or_else(PoisonError::into_inner) = threshold;
    }

    /// Raises the threshold to at least `floor`; never lowers it.
    pub(crate) fn tighten(&self, floor: Severity) -> Severity {
        let mut threshold = self.threshold.write().unwrap_or_else(PoisonError::into_inner);
        *threshold = (*threshold).max(floor);
        *threshold
    }

    #[inline]
    pub(crate) fn admits(&self, severity: Severity) -> bool {
        severity >= self.threshold()
    }
}
