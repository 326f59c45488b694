//! # Raw failure input accepted by the ingestion API.
//!
//! A [`Failure`] is either a bare message or an error-like value ([`ErrorInfo`]) carrying a
//! message, an optional stack trace and a causal chain. Only error-like values contribute
//! `stack` / `causes` to the resulting report.
//!
//! ## Example
//! ```rust
//! use faultwatch::Failure;
//!
//! let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
//! let failure = Failure::from_error(&io);
//! assert_eq!(failure.message(), "missing");
//!
//! let plain: Failure = "something odd".into();
//! assert!(plain.error_info().is_none());
//! ```

use std::error::Error as StdError;

/// Details of an error-like failure.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorInfo {
    pub message: String,
    pub stack: Option<String>,
    /// Causal chain, outermost cause first.
    pub causes: Vec<String>,
}

impl ErrorInfo {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Self::default()
        }
    }

    #[inline]
    pub fn with_stack(mut self, stack: impl Into<String>) -> Self {
        self.stack = Some(stack.into());
        self
    }

    #[inline]
    pub fn with_cause(mut self, cause: impl Into<String>) -> Self {
        self.causes.push(cause.into());
        self
    }
}

/// Raw failure: a plain message or an error-like value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Failure {
    Message(String),
    Error(ErrorInfo),
}

impl Failure {
    /// Captures an error and its `source()` chain.
    pub fn from_error<E: StdError + ?Sized>(err: &E) -> Self {
        let mut causes = Vec::new();
        let mut next = err.source();
        while let Some(cause) = next {
            causes.push(cause.to_string());
            next = cause.source();
        }
        Failure::Error(ErrorInfo {
            message: err.to_string(),
            stack: None,
            causes,
        })
    }

    /// Message text as given (possibly empty).
    pub fn message(&self) -> &str {
        match self {
            Failure::Message(m) => m,
            Failure::Error(info) => &info.message,
        }
    }

    /// Error details, if this failure is error-like.
    pub fn error_info(&self) -> Option<&ErrorInfo> {
        match self {
            Failure::Message(_) => None,
            Failure::Error(info) => Some(info),
        }
    }

    /// Attaches a stack trace, promoting a bare message to an error-like failure.
    pub fn with_stack(self, stack: impl Into<String>) -> Self {
        match self {
            Failure::Message(message) => Failure::Error(ErrorInfo::new(message).with_stack(stack)),
            Failure::Error(info) => Failure::Error(info.with_stack(stack)),
        }
    }
}

impl From<&str> for Failure {
    fn from(message: &str) -> Self {
        Failure::Message(message.to_string())
    }
}

impl From<String> for Failure {
    fn from(message: String) -> Self {
        Failure::Message(message)
    }
}

impl From<ErrorInfo> for Failure {
    fn from(info: ErrorInfo) -> Self {
        Failure::Error(info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fmt;

    #[derive(Debug)]
    struct Outer(std::io::Error);

    impl fmt::Display for Outer {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("fetch failed")
        }
    }

    impl StdError for Outer {
        fn source(&self) -> Option<&(dyn StdError + 'static)> {
            Some(&self.0)
        }
    }

    #[test]
    fn from_error_walks_the_source_chain() {
        let err = Outer(std::io::Error::other("connection reset"));
        let failure = Failure::from_error(&err);

        let info = failure.error_info().expect("error-like");
        assert_eq!(info.message, "fetch failed");
        assert_eq!(info.causes, vec!["connection reset".to_string()]);
        assert!(info.stack.is_none());
    }

    #[test]
    fn with_stack_promotes_plain_messages() {
        let failure = Failure::from("boom").with_stack("at main.rs:1");
        assert_eq!(failure.message(), "boom");
        assert_eq!(
            failure.error_info().and_then(|i| i.stack.as_deref()),
            Some("at main.rs:1")
        );
    }
}
