//! Error types for the observable engine.

use std::sync::Arc;

use thiserror::Error;

/// The main error type carried by terminal error signals.
///
/// Errors are `Clone` so that recovery operators can inspect a failure and
/// retry it without consuming it; causes are shared behind an `Arc`.
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// The source failed while producing items
    #[error("source error: {0}")]
    Source(Arc<dyn std::error::Error + Send + Sync>),

    /// A user-supplied function panicked during a transformation
    #[error("transform fault: {0}")]
    Fault(String),

    /// The subscription was cancelled before a terminal signal was delivered
    #[error("subscription cancelled")]
    Cancelled,

    /// A custom error with a message
    #[error("{0}")]
    Custom(String),
}

impl Error {
    /// Wrap any error type as a source failure.
    pub fn source<E: std::error::Error + Send + Sync + 'static>(error: E) -> Self {
        Error::Source(Arc::new(error))
    }

    /// Create a transform fault from a panic description.
    pub fn fault<S: Into<String>>(message: S) -> Self {
        Error::Fault(message.into())
    }

    /// Create a custom error with a message.
    pub fn custom<S: Into<String>>(message: S) -> Self {
        Error::Custom(message.into())
    }

    /// Whether this error represents cancellation rather than a failure.
    ///
    /// Recovery operators (`retry`, `on_error_resume_next`) treat cancellation
    /// as final and never attempt to recover from it.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled)
    }
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Custom(s)
    }
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::Custom(s.to_string())
    }
}

/// Convenience type alias for Results in this crate
pub type Result<T> = std::result::Result<T, Error>;
