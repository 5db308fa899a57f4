//! Errors raised by the operation under test.

use std::any::Any;

use thiserror::Error;

/// Failure of a user-supplied operation, either while being timed or while
/// being checked for correctness.
///
/// The harness never inspects the variant; both are logged and swallowed the
/// same way.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OperationError {
    /// The operation returned an `Err`.
    #[error("{0}")]
    Failed(String),
    /// The operation panicked.
    #[error("panicked: {0}")]
    Panicked(String),
}

impl OperationError {
    /// Build a `Failed` error from anything displayable.
    pub fn failed(reason: impl std::fmt::Display) -> Self {
        Self::Failed(reason.to_string())
    }

    /// Convert a payload caught by `catch_unwind`.
    pub(crate) fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "unknown panic payload".to_string()
        };
        Self::Panicked(message)
    }
}
