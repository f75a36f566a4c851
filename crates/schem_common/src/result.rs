//! Common result and error types for the schem toolchain.

/// The standard result type for fallible internal operations.
///
/// `Err` indicates an unrecoverable error — a malformed layout response or a
/// bug in the pipeline, not a user-input problem. Recoverable user-input
/// issues (unknown cell type, missing top module) are reported through
/// [`DiagnosticSink`](crate::diagnostics::DiagnosticSink) instead, and the
/// operation still returns `Ok`.
pub type SchemResult<T> = Result<T, InternalError>;

/// An internal error indicating a bug or an unrecoverable upstream failure.
#[derive(Debug, thiserror::Error)]
#[error("internal error: {message}")]
pub struct InternalError {
    /// Description of the internal error.
    pub message: String,
}

impl InternalError {
    /// Creates a new internal error with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<String> for InternalError {
    fn from(message: String) -> Self {
        Self { message }
    }
}
