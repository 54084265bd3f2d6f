//! FILENAME: engine/src/error.rs
//! PURPOSE: Error types raised during evaluation.
//! CONTEXT: Every evaluation failure is one of three kinds. TypedOperation
//! covers data and type errors a formula or script can provoke; Fatal is
//! the script-invoked hard stop; Programming marks a broken internal
//! invariant. Control flow (return/break/continue) is not an error and
//! lives in the script module.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvalError {
    /// A data or type error: wrong operand types, out-of-bounds index,
    /// missing key, undefined name, arity mismatch, or a reference cycle.
    #[error("{0}")]
    TypedOperation(String),

    /// Raised by the script `Fatal` builtin; aborts the current statement
    /// sequence and is caught at library load and per cell.
    #[error("{0}")]
    Fatal(String),

    /// An internal invariant violation. Never expected during normal
    /// operation.
    #[error("{0}")]
    Programming(String),
}

/// Shorthand for the common case.
pub fn typed(message: impl Into<String>) -> EvalError {
    EvalError::TypedOperation(message.into())
}
