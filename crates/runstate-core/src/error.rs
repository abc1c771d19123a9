//! Core domain errors.

use thiserror::Error;

use crate::kind::StateKind;

/// Usage errors raised by the state model itself.
///
/// Failures from result handlers and codecs are not wrapped here; they
/// propagate with the collaborator's own error type.
#[derive(Debug, Error)]
pub enum StateError {
    /// A result binding that is neither a raw value nor a valid deferred handle.
    #[error("Invalid result binding: {0}")]
    InvalidResultBinding(String),

    /// A meta-state was unwrapped before an inner state was set.
    #[error("{kind} meta-state has no wrapped state")]
    MissingWrappedState { kind: StateKind },

    /// Unknown state discriminant.
    #[error("Unknown state kind: {0}")]
    UnknownKind(String),
}

/// Failure while moving a value behind a result handler.
#[derive(Debug, Error)]
pub enum StoreError<E> {
    /// The handler itself failed; its error is passed through unchanged.
    #[error("result handler failed: {0}")]
    Handler(E),

    /// The handler produced a safe result that could never be resolved.
    #[error(transparent)]
    Binding(#[from] StateError),
}

/// Result alias for state model operations.
pub type Result<T> = std::result::Result<T, StateError>;
