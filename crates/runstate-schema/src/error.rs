//! Codec errors.

use runstate_core::StateError;
use thiserror::Error;

/// Errors raised while encoding or decoding state documents.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// Malformed JSON or a document that does not match any state schema.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Document decoded but described an invalid state.
    #[error("State error: {0}")]
    State(#[from] StateError),

    /// Document written by an incompatible schema version.
    #[error("Unsupported schema version {found} (expected {expected})")]
    UnsupportedVersion { found: String, expected: String },
}
