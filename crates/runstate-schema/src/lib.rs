//! Wire documents and codec for run states.
//!
//! This crate contains:
//! - Per-variant document types with a stable `"type"` discriminant
//! - Converters between documents and `runstate_core` states
//! - A JSON implementation of `runstate_core::StateCodec`

pub mod codec;
pub mod config;
pub mod convert;
pub mod document;
pub mod error;

// Re-export commonly used types
pub use codec::{JsonCodec, SCHEMA_VERSION};
pub use config::{CodecConfig, VersionPolicy};
pub use document::{ResultDocument, StateDocument};
pub use error::SchemaError;
