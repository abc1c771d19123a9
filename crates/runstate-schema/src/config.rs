//! Codec configuration.

use serde::Deserialize;

/// How to treat a document whose `__version__` differs from ours.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VersionPolicy {
    /// Decode without checking.
    Ignore,
    /// Decode, logging a warning on a major version mismatch.
    #[default]
    Warn,
    /// Refuse documents from another major version.
    Reject,
}

/// JSON codec configuration.
///
/// Deserializable so hosts can embed it in their own config files.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CodecConfig {
    /// Indent documents produced by [`crate::JsonCodec::to_string`].
    pub pretty: bool,

    /// Version compatibility check on decode.
    pub version_policy: VersionPolicy,
}
