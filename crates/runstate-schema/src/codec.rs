//! JSON codec for states.

use runstate_core::{State, StateCodec};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, trace, warn};

use crate::config::{CodecConfig, VersionPolicy};
use crate::document::StateDocument;
use crate::error::SchemaError;

/// Version stamped into every top-level document.
pub const SCHEMA_VERSION: &str = env!("CARGO_PKG_VERSION");

const VERSION_KEY: &str = "__version__";

/// Encodes states as JSON documents.
#[derive(Debug, Clone, Default)]
pub struct JsonCodec {
    config: CodecConfig,
}

impl JsonCodec {
    pub fn new(config: CodecConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    /// Serialize to a JSON string, pretty-printed if configured.
    pub fn to_string(&self, state: &State) -> Result<String, SchemaError> {
        let document = self.serialize(state)?;
        let text = if self.config.pretty {
            serde_json::to_string_pretty(&document)?
        } else {
            serde_json::to_string(&document)?
        };
        Ok(text)
    }

    /// Deserialize from a JSON string.
    pub fn from_str(&self, text: &str) -> Result<State, SchemaError> {
        let document: Value = serde_json::from_str(text)?;
        self.deserialize(&document)
    }

    fn check_version(&self, document: &Value) -> Result<(), SchemaError> {
        if self.config.version_policy == VersionPolicy::Ignore {
            return Ok(());
        }
        let Some(found) = document.get(VERSION_KEY).and_then(Value::as_str) else {
            trace!("document carries no schema version");
            return Ok(());
        };
        if compatibility_key(found) == compatibility_key(SCHEMA_VERSION) {
            return Ok(());
        }
        match self.config.version_policy {
            VersionPolicy::Reject => Err(SchemaError::UnsupportedVersion {
                found: found.to_string(),
                expected: SCHEMA_VERSION.to_string(),
            }),
            _ => {
                warn!(
                    found,
                    expected = SCHEMA_VERSION,
                    "decoding state written by another schema version"
                );
                Ok(())
            }
        }
    }
}

/// The part of a version that must match for documents to be compatible:
/// the major version, or `0.minor` before 1.0.
fn compatibility_key(version: &str) -> (&str, Option<&str>) {
    let mut parts = version.split('.');
    let major = parts.next().unwrap_or(version);
    if major == "0" {
        (major, parts.next())
    } else {
        (major, None)
    }
}

impl StateCodec for JsonCodec {
    type Document = Value;
    type Error = SchemaError;

    fn serialize(&self, state: &State) -> Result<Value, SchemaError> {
        let mut document = serde_json::to_value(StateDocument::from(state))?;
        if let Value::Object(map) = &mut document {
            map.insert(VERSION_KEY.to_string(), Value::from(SCHEMA_VERSION));
        }
        debug!(kind = %state.kind(), "serialized state");
        Ok(document)
    }

    fn deserialize(&self, document: &Value) -> Result<State, SchemaError> {
        self.check_version(document)?;
        let state = State::try_from(StateDocument::deserialize(document)?)?;
        debug!(kind = %state.kind(), "deserialized state");
        Ok(state)
    }
}
