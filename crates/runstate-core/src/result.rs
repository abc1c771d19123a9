//! Deferred-result handles bound to a state's `result`.
//!
//! A state never stores a bare payload. It stores a [`ResultHandle`]:
//! - [`ResultHandle::NoResult`]: the run never produced a value
//! - [`ResultHandle::Immediate`]: a materialized value (which may be `null`)
//! - [`ResultHandle::Safe`]: a serialized reference that a [`ResultHandler`]
//!   resolves on demand

use serde::Serialize;
use serde_json::Value;
use tracing::trace;

use crate::error::{Result, StateError, StoreError};

/// External collaborator that stores and hydrates result payloads.
pub trait ResultHandler {
    /// Error surfaced unmodified to callers.
    type Error;

    /// Identifier recorded in every [`SafeResult`] this handler writes.
    fn name(&self) -> &str;

    /// Resolve a safe value into the payload it refers to.
    fn read(&self, safe_value: &Value) -> std::result::Result<Value, Self::Error>;

    /// Persist a payload and return the safe value that refers to it.
    fn write(&self, value: &Value) -> std::result::Result<Value, Self::Error>;
}

/// A payload stored behind a result handler.
#[derive(Debug, Clone, PartialEq)]
pub struct SafeResult {
    safe_value: Value,
    handler: String,
}

impl SafeResult {
    /// Create a safe result, rejecting bindings no handler could resolve.
    pub fn new(safe_value: Value, handler: impl Into<String>) -> Result<Self> {
        let handler = handler.into();
        if handler.trim().is_empty() {
            return Err(StateError::InvalidResultBinding(
                "safe result requires a handler name".to_string(),
            ));
        }
        if safe_value.is_null() {
            return Err(StateError::InvalidResultBinding(format!(
                "safe result for handler '{}' has no safe value",
                handler
            )));
        }
        Ok(Self {
            safe_value,
            handler,
        })
    }

    /// The serialized reference, e.g. a storage location.
    pub fn safe_value(&self) -> &Value {
        &self.safe_value
    }

    /// Name of the handler that wrote this result.
    pub fn handler(&self) -> &str {
        &self.handler
    }
}

/// Result binding held by every state.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum ResultHandle {
    /// Sentinel for "no value was ever produced".
    #[default]
    NoResult,
    /// A value held in memory.
    Immediate(Value),
    /// A value held by an external handler.
    Safe(SafeResult),
}

impl ResultHandle {
    /// Bind a raw Rust value, failing if it has no JSON representation.
    pub fn from_value<T: Serialize>(value: T) -> Result<Self> {
        serde_json::to_value(value)
            .map(Self::Immediate)
            .map_err(|e| StateError::InvalidResultBinding(e.to_string()))
    }

    /// The stored representation, without any I/O.
    ///
    /// For safe handles this is the safe value, not the hydrated payload.
    pub fn value(&self) -> Option<&Value> {
        match self {
            Self::NoResult => None,
            Self::Immediate(value) => Some(value),
            Self::Safe(safe) => Some(&safe.safe_value),
        }
    }

    pub fn is_no_result(&self) -> bool {
        matches!(self, Self::NoResult)
    }

    pub fn is_safe(&self) -> bool {
        matches!(self, Self::Safe(_))
    }

    /// Resolve the payload, reading through `handler` for safe handles.
    ///
    /// Every call reaches the handler again; nothing is cached here.
    pub fn materialize<H: ResultHandler>(
        &self,
        handler: &H,
    ) -> std::result::Result<Option<Value>, H::Error> {
        match self {
            Self::NoResult => Ok(None),
            Self::Immediate(value) => Ok(Some(value.clone())),
            Self::Safe(safe) => {
                trace!(
                    handler = handler.name(),
                    written_by = safe.handler.as_str(),
                    "hydrating safe result"
                );
                handler.read(&safe.safe_value).map(Some)
            }
        }
    }

    /// Move an in-memory value behind `handler`.
    ///
    /// Safe handles and the no-result sentinel are returned unchanged. The
    /// written reference is held to the same rules as [`SafeResult::new`].
    pub fn store_safe<H: ResultHandler>(
        &self,
        handler: &H,
    ) -> std::result::Result<ResultHandle, StoreError<H::Error>> {
        match self {
            Self::Immediate(value) => {
                let safe_value = handler.write(value).map_err(StoreError::Handler)?;
                let safe = SafeResult::new(safe_value, handler.name())?;
                trace!(handler = handler.name(), "stored safe result");
                Ok(Self::Safe(safe))
            }
            other => Ok(other.clone()),
        }
    }
}

impl From<Value> for ResultHandle {
    fn from(value: Value) -> Self {
        Self::Immediate(value)
    }
}

impl From<Option<Value>> for ResultHandle {
    fn from(value: Option<Value>) -> Self {
        value.map_or(Self::NoResult, Self::Immediate)
    }
}

impl From<SafeResult> for ResultHandle {
    fn from(safe: SafeResult) -> Self {
        Self::Safe(safe)
    }
}
