//! Wire documents for states.
//!
//! Each variant has its own document carrying exactly the fields that
//! variant declares, discriminated by a `"type"` key holding
//! [`runstate_core::StateKind::name`].

use std::collections::HashMap;

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Wire form of a result handle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ResultDocument {
    #[default]
    NoResult,
    Result {
        value: Value,
    },
    SafeResult {
        value: Value,
        result_handler: String,
    },
}

/// Input name to result document.
pub type CachedInputsDocument = HashMap<String, ResultDocument>;

/// Running, Finished, Success, Skipped, Failed, Aborted, TriggerFailed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BaseDocument {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(rename = "_result", default)]
    pub result: ResultDocument,
}

/// Pending, Paused, TimedOut.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PendingDocument {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(rename = "_result", default)]
    pub result: ResultDocument,
    #[serde(default)]
    pub cached_inputs: Option<CachedInputsDocument>,
}

/// Scheduled, Resume.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledDocument {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(rename = "_result", default)]
    pub result: ResultDocument,
    pub start_time: DateTime<Utc>,
    #[serde(default)]
    pub cached_inputs: Option<CachedInputsDocument>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryingDocument {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(rename = "_result", default)]
    pub result: ResultDocument,
    pub start_time: DateTime<Utc>,
    #[serde(default)]
    pub cached_inputs: Option<CachedInputsDocument>,
    pub run_count: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CachedDocument {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(rename = "_result", default)]
    pub result: ResultDocument,
    #[serde(default)]
    pub cached_inputs: Option<CachedInputsDocument>,
    #[serde(default)]
    pub cached_parameters: Option<Map<String, Value>>,
    #[serde(default)]
    pub cached_result_expiration: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MappedDocument {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(rename = "_result", default)]
    pub result: ResultDocument,
    #[serde(default)]
    pub map_states: Vec<StateDocument>,
}

/// Submitted, ClientFailed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WrapperDocument {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(rename = "_result", default)]
    pub result: ResultDocument,
    #[serde(default)]
    pub state: Option<Box<StateDocument>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueuedDocument {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(rename = "_result", default)]
    pub result: ResultDocument,
    #[serde(default)]
    pub state: Option<Box<StateDocument>>,
    pub start_time: DateTime<FixedOffset>,
}

/// Wire form of a state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum StateDocument {
    Pending(PendingDocument),
    Paused(PendingDocument),
    Scheduled(ScheduledDocument),
    Resume(ScheduledDocument),
    Retrying(RetryingDocument),
    Running(BaseDocument),
    Finished(BaseDocument),
    Success(BaseDocument),
    Cached(CachedDocument),
    Mapped(MappedDocument),
    Skipped(BaseDocument),
    Failed(BaseDocument),
    Aborted(BaseDocument),
    TimedOut(PendingDocument),
    TriggerFailed(BaseDocument),
    Submitted(WrapperDocument),
    Queued(QueuedDocument),
    ClientFailed(WrapperDocument),
}
