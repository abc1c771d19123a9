//! Meta-states: annotations that wrap another state without replacing it.
//!
//! A meta-state's own classification never inherits from its wrapped state.
//! `Submitted(Success)` is not finished; callers that care about the inner
//! state must unwrap it, one level at a time.

use chrono::{DateTime, FixedOffset, Offset, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, StateError};
use crate::kind::StateKind;
use crate::result::ResultHandle;
use crate::state::State;

/// The three wrapping kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MetaKind {
    /// The wrapped state has been handled, e.g. a retry was dispatched.
    Submitted,
    /// The wrapped state could not move to running, usually for lack of resources.
    Queued,
    /// Persisting the wrapped state failed; the run halts without
    /// triggering downstream runs.
    ClientFailed,
}

impl MetaKind {
    pub fn state_kind(&self) -> StateKind {
        match self {
            Self::Submitted => StateKind::Submitted,
            Self::Queued => StateKind::Queued,
            Self::ClientFailed => StateKind::ClientFailed,
        }
    }
}

/// Payload for `Submitted` and `ClientFailed`.
#[derive(Debug, Clone, Default)]
pub struct Wrapper {
    pub message: Option<String>,
    pub result: ResultHandle,
    pub state: Option<Box<State>>,
}

impl Wrapper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn wrapping(state: State) -> Self {
        Self {
            state: Some(Box::new(state)),
            ..Self::default()
        }
    }
}

/// Payload for `Queued`.
#[derive(Debug, Clone)]
pub struct Queued {
    pub message: Option<String>,
    pub result: ResultHandle,
    pub state: Option<Box<State>>,
    /// Instant the item is queued until. Keeps the offset it was given.
    pub start_time: DateTime<FixedOffset>,
}

impl Queued {
    /// Queued until now, with no inner state.
    pub fn new() -> Self {
        Self {
            message: None,
            result: ResultHandle::NoResult,
            state: None,
            start_time: Utc::now().into(),
        }
    }

    pub fn wrapping(state: State) -> Self {
        Self {
            state: Some(Box::new(state)),
            ..Self::new()
        }
    }

    pub fn with_start_time<Tz: TimeZone>(mut self, start_time: DateTime<Tz>) -> Self {
        let offset = start_time.offset().fix();
        self.start_time = start_time.with_timezone(&offset);
        self
    }
}

impl Default for Queued {
    fn default() -> Self {
        Self::new()
    }
}

/// A state about another state.
#[derive(Debug, Clone)]
pub enum MetaState {
    Submitted(Wrapper),
    Queued(Queued),
    ClientFailed(Wrapper),
}

impl MetaState {
    /// Wrap `inner` without touching it. `Queued` is queued until now.
    pub fn wrap(inner: State, kind: MetaKind) -> Self {
        debug!(meta = %kind.state_kind(), inner = %inner.kind(), "wrapping state");
        match kind {
            MetaKind::Submitted => Self::Submitted(Wrapper::wrapping(inner)),
            MetaKind::Queued => Self::Queued(Queued::wrapping(inner)),
            MetaKind::ClientFailed => Self::ClientFailed(Wrapper::wrapping(inner)),
        }
    }

    /// Queue `inner` until `start_time`.
    pub fn queued<Tz: TimeZone>(inner: State, start_time: DateTime<Tz>) -> Self {
        debug!(inner = %inner.kind(), "queueing state");
        Self::Queued(Queued::wrapping(inner).with_start_time(start_time))
    }

    /// A meta-state with nothing wrapped yet.
    pub fn empty(kind: MetaKind) -> Self {
        match kind {
            MetaKind::Submitted => Self::Submitted(Wrapper::new()),
            MetaKind::Queued => Self::Queued(Queued::new()),
            MetaKind::ClientFailed => Self::ClientFailed(Wrapper::new()),
        }
    }

    pub fn meta_kind(&self) -> MetaKind {
        match self {
            Self::Submitted(_) => MetaKind::Submitted,
            Self::Queued(_) => MetaKind::Queued,
            Self::ClientFailed(_) => MetaKind::ClientFailed,
        }
    }

    pub fn kind(&self) -> StateKind {
        self.meta_kind().state_kind()
    }

    fn wrapped(&self) -> Option<&State> {
        match self {
            Self::Submitted(w) | Self::ClientFailed(w) => w.state.as_deref(),
            Self::Queued(q) => q.state.as_deref(),
        }
    }

    /// The wrapped state.
    ///
    /// Fails with [`StateError::MissingWrappedState`] if none was set.
    pub fn inner(&self) -> Result<&State> {
        self.wrapped().ok_or_else(|| {
            debug!(meta = %self.kind(), "unwrapping empty meta-state");
            StateError::MissingWrappedState { kind: self.kind() }
        })
    }

    /// Take the wrapped state.
    pub fn into_inner(self) -> Result<State> {
        let kind = self.kind();
        let state = match self {
            Self::Submitted(w) | Self::ClientFailed(w) => w.state,
            Self::Queued(q) => q.state,
        };
        state
            .map(|boxed| *boxed)
            .ok_or(StateError::MissingWrappedState { kind })
    }

    /// Instant a `Queued` meta-state is queued until.
    pub fn queued_until(&self) -> Option<DateTime<FixedOffset>> {
        match self {
            Self::Queued(q) => Some(q.start_time),
            _ => None,
        }
    }

    pub(crate) fn parts(&self) -> (&Option<String>, &ResultHandle) {
        match self {
            Self::Submitted(w) | Self::ClientFailed(w) => (&w.message, &w.result),
            Self::Queued(q) => (&q.message, &q.result),
        }
    }

    pub(crate) fn parts_mut(&mut self) -> (&mut Option<String>, &mut ResultHandle) {
        match self {
            Self::Submitted(w) | Self::ClientFailed(w) => (&mut w.message, &mut w.result),
            Self::Queued(q) => (&mut q.message, &mut q.result),
        }
    }
}

impl PartialEq for MetaState {
    fn eq(&self, other: &Self) -> bool {
        if self.meta_kind() != other.meta_kind() {
            return false;
        }
        if self.parts().1.value() != other.parts().1.value() {
            return false;
        }
        match (self, other) {
            (Self::Queued(a), Self::Queued(b)) => {
                a.start_time == b.start_time && a.state == b.state
            }
            _ => self.wrapped() == other.wrapped(),
        }
    }
}
