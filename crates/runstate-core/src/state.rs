//! The `State` value and its per-variant payloads.

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, TimeZone, Utc};
use serde_json::{Map, Value};
use tracing::trace;

use crate::context::RunCountContext;
use crate::kind::{StateGroup, StateKind};
use crate::meta::{MetaKind, MetaState};
use crate::result::{ResultHandle, ResultHandler};

/// Upstream results reused by the next attempt of a run, keyed by input name.
pub type CachedInputs = HashMap<String, ResultHandle>;

/// Payload for variants with no fields of their own.
#[derive(Debug, Clone, Default)]
pub struct Base {
    pub message: Option<String>,
    pub result: ResultHandle,
}

impl Base {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Payload for `Pending` and `Paused`.
#[derive(Debug, Clone, Default)]
pub struct Pending {
    pub message: Option<String>,
    pub result: ResultHandle,
    pub cached_inputs: Option<CachedInputs>,
}

impl Pending {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cached_inputs(mut self, inputs: CachedInputs) -> Self {
        self.cached_inputs = Some(inputs);
        self
    }
}

/// Payload for `Scheduled` and `Resume`.
///
/// Non-Rust consumers identify scheduled states by the presence of
/// `start_time`, so every variant in this branch carries one.
#[derive(Debug, Clone)]
pub struct Scheduled {
    pub message: Option<String>,
    pub result: ResultHandle,
    /// When the run should start, always UTC.
    pub start_time: DateTime<Utc>,
    pub cached_inputs: Option<CachedInputs>,
}

impl Scheduled {
    /// Scheduled for now.
    pub fn new() -> Self {
        Self {
            message: None,
            result: ResultHandle::NoResult,
            start_time: Utc::now(),
            cached_inputs: None,
        }
    }

    pub fn with_start_time<Tz: TimeZone>(mut self, start_time: DateTime<Tz>) -> Self {
        self.start_time = start_time.with_timezone(&Utc);
        self
    }

    pub fn with_cached_inputs(mut self, inputs: CachedInputs) -> Self {
        self.cached_inputs = Some(inputs);
        self
    }
}

impl Default for Scheduled {
    fn default() -> Self {
        Self::new()
    }
}

/// Payload for `Retrying`.
#[derive(Debug, Clone)]
pub struct Retrying {
    pub message: Option<String>,
    pub result: ResultHandle,
    pub start_time: DateTime<Utc>,
    pub cached_inputs: Option<CachedInputs>,
    /// Attempts made when this retry was scheduled.
    pub run_count: u32,
}

impl Retrying {
    /// A retry due now, counted as the first attempt.
    pub fn new() -> Self {
        Self {
            message: None,
            result: ResultHandle::NoResult,
            start_time: Utc::now(),
            cached_inputs: None,
            run_count: 1,
        }
    }

    /// A retry whose run count comes from the active run, or 1 if unknown.
    pub fn from_context<C: RunCountContext + ?Sized>(context: &C) -> Self {
        let run_count = context.current_run_count().unwrap_or_else(|| {
            trace!("no run count in context, defaulting to 1");
            1
        });
        Self {
            run_count,
            ..Self::new()
        }
    }

    pub fn with_run_count(mut self, run_count: u32) -> Self {
        self.run_count = run_count;
        self
    }

    pub fn with_start_time<Tz: TimeZone>(mut self, start_time: DateTime<Tz>) -> Self {
        self.start_time = start_time.with_timezone(&Utc);
        self
    }

    pub fn with_cached_inputs(mut self, inputs: CachedInputs) -> Self {
        self.cached_inputs = Some(inputs);
        self
    }
}

impl Default for Retrying {
    fn default() -> Self {
        Self::new()
    }
}

/// Payload for `Cached`: a success whose outputs may be reused.
#[derive(Debug, Clone, Default)]
pub struct Cached {
    pub message: Option<String>,
    pub result: ResultHandle,
    pub cached_inputs: Option<CachedInputs>,
    pub cached_parameters: Option<Map<String, Value>>,
    /// After this instant the cache can no longer be used. Always UTC.
    pub cached_result_expiration: Option<DateTime<Utc>>,
}

impl Cached {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cached_inputs(mut self, inputs: CachedInputs) -> Self {
        self.cached_inputs = Some(inputs);
        self
    }

    pub fn with_cached_parameters(mut self, parameters: Map<String, Value>) -> Self {
        self.cached_parameters = Some(parameters);
        self
    }

    pub fn with_expiration<Tz: TimeZone>(mut self, expiration: DateTime<Tz>) -> Self {
        self.cached_result_expiration = Some(expiration.with_timezone(&Utc));
        self
    }

    /// A cache without an expiration never expires.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.cached_result_expiration
            .is_some_and(|expiration| expiration <= now)
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// Returns true if the cache was produced with exactly `parameters`.
    pub fn matches_parameters(&self, parameters: &Map<String, Value>) -> bool {
        match &self.cached_parameters {
            Some(cached) => cached == parameters,
            None => parameters.is_empty(),
        }
    }
}

/// Payload for `Mapped`: the parent of a fan-out.
///
/// A mapped state only records that its children were submitted; it says
/// nothing about whether they succeeded.
#[derive(Debug, Clone, Default)]
pub struct Mapped {
    pub message: Option<String>,
    pub result: ResultHandle,
    /// Per-element child outcomes, in map order.
    pub map_states: Vec<State>,
}

impl Mapped {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_map_states(mut self, map_states: Vec<State>) -> Self {
        self.map_states = map_states;
        self
    }

    pub fn n_map_states(&self) -> usize {
        self.map_states.len()
    }
}

/// Payload for `TimedOut`.
#[derive(Debug, Clone, Default)]
pub struct TimedOut {
    pub message: Option<String>,
    pub result: ResultHandle,
    pub cached_inputs: Option<CachedInputs>,
}

impl TimedOut {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cached_inputs(mut self, inputs: CachedInputs) -> Self {
        self.cached_inputs = Some(inputs);
        self
    }
}

/// The status of a single task or flow run.
///
/// # Equality and hashing
///
/// Two states are equal when they are the same variant, hold the same result
/// value and agree on every variant-specific field. `message` never takes
/// part. `State` deliberately implements neither `Eq` nor `Hash`: do not
/// deduplicate states in hashed collections; key them by run instead.
#[derive(Debug, Clone)]
pub enum State {
    /// Waiting to run. The default for new runs.
    Pending(Pending),
    /// Waiting for manual approval.
    Paused(Pending),
    /// Waiting for `start_time`.
    Scheduled(Scheduled),
    /// Cleared to continue after a pause.
    Resume(Scheduled),
    /// Scheduled for another attempt.
    Retrying(Retrying),
    Running(Base),
    Finished(Base),
    Success(Base),
    Cached(Cached),
    Mapped(Mapped),
    /// Succeeded without running. Carries no cache fields.
    Skipped(Base),
    Failed(Base),
    /// Stopped by a user.
    Aborted(Base),
    TimedOut(TimedOut),
    /// Upstream trigger did not pass.
    TriggerFailed(Base),
    /// Annotation wrapping another state.
    Meta(MetaState),
}

impl Default for State {
    fn default() -> Self {
        Self::Pending(Pending::new())
    }
}

impl State {
    /// Default instance of `kind`. Meta kinds are created without an inner state.
    pub fn new(kind: StateKind) -> Self {
        match kind {
            StateKind::Pending => Self::Pending(Pending::new()),
            StateKind::Paused => Self::Paused(Pending::new()),
            StateKind::Scheduled => Self::Scheduled(Scheduled::new()),
            StateKind::Resume => Self::Resume(Scheduled::new()),
            StateKind::Retrying => Self::Retrying(Retrying::new()),
            StateKind::Running => Self::Running(Base::new()),
            StateKind::Finished => Self::Finished(Base::new()),
            StateKind::Success => Self::Success(Base::new()),
            StateKind::Cached => Self::Cached(Cached::new()),
            StateKind::Mapped => Self::Mapped(Mapped::new()),
            StateKind::Skipped => Self::Skipped(Base::new()),
            StateKind::Failed => Self::Failed(Base::new()),
            StateKind::Aborted => Self::Aborted(Base::new()),
            StateKind::TimedOut => Self::TimedOut(TimedOut::new()),
            StateKind::TriggerFailed => Self::TriggerFailed(Base::new()),
            StateKind::Submitted => Self::Meta(MetaState::empty(MetaKind::Submitted)),
            StateKind::Queued => Self::Meta(MetaState::empty(MetaKind::Queued)),
            StateKind::ClientFailed => Self::Meta(MetaState::empty(MetaKind::ClientFailed)),
        }
    }

    pub fn pending() -> Self {
        Self::new(StateKind::Pending)
    }

    pub fn paused() -> Self {
        Self::new(StateKind::Paused)
    }

    pub fn scheduled() -> Self {
        Self::new(StateKind::Scheduled)
    }

    pub fn resume() -> Self {
        Self::new(StateKind::Resume)
    }

    pub fn retrying() -> Self {
        Self::new(StateKind::Retrying)
    }

    pub fn running() -> Self {
        Self::new(StateKind::Running)
    }

    pub fn finished() -> Self {
        Self::new(StateKind::Finished)
    }

    pub fn success() -> Self {
        Self::new(StateKind::Success)
    }

    pub fn cached() -> Self {
        Self::new(StateKind::Cached)
    }

    pub fn mapped() -> Self {
        Self::new(StateKind::Mapped)
    }

    pub fn skipped() -> Self {
        Self::new(StateKind::Skipped)
    }

    pub fn failed() -> Self {
        Self::new(StateKind::Failed)
    }

    pub fn aborted() -> Self {
        Self::new(StateKind::Aborted)
    }

    pub fn timed_out() -> Self {
        Self::new(StateKind::TimedOut)
    }

    pub fn trigger_failed() -> Self {
        Self::new(StateKind::TriggerFailed)
    }

    pub fn kind(&self) -> StateKind {
        match self {
            Self::Pending(_) => StateKind::Pending,
            Self::Paused(_) => StateKind::Paused,
            Self::Scheduled(_) => StateKind::Scheduled,
            Self::Resume(_) => StateKind::Resume,
            Self::Retrying(_) => StateKind::Retrying,
            Self::Running(_) => StateKind::Running,
            Self::Finished(_) => StateKind::Finished,
            Self::Success(_) => StateKind::Success,
            Self::Cached(_) => StateKind::Cached,
            Self::Mapped(_) => StateKind::Mapped,
            Self::Skipped(_) => StateKind::Skipped,
            Self::Failed(_) => StateKind::Failed,
            Self::Aborted(_) => StateKind::Aborted,
            Self::TimedOut(_) => StateKind::TimedOut,
            Self::TriggerFailed(_) => StateKind::TriggerFailed,
            Self::Meta(meta) => meta.kind(),
        }
    }

    fn parts(&self) -> (&Option<String>, &ResultHandle) {
        match self {
            Self::Pending(s) | Self::Paused(s) => (&s.message, &s.result),
            Self::Scheduled(s) | Self::Resume(s) => (&s.message, &s.result),
            Self::Retrying(s) => (&s.message, &s.result),
            Self::Running(s)
            | Self::Finished(s)
            | Self::Success(s)
            | Self::Skipped(s)
            | Self::Failed(s)
            | Self::Aborted(s)
            | Self::TriggerFailed(s) => (&s.message, &s.result),
            Self::Cached(s) => (&s.message, &s.result),
            Self::Mapped(s) => (&s.message, &s.result),
            Self::TimedOut(s) => (&s.message, &s.result),
            Self::Meta(meta) => meta.parts(),
        }
    }

    fn parts_mut(&mut self) -> (&mut Option<String>, &mut ResultHandle) {
        match self {
            Self::Pending(s) | Self::Paused(s) => (&mut s.message, &mut s.result),
            Self::Scheduled(s) | Self::Resume(s) => (&mut s.message, &mut s.result),
            Self::Retrying(s) => (&mut s.message, &mut s.result),
            Self::Running(s)
            | Self::Finished(s)
            | Self::Success(s)
            | Self::Skipped(s)
            | Self::Failed(s)
            | Self::Aborted(s)
            | Self::TriggerFailed(s) => (&mut s.message, &mut s.result),
            Self::Cached(s) => (&mut s.message, &mut s.result),
            Self::Mapped(s) => (&mut s.message, &mut s.result),
            Self::TimedOut(s) => (&mut s.message, &mut s.result),
            Self::Meta(meta) => meta.parts_mut(),
        }
    }

    /// Human-readable explanation, often the error that caused the state.
    pub fn message(&self) -> Option<&str> {
        self.parts().0.as_deref()
    }

    pub fn result_handle(&self) -> &ResultHandle {
        self.parts().1
    }

    /// The stored result value; `None` means no result was ever produced.
    pub fn result(&self) -> Option<&Value> {
        self.result_handle().value()
    }

    /// Bind a result, wrapping raw values in an immediate handle.
    pub fn set_result(&mut self, result: impl Into<ResultHandle>) {
        *self.parts_mut().1 = result.into();
    }

    pub fn set_message(&mut self, message: impl Into<String>) {
        *self.parts_mut().0 = Some(message.into());
    }

    pub fn with_result(mut self, result: impl Into<ResultHandle>) -> Self {
        self.set_result(result);
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.set_message(message);
        self
    }

    /// Record an error as the state's message.
    pub fn with_error(self, error: &dyn std::error::Error) -> Self {
        self.with_message(error.to_string())
    }

    /// Resolve the result through `handler`.
    pub fn materialize_result<H: ResultHandler>(
        &self,
        handler: &H,
    ) -> Result<Option<Value>, H::Error> {
        self.result_handle().materialize(handler)
    }

    pub fn cached_inputs(&self) -> Option<&CachedInputs> {
        match self {
            Self::Pending(s) | Self::Paused(s) => s.cached_inputs.as_ref(),
            Self::Scheduled(s) | Self::Resume(s) => s.cached_inputs.as_ref(),
            Self::Retrying(s) => s.cached_inputs.as_ref(),
            Self::Cached(s) => s.cached_inputs.as_ref(),
            Self::TimedOut(s) => s.cached_inputs.as_ref(),
            _ => None,
        }
    }

    /// Start time of the scheduled branch. Queued meta-states expose theirs
    /// through [`MetaState::queued_until`].
    pub fn start_time(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Scheduled(s) | Self::Resume(s) => Some(s.start_time),
            Self::Retrying(s) => Some(s.start_time),
            _ => None,
        }
    }

    pub fn run_count(&self) -> Option<u32> {
        match self {
            Self::Retrying(s) => Some(s.run_count),
            _ => None,
        }
    }

    pub fn map_states(&self) -> Option<&[State]> {
        match self {
            Self::Mapped(s) => Some(&s.map_states),
            _ => None,
        }
    }

    pub fn n_map_states(&self) -> Option<usize> {
        match self {
            Self::Mapped(s) => Some(s.n_map_states()),
            _ => None,
        }
    }

    pub fn as_meta(&self) -> Option<&MetaState> {
        match self {
            Self::Meta(meta) => Some(meta),
            _ => None,
        }
    }

    /// Wrap this state in a meta-state of `kind`.
    pub fn wrap(self, kind: MetaKind) -> State {
        Self::Meta(MetaState::wrap(self, kind))
    }

    /// Membership in a classification group.
    pub fn is_in(&self, group: StateGroup) -> bool {
        group.contains(self.kind())
    }

    pub fn is_pending(&self) -> bool {
        self.is_in(StateGroup::Pending)
    }

    pub fn is_retrying(&self) -> bool {
        self.is_in(StateGroup::Retrying)
    }

    pub fn is_running(&self) -> bool {
        self.is_in(StateGroup::Running)
    }

    pub fn is_cached(&self) -> bool {
        self.is_in(StateGroup::Cached)
    }

    pub fn is_finished(&self) -> bool {
        self.is_in(StateGroup::Finished)
    }

    /// Includes `Resume` and `Retrying`.
    pub fn is_scheduled(&self) -> bool {
        self.is_in(StateGroup::Scheduled)
    }

    pub fn is_submitted(&self) -> bool {
        self.is_in(StateGroup::Submitted)
    }

    pub fn is_skipped(&self) -> bool {
        self.is_in(StateGroup::Skipped)
    }

    pub fn is_successful(&self) -> bool {
        self.is_in(StateGroup::Successful)
    }

    pub fn is_failed(&self) -> bool {
        self.is_in(StateGroup::Failed)
    }

    pub fn is_mapped(&self) -> bool {
        self.is_in(StateGroup::Mapped)
    }

    pub fn is_meta_state(&self) -> bool {
        self.is_in(StateGroup::MetaState)
    }
}

impl PartialEq for State {
    fn eq(&self, other: &Self) -> bool {
        if self.kind() != other.kind() || self.result() != other.result() {
            return false;
        }
        match (self, other) {
            (Self::Pending(a), Self::Pending(b)) | (Self::Paused(a), Self::Paused(b)) => {
                a.cached_inputs == b.cached_inputs
            }
            (Self::Scheduled(a), Self::Scheduled(b)) | (Self::Resume(a), Self::Resume(b)) => {
                a.start_time == b.start_time && a.cached_inputs == b.cached_inputs
            }
            (Self::Retrying(a), Self::Retrying(b)) => {
                a.start_time == b.start_time
                    && a.cached_inputs == b.cached_inputs
                    && a.run_count == b.run_count
            }
            (Self::Cached(a), Self::Cached(b)) => {
                a.cached_inputs == b.cached_inputs
                    && a.cached_parameters == b.cached_parameters
                    && a.cached_result_expiration == b.cached_result_expiration
            }
            (Self::Mapped(a), Self::Mapped(b)) => a.map_states == b.map_states,
            (Self::TimedOut(a), Self::TimedOut(b)) => a.cached_inputs == b.cached_inputs,
            (Self::Meta(a), Self::Meta(b)) => a == b,
            (Self::Running(_), Self::Running(_))
            | (Self::Finished(_), Self::Finished(_))
            | (Self::Success(_), Self::Success(_))
            | (Self::Skipped(_), Self::Skipped(_))
            | (Self::Failed(_), Self::Failed(_))
            | (Self::Aborted(_), Self::Aborted(_))
            | (Self::TriggerFailed(_), Self::TriggerFailed(_)) => true,
            _ => false,
        }
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.message() {
            Some(message) => write!(f, "{}: {:?}", self.kind(), message),
            None => write!(f, "{}", self.kind()),
        }
    }
}

impl From<Scheduled> for State {
    fn from(payload: Scheduled) -> Self {
        Self::Scheduled(payload)
    }
}

impl From<Retrying> for State {
    fn from(payload: Retrying) -> Self {
        Self::Retrying(payload)
    }
}

impl From<Cached> for State {
    fn from(payload: Cached) -> Self {
        Self::Cached(payload)
    }
}

impl From<Mapped> for State {
    fn from(payload: Mapped) -> Self {
        Self::Mapped(payload)
    }
}

impl From<TimedOut> for State {
    fn from(payload: TimedOut) -> Self {
        Self::TimedOut(payload)
    }
}

impl From<MetaState> for State {
    fn from(meta: MetaState) -> Self {
        Self::Meta(meta)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::RunContext;
    use crate::result::tests::MemoryHandler;
    use crate::result::SafeResult;
    use chrono::{Duration, FixedOffset};
    use serde_json::json;

    use StateGroup as G;
    use StateKind as K;

    fn predicate(group: StateGroup) -> fn(&State) -> bool {
        match group {
            G::Pending => State::is_pending,
            G::Retrying => State::is_retrying,
            G::Running => State::is_running,
            G::Finished => State::is_finished,
            G::Cached => State::is_cached,
            G::Scheduled => State::is_scheduled,
            G::Submitted => State::is_submitted,
            G::Skipped => State::is_skipped,
            G::Successful => State::is_successful,
            G::Failed => State::is_failed,
            G::Mapped => State::is_mapped,
            G::MetaState => State::is_meta_state,
        }
    }

    #[test]
    fn test_classification_table() {
        let table: [(StateKind, &[StateGroup]); 18] = [
            (K::Pending, &[G::Pending]),
            (K::Paused, &[G::Pending]),
            (K::Scheduled, &[G::Pending, G::Scheduled]),
            (K::Resume, &[G::Pending, G::Scheduled]),
            (K::Retrying, &[G::Pending, G::Scheduled, G::Retrying]),
            (K::Running, &[G::Running]),
            (K::Finished, &[G::Finished]),
            (K::Success, &[G::Finished, G::Successful]),
            (K::Cached, &[G::Finished, G::Successful, G::Cached]),
            (K::Mapped, &[G::Finished, G::Successful, G::Mapped]),
            (K::Skipped, &[G::Finished, G::Successful, G::Skipped]),
            (K::Failed, &[G::Finished, G::Failed]),
            (K::Aborted, &[G::Finished, G::Failed]),
            (K::TimedOut, &[G::Finished, G::Failed]),
            (K::TriggerFailed, &[G::Finished, G::Failed]),
            (K::Submitted, &[G::MetaState, G::Submitted]),
            (K::Queued, &[G::MetaState]),
            (K::ClientFailed, &[G::MetaState]),
        ];

        for (kind, groups) in table {
            let state = State::new(kind);
            assert_eq!(state.kind(), kind);
            for group in StateGroup::ALL {
                let expected = groups.contains(&group);
                assert_eq!(
                    state.is_in(group),
                    expected,
                    "{} in {:?}",
                    kind,
                    group
                );
                assert_eq!(
                    predicate(group)(&state),
                    expected,
                    "{} is_{:?}",
                    kind,
                    group
                );
            }
        }
    }

    #[test]
    fn test_meta_state_ignores_wrapped_classification() {
        let queued = State::success().wrap(MetaKind::Queued);
        assert!(!queued.is_finished());
        assert!(!queued.is_successful());
        assert!(queued.is_meta_state());

        let submitted = State::retrying().wrap(MetaKind::Submitted);
        assert!(!submitted.is_pending());
        assert!(!submitted.is_scheduled());
        assert!(submitted.is_submitted());
    }

    #[test]
    fn test_defaults() {
        let state = State::success();
        assert_eq!(state.message(), None);
        assert_eq!(state.result(), None);
        assert!(state.result_handle().is_no_result());
        assert_eq!(State::default().kind(), K::Pending);
        assert_eq!(State::mapped().n_map_states(), Some(0));
    }

    #[test]
    fn test_result_none_differs_from_no_result() {
        let produced_null = State::success().with_result(Value::Null);
        assert_eq!(produced_null.result(), Some(&Value::Null));
        assert_ne!(produced_null, State::success());
    }

    #[test]
    fn test_retrying_run_count_defaults() {
        assert_eq!(State::retrying().run_count(), Some(1));
        assert_eq!(Retrying::from_context(&RunContext::default()).run_count, 1);
        assert_eq!(
            Retrying::from_context(&RunContext::with_task_run_count(4)).run_count,
            4
        );
        assert_eq!(Retrying::from_context(&Some(2u32)).run_count, 2);
        assert_eq!(
            Retrying::from_context(&RunContext::with_task_run_count(4))
                .with_run_count(7)
                .run_count,
            7
        );
    }

    #[test]
    fn test_scheduled_start_time_defaults_to_now() {
        let before = Utc::now();
        let start = State::scheduled().start_time().unwrap();
        let after = Utc::now();
        assert!(before <= start && start <= after);
    }

    #[test]
    fn test_start_time_normalized_to_utc() {
        let offset = FixedOffset::east_opt(5 * 3600).unwrap();
        let local = offset.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let state = State::from(Scheduled::new().with_start_time(local));

        let start = state.start_time().unwrap();
        assert_eq!(start, Utc.with_ymd_and_hms(2024, 3, 1, 7, 0, 0).unwrap());

        let retry = Retrying::new().with_start_time(local);
        assert_eq!(retry.start_time, start);
    }

    #[test]
    fn test_cache_expiration() {
        let now = Utc::now();
        let cached = Cached::new().with_expiration(now + Duration::minutes(5));
        assert!(!cached.is_expired_at(now));
        assert!(cached.is_expired_at(now + Duration::minutes(5)));
        assert!(!Cached::new().is_expired());
    }

    #[test]
    fn test_cache_parameters_match() {
        let mut params = Map::new();
        params.insert("x".to_string(), json!(1));

        let cached = Cached::new().with_cached_parameters(params.clone());
        assert!(cached.matches_parameters(&params));
        assert!(!cached.matches_parameters(&Map::new()));
        assert!(Cached::new().matches_parameters(&Map::new()));
        assert!(!Cached::new().matches_parameters(&params));
    }

    #[test]
    fn test_equality_ignores_message() {
        let a = State::timed_out().with_message("a");
        let b = State::timed_out().with_message("b");
        assert_eq!(a, b);
    }

    #[test]
    fn test_equality_requires_exact_kind() {
        assert_ne!(State::timed_out(), State::failed());
        assert_ne!(State::failed(), State::timed_out());
        assert_ne!(State::paused(), State::pending());
    }

    #[test]
    fn test_equality_compares_result() {
        let one = State::cached().with_result(json!(1));
        let two = State::cached().with_result(json!(2));
        assert_ne!(one, two);
        assert_eq!(one, State::cached().with_result(json!(1)));
    }

    #[test]
    fn test_equality_compares_variant_fields() {
        let start = Utc::now();
        let a = State::from(Retrying::new().with_start_time(start).with_run_count(2));
        let b = State::from(Retrying::new().with_start_time(start).with_run_count(3));
        assert_ne!(a, b);

        let mut inputs = CachedInputs::new();
        inputs.insert("x".to_string(), ResultHandle::from(json!(1)));
        assert_ne!(
            State::Pending(Pending::new().with_cached_inputs(inputs)),
            State::pending()
        );
    }

    #[test]
    fn test_mapped_children_compare_without_messages() {
        let a = State::from(Mapped::new().with_map_states(vec![
            State::success().with_message("first"),
            State::failed(),
        ]));
        let b = State::from(
            Mapped::new().with_map_states(vec![State::success(), State::failed()]),
        );
        assert_eq!(a.n_map_states(), Some(2));
        assert_eq!(a, b);
    }

    #[test]
    fn test_materialize_result_through_handler() {
        let handler = MemoryHandler::default();
        handler
            .store
            .borrow_mut()
            .insert("mem://x".to_string(), json!([1, 2, 3]));
        let safe = SafeResult::new(json!("mem://x"), "memory").unwrap();
        let state = State::success().with_result(safe);

        assert_eq!(state.result(), Some(&json!("mem://x")));
        assert_eq!(
            state.materialize_result(&handler).unwrap(),
            Some(json!([1, 2, 3]))
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(State::running().to_string(), "Running");
        assert_eq!(
            State::failed().with_message("boom").to_string(),
            "Failed: \"boom\""
        );
    }

    #[test]
    fn test_with_error_records_message() {
        let err = std::io::Error::new(std::io::ErrorKind::Other, "disk full");
        let state = State::failed().with_error(&err);
        assert_eq!(state.message(), Some("disk full"));
    }

    #[test]
    fn test_accessors_absent_on_other_variants() {
        assert_eq!(State::skipped().cached_inputs(), None);
        assert_eq!(State::running().start_time(), None);
        assert_eq!(State::scheduled().run_count(), None);
        assert!(State::success().map_states().is_none());
        assert!(State::success().as_meta().is_none());
    }
}
