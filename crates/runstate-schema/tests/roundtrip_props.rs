//! Property-based tests for state documents
//!
//! These tests use proptest to check that encoding never changes what a
//! state means.

use chrono::{DateTime, FixedOffset, TimeZone, Utc};
use proptest::prelude::*;
use runstate_core::{
    Cached, CachedInputs, Mapped, MetaKind, MetaState, Pending, ResultHandle, Retrying,
    SafeResult, Scheduled, State, StateCodec, StateKind, TimedOut,
};
use runstate_schema::JsonCodec;
use serde_json::{Map, Value};

const META_KINDS: [MetaKind; 3] = [
    MetaKind::Submitted,
    MetaKind::Queued,
    MetaKind::ClientFailed,
];

fn instant(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(secs, 0).unwrap()
}

/// Generate a JSON value, including finite floats and small containers.
fn arb_value() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::from),
        any::<i64>().prop_map(Value::from),
        any::<f64>()
            .prop_filter("finite", |f| f.is_finite())
            .prop_map(Value::from),
        "[a-z0-9 ]{0,12}".prop_map(Value::from),
    ];
    leaf.prop_recursive(2, 12, 3, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..3).prop_map(Value::from),
            prop::collection::btree_map("[a-z]{1,6}", inner, 0..3)
                .prop_map(|map| Value::Object(map.into_iter().collect())),
        ]
    })
}

/// Generate any of the three result bindings.
fn arb_handle() -> impl Strategy<Value = ResultHandle> {
    prop_oneof![
        Just(ResultHandle::NoResult),
        arb_value().prop_map(ResultHandle::Immediate),
        ("[a-z/]{1,12}", "[a-z]{1,8}").prop_map(|(location, handler)| {
            ResultHandle::from(SafeResult::new(Value::from(location), handler).unwrap())
        }),
    ]
}

fn arb_inputs() -> impl Strategy<Value = Option<CachedInputs>> {
    prop::option::of(prop::collection::hash_map("[a-z]{1,6}", arb_handle(), 0..4))
}

fn arb_parameters() -> impl Strategy<Value = Option<Map<String, Value>>> {
    prop::option::of(
        prop::collection::btree_map("[a-z]{1,6}", arb_value(), 0..4)
            .prop_map(|params| params.into_iter().collect::<Map<String, Value>>()),
    )
}

/// Generate an arbitrary non-meta, non-mapped state with random payload fields.
fn arb_status() -> impl Strategy<Value = State> {
    let kinds: Vec<StateKind> = StateKind::ALL
        .into_iter()
        .filter(|kind| !kind.is_meta() && *kind != StateKind::Mapped)
        .collect();
    (
        (
            prop::sample::select(kinds),
            prop::option::of("[a-z ]{0,20}"),
            arb_handle(),
            arb_inputs(),
        ),
        (
            1u32..50,
            0i64..4_000_000_000,
            arb_parameters(),
            prop::option::of(0i64..4_000_000_000),
        ),
    )
        .prop_map(
            |((kind, message, result, inputs), (run_count, secs, params, expiration))| {
                let start = instant(secs);
                let state = match kind {
                    StateKind::Pending | StateKind::Paused => {
                        let mut pending = Pending::new();
                        pending.cached_inputs = inputs;
                        if kind == StateKind::Paused {
                            State::Paused(pending)
                        } else {
                            State::Pending(pending)
                        }
                    }
                    StateKind::Scheduled | StateKind::Resume => {
                        let mut scheduled = Scheduled::new().with_start_time(start);
                        scheduled.cached_inputs = inputs;
                        if kind == StateKind::Resume {
                            State::Resume(scheduled)
                        } else {
                            State::Scheduled(scheduled)
                        }
                    }
                    StateKind::Retrying => {
                        let mut retrying = Retrying::new()
                            .with_start_time(start)
                            .with_run_count(run_count);
                        retrying.cached_inputs = inputs;
                        State::from(retrying)
                    }
                    StateKind::Cached => {
                        let mut cached = Cached::new();
                        cached.cached_inputs = inputs;
                        cached.cached_parameters = params;
                        if let Some(expiration) = expiration {
                            cached = cached.with_expiration(instant(expiration));
                        }
                        State::from(cached)
                    }
                    StateKind::TimedOut => {
                        let mut timed_out = TimedOut::new();
                        timed_out.cached_inputs = inputs;
                        State::from(timed_out)
                    }
                    other => State::new(other),
                };
                let state = state.with_result(result);
                match message {
                    Some(message) => state.with_message(message),
                    None => state,
                }
            },
        )
}

/// Generate a state tree: mapped parents with children and chains of
/// meta-states, including queued wrappers at arbitrary offsets.
fn arb_state() -> impl Strategy<Value = State> {
    arb_status().prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            (prop::collection::vec(inner.clone(), 0..4), arb_handle()).prop_map(
                |(children, result)| {
                    State::from(Mapped::new().with_map_states(children)).with_result(result)
                }
            ),
            (inner.clone(), prop::sample::select(META_KINDS.to_vec()))
                .prop_map(|(state, kind)| state.wrap(kind)),
            (inner, -719i32..840, 0i64..4_000_000_000).prop_map(
                |(state, offset_minutes, secs)| {
                    let offset = FixedOffset::east_opt(offset_minutes * 60).unwrap();
                    let until = offset.timestamp_opt(secs, 0).unwrap();
                    State::from(MetaState::queued(state, until))
                }
            ),
        ]
    })
}

/// Generate a state tree or a meta-state with nothing wrapped.
fn arb_document_state() -> impl Strategy<Value = State> {
    prop_oneof![
        4 => arb_state(),
        1 => prop::sample::select(META_KINDS.to_vec())
            .prop_map(|kind| State::from(MetaState::empty(kind))),
    ]
}

proptest! {
    #[test]
    fn prop_roundtrip_preserves_equality(state in arb_document_state()) {
        let codec = JsonCodec::default();
        let document = codec.serialize(&state).unwrap();
        let back = codec.deserialize(&document).unwrap();
        prop_assert_eq!(back.kind(), state.kind());
        prop_assert_eq!(back.message(), state.message());
        prop_assert_eq!(back, state);
    }

    #[test]
    fn prop_text_roundtrip_preserves_equality(state in arb_document_state()) {
        let codec = JsonCodec::default();
        let text = codec.to_string(&state).unwrap();
        let back = codec.from_str(&text).unwrap();
        prop_assert_eq!(back, state);
    }

    #[test]
    fn prop_queued_offset_survives(state in arb_state()) {
        let codec = JsonCodec::default();
        let back = codec.from_str(&codec.to_string(&state).unwrap()).unwrap();
        let until = |s: &State| {
            s.as_meta()
                .and_then(MetaState::queued_until)
                .map(|t| *t.offset())
        };
        prop_assert_eq!(until(&back), until(&state));
    }

    #[test]
    fn prop_message_never_affects_equality(state in arb_state(), message in "[a-z]{1,10}") {
        let relabelled = state.clone().with_message(message);
        prop_assert_eq!(relabelled, state);
    }

    #[test]
    fn prop_wrap_then_unwrap_is_identity(state in arb_state()) {
        for kind in META_KINDS {
            let meta = MetaState::wrap(state.clone(), kind);
            prop_assert!(!State::from(meta.clone()).is_finished());
            prop_assert_eq!(meta.into_inner().unwrap(), state.clone());
        }
    }
}
