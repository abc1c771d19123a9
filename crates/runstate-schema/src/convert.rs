//! Converters between wire documents and domain states.

use runstate_core::{
    Base, Cached, CachedInputs, Mapped, MetaState, Pending, Queued, ResultHandle, Retrying,
    SafeResult, Scheduled, State, StateError, TimedOut, Wrapper,
};

use crate::document::{
    BaseDocument, CachedDocument, CachedInputsDocument, MappedDocument, PendingDocument,
    QueuedDocument, ResultDocument, RetryingDocument, ScheduledDocument, StateDocument,
    WrapperDocument,
};

// ============================================================================
// Result handle conversions
// ============================================================================

impl From<&ResultHandle> for ResultDocument {
    fn from(handle: &ResultHandle) -> Self {
        match handle {
            ResultHandle::NoResult => ResultDocument::NoResult,
            ResultHandle::Immediate(value) => ResultDocument::Result {
                value: value.clone(),
            },
            ResultHandle::Safe(safe) => ResultDocument::SafeResult {
                value: safe.safe_value().clone(),
                result_handler: safe.handler().to_string(),
            },
        }
    }
}

impl TryFrom<ResultDocument> for ResultHandle {
    type Error = StateError;

    fn try_from(doc: ResultDocument) -> Result<Self, Self::Error> {
        Ok(match doc {
            ResultDocument::NoResult => ResultHandle::NoResult,
            ResultDocument::Result { value } => ResultHandle::Immediate(value),
            ResultDocument::SafeResult {
                value,
                result_handler,
            } => ResultHandle::Safe(SafeResult::new(value, result_handler)?),
        })
    }
}

fn inputs_to_doc(inputs: &Option<CachedInputs>) -> Option<CachedInputsDocument> {
    inputs.as_ref().map(|inputs| {
        inputs
            .iter()
            .map(|(name, handle)| (name.clone(), handle.into()))
            .collect()
    })
}

fn inputs_from_doc(doc: Option<CachedInputsDocument>) -> Result<Option<CachedInputs>, StateError> {
    doc.map(|inputs| {
        inputs
            .into_iter()
            .map(|(name, result)| ResultHandle::try_from(result).map(|handle| (name, handle)))
            .collect::<Result<CachedInputs, StateError>>()
    })
    .transpose()
}

fn wrapped_from_doc(doc: Option<Box<StateDocument>>) -> Result<Option<Box<State>>, StateError> {
    doc.map(|inner| State::try_from(*inner).map(Box::new))
        .transpose()
}

// ============================================================================
// Payload conversions
// ============================================================================

impl From<&Base> for BaseDocument {
    fn from(s: &Base) -> Self {
        BaseDocument {
            message: s.message.clone(),
            result: (&s.result).into(),
        }
    }
}

impl TryFrom<BaseDocument> for Base {
    type Error = StateError;

    fn try_from(doc: BaseDocument) -> Result<Self, Self::Error> {
        Ok(Base {
            message: doc.message,
            result: doc.result.try_into()?,
        })
    }
}

impl From<&Pending> for PendingDocument {
    fn from(s: &Pending) -> Self {
        PendingDocument {
            message: s.message.clone(),
            result: (&s.result).into(),
            cached_inputs: inputs_to_doc(&s.cached_inputs),
        }
    }
}

impl TryFrom<PendingDocument> for Pending {
    type Error = StateError;

    fn try_from(doc: PendingDocument) -> Result<Self, Self::Error> {
        Ok(Pending {
            message: doc.message,
            result: doc.result.try_into()?,
            cached_inputs: inputs_from_doc(doc.cached_inputs)?,
        })
    }
}

impl From<&TimedOut> for PendingDocument {
    fn from(s: &TimedOut) -> Self {
        PendingDocument {
            message: s.message.clone(),
            result: (&s.result).into(),
            cached_inputs: inputs_to_doc(&s.cached_inputs),
        }
    }
}

impl TryFrom<PendingDocument> for TimedOut {
    type Error = StateError;

    fn try_from(doc: PendingDocument) -> Result<Self, Self::Error> {
        Ok(TimedOut {
            message: doc.message,
            result: doc.result.try_into()?,
            cached_inputs: inputs_from_doc(doc.cached_inputs)?,
        })
    }
}

impl From<&Scheduled> for ScheduledDocument {
    fn from(s: &Scheduled) -> Self {
        ScheduledDocument {
            message: s.message.clone(),
            result: (&s.result).into(),
            start_time: s.start_time,
            cached_inputs: inputs_to_doc(&s.cached_inputs),
        }
    }
}

impl TryFrom<ScheduledDocument> for Scheduled {
    type Error = StateError;

    fn try_from(doc: ScheduledDocument) -> Result<Self, Self::Error> {
        Ok(Scheduled {
            message: doc.message,
            result: doc.result.try_into()?,
            start_time: doc.start_time,
            cached_inputs: inputs_from_doc(doc.cached_inputs)?,
        })
    }
}

impl From<&Retrying> for RetryingDocument {
    fn from(s: &Retrying) -> Self {
        RetryingDocument {
            message: s.message.clone(),
            result: (&s.result).into(),
            start_time: s.start_time,
            cached_inputs: inputs_to_doc(&s.cached_inputs),
            run_count: s.run_count,
        }
    }
}

impl TryFrom<RetryingDocument> for Retrying {
    type Error = StateError;

    fn try_from(doc: RetryingDocument) -> Result<Self, Self::Error> {
        Ok(Retrying {
            message: doc.message,
            result: doc.result.try_into()?,
            start_time: doc.start_time,
            cached_inputs: inputs_from_doc(doc.cached_inputs)?,
            run_count: doc.run_count,
        })
    }
}

impl From<&Cached> for CachedDocument {
    fn from(s: &Cached) -> Self {
        CachedDocument {
            message: s.message.clone(),
            result: (&s.result).into(),
            cached_inputs: inputs_to_doc(&s.cached_inputs),
            cached_parameters: s.cached_parameters.clone(),
            cached_result_expiration: s.cached_result_expiration,
        }
    }
}

impl TryFrom<CachedDocument> for Cached {
    type Error = StateError;

    fn try_from(doc: CachedDocument) -> Result<Self, Self::Error> {
        Ok(Cached {
            message: doc.message,
            result: doc.result.try_into()?,
            cached_inputs: inputs_from_doc(doc.cached_inputs)?,
            cached_parameters: doc.cached_parameters,
            cached_result_expiration: doc.cached_result_expiration,
        })
    }
}

impl From<&Mapped> for MappedDocument {
    fn from(s: &Mapped) -> Self {
        MappedDocument {
            message: s.message.clone(),
            result: (&s.result).into(),
            map_states: s.map_states.iter().map(Into::into).collect(),
        }
    }
}

impl TryFrom<MappedDocument> for Mapped {
    type Error = StateError;

    fn try_from(doc: MappedDocument) -> Result<Self, Self::Error> {
        Ok(Mapped {
            message: doc.message,
            result: doc.result.try_into()?,
            map_states: doc
                .map_states
                .into_iter()
                .map(State::try_from)
                .collect::<Result<_, _>>()?,
        })
    }
}

impl From<&Wrapper> for WrapperDocument {
    fn from(s: &Wrapper) -> Self {
        WrapperDocument {
            message: s.message.clone(),
            result: (&s.result).into(),
            state: s.state.as_deref().map(|inner| Box::new(inner.into())),
        }
    }
}

impl TryFrom<WrapperDocument> for Wrapper {
    type Error = StateError;

    fn try_from(doc: WrapperDocument) -> Result<Self, Self::Error> {
        Ok(Wrapper {
            message: doc.message,
            result: doc.result.try_into()?,
            state: wrapped_from_doc(doc.state)?,
        })
    }
}

impl From<&Queued> for QueuedDocument {
    fn from(s: &Queued) -> Self {
        QueuedDocument {
            message: s.message.clone(),
            result: (&s.result).into(),
            state: s.state.as_deref().map(|inner| Box::new(inner.into())),
            start_time: s.start_time,
        }
    }
}

impl TryFrom<QueuedDocument> for Queued {
    type Error = StateError;

    fn try_from(doc: QueuedDocument) -> Result<Self, Self::Error> {
        Ok(Queued {
            message: doc.message,
            result: doc.result.try_into()?,
            state: wrapped_from_doc(doc.state)?,
            start_time: doc.start_time,
        })
    }
}

// ============================================================================
// State conversions
// ============================================================================

impl From<&State> for StateDocument {
    fn from(state: &State) -> Self {
        match state {
            State::Pending(s) => StateDocument::Pending(s.into()),
            State::Paused(s) => StateDocument::Paused(s.into()),
            State::Scheduled(s) => StateDocument::Scheduled(s.into()),
            State::Resume(s) => StateDocument::Resume(s.into()),
            State::Retrying(s) => StateDocument::Retrying(s.into()),
            State::Running(s) => StateDocument::Running(s.into()),
            State::Finished(s) => StateDocument::Finished(s.into()),
            State::Success(s) => StateDocument::Success(s.into()),
            State::Cached(s) => StateDocument::Cached(s.into()),
            State::Mapped(s) => StateDocument::Mapped(s.into()),
            State::Skipped(s) => StateDocument::Skipped(s.into()),
            State::Failed(s) => StateDocument::Failed(s.into()),
            State::Aborted(s) => StateDocument::Aborted(s.into()),
            State::TimedOut(s) => StateDocument::TimedOut(s.into()),
            State::TriggerFailed(s) => StateDocument::TriggerFailed(s.into()),
            State::Meta(MetaState::Submitted(w)) => StateDocument::Submitted(w.into()),
            State::Meta(MetaState::Queued(q)) => StateDocument::Queued(q.into()),
            State::Meta(MetaState::ClientFailed(w)) => StateDocument::ClientFailed(w.into()),
        }
    }
}

impl TryFrom<StateDocument> for State {
    type Error = StateError;

    fn try_from(doc: StateDocument) -> Result<Self, Self::Error> {
        Ok(match doc {
            StateDocument::Pending(d) => State::Pending(d.try_into()?),
            StateDocument::Paused(d) => State::Paused(d.try_into()?),
            StateDocument::Scheduled(d) => State::Scheduled(d.try_into()?),
            StateDocument::Resume(d) => State::Resume(d.try_into()?),
            StateDocument::Retrying(d) => State::Retrying(d.try_into()?),
            StateDocument::Running(d) => State::Running(d.try_into()?),
            StateDocument::Finished(d) => State::Finished(d.try_into()?),
            StateDocument::Success(d) => State::Success(d.try_into()?),
            StateDocument::Cached(d) => State::Cached(d.try_into()?),
            StateDocument::Mapped(d) => State::Mapped(d.try_into()?),
            StateDocument::Skipped(d) => State::Skipped(d.try_into()?),
            StateDocument::Failed(d) => State::Failed(d.try_into()?),
            StateDocument::Aborted(d) => State::Aborted(d.try_into()?),
            StateDocument::TimedOut(d) => State::TimedOut(d.try_into()?),
            StateDocument::TriggerFailed(d) => State::TriggerFailed(d.try_into()?),
            StateDocument::Submitted(d) => State::Meta(MetaState::Submitted(d.try_into()?)),
            StateDocument::Queued(d) => State::Meta(MetaState::Queued(d.try_into()?)),
            StateDocument::ClientFailed(d) => State::Meta(MetaState::ClientFailed(d.try_into()?)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use runstate_core::{MetaKind, StateKind};
    use serde_json::json;

    #[test]
    fn test_every_kind_keeps_its_discriminant() {
        for kind in StateKind::ALL {
            let state = State::new(kind);
            let value = serde_json::to_value(StateDocument::from(&state)).unwrap();
            assert_eq!(value["type"], json!(kind.name()));

            let back = State::try_from(StateDocument::from(&state)).unwrap();
            assert_eq!(back.kind(), kind);
        }
    }

    #[test]
    fn test_skipped_has_no_cache_fields() {
        let skipped = serde_json::to_value(StateDocument::from(&State::skipped())).unwrap();
        let object = skipped.as_object().unwrap();
        assert!(!object.contains_key("cached_inputs"));
        assert!(!object.contains_key("cached_parameters"));
        assert!(!object.contains_key("cached_result_expiration"));

        let cached = serde_json::to_value(StateDocument::from(&State::cached())).unwrap();
        assert!(cached.as_object().unwrap().contains_key("cached_result_expiration"));
    }

    #[test]
    fn test_result_documents() {
        assert_eq!(
            serde_json::to_value(ResultDocument::from(&ResultHandle::NoResult)).unwrap(),
            json!({"type": "NoResult"})
        );
        assert_eq!(
            serde_json::to_value(ResultDocument::from(&ResultHandle::Immediate(json!(null))))
                .unwrap(),
            json!({"type": "Result", "value": null})
        );
    }

    #[test]
    fn test_malformed_safe_result_is_rejected() {
        let doc = ResultDocument::SafeResult {
            value: json!("s3://bucket/key"),
            result_handler: String::new(),
        };
        assert!(matches!(
            ResultHandle::try_from(doc),
            Err(StateError::InvalidResultBinding(_))
        ));
    }

    #[test]
    fn test_nested_meta_document() {
        let state = State::retrying()
            .wrap(MetaKind::Queued)
            .wrap(MetaKind::Submitted);
        let value = serde_json::to_value(StateDocument::from(&state)).unwrap();
        assert_eq!(value["type"], json!("Submitted"));
        assert_eq!(value["state"]["type"], json!("Queued"));
        assert_eq!(value["state"]["state"]["type"], json!("Retrying"));
        assert_eq!(value["state"]["state"]["run_count"], json!(1));
    }

    #[test]
    fn test_empty_meta_document() {
        let value = serde_json::to_value(StateDocument::from(&State::new(StateKind::ClientFailed)))
            .unwrap();
        assert_eq!(value["state"], json!(null));
        let back: StateDocument = serde_json::from_value(value).unwrap();
        let state = State::try_from(back).unwrap();
        assert!(state.as_meta().unwrap().inner().is_err());
    }
}
