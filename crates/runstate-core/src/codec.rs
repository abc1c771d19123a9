//! Seam for the external schema codec.

use crate::state::State;

/// Converts states to and from a structured document.
///
/// Implementations must guarantee `deserialize(serialize(s)) == s` under
/// [`State`] equality and must reconstruct the exact variant from a stable
/// discriminant ([`crate::StateKind::name`]).
pub trait StateCodec {
    /// Wire representation.
    type Document;
    /// Codec failure, surfaced unmodified.
    type Error;

    fn serialize(&self, state: &State) -> Result<Self::Document, Self::Error>;

    fn deserialize(&self, document: &Self::Document) -> Result<State, Self::Error>;
}

impl State {
    /// Serialize through `codec`.
    pub fn serialize_with<C: StateCodec>(&self, codec: &C) -> Result<C::Document, C::Error> {
        codec.serialize(self)
    }

    /// Deserialize through `codec`.
    pub fn deserialize_with<C: StateCodec>(
        codec: &C,
        document: &C::Document,
    ) -> Result<State, C::Error> {
        codec.deserialize(document)
    }
}
