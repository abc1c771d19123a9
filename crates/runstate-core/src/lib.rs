//! Run-state model
//!
//! Every execution of a task or flow is described by exactly one [`State`].
//! This crate holds the taxonomy and its semantics only:
//! - Classification predicates over the refinement lattice
//! - Value equality (message excluded)
//! - Meta-states that annotate another state
//! - Deferred result handles
//! - The codec seam used for persistence
//!
//! Deciding when to transition, storing results and encoding documents all
//! belong to collaborators reached through [`ResultHandler`],
//! [`RunCountContext`] and [`StateCodec`].

pub mod codec;
pub mod context;
pub mod error;
pub mod kind;
pub mod meta;
pub mod result;
pub mod state;

// Re-export commonly used types
pub use codec::StateCodec;
pub use context::{RunContext, RunCountContext};
pub use error::{StateError, StoreError};
pub use kind::{StateGroup, StateKind};
pub use meta::{MetaKind, MetaState, Queued, Wrapper};
pub use result::{ResultHandle, ResultHandler, SafeResult};
pub use state::{
    Base, Cached, CachedInputs, Mapped, Pending, Retrying, Scheduled, State, TimedOut,
};
