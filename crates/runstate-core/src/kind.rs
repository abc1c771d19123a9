//! State kinds and the classification groups built over them.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::StateError;

/// Discriminant of every concrete state variant.
///
/// The refinement lattice is:
///
/// ```text
/// Pending ── Paused
///         └─ Scheduled ── Resume
///                      └─ Retrying
/// Running
/// Finished ── Success ── Cached
///          │          ├─ Mapped
///          │          └─ Skipped
///          └─ Failed ── Aborted
///                    ├─ TimedOut
///                    └─ TriggerFailed
/// Submitted, Queued, ClientFailed   (meta-states)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StateKind {
    Pending,
    Paused,
    Scheduled,
    Resume,
    Retrying,
    Running,
    Finished,
    Success,
    Cached,
    Mapped,
    Skipped,
    Failed,
    Aborted,
    TimedOut,
    TriggerFailed,
    Submitted,
    Queued,
    ClientFailed,
}

impl StateKind {
    /// Every kind, in declaration order.
    pub const ALL: [StateKind; 18] = [
        Self::Pending,
        Self::Paused,
        Self::Scheduled,
        Self::Resume,
        Self::Retrying,
        Self::Running,
        Self::Finished,
        Self::Success,
        Self::Cached,
        Self::Mapped,
        Self::Skipped,
        Self::Failed,
        Self::Aborted,
        Self::TimedOut,
        Self::TriggerFailed,
        Self::Submitted,
        Self::Queued,
        Self::ClientFailed,
    ];

    /// Stable discriminant used by codecs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Paused => "Paused",
            Self::Scheduled => "Scheduled",
            Self::Resume => "Resume",
            Self::Retrying => "Retrying",
            Self::Running => "Running",
            Self::Finished => "Finished",
            Self::Success => "Success",
            Self::Cached => "Cached",
            Self::Mapped => "Mapped",
            Self::Skipped => "Skipped",
            Self::Failed => "Failed",
            Self::Aborted => "Aborted",
            Self::TimedOut => "TimedOut",
            Self::TriggerFailed => "TriggerFailed",
            Self::Submitted => "Submitted",
            Self::Queued => "Queued",
            Self::ClientFailed => "ClientFailed",
        }
    }

    /// The kind this one directly refines, if any.
    pub fn parent(&self) -> Option<StateKind> {
        match self {
            Self::Pending | Self::Running | Self::Finished => None,
            Self::Paused | Self::Scheduled => Some(Self::Pending),
            Self::Resume | Self::Retrying => Some(Self::Scheduled),
            Self::Success | Self::Failed => Some(Self::Finished),
            Self::Cached | Self::Mapped | Self::Skipped => Some(Self::Success),
            Self::Aborted | Self::TimedOut | Self::TriggerFailed => Some(Self::Failed),
            Self::Submitted | Self::Queued | Self::ClientFailed => None,
        }
    }

    /// Returns true if `self` is `ancestor` or refines it transitively.
    pub fn is_refinement_of(&self, ancestor: StateKind) -> bool {
        let mut current = Some(*self);
        while let Some(kind) = current {
            if kind == ancestor {
                return true;
            }
            current = kind.parent();
        }
        false
    }

    /// Returns true for the meta-state branch.
    pub fn is_meta(&self) -> bool {
        matches!(self, Self::Submitted | Self::Queued | Self::ClientFailed)
    }

    /// Display color, cosmetic only.
    pub fn color(&self) -> &'static str {
        match self {
            Self::Pending => "#7ebdff",
            Self::Paused => "#cfd8dc",
            Self::Scheduled => "#ffab00",
            Self::Resume => "#fb8532",
            Self::Retrying => "#f66a0a",
            Self::Running => "#3d67ff",
            Self::Finished => "#003ccb",
            Self::Success => "#28a745",
            Self::Cached => "#34d058",
            Self::Mapped => "#003ccb",
            Self::Skipped => "#62757f",
            Self::Failed => "#eb0000",
            Self::Aborted => "#c42800",
            Self::TimedOut => "#ff4e33",
            Self::TriggerFailed => "#ff5131",
            Self::Submitted => "#ffdf5d",
            Self::Queued => "#ffea7f",
            Self::ClientFailed => "#eb0000",
        }
    }
}

impl fmt::Display for StateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for StateKind {
    type Err = StateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| StateError::UnknownKind(s.to_string()))
    }
}

/// A named classification group.
///
/// Membership is reflexive over refinement: a group contains its anchor kind
/// and every kind that refines it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StateGroup {
    Pending,
    Retrying,
    Running,
    Finished,
    Cached,
    Scheduled,
    Submitted,
    Skipped,
    Successful,
    Failed,
    Mapped,
    MetaState,
}

impl StateGroup {
    /// Every group, in declaration order.
    pub const ALL: [StateGroup; 12] = [
        Self::Pending,
        Self::Retrying,
        Self::Running,
        Self::Finished,
        Self::Cached,
        Self::Scheduled,
        Self::Submitted,
        Self::Skipped,
        Self::Successful,
        Self::Failed,
        Self::Mapped,
        Self::MetaState,
    ];

    /// The kind that roots this group. `MetaState` has no single anchor.
    pub fn anchor(&self) -> Option<StateKind> {
        match self {
            Self::Pending => Some(StateKind::Pending),
            Self::Retrying => Some(StateKind::Retrying),
            Self::Running => Some(StateKind::Running),
            Self::Finished => Some(StateKind::Finished),
            Self::Cached => Some(StateKind::Cached),
            Self::Scheduled => Some(StateKind::Scheduled),
            Self::Submitted => Some(StateKind::Submitted),
            Self::Skipped => Some(StateKind::Skipped),
            Self::Successful => Some(StateKind::Success),
            Self::Failed => Some(StateKind::Failed),
            Self::Mapped => Some(StateKind::Mapped),
            Self::MetaState => None,
        }
    }

    /// Static membership table.
    pub fn contains(&self, kind: StateKind) -> bool {
        use StateKind as K;
        match self {
            Self::Pending => matches!(
                kind,
                K::Pending | K::Paused | K::Scheduled | K::Resume | K::Retrying
            ),
            Self::Retrying => matches!(kind, K::Retrying),
            Self::Running => matches!(kind, K::Running),
            Self::Finished => matches!(
                kind,
                K::Finished
                    | K::Success
                    | K::Cached
                    | K::Mapped
                    | K::Skipped
                    | K::Failed
                    | K::Aborted
                    | K::TimedOut
                    | K::TriggerFailed
            ),
            Self::Cached => matches!(kind, K::Cached),
            Self::Scheduled => matches!(kind, K::Scheduled | K::Resume | K::Retrying),
            Self::Submitted => matches!(kind, K::Submitted),
            Self::Skipped => matches!(kind, K::Skipped),
            Self::Successful => {
                matches!(kind, K::Success | K::Cached | K::Mapped | K::Skipped)
            }
            Self::Failed => matches!(
                kind,
                K::Failed | K::Aborted | K::TimedOut | K::TriggerFailed
            ),
            Self::Mapped => matches!(kind, K::Mapped),
            Self::MetaState => matches!(kind, K::Submitted | K::Queued | K::ClientFailed),
        }
    }
}
