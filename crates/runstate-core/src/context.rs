//! Run-count context consulted when building `Retrying` states.

/// Read-only view of the active run's attempt counter.
pub trait RunCountContext {
    /// Number of attempts made so far, if the caller is tracking it.
    fn current_run_count(&self) -> Option<u32>;
}

/// Per-run values the execution engine hands to state constructors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunContext {
    /// Attempts made by the current task run.
    pub task_run_count: Option<u32>,
}

impl RunContext {
    /// Create a context with a known run count.
    pub fn with_task_run_count(run_count: u32) -> Self {
        Self {
            task_run_count: Some(run_count),
        }
    }
}

impl RunCountContext for RunContext {
    fn current_run_count(&self) -> Option<u32> {
        self.task_run_count
    }
}

impl RunCountContext for Option<u32> {
    fn current_run_count(&self) -> Option<u32> {
        *self
    }
}
