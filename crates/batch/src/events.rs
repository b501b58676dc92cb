//! Progress events emitted while a batch runs

use autoflow_core_types::BatchProgress;

/// Per-item transitions plus a single terminal event per batch.
#[derive(Debug, Clone)]
pub enum BatchEvent {
    /// An item moved to Processing.
    ItemStarted { index: usize, progress: BatchProgress },

    /// An item settled as Completed.
    ItemCompleted { index: usize, progress: BatchProgress },

    /// An item settled as Error, with the captured message.
    ItemFailed {
        index: usize,
        error: String,
        progress: BatchProgress,
    },

    /// Every launched run has settled. Fires exactly once per batch.
    Finished { completed: usize, failed: usize },
}
