//! Batch-level errors

use thiserror::Error;

/// Failures that stop a batch before it launches. Per-item run failures
/// are recorded on the item instead and never surface here.
#[derive(Debug, Error)]
pub enum BatchError {
    /// Input contained no non-blank lines.
    #[error("no prompts supplied")]
    EmptyBatch,

    /// A configured workflow id has no template in the registry.
    #[error("workflow not found: {0}")]
    WorkflowNotFound(String),

    /// A batch is already in flight on this orchestrator.
    #[error("a batch is already running")]
    AlreadyRunning,
}
