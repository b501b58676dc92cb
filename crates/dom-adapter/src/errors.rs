//! Error type for document operations

use thiserror::Error;

/// Failures raised below the step interpreter: transport problems,
/// script evaluation failures, or not finding the target page at all.
#[derive(Debug, Error, Clone)]
pub enum DomError {
    /// CDP connection or command transport failed.
    #[error("CDP transport error: {0}")]
    Transport(String),

    /// A script evaluated on the page failed or returned an
    /// uninterpretable result.
    #[error("script evaluation failed: {0}")]
    Evaluation(String),

    /// No open page matched the requested URL fragment.
    #[error("no page matching '{0}'")]
    PageNotFound(String),
}
