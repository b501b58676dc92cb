//! Error taxonomy for step execution

use autoflow_dom_adapter::DomError;
use thiserror::Error;

/// Which wait contract expired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeoutKind {
    /// `wait` on a selector: the element never appeared.
    Appearance,
    /// `waitForNewResults`: the match count never grew enough.
    Count,
}

/// Failures raised by the step interpreter. A step failure aborts the
/// remaining sequence; there is no partial-step retry.
#[derive(Debug, Error, Clone)]
pub enum StepError {
    /// The locator matched nothing.
    #[error("element not found: {selector}")]
    ElementNotFound { selector: String },

    /// An explicit occurrence index pointed past the match list.
    #[error("index {index} out of range, found {found} elements for: {selector}")]
    IndexOutOfRange {
        selector: String,
        index: usize,
        found: usize,
    },

    /// Element present but neither a native input nor rich-text editable.
    #[error("element is not a valid input: {selector}")]
    InvalidTarget { selector: String },

    /// `wait` on a selector expired.
    #[error("element not found within {timeout_ms}ms: {selector}")]
    AppearanceTimeout { selector: String, timeout_ms: u64 },

    /// `waitForNewResults` expired; carries the observed counts.
    #[error(
        "expected {expected} new results within {timeout_ms}ms for {selector}, \
         initial: {initial}, final: {final_count}"
    )]
    CountTimeout {
        selector: String,
        expected: usize,
        timeout_ms: u64,
        initial: usize,
        final_count: usize,
    },

    /// A step tag outside the closed variant set, from an external payload.
    #[error("unknown step kind: {0}")]
    UnknownStepKind(String),

    /// Any lower-level document failure.
    #[error("dom operation failed: {0}")]
    Dom(#[from] DomError),
}

impl StepError {
    /// The timeout sub-case, when this error is one.
    pub fn timeout_kind(&self) -> Option<TimeoutKind> {
        match self {
            StepError::AppearanceTimeout { .. } => Some(TimeoutKind::Appearance),
            StepError::CountTimeout { .. } => Some(TimeoutKind::Count),
            _ => None,
        }
    }
}
