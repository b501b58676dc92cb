//! Shared data model for autoflow
//!
//! The wire-facing types live here so every crate (interpreter, relay,
//! registry, batch) agrees on one serialized shape: a `Step` is a closed
//! tagged union, a `Workflow` is an immutable template of steps for one
//! target site, and `PromptItem`/`BatchProgress` track one batch run.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One scripted DOM operation.
///
/// Serialized with an internal `type` tag (`fillInput`, `click`, `wait`,
/// `waitForNewResults`, `download`) so dispatch payloads stay readable.
/// The set is closed: payloads carrying any other tag are rejected at the
/// relay boundary, never silently skipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Step {
    /// Fill a text input or rich-text editor with a value.
    #[serde(rename_all = "camelCase")]
    FillInput { selector: String, value: String },

    /// Click the sole match, or the `index`-th match when given.
    #[serde(rename_all = "camelCase")]
    Click {
        selector: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        index: Option<usize>,
    },

    /// Wait for an element to appear, or sleep for a fixed duration (ms).
    #[serde(rename_all = "camelCase")]
    Wait {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        selector: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        duration: Option<u64>,
    },

    /// Wait until the match count for `selector` grows by `expected_count`.
    #[serde(rename_all = "camelCase")]
    WaitForNewResults {
        selector: String,
        expected_count: usize,
    },

    /// Activate a download anchor/button; same contract as `Click`.
    #[serde(rename_all = "camelCase")]
    Download {
        selector: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        index: Option<usize>,
    },
}

impl Step {
    /// Wire tag for this step kind, for logging and payload validation.
    pub fn kind(&self) -> &'static str {
        match self {
            Step::FillInput { .. } => "fillInput",
            Step::Click { .. } => "click",
            Step::Wait { .. } => "wait",
            Step::WaitForNewResults { .. } => "waitForNewResults",
            Step::Download { .. } => "download",
        }
    }

    /// All tags accepted on the wire.
    pub const KNOWN_KINDS: [&'static str; 5] =
        ["fillInput", "click", "wait", "waitForNewResults", "download"];
}

/// Supported target sites.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Site {
    #[serde(rename = "meta-ai")]
    MetaAi,
    #[serde(rename = "flow-veo")]
    FlowVeo,
}

impl Site {
    pub fn as_str(&self) -> &'static str {
        match self {
            Site::MetaAi => "meta-ai",
            Site::FlowVeo => "flow-veo",
        }
    }
}

impl fmt::Display for Site {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named, ordered template of steps for one target site.
///
/// Templates are immutable; per-run customization (prompt substitution,
/// download-index offsets) always produces a fresh step vector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workflow {
    pub id: String,
    pub name: String,
    pub description: String,
    pub site: Site,
    pub steps: Vec<Step>,
}

impl Workflow {
    pub fn new(id: impl Into<String>, name: impl Into<String>, site: Site) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            site,
            steps: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_steps(mut self, steps: Vec<Step>) -> Self {
        self.steps = steps;
        self
    }
}

/// Which half of a batch iteration a dispatched run belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RunPhase {
    Submit,
    Download,
    /// Staggered mode runs submit and download in one combined workflow.
    Combined,
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunPhase::Submit => f.write_str("submit"),
            RunPhase::Download => f.write_str("download"),
            RunPhase::Combined => f.write_str("combined"),
        }
    }
}

/// Optional metadata attached to a dispatched run so logs can be
/// correlated back to the batch item that launched it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunMetadata {
    pub prompt_index: usize,
    pub prompt_text: String,
    pub phase: RunPhase,
}

/// Unique identifier for one workflow run, used in tracing output.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunId(pub String);

impl RunId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lifecycle state of one batch prompt.
///
/// Transitions are monotonic: Pending -> Processing -> Completed | Error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PromptStatus {
    Pending,
    Processing,
    Completed,
    Error,
}

impl PromptStatus {
    /// Whether moving to `next` respects the monotonic lifecycle.
    pub fn can_transition_to(&self, next: PromptStatus) -> bool {
        matches!(
            (self, next),
            (PromptStatus::Pending, PromptStatus::Processing)
                | (PromptStatus::Processing, PromptStatus::Completed)
                | (PromptStatus::Processing, PromptStatus::Error)
        )
    }

    /// Terminal states never transition again.
    pub fn is_terminal(&self) -> bool {
        matches!(self, PromptStatus::Completed | PromptStatus::Error)
    }
}

impl fmt::Display for PromptStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PromptStatus::Pending => "pending",
            PromptStatus::Processing => "processing",
            PromptStatus::Completed => "completed",
            PromptStatus::Error => "error",
        };
        f.write_str(s)
    }
}

/// One batch entry: raw prompt text plus its run state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptItem {
    pub text: String,
    pub status: PromptStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PromptItem {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            status: PromptStatus::Pending,
            error: None,
        }
    }
}

/// Derived batch counters, recomputed after every status transition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchProgress {
    pub current: usize,
    pub total: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_prompt: Option<String>,
}

impl BatchProgress {
    /// Recompute from the current item list.
    pub fn from_items(items: &[PromptItem]) -> Self {
        let current = items
            .iter()
            .filter(|item| item.status != PromptStatus::Pending)
            .count();
        let current_prompt = items
            .iter()
            .find(|item| item.status == PromptStatus::Processing)
            .map(|item| item.text.clone());
        Self {
            current,
            total: items.len(),
            current_prompt,
        }
    }
}
