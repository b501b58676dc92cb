//! Document seam for autoflow
//!
//! The step interpreter never touches a browser directly; it drives the
//! [`Dom`] trait, which expresses exactly the document operations the step
//! set needs. Two implementations ship here:
//!
//! - [`CdpDom`]: a live page over the Chrome DevTools Protocol
//!   (chromiumoxide), one script evaluation per operation.
//! - [`FakeDom`]: an in-memory document suitable for unit tests and dry
//!   runs, scriptable enough to simulate editors that reject synthetic
//!   input.

mod cdp;
mod errors;
mod fake;

pub use cdp::CdpDom;
pub use errors::DomError;
pub use fake::{ClickEffect, FakeDom, FakeElement};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// How a fill target accepts text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TargetKind {
    /// A native `<input>`/`<textarea>`: assignable value plus synthetic
    /// input/change notifications.
    NativeInput,

    /// The element is an editable root, or sits under one: rich-text
    /// insertion ladder applies.
    RichText,

    /// Present but not a recognized input kind.
    Other,
}

/// Result of dispatching a synthetic paste on an editable root.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasteOutcome {
    /// The page let the paste through (or applied it itself).
    Applied,

    /// The page called `preventDefault()` without applying the text; the
    /// caller must fall back to manual node insertion.
    Prevented,
}

/// Document operations the step interpreter is built on.
///
/// All operations are keyed by selector; implementations re-resolve on
/// every call, matching how the live page behaves between steps. The
/// rich-text operations (`clear_editable` onward) act on the *editable
/// root* of the selector's first match, which may be an ancestor of the
/// matched element. Callers are expected to check `count` before invoking
/// element-specific operations.
#[async_trait]
pub trait Dom: Send + Sync {
    /// Number of elements currently matching `selector`.
    async fn count(&self, selector: &str) -> Result<usize, DomError>;

    /// Classify the first match as a fill target.
    async fn classify(&self, selector: &str) -> Result<TargetKind, DomError>;

    /// Set a native input's value and emit synthetic input+change events.
    async fn set_native_value(&self, selector: &str, value: &str) -> Result<(), DomError>;

    /// Focus the editable root, select its entire content and delete it.
    async fn clear_editable(&self, selector: &str) -> Result<(), DomError>;

    /// Insert text via the platform insert-text command. Returns `false`
    /// when the platform reports the command unsupported.
    async fn insert_text_command(&self, selector: &str, text: &str) -> Result<bool, DomError>;

    /// Dispatch a synthetic paste event carrying `text` as the plain-text
    /// clipboard payload.
    async fn dispatch_paste(&self, selector: &str, text: &str) -> Result<PasteOutcome, DomError>;

    /// Manual DOM surgery: collapse the selection to end-of-content,
    /// insert a text node, move the cursor after it and emit one synthetic
    /// insertText input notification.
    async fn insert_text_manual(&self, selector: &str, text: &str) -> Result<(), DomError>;

    /// Emit a synthetic change notification on the editable root.
    async fn dispatch_change(&self, selector: &str) -> Result<(), DomError>;

    /// Activate the `index`-th match of `selector`.
    async fn click(&self, selector: &str, index: usize) -> Result<(), DomError>;
}
