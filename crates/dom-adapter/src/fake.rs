//! In-memory document for unit tests and dry runs
//!
//! Selector matching is exact-key: an element registered under
//! `"button.send"` is only visible to operations using that selector.
//! That is all the interpreter needs, and it keeps the fake honest about
//! what a selector resolves to.
//!
//! The fake is scriptable where real pages are awkward: per-element
//! insert-text support and paste interception are configurable, clicks
//! can append elements elsewhere (simulating result generation), and an
//! operation log records call order so tests can assert the fill ladder
//! tier by tier.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::{Dom, DomError, PasteOutcome, TargetKind};

/// One fake element: its fill classification plus the knobs that steer
/// the rich-text insertion ladder.
#[derive(Debug, Clone)]
pub struct FakeElement {
    pub kind: TargetKind,
    pub value: String,
    pub insert_text_supported: bool,
    pub paste_prevented: bool,
    pub clicks: usize,
}

impl FakeElement {
    pub fn native_input() -> Self {
        Self {
            kind: TargetKind::NativeInput,
            value: String::new(),
            insert_text_supported: true,
            paste_prevented: false,
            clicks: 0,
        }
    }

    pub fn rich_text() -> Self {
        Self {
            kind: TargetKind::RichText,
            value: String::new(),
            insert_text_supported: true,
            paste_prevented: false,
            clicks: 0,
        }
    }

    /// An element that is neither a native input nor editable.
    pub fn plain() -> Self {
        Self {
            kind: TargetKind::Other,
            value: String::new(),
            insert_text_supported: false,
            paste_prevented: false,
            clicks: 0,
        }
    }

    /// Simulate an editor where `execCommand('insertText')` reports
    /// unsupported.
    pub fn without_insert_text(mut self) -> Self {
        self.insert_text_supported = false;
        self
    }

    /// Simulate a page that intercepts paste events without applying them.
    pub fn with_paste_prevented(mut self) -> Self {
        self.paste_prevented = true;
        self
    }
}

/// Side effect attached to clicking a selector: appends `count` clones of
/// `template` under `target_selector`, simulating a page that prepends
/// result entries after activation.
#[derive(Debug, Clone)]
pub struct ClickEffect {
    pub target_selector: String,
    pub template: FakeElement,
    pub count: usize,
}

#[derive(Default)]
struct FakeState {
    elements: HashMap<String, Vec<FakeElement>>,
    click_effects: HashMap<String, ClickEffect>,
    fail_values: Vec<String>,
    log: Vec<String>,
}

/// Cheap-to-clone handle to one shared fake document.
#[derive(Clone, Default)]
pub struct FakeDom {
    state: Arc<Mutex<FakeState>>,
}

impl FakeDom {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register one element under `selector`.
    pub fn insert(&self, selector: &str, element: FakeElement) {
        self.state
            .lock()
            .elements
            .entry(selector.to_string())
            .or_default()
            .push(element);
    }

    /// Register `count` clones of `element` under `selector`.
    pub fn insert_many(&self, selector: &str, count: usize, element: FakeElement) {
        let mut state = self.state.lock();
        let entry = state.elements.entry(selector.to_string()).or_default();
        for _ in 0..count {
            entry.push(element.clone());
        }
    }

    /// Clicking `selector` appends elements elsewhere (result generation).
    pub fn set_click_effect(&self, selector: &str, effect: ClickEffect) {
        self.state
            .lock()
            .click_effects
            .insert(selector.to_string(), effect);
    }

    /// Make `set_native_value` fail for this exact value, to force one
    /// batch item into an error without touching the others.
    pub fn fail_value(&self, value: &str) {
        self.state.lock().fail_values.push(value.to_string());
    }

    /// Current text of the first element under `selector`.
    pub fn value_of(&self, selector: &str) -> Option<String> {
        self.state
            .lock()
            .elements
            .get(selector)
            .and_then(|els| els.first())
            .map(|el| el.value.clone())
    }

    /// How many times the `index`-th element under `selector` was clicked.
    pub fn clicks(&self, selector: &str, index: usize) -> usize {
        self.state
            .lock()
            .elements
            .get(selector)
            .and_then(|els| els.get(index))
            .map(|el| el.clicks)
            .unwrap_or(0)
    }

    /// Ordered record of every operation the interpreter issued.
    pub fn operations(&self) -> Vec<String> {
        self.state.lock().log.clone()
    }

    fn log(&self, entry: String) {
        self.state.lock().log.push(entry);
    }

    fn with_first<R>(
        &self,
        selector: &str,
        f: impl FnOnce(&mut FakeElement) -> R,
    ) -> Result<R, DomError> {
        let mut state = self.state.lock();
        let element = state
            .elements
            .get_mut(selector)
            .and_then(|els| els.first_mut())
            .ok_or_else(|| DomError::Evaluation(format!("no element under: {selector}")))?;
        Ok(f(element))
    }
}

#[async_trait]
impl Dom for FakeDom {
    async fn count(&self, selector: &str) -> Result<usize, DomError> {
        Ok(self
            .state
            .lock()
            .elements
            .get(selector)
            .map(|els| els.len())
            .unwrap_or(0))
    }

    async fn classify(&self, selector: &str) -> Result<TargetKind, DomError> {
        self.with_first(selector, |el| el.kind)
    }

    async fn set_native_value(&self, selector: &str, value: &str) -> Result<(), DomError> {
        self.log(format!("set_native_value {selector}"));
        let rejected = self.state.lock().fail_values.iter().any(|v| v == value);
        if rejected {
            return Err(DomError::Evaluation(format!(
                "page rejected input value: {value}"
            )));
        }
        self.with_first(selector, |el| el.value = value.to_string())
    }

    async fn clear_editable(&self, selector: &str) -> Result<(), DomError> {
        self.log(format!("clear_editable {selector}"));
        self.with_first(selector, |el| el.value.clear())
    }

    async fn insert_text_command(&self, selector: &str, text: &str) -> Result<bool, DomError> {
        self.log(format!("insert_text_command {selector}"));
        self.with_first(selector, |el| {
            if el.insert_text_supported {
                el.value.push_str(text);
                true
            } else {
                false
            }
        })
    }

    async fn dispatch_paste(&self, selector: &str, text: &str) -> Result<PasteOutcome, DomError> {
        self.log(format!("dispatch_paste {selector}"));
        self.with_first(selector, |el| {
            if el.paste_prevented {
                PasteOutcome::Prevented
            } else {
                el.value.push_str(text);
                PasteOutcome::Applied
            }
        })
    }

    async fn insert_text_manual(&self, selector: &str, text: &str) -> Result<(), DomError> {
        self.log(format!("insert_text_manual {selector}"));
        self.with_first(selector, |el| el.value.push_str(text))
    }

    async fn dispatch_change(&self, selector: &str) -> Result<(), DomError> {
        self.log(format!("dispatch_change {selector}"));
        // Notification only; the fake has no framework listening.
        self.with_first(selector, |_| ())
    }

    async fn click(&self, selector: &str, index: usize) -> Result<(), DomError> {
        self.log(format!("click {selector}[{index}]"));
        let effect = {
            let mut state = self.state.lock();
            let element = state
                .elements
                .get_mut(selector)
                .and_then(|els| els.get_mut(index))
                .ok_or_else(|| {
                    DomError::Evaluation(format!("no element under: {selector}[{index}]"))
                })?;
            element.clicks += 1;
            state.click_effects.get(selector).cloned()
        };

        if let Some(effect) = effect {
            self.insert_many(&effect.target_selector, effect.count, effect.template);
        }
        Ok(())
    }
}
