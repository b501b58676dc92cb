//! CDP-backed document implementation
//!
//! One `Runtime.evaluate` round-trip per operation. Every snippet is an
//! IIFE returning a small status object so failures are distinguishable
//! from transport errors. Selector and text literals are embedded as JSON
//! strings, never interpolated raw.

use async_trait::async_trait;
use chromiumoxide::{Browser, Page};
use futures::StreamExt;
use serde_json::Value;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::{Dom, DomError, PasteOutcome, TargetKind};

/// Finds the editable root for the first match of `__SELECTOR__`:
/// the element itself when it carries an editable marker, else its
/// nearest contenteditable ancestor.
const EDITABLE_ROOT_JS: &str = r#"
    const target = document.querySelector(__SELECTOR__);
    if (!target) { return { status: 'missing' }; }
    let root = null;
    if (target.isContentEditable || target.hasAttribute('contenteditable')) {
        root = target;
    } else if (target.closest) {
        root = target.closest('[contenteditable="true"]');
    }
    if (!root) { return { status: 'no-editable' }; }
"#;

const COUNT_JS: &str = r#"(() => {
    try {
        return { status: 'ok', count: document.querySelectorAll(__SELECTOR__).length };
    } catch (err) {
        return { status: 'error', message: String(err) };
    }
})()"#;

const CLASSIFY_JS: &str = r#"(() => {
    const el = document.querySelector(__SELECTOR__);
    if (!el) { return { status: 'missing' }; }
    if (el instanceof HTMLInputElement || el instanceof HTMLTextAreaElement) {
        return { status: 'ok', kind: 'native-input' };
    }
    const editable =
        el.isContentEditable ||
        el.hasAttribute('contenteditable') ||
        (el.closest && el.closest('[contenteditable="true"]') !== null);
    return { status: 'ok', kind: editable ? 'rich-text' : 'other' };
})()"#;

const SET_NATIVE_VALUE_JS: &str = r#"(() => {
    const el = document.querySelector(__SELECTOR__);
    if (!el) { return { status: 'missing' }; }
    if (!(el instanceof HTMLInputElement || el instanceof HTMLTextAreaElement)) {
        return { status: 'not-native' };
    }
    el.value = __TEXT__;
    el.dispatchEvent(new Event('input', { bubbles: true }));
    el.dispatchEvent(new Event('change', { bubbles: true }));
    return { status: 'ok' };
})()"#;

const CLEAR_EDITABLE_JS: &str = r#"(() => {
    __ROOT__
    root.focus();
    const selection = window.getSelection();
    const range = document.createRange();
    range.selectNodeContents(root);
    selection.removeAllRanges();
    selection.addRange(range);
    document.execCommand('delete', false);
    return { status: 'ok' };
})()"#;

const INSERT_TEXT_COMMAND_JS: &str = r#"(() => {
    __ROOT__
    root.focus();
    const inserted = document.execCommand('insertText', false, __TEXT__);
    return { status: 'ok', inserted: inserted === true };
})()"#;

const DISPATCH_PASTE_JS: &str = r#"(() => {
    __ROOT__
    const dataTransfer = new DataTransfer();
    dataTransfer.setData('text/plain', __TEXT__);
    const pasteEvent = new ClipboardEvent('paste', {
        bubbles: true,
        cancelable: true,
        clipboardData: dataTransfer
    });
    root.dispatchEvent(pasteEvent);
    return { status: 'ok', prevented: pasteEvent.defaultPrevented === true };
})()"#;

const INSERT_TEXT_MANUAL_JS: &str = r#"(() => {
    __ROOT__
    root.focus();
    const selection = window.getSelection();
    const range = document.createRange();
    range.selectNodeContents(root);
    range.collapse(false);
    selection.removeAllRanges();
    selection.addRange(range);
    const textNode = document.createTextNode(__TEXT__);
    range.insertNode(textNode);
    range.setStartAfter(textNode);
    range.collapse(true);
    selection.removeAllRanges();
    selection.addRange(range);
    root.dispatchEvent(new InputEvent('input', {
        bubbles: true,
        cancelable: false,
        inputType: 'insertText',
        data: __TEXT__
    }));
    return { status: 'ok' };
})()"#;

const DISPATCH_CHANGE_JS: &str = r#"(() => {
    __ROOT__
    root.dispatchEvent(new Event('change', { bubbles: true }));
    return { status: 'ok' };
})()"#;

const CLICK_JS: &str = r#"(() => {
    const elements = document.querySelectorAll(__SELECTOR__);
    if (elements.length === 0) { return { status: 'missing' }; }
    const index = __INDEX__;
    if (index >= elements.length) {
        return { status: 'out-of-range', found: elements.length };
    }
    elements[index].click();
    return { status: 'ok' };
})()"#;

/// Live-page [`Dom`] over the Chrome DevTools Protocol.
///
/// Connects to an already-running browser's debugging websocket and picks
/// the page whose URL contains a caller-supplied fragment, the same way an
/// operator would point the automation at the site tab they have open.
pub struct CdpDom {
    page: Page,
    // Keeps the connection alive; the handler task drives its event loop.
    _browser: Browser,
    handler_task: JoinHandle<()>,
}

impl CdpDom {
    /// Connect to `ws_url` and attach to the first page whose URL contains
    /// `page_url_fragment`.
    pub async fn connect(ws_url: &str, page_url_fragment: &str) -> Result<Self, DomError> {
        let (browser, mut handler) = Browser::connect(ws_url)
            .await
            .map_err(|err| DomError::Transport(err.to_string()))?;

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(err) = event {
                    warn!(?err, "CDP handler error");
                }
            }
        });

        let pages = browser
            .pages()
            .await
            .map_err(|err| DomError::Transport(err.to_string()))?;

        for page in pages {
            let url = page.url().await.ok().flatten().unwrap_or_default();
            if url.contains(page_url_fragment) {
                info!(%url, "attached to page");
                return Ok(Self {
                    page,
                    _browser: browser,
                    handler_task,
                });
            }
        }

        handler_task.abort();
        Err(DomError::PageNotFound(page_url_fragment.to_string()))
    }

    async fn eval(&self, expression: String) -> Result<Value, DomError> {
        let result = self
            .page
            .evaluate(expression)
            .await
            .map_err(|err| DomError::Transport(err.to_string()))?;
        Ok(result.value().cloned().unwrap_or(Value::Null))
    }

    /// Evaluate a snippet and interpret its `{ status }` object.
    async fn eval_status(&self, selector: &str, expression: String) -> Result<Value, DomError> {
        let value = self.eval(expression).await?;
        match value.get("status").and_then(Value::as_str) {
            Some("ok") => Ok(value),
            Some("missing") => Err(DomError::Evaluation(format!(
                "element vanished between steps: {selector}"
            ))),
            Some("no-editable") => Err(DomError::Evaluation(format!(
                "no editable root for: {selector}"
            ))),
            Some("not-native") => Err(DomError::Evaluation(format!(
                "element is no longer a native input: {selector}"
            ))),
            Some("out-of-range") => {
                let found = value.get("found").and_then(Value::as_u64).unwrap_or(0);
                Err(DomError::Evaluation(format!(
                    "match count shrank to {found} between steps: {selector}"
                )))
            }
            Some("error") => {
                let message = value
                    .get("message")
                    .and_then(Value::as_str)
                    .unwrap_or("unknown script error");
                Err(DomError::Evaluation(message.to_string()))
            }
            other => Err(DomError::Evaluation(format!(
                "unexpected script status {other:?} for: {selector}"
            ))),
        }
    }
}

impl Drop for CdpDom {
    fn drop(&mut self) {
        self.handler_task.abort();
    }
}

fn js_literal(text: &str) -> String {
    // serde_json string encoding is valid JS string syntax.
    serde_json::to_string(text).unwrap_or_else(|_| "\"\"".to_string())
}

fn render(template: &str, selector: &str) -> String {
    template
        .replace("__ROOT__", &EDITABLE_ROOT_JS.replace("__SELECTOR__", &js_literal(selector)))
        .replace("__SELECTOR__", &js_literal(selector))
}

fn render_with_text(template: &str, selector: &str, text: &str) -> String {
    render(template, selector).replace("__TEXT__", &js_literal(text))
}

#[async_trait]
impl Dom for CdpDom {
    async fn count(&self, selector: &str) -> Result<usize, DomError> {
        let value = self
            .eval_status(selector, render(COUNT_JS, selector))
            .await?;
        Ok(value.get("count").and_then(Value::as_u64).unwrap_or(0) as usize)
    }

    async fn classify(&self, selector: &str) -> Result<TargetKind, DomError> {
        let value = self
            .eval_status(selector, render(CLASSIFY_JS, selector))
            .await?;
        let kind = match value.get("kind").and_then(Value::as_str) {
            Some("native-input") => TargetKind::NativeInput,
            Some("rich-text") => TargetKind::RichText,
            _ => TargetKind::Other,
        };
        debug!(selector, ?kind, "classified fill target");
        Ok(kind)
    }

    async fn set_native_value(&self, selector: &str, value: &str) -> Result<(), DomError> {
        self.eval_status(selector, render_with_text(SET_NATIVE_VALUE_JS, selector, value))
            .await
            .map(|_| ())
    }

    async fn clear_editable(&self, selector: &str) -> Result<(), DomError> {
        self.eval_status(selector, render(CLEAR_EDITABLE_JS, selector))
            .await
            .map(|_| ())
    }

    async fn insert_text_command(&self, selector: &str, text: &str) -> Result<bool, DomError> {
        let value = self
            .eval_status(
                selector,
                render_with_text(INSERT_TEXT_COMMAND_JS, selector, text),
            )
            .await?;
        Ok(value
            .get("inserted")
            .and_then(Value::as_bool)
            .unwrap_or(false))
    }

    async fn dispatch_paste(&self, selector: &str, text: &str) -> Result<PasteOutcome, DomError> {
        let value = self
            .eval_status(selector, render_with_text(DISPATCH_PASTE_JS, selector, text))
            .await?;
        let prevented = value
            .get("prevented")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        Ok(if prevented {
            PasteOutcome::Prevented
        } else {
            PasteOutcome::Applied
        })
    }

    async fn insert_text_manual(&self, selector: &str, text: &str) -> Result<(), DomError> {
        self.eval_status(
            selector,
            render_with_text(INSERT_TEXT_MANUAL_JS, selector, text),
        )
        .await
        .map(|_| ())
    }

    async fn dispatch_change(&self, selector: &str) -> Result<(), DomError> {
        self.eval_status(selector, render(DISPATCH_CHANGE_JS, selector))
            .await
            .map(|_| ())
    }

    async fn click(&self, selector: &str, index: usize) -> Result<(), DomError> {
        self.eval_status(
            selector,
            render(CLICK_JS, selector).replace("__INDEX__", &index.to_string()),
        )
        .await
        .map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selectors_are_embedded_as_json_literals() {
        let snippet = render(COUNT_JS, "a[href^=\"/create/\"]");
        assert!(snippet.contains(r#""a[href^=\"/create/\"]""#));
        assert!(!snippet.contains("__SELECTOR__"));
    }

    #[test]
    fn rich_text_snippets_inline_the_root_lookup() {
        let snippet = render_with_text(DISPATCH_PASTE_JS, "p.editor", "hello");
        assert!(snippet.contains("closest('[contenteditable=\"true\"]')"));
        assert!(snippet.contains(r#""hello""#));
        assert!(!snippet.contains("__ROOT__"));
        assert!(!snippet.contains("__TEXT__"));
    }

    #[test]
    fn click_snippet_carries_the_index() {
        let snippet = render(CLICK_JS, "div.download").replace("__INDEX__", "3");
        assert!(snippet.contains("const index = 3;"));
    }
}
