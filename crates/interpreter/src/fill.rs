//! Fill-input execution
//!
//! Native inputs take the value directly. Rich-text targets go through a
//! three-tier insertion ladder: platform insert-text command, synthetic
//! paste, manual node insertion. Different rich-text frameworks intercept
//! different levels, so each tier is only attempted when the previous one
//! is reported unavailable or suppressed.

use autoflow_dom_adapter::{Dom, PasteOutcome, TargetKind};
use tokio::time::sleep;
use tracing::debug;

use crate::{errors::StepError, timing::StepTiming};

pub(crate) async fn fill_input(
    dom: &dyn Dom,
    timing: &StepTiming,
    selector: &str,
    value: &str,
) -> Result<(), StepError> {
    if dom.count(selector).await? == 0 {
        return Err(StepError::ElementNotFound {
            selector: selector.to_string(),
        });
    }

    match dom.classify(selector).await? {
        TargetKind::NativeInput => {
            debug!(selector, "filling native input");
            dom.set_native_value(selector, value).await?;
        }

        TargetKind::RichText => {
            debug!(selector, "filling rich-text editor");
            dom.clear_editable(selector).await?;
            // Give the editor time to apply the deletion.
            sleep(timing.clear_settle()).await;

            if !dom.insert_text_command(selector, value).await? {
                debug!(selector, "insert-text command unsupported, trying paste");
                match dom.dispatch_paste(selector, value).await? {
                    PasteOutcome::Applied => {}
                    PasteOutcome::Prevented => {
                        debug!(selector, "paste suppressed, inserting node manually");
                        dom.insert_text_manual(selector, value).await?;
                    }
                }
            }

            dom.dispatch_change(selector).await?;
        }

        TargetKind::Other => {
            return Err(StepError::InvalidTarget {
                selector: selector.to_string(),
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use autoflow_dom_adapter::{FakeDom, FakeElement};

    #[tokio::test]
    async fn native_input_takes_the_exact_value() {
        let dom = FakeDom::new();
        dom.insert("textarea.prompt", FakeElement::native_input());

        fill_input(&dom, &StepTiming::default(), "textarea.prompt", "sunset over the ocean")
            .await
            .unwrap();
        assert_eq!(
            dom.value_of("textarea.prompt").as_deref(),
            Some("sunset over the ocean")
        );
    }

    #[tokio::test]
    async fn native_input_accepts_the_empty_string() {
        let dom = FakeDom::new();
        let mut element = FakeElement::native_input();
        element.value = "previous text".to_string();
        dom.insert("input.q", element);

        fill_input(&dom, &StepTiming::default(), "input.q", "")
            .await
            .unwrap();
        assert_eq!(dom.value_of("input.q").as_deref(), Some(""));
    }

    #[tokio::test]
    async fn rich_text_uses_insert_command_when_supported() {
        let dom = FakeDom::new();
        dom.insert("p.editor", FakeElement::rich_text());

        fill_input(&dom, &StepTiming::default(), "p.editor", "hello")
            .await
            .unwrap();

        assert_eq!(dom.value_of("p.editor").as_deref(), Some("hello"));
        let ops = dom.operations();
        assert_eq!(
            ops,
            vec![
                "clear_editable p.editor",
                "insert_text_command p.editor",
                "dispatch_change p.editor",
            ]
        );
    }

    #[tokio::test]
    async fn paste_is_tried_before_manual_insertion() {
        let dom = FakeDom::new();
        dom.insert("p.editor", FakeElement::rich_text().without_insert_text());

        fill_input(&dom, &StepTiming::default(), "p.editor", "hello")
            .await
            .unwrap();

        assert_eq!(dom.value_of("p.editor").as_deref(), Some("hello"));
        let ops = dom.operations();
        assert_eq!(
            ops,
            vec![
                "clear_editable p.editor",
                "insert_text_command p.editor",
                "dispatch_paste p.editor",
                "dispatch_change p.editor",
            ]
        );
    }

    #[tokio::test]
    async fn manual_insertion_only_after_prevented_paste() {
        let dom = FakeDom::new();
        dom.insert(
            "p.editor",
            FakeElement::rich_text()
                .without_insert_text()
                .with_paste_prevented(),
        );

        fill_input(&dom, &StepTiming::default(), "p.editor", "hello")
            .await
            .unwrap();

        assert_eq!(dom.value_of("p.editor").as_deref(), Some("hello"));
        let ops = dom.operations();
        assert_eq!(
            ops,
            vec![
                "clear_editable p.editor",
                "insert_text_command p.editor",
                "dispatch_paste p.editor",
                "insert_text_manual p.editor",
                "dispatch_change p.editor",
            ]
        );
    }

    #[tokio::test]
    async fn missing_element_fails_before_any_mutation() {
        let dom = FakeDom::new();
        let err = fill_input(&dom, &StepTiming::default(), "p.gone", "hello")
            .await
            .unwrap_err();
        assert!(matches!(err, StepError::ElementNotFound { .. }));
        assert!(dom.operations().is_empty());
    }

    #[tokio::test]
    async fn unrecognized_element_is_an_invalid_target() {
        let dom = FakeDom::new();
        dom.insert("div.banner", FakeElement::plain());

        let err = fill_input(&dom, &StepTiming::default(), "div.banner", "hello")
            .await
            .unwrap_err();
        assert!(matches!(err, StepError::InvalidTarget { .. }));
    }
}
