//! Document wiring shared by the run and batch commands

use std::collections::HashSet;
use std::sync::Arc;

use anyhow::{Context, Result};
use autoflow_core_types::{Step, Workflow};
use autoflow_dom_adapter::{CdpDom, ClickEffect, Dom, FakeDom, FakeElement};
use tracing::info;

use crate::config::BrowserConfig;

/// Connect to a running browser, or build a seeded in-memory document
/// when `dry_run` is set.
pub async fn build_dom(
    browser: &BrowserConfig,
    dry_run: bool,
    workflows: &[&Workflow],
    clickable_slots: usize,
) -> Result<Arc<dyn Dom>> {
    if dry_run {
        info!("dry run: using in-memory document");
        let dom = FakeDom::new();
        for workflow in workflows {
            seed_dry_run(&dom, workflow, clickable_slots);
        }
        return Ok(Arc::new(dom));
    }

    let dom = CdpDom::connect(&browser.ws_url, &browser.page_url)
        .await
        .with_context(|| {
            format!(
                "failed to attach to {} (page matching '{}')",
                browser.ws_url, browser.page_url
            )
        })?;
    Ok(Arc::new(dom))
}

/// Populate the fake with enough structure for `workflow` to complete:
/// editable targets for fill steps, clickable elements for click and
/// download steps, and a click effect that grows the watched result list
/// so count waits resolve.
fn seed_dry_run(dom: &FakeDom, workflow: &Workflow, clickable_slots: usize) {
    let mut seeded: HashSet<&str> = HashSet::new();
    let mut last_clicked: Option<&str> = None;

    for step in &workflow.steps {
        match step {
            Step::FillInput { selector, .. } => {
                if seeded.insert(selector) {
                    dom.insert(selector, FakeElement::rich_text());
                }
            }
            Step::Click { selector, .. } | Step::Download { selector, .. } => {
                if seeded.insert(selector) {
                    dom.insert_many(selector, clickable_slots, FakeElement::plain());
                }
                last_clicked = Some(selector);
            }
            Step::Wait {
                selector: Some(selector),
                ..
            } => {
                if seeded.insert(selector) {
                    dom.insert(selector, FakeElement::plain());
                }
            }
            Step::Wait { selector: None, .. } => {}
            Step::WaitForNewResults {
                selector,
                expected_count,
            } => {
                // The watched list starts empty and grows when the most
                // recent activation selector is clicked.
                if let Some(trigger) = last_clicked {
                    dom.set_click_effect(
                        trigger,
                        ClickEffect {
                            target_selector: selector.clone(),
                            template: FakeElement::plain(),
                            count: *expected_count,
                        },
                    );
                }
            }
        }
    }
}
