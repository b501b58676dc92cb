//! Sequential step execution

use std::sync::Arc;

use autoflow_core_types::{RunId, RunMetadata, Step};
use autoflow_dom_adapter::Dom;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::{
    errors::StepError,
    fill::fill_input,
    report::RunReport,
    timing::StepTiming,
    wait::{wait_for_element, wait_for_new_results},
};

/// Executes workflow steps strictly in order against one document.
///
/// Step `i + 1` begins only after step `i` succeeds and the inter-step
/// settle delay elapses. Any failure aborts the remaining sequence and
/// surfaces the triggering error; there is no retry.
#[derive(Clone)]
pub struct StepInterpreter {
    dom: Arc<dyn Dom>,
    timing: StepTiming,
}

impl StepInterpreter {
    pub fn new(dom: Arc<dyn Dom>) -> Self {
        Self {
            dom,
            timing: StepTiming::default(),
        }
    }

    pub fn with_timing(mut self, timing: StepTiming) -> Self {
        self.timing = timing;
        self
    }

    pub fn timing(&self) -> &StepTiming {
        &self.timing
    }

    /// Run a full step sequence, returning a report on success and the
    /// aborting error otherwise.
    pub async fn execute(
        &self,
        steps: &[Step],
        metadata: Option<&RunMetadata>,
    ) -> Result<RunReport, StepError> {
        let run_id = RunId::new();
        let report = RunReport::new(run_id.clone());

        match metadata {
            Some(meta) => info!(
                run_id = %run_id,
                prompt_index = meta.prompt_index,
                phase = %meta.phase,
                total_steps = steps.len(),
                "starting workflow run"
            ),
            None => info!(run_id = %run_id, total_steps = steps.len(), "starting workflow run"),
        }

        for (i, step) in steps.iter().enumerate() {
            debug!(run_id = %run_id, step = i + 1, kind = step.kind(), "executing step");

            if let Err(err) = self.execute_step(step).await {
                warn!(run_id = %run_id, step = i + 1, error = %err, "workflow run aborted");
                return Err(err);
            }

            if i + 1 < steps.len() {
                sleep(self.timing.inter_step_delay()).await;
            }
        }

        info!(run_id = %run_id, "workflow run completed");
        Ok(report
            .with_success()
            .with_steps_executed(steps.len())
            .finish())
    }

    /// Execute one step. Exposed for granular driving and tests.
    pub async fn execute_step(&self, step: &Step) -> Result<(), StepError> {
        match step {
            Step::FillInput { selector, value } => {
                fill_input(self.dom.as_ref(), &self.timing, selector, value).await
            }

            Step::Click { selector, index } | Step::Download { selector, index } => {
                self.click_element(selector, *index).await
            }

            Step::Wait { selector, duration } => match (selector, duration) {
                (Some(selector), _) => {
                    wait_for_element(self.dom.as_ref(), &self.timing, selector).await
                }
                (None, Some(ms)) => {
                    sleep(std::time::Duration::from_millis(*ms)).await;
                    Ok(())
                }
                (None, None) => {
                    warn!("wait step with neither selector nor duration, skipping");
                    Ok(())
                }
            },

            Step::WaitForNewResults {
                selector,
                expected_count,
            } => {
                wait_for_new_results(self.dom.as_ref(), &self.timing, selector, *expected_count)
                    .await
            }
        }
    }

    async fn click_element(&self, selector: &str, index: Option<usize>) -> Result<(), StepError> {
        let found = self.dom.count(selector).await?;
        if found == 0 {
            return Err(StepError::ElementNotFound {
                selector: selector.to_string(),
            });
        }

        if let Some(index) = index {
            if index >= found {
                return Err(StepError::IndexOutOfRange {
                    selector: selector.to_string(),
                    index,
                    found,
                });
            }
        }

        self.dom.click(selector, index.unwrap_or(0)).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use autoflow_dom_adapter::{ClickEffect, FakeDom, FakeElement};

    fn interpreter(dom: &FakeDom) -> StepInterpreter {
        // Tight pacing keeps the unit tests quick under a real clock.
        StepInterpreter::new(Arc::new(dom.clone())).with_timing(StepTiming {
            inter_step_delay_ms: 1,
            clear_settle_ms: 1,
            appearance_poll_ms: 1,
            appearance_timeout_ms: 50,
            results_poll_ms: 1,
            results_timeout_ms: 50,
        })
    }

    #[tokio::test]
    async fn steps_run_in_order() {
        let dom = FakeDom::new();
        dom.insert("input.prompt", FakeElement::native_input());
        dom.insert("button.send", FakeElement::plain());

        let steps = vec![
            Step::FillInput {
                selector: "input.prompt".to_string(),
                value: "a sunset".to_string(),
            },
            Step::Click {
                selector: "button.send".to_string(),
                index: None,
            },
        ];

        let report = interpreter(&dom).execute(&steps, None).await.unwrap();
        assert!(report.ok);
        assert_eq!(report.steps_executed, 2);
        assert_eq!(
            dom.operations(),
            vec!["set_native_value input.prompt", "click button.send[0]"]
        );
    }

    #[tokio::test]
    async fn click_with_index_selects_the_kth_match() {
        let dom = FakeDom::new();
        dom.insert_many("div.download", 4, FakeElement::plain());

        interpreter(&dom)
            .execute_step(&Step::Click {
                selector: "div.download".to_string(),
                index: Some(2),
            })
            .await
            .unwrap();

        assert_eq!(dom.clicks("div.download", 2), 1);
        assert_eq!(dom.clicks("div.download", 0), 0);
    }

    #[tokio::test]
    async fn click_index_at_match_count_is_out_of_range() {
        let dom = FakeDom::new();
        dom.insert_many("div.download", 3, FakeElement::plain());

        let err = interpreter(&dom)
            .execute_step(&Step::Click {
                selector: "div.download".to_string(),
                index: Some(3),
            })
            .await
            .unwrap_err();

        match err {
            StepError::IndexOutOfRange { index, found, .. } => {
                assert_eq!(index, 3);
                assert_eq!(found, 3);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn click_without_match_is_element_not_found() {
        let dom = FakeDom::new();
        let err = interpreter(&dom)
            .execute_step(&Step::Click {
                selector: "button.gone".to_string(),
                index: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, StepError::ElementNotFound { .. }));
    }

    #[tokio::test]
    async fn download_shares_the_click_contract() {
        let dom = FakeDom::new();
        dom.insert_many("a.media", 2, FakeElement::plain());

        interpreter(&dom)
            .execute_step(&Step::Download {
                selector: "a.media".to_string(),
                index: Some(1),
            })
            .await
            .unwrap();
        assert_eq!(dom.clicks("a.media", 1), 1);
    }

    #[tokio::test]
    async fn failure_aborts_the_remaining_sequence() {
        let dom = FakeDom::new();
        dom.insert("button.later", FakeElement::plain());

        let steps = vec![
            Step::Click {
                selector: "button.gone".to_string(),
                index: None,
            },
            Step::Click {
                selector: "button.later".to_string(),
                index: None,
            },
        ];

        let err = interpreter(&dom).execute(&steps, None).await.unwrap_err();
        assert!(matches!(err, StepError::ElementNotFound { .. }));
        // The second step never ran.
        assert_eq!(dom.clicks("button.later", 0), 0);
    }

    #[tokio::test]
    async fn generate_then_wait_for_results_flow() {
        let dom = FakeDom::new();
        dom.insert("p.editor", FakeElement::rich_text());
        dom.insert("button.send", FakeElement::plain());
        dom.set_click_effect(
            "button.send",
            ClickEffect {
                target_selector: "a.result".to_string(),
                template: FakeElement::plain(),
                count: 4,
            },
        );

        let steps = vec![
            Step::FillInput {
                selector: "p.editor".to_string(),
                value: "a sunset".to_string(),
            },
            Step::Click {
                selector: "button.send".to_string(),
                index: None,
            },
            Step::WaitForNewResults {
                selector: "a.result".to_string(),
                expected_count: 4,
            },
        ];

        let report = interpreter(&dom).execute(&steps, None).await.unwrap();
        assert!(report.ok);
        assert_eq!(report.steps_executed, 3);
    }
}
