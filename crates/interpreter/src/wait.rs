//! Wait primitives: element appearance and result-count growth

use autoflow_dom_adapter::Dom;
use tokio::time::{sleep, Instant};
use tracing::debug;

use crate::{errors::StepError, timing::StepTiming};

/// Poll until `selector` matches at least one element.
pub(crate) async fn wait_for_element(
    dom: &dyn Dom,
    timing: &StepTiming,
    selector: &str,
) -> Result<(), StepError> {
    let deadline = Instant::now() + timing.appearance_timeout();

    loop {
        if dom.count(selector).await? > 0 {
            return Ok(());
        }
        if Instant::now() >= deadline {
            return Err(StepError::AppearanceTimeout {
                selector: selector.to_string(),
                timeout_ms: timing.appearance_timeout_ms,
            });
        }
        sleep(timing.appearance_poll()).await;
    }
}

/// Poll until the match count grows by `expected` over its initial value.
pub(crate) async fn wait_for_new_results(
    dom: &dyn Dom,
    timing: &StepTiming,
    selector: &str,
    expected: usize,
) -> Result<(), StepError> {
    let initial = dom.count(selector).await?;
    let target = initial + expected;
    let deadline = Instant::now() + timing.results_timeout();
    debug!(selector, initial, target, "waiting for new results");

    loop {
        let current = dom.count(selector).await?;
        if current >= target {
            debug!(selector, current, "result count reached target");
            return Ok(());
        }
        if Instant::now() >= deadline {
            return Err(StepError::CountTimeout {
                selector: selector.to_string(),
                expected,
                timeout_ms: timing.results_timeout_ms,
                initial,
                final_count: current,
            });
        }
        sleep(timing.results_poll()).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use autoflow_dom_adapter::{FakeDom, FakeElement};
    use std::time::Duration;

    fn quick_timing() -> StepTiming {
        StepTiming {
            appearance_poll_ms: 10,
            appearance_timeout_ms: 200,
            results_poll_ms: 10,
            results_timeout_ms: 200,
            ..StepTiming::default()
        }
    }

    #[tokio::test]
    async fn resolves_when_element_already_present() {
        let dom = FakeDom::new();
        dom.insert("video", FakeElement::plain());
        wait_for_element(&dom, &quick_timing(), "video")
            .await
            .unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn resolves_when_element_appears_later() {
        let dom = FakeDom::new();
        let delayed = dom.clone();
        tokio::spawn(async move {
            sleep(Duration::from_millis(50)).await;
            delayed.insert("video", FakeElement::plain());
        });

        wait_for_element(&dom, &quick_timing(), "video")
            .await
            .unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn appearance_timeout_carries_the_threshold() {
        let dom = FakeDom::new();
        let err = wait_for_element(&dom, &quick_timing(), "video")
            .await
            .unwrap_err();
        match err {
            StepError::AppearanceTimeout {
                selector,
                timeout_ms,
            } => {
                assert_eq!(selector, "video");
                assert_eq!(timeout_ms, 200);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn count_growth_resolves_at_initial_plus_expected() {
        let dom = FakeDom::new();
        dom.insert_many("a.result", 2, FakeElement::plain());

        let delayed = dom.clone();
        tokio::spawn(async move {
            sleep(Duration::from_millis(30)).await;
            delayed.insert_many("a.result", 4, FakeElement::plain());
        });

        wait_for_new_results(&dom, &quick_timing(), "a.result", 4)
            .await
            .unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn count_timeout_reports_initial_and_final() {
        let dom = FakeDom::new();
        dom.insert_many("a.result", 2, FakeElement::plain());

        let delayed = dom.clone();
        tokio::spawn(async move {
            sleep(Duration::from_millis(30)).await;
            // Only one of the four expected results shows up.
            delayed.insert("a.result", FakeElement::plain());
        });

        let err = wait_for_new_results(&dom, &quick_timing(), "a.result", 4)
            .await
            .unwrap_err();
        match err {
            StepError::CountTimeout {
                initial,
                final_count,
                expected,
                ..
            } => {
                assert_eq!(initial, 2);
                assert_eq!(final_count, 3);
                assert_eq!(expected, 4);
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
