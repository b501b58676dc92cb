//! Interpreter pacing configuration
//!
//! Every delay the interpreter observes lives here. The defaults were
//! tuned empirically against one site's rendering latency; keeping them
//! in configuration lets a deployment retune without touching logic.

use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StepTiming {
    /// Settle delay between consecutive steps.
    pub inter_step_delay_ms: u64,

    /// Pause after clearing an editable root; some rich-text editors
    /// process the deletion asynchronously.
    pub clear_settle_ms: u64,

    /// Poll interval while waiting for an element to appear.
    pub appearance_poll_ms: u64,

    /// Give-up threshold for element appearance.
    pub appearance_timeout_ms: u64,

    /// Poll interval while waiting for the result count to grow.
    pub results_poll_ms: u64,

    /// Give-up threshold for result-count growth.
    pub results_timeout_ms: u64,
}

impl Default for StepTiming {
    fn default() -> Self {
        Self {
            inter_step_delay_ms: 300,
            clear_settle_ms: 100,
            appearance_poll_ms: 100,
            appearance_timeout_ms: 10_000,
            results_poll_ms: 500,
            results_timeout_ms: 60_000,
        }
    }
}

impl StepTiming {
    pub fn inter_step_delay(&self) -> Duration {
        Duration::from_millis(self.inter_step_delay_ms)
    }

    pub fn clear_settle(&self) -> Duration {
        Duration::from_millis(self.clear_settle_ms)
    }

    pub fn appearance_poll(&self) -> Duration {
        Duration::from_millis(self.appearance_poll_ms)
    }

    pub fn appearance_timeout(&self) -> Duration {
        Duration::from_millis(self.appearance_timeout_ms)
    }

    pub fn results_poll(&self) -> Duration {
        Duration::from_millis(self.results_poll_ms)
    }

    pub fn results_timeout(&self) -> Duration {
        Duration::from_millis(self.results_timeout_ms)
    }
}
