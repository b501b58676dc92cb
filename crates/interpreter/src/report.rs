//! Per-run execution report

use autoflow_core_types::RunId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Summary of one workflow run, success or aborted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: RunId,

    pub ok: bool,

    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub started_at: DateTime<Utc>,

    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub finished_at: DateTime<Utc>,

    pub latency_ms: u64,

    /// Steps completed before success or abort.
    pub steps_executed: usize,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RunReport {
    pub fn new(run_id: RunId) -> Self {
        let now = Utc::now();
        Self {
            run_id,
            ok: false,
            started_at: now,
            finished_at: now,
            latency_ms: 0,
            steps_executed: 0,
            error: None,
        }
    }

    pub fn with_success(mut self) -> Self {
        self.ok = true;
        self
    }

    pub fn with_error(mut self, error: String) -> Self {
        self.ok = false;
        self.error = Some(error);
        self
    }

    pub fn with_steps_executed(mut self, steps: usize) -> Self {
        self.steps_executed = steps;
        self
    }

    /// Stamp the finish time and derive latency.
    pub fn finish(mut self) -> Self {
        self.finished_at = Utc::now();
        self.latency_ms = (self.finished_at - self.started_at)
            .num_milliseconds()
            .max(0) as u64;
        self
    }
}
