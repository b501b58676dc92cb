//! Batch execution strategies

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use autoflow_core_types::{
    BatchProgress, PromptItem, PromptStatus, RunMetadata, RunPhase, Workflow,
};
use autoflow_registry::WorkflowRegistry;
use autoflow_relay::RelayHandle;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio::task::JoinSet;
use tokio::time::sleep;
use tracing::{info, warn};

use crate::{
    builder::{offset_download_indices, parse_prompts, substitute_prompt},
    errors::BatchError,
    events::BatchEvent,
};
use std::time::Duration;

/// Orchestration strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchMode {
    /// One prompt at a time: submit, fixed generation wait, download.
    Sequential,

    /// All prompts launched with staggered starts, each running one
    /// combined generate-and-download workflow.
    Staggered,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    pub mode: BatchMode,

    /// Pause between prompts (sequential) or between launches (staggered).
    pub delay_between_prompts_ms: u64,

    /// Unconditional wait between submit and download in sequential mode.
    pub generation_wait_ms: u64,

    /// Result entries each completed prompt prepends to the shared list.
    pub results_per_prompt: usize,

    pub submit_workflow: String,
    pub download_workflow: String,
    pub combined_workflow: String,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            mode: BatchMode::Sequential,
            delay_between_prompts_ms: 2_000,
            generation_wait_ms: 20_000,
            results_per_prompt: autoflow_registry::META_AI_RESULTS_PER_PROMPT,
            submit_workflow: "meta-ai-submit-only".to_string(),
            download_workflow: "meta-ai-download-only".to_string(),
            combined_workflow: "meta-ai-generate-download".to_string(),
        }
    }
}

impl BatchConfig {
    /// The user-facing delay setting is whole seconds.
    pub fn with_delay_secs(mut self, secs: u64) -> Self {
        self.delay_between_prompts_ms = secs * 1_000;
        self
    }

    pub fn delay_between_prompts(&self) -> Duration {
        Duration::from_millis(self.delay_between_prompts_ms)
    }

    pub fn generation_wait(&self) -> Duration {
        Duration::from_millis(self.generation_wait_ms)
    }
}

/// Counts reported once per batch, after every item settles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchSummary {
    pub total: usize,
    pub completed: usize,
    pub failed: usize,
}

/// Shared item store: transitions are applied here and every transition
/// emits one progress event. Clones share state with their origin.
#[derive(Clone)]
struct ItemBoard {
    items: Arc<Mutex<Vec<PromptItem>>>,
    events: broadcast::Sender<BatchEvent>,
}

impl ItemBoard {
    fn transition(&self, index: usize, status: PromptStatus, error: Option<String>) -> BatchProgress {
        let mut items = self.items.lock();
        let item = &mut items[index];
        if !item.status.can_transition_to(status) {
            warn!(index, from = %item.status, to = %status, "ignoring invalid status transition");
            return BatchProgress::from_items(&items);
        }
        item.status = status;
        item.error = error;
        BatchProgress::from_items(&items)
    }

    fn start(&self, index: usize) {
        let progress = self.transition(index, PromptStatus::Processing, None);
        let _ = self.events.send(BatchEvent::ItemStarted { index, progress });
    }

    fn complete(&self, index: usize) {
        let progress = self.transition(index, PromptStatus::Completed, None);
        let _ = self
            .events
            .send(BatchEvent::ItemCompleted { index, progress });
    }

    fn fail(&self, index: usize, error: String) {
        let progress = self.transition(index, PromptStatus::Error, Some(error.clone()));
        let _ = self.events.send(BatchEvent::ItemFailed {
            index,
            error,
            progress,
        });
    }

    fn text(&self, index: usize) -> String {
        self.items.lock()[index].text.clone()
    }
}

/// Runs one workflow per prompt item via the relay.
pub struct BatchOrchestrator {
    relay: RelayHandle,
    registry: Arc<WorkflowRegistry>,
    config: BatchConfig,
    board: ItemBoard,
    running: Arc<AtomicBool>,
}

impl BatchOrchestrator {
    pub fn new(relay: RelayHandle, registry: Arc<WorkflowRegistry>, config: BatchConfig) -> Self {
        let (events, _) = broadcast::channel(256);
        Self {
            relay,
            registry,
            config,
            board: ItemBoard {
                items: Arc::new(Mutex::new(Vec::new())),
                events,
            },
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Subscribe to per-item transitions and the terminal event.
    pub fn subscribe(&self) -> broadcast::Receiver<BatchEvent> {
        self.board.events.subscribe()
    }

    /// Snapshot of the current items.
    pub fn items(&self) -> Vec<PromptItem> {
        self.board.items.lock().clone()
    }

    /// Derived counters for the current items.
    pub fn progress(&self) -> BatchProgress {
        BatchProgress::from_items(&self.board.items.lock())
    }

    /// Run a full batch. Returns once every launched run has settled;
    /// the terminal event has fired by then.
    pub async fn run(&self, input: &str) -> Result<BatchSummary, BatchError> {
        if self
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(BatchError::AlreadyRunning);
        }

        let result = self.run_inner(input).await;
        self.running.store(false, Ordering::SeqCst);
        result
    }

    async fn run_inner(&self, input: &str) -> Result<BatchSummary, BatchError> {
        // Reject bad input and missing templates before any run starts.
        let prompts = parse_prompts(input)?;
        let total = prompts.len();
        *self.board.items.lock() = prompts;

        info!(total, mode = ?self.config.mode, "starting batch");

        match self.config.mode {
            BatchMode::Sequential => self.run_sequential(total).await,
            BatchMode::Staggered => self.run_staggered(total).await,
        }?;

        let summary = self.summarize(total);
        info!(
            completed = summary.completed,
            failed = summary.failed,
            "batch finished"
        );
        let _ = self.board.events.send(BatchEvent::Finished {
            completed: summary.completed,
            failed: summary.failed,
        });
        Ok(summary)
    }

    fn lookup(&self, id: &str) -> Result<Workflow, BatchError> {
        self.registry
            .get(id)
            .cloned()
            .ok_or_else(|| BatchError::WorkflowNotFound(id.to_string()))
    }

    async fn run_sequential(&self, total: usize) -> Result<(), BatchError> {
        let submit = self.lookup(&self.config.submit_workflow)?;
        let download = self.lookup(&self.config.download_workflow)?;

        for index in 0..total {
            let text = self.board.text(index);
            self.board.start(index);

            match self.run_item_sequential(index, &text, &submit, &download).await {
                Ok(()) => self.board.complete(index),
                Err(error) => {
                    warn!(index, %error, "prompt failed");
                    self.board.fail(index, error);
                }
            }

            if index + 1 < total {
                sleep(self.config.delay_between_prompts()).await;
            }
        }
        Ok(())
    }

    async fn run_item_sequential(
        &self,
        index: usize,
        text: &str,
        submit: &Workflow,
        download: &Workflow,
    ) -> Result<(), String> {
        let steps = substitute_prompt(submit, text);
        self.dispatch(steps, index, text, RunPhase::Submit).await?;

        // No page signal marks generation done in this mode; the wait is
        // unconditional.
        sleep(self.config.generation_wait()).await;

        self.dispatch(download.steps.clone(), index, text, RunPhase::Download)
            .await
    }

    async fn dispatch(
        &self,
        steps: Vec<autoflow_core_types::Step>,
        index: usize,
        text: &str,
        phase: RunPhase,
    ) -> Result<(), String> {
        let metadata = RunMetadata {
            prompt_index: index,
            prompt_text: text.to_string(),
            phase,
        };
        match self.relay.execute(steps, Some(metadata)).await {
            Ok(reply) if reply.success => Ok(()),
            Ok(reply) => Err(reply
                .error
                .unwrap_or_else(|| "workflow execution failed".to_string())),
            Err(err) => Err(err.to_string()),
        }
    }

    async fn run_staggered(&self, total: usize) -> Result<(), BatchError> {
        let combined = self.lookup(&self.config.combined_workflow)?;
        let mut runs = JoinSet::new();

        for index in 0..total {
            let text = self.board.text(index);
            let mut steps = substitute_prompt(&combined, &text);
            // Later-launched prompts prepend their results above this
            // run's entries before it downloads.
            let offset = (total - 1 - index) * self.config.results_per_prompt;
            offset_download_indices(&mut steps, offset);

            let relay = self.relay.clone();
            let board = self.board.clone();
            let launch_delay = self.config.delay_between_prompts() * index as u32;

            runs.spawn(async move {
                sleep(launch_delay).await;
                board.start(index);

                let metadata = RunMetadata {
                    prompt_index: index,
                    prompt_text: text.clone(),
                    phase: RunPhase::Combined,
                };
                let outcome = match relay.execute(steps, Some(metadata)).await {
                    Ok(reply) if reply.success => Ok(()),
                    Ok(reply) => Err(reply
                        .error
                        .unwrap_or_else(|| "workflow execution failed".to_string())),
                    Err(err) => Err(err.to_string()),
                };

                match outcome {
                    Ok(()) => board.complete(index),
                    Err(error) => {
                        warn!(index, %error, "prompt failed");
                        board.fail(index, error);
                    }
                }
            });
        }

        while let Some(joined) = runs.join_next().await {
            if let Err(err) = joined {
                warn!(?err, "staggered run task panicked");
            }
        }
        Ok(())
    }

    fn summarize(&self, total: usize) -> BatchSummary {
        let items = self.board.items.lock();
        BatchSummary {
            total,
            completed: items
                .iter()
                .filter(|i| i.status == PromptStatus::Completed)
                .count(),
            failed: items
                .iter()
                .filter(|i| i.status == PromptStatus::Error)
                .count(),
        }
    }
}
