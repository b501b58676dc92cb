use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use autoflow_batch::{BatchEvent, BatchMode, BatchOrchestrator};
use autoflow_interpreter::StepInterpreter;
use autoflow_registry::WorkflowRegistry;
use autoflow_relay::Relay;
use tokio::fs;
use tracing::info;

use crate::cli::{dom::build_dom, BatchArgs, BatchModeOpt, OutputFormat};
use crate::config::AppConfig;

pub async fn cmd_batch(args: BatchArgs, config: &AppConfig, output: OutputFormat) -> Result<()> {
    let input = fs::read_to_string(&args.input)
        .await
        .with_context(|| format!("failed to read prompts from {}", args.input.display()))?;

    let mut batch_config = config.batch.clone();
    if let Some(mode) = args.mode {
        batch_config.mode = match mode {
            BatchModeOpt::Sequential => BatchMode::Sequential,
            BatchModeOpt::Staggered => BatchMode::Staggered,
        };
    }
    if let Some(delay) = args.delay {
        batch_config = batch_config.with_delay_secs(delay);
    }

    let registry = Arc::new(WorkflowRegistry::builtin());
    let workflows = [
        &batch_config.submit_workflow,
        &batch_config.download_workflow,
        &batch_config.combined_workflow,
    ]
    .into_iter()
    .map(|id| {
        registry
            .get(id)
            .ok_or_else(|| anyhow!("unknown workflow: {id}"))
    })
    .collect::<Result<Vec<_>>>()?;

    let mut browser = config.browser.clone();
    if let Some(ws_url) = args.ws_url {
        browser.ws_url = ws_url;
    }
    if let Some(page_url) = args.page_url {
        browser.page_url = page_url;
    }

    // Staggered offsets reach (n-1) * results_per_prompt + the per-run
    // indices, so the dry-run document needs a deep clickable list.
    let prompt_count = input.lines().filter(|l| !l.trim().is_empty()).count();
    let clickable_slots = (prompt_count + 1) * batch_config.results_per_prompt;
    let dom = build_dom(&browser, args.dry_run, &workflows, clickable_slots).await?;

    let interpreter = StepInterpreter::new(dom).with_timing(config.timing.clone());
    let (relay, _relay_task) = Relay::spawn(interpreter);

    let orchestrator = BatchOrchestrator::new(relay, registry, batch_config);
    let mut events = orchestrator.subscribe();

    let printer = match output {
        OutputFormat::Human => Some(tokio::spawn(async move {
            while let Ok(event) = events.recv().await {
                match event {
                    BatchEvent::ItemStarted { index, progress } => {
                        println!("[{}/{}] prompt {index} started", progress.current, progress.total)
                    }
                    BatchEvent::ItemCompleted { index, progress } => {
                        println!("[{}/{}] prompt {index} completed", progress.current, progress.total)
                    }
                    BatchEvent::ItemFailed {
                        index,
                        error,
                        progress,
                    } => println!(
                        "[{}/{}] prompt {index} failed: {error}",
                        progress.current, progress.total
                    ),
                    BatchEvent::Finished { .. } => break,
                }
            }
        })),
        OutputFormat::Json => None,
    };

    info!(prompts = prompt_count, "starting batch run");
    let summary = orchestrator.run(&input).await?;

    if let Some(printer) = printer {
        let _ = printer.await;
    }

    match output {
        OutputFormat::Json => {
            let items = orchestrator.items();
            println!(
                "{}",
                serde_json::to_string_pretty(&serde_json::json!({
                    "total": summary.total,
                    "completed": summary.completed,
                    "failed": summary.failed,
                    "items": items,
                }))?
            );
        }
        OutputFormat::Human => println!(
            "batch finished: {} completed, {} failed of {}",
            summary.completed, summary.failed, summary.total
        ),
    }

    if summary.failed > 0 {
        return Err(anyhow!("{} of {} prompts failed", summary.failed, summary.total));
    }
    Ok(())
}
