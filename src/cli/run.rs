use anyhow::{anyhow, Result};
use autoflow_batch::substitute_prompt;
use autoflow_interpreter::StepInterpreter;
use autoflow_registry::WorkflowRegistry;
use tracing::info;

use crate::cli::{dom::build_dom, OutputFormat, RunArgs};
use crate::config::AppConfig;

pub async fn cmd_run(args: RunArgs, config: &AppConfig, output: OutputFormat) -> Result<()> {
    let registry = WorkflowRegistry::builtin();
    let workflow = registry
        .get(&args.workflow)
        .ok_or_else(|| anyhow!("unknown workflow: {}", args.workflow))?;

    let mut browser = config.browser.clone();
    if let Some(ws_url) = args.ws_url {
        browser.ws_url = ws_url;
    }
    if let Some(page_url) = args.page_url {
        browser.page_url = page_url;
    }

    let dom = build_dom(
        &browser,
        args.dry_run,
        &[workflow],
        config.batch.results_per_prompt * 2,
    )
    .await?;

    let steps = match &args.prompt {
        Some(prompt) => substitute_prompt(workflow, prompt),
        None => workflow.steps.clone(),
    };

    info!(workflow = %workflow.id, steps = steps.len(), "executing workflow");

    let interpreter = StepInterpreter::new(dom).with_timing(config.timing.clone());
    let report = interpreter.execute(&steps, None).await?;

    match output {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Human => println!(
            "ok {} ({} steps, {} ms)",
            workflow.id, report.steps_executed, report.latency_ms,
        ),
    }

    Ok(())
}
