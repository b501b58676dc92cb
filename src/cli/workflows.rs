use anyhow::{anyhow, Result};
use autoflow_core_types::Site;
use autoflow_registry::WorkflowRegistry;

use crate::cli::{OutputFormat, WorkflowsArgs};

pub fn cmd_workflows(args: WorkflowsArgs, output: OutputFormat) -> Result<()> {
    let registry = WorkflowRegistry::builtin();

    let site = match args.site.as_deref() {
        None => None,
        Some("meta-ai") => Some(Site::MetaAi),
        Some("flow-veo") => Some(Site::FlowVeo),
        Some(other) => return Err(anyhow!("unknown site: {other}")),
    };

    let workflows: Vec<_> = match site {
        Some(site) => registry.for_site(site).collect(),
        None => registry.all().iter().collect(),
    };

    match output {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&workflows)?),
        OutputFormat::Human => {
            for workflow in workflows {
                println!(
                    "{:<28} {:<10} {:>2} steps  {}",
                    workflow.id,
                    workflow.site,
                    workflow.steps.len(),
                    workflow.description,
                );
            }
        }
    }

    Ok(())
}
