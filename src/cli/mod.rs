use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};

use crate::config::AppConfig;

mod batch;
mod dom;
mod run;
pub mod runtime;
mod workflows;

/// Autoflow - declarative workflow automation for AI generation sites
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Log level
    #[arg(short, long, default_value = "info")]
    pub log_level: String,

    /// Enable debug mode
    #[arg(short, long)]
    pub debug: bool,

    /// Output format
    #[arg(short, long, default_value = "human")]
    pub output: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Human,
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Execute one workflow against a live page
    Run(RunArgs),

    /// Run a batch of prompts through a workflow
    Batch(BatchArgs),

    /// List registered workflow templates
    Workflows(WorkflowsArgs),
}

#[derive(Args)]
pub struct RunArgs {
    /// Workflow id to execute (see `autoflow workflows`)
    #[arg(short, long)]
    pub workflow: String,

    /// Prompt text substituted into the workflow's fill steps
    #[arg(short, long)]
    pub prompt: Option<String>,

    /// Override the DevTools websocket endpoint
    #[arg(long)]
    pub ws_url: Option<String>,

    /// Override the page URL fragment used to pick the target tab
    #[arg(long)]
    pub page_url: Option<String>,

    /// Run against an in-memory document instead of a browser
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Args)]
pub struct BatchArgs {
    /// File with one prompt per line
    pub input: PathBuf,

    /// Orchestration mode
    #[arg(long, value_enum)]
    pub mode: Option<BatchModeOpt>,

    /// Seconds to pause between prompts or launches
    #[arg(long)]
    pub delay: Option<u64>,

    /// Override the DevTools websocket endpoint
    #[arg(long)]
    pub ws_url: Option<String>,

    /// Override the page URL fragment used to pick the target tab
    #[arg(long)]
    pub page_url: Option<String>,

    /// Run against an in-memory document instead of a browser
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum BatchModeOpt {
    Sequential,
    Staggered,
}

#[derive(Args)]
pub struct WorkflowsArgs {
    /// Only list workflows for the given site
    #[arg(long)]
    pub site: Option<String>,
}

pub async fn dispatch(command: Commands, config: &AppConfig, output: OutputFormat) -> Result<()> {
    match command {
        Commands::Run(args) => run::cmd_run(args, config, output).await,
        Commands::Batch(args) => batch::cmd_batch(args, config, output).await,
        Commands::Workflows(args) => workflows::cmd_workflows(args, output),
    }
}
