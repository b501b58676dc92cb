use anyhow::Result;
use clap::Parser;
use tracing::{error, info};

use autoflow_cli::cli::{self, runtime, Cli};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    runtime::init_logging(&cli.log_level, cli.debug)?;

    info!("Starting Autoflow v{}", env!("CARGO_PKG_VERSION"));

    let loaded = runtime::load_config(cli.config.as_ref()).await?;

    match cli::dispatch(cli.command, &loaded.config, cli.output).await {
        Ok(()) => {
            info!("Command completed successfully");
            Ok(())
        }
        Err(e) => {
            error!("Command failed: {}", e);
            std::process::exit(1);
        }
    }
}
