//! B1 cleanup handler - HTTP endpoint that tidies B1 item groups.

mod app;
mod errors;
mod handler;

use std::path::PathBuf;

use clap::Parser;
use cleanup_config_and_utils::{init_logging, Config};

/// B1 cleanup handler command-line interface.
#[derive(Parser)]
#[command(name = "b1-cleanup-handler")]
#[command(about = "Moves marked B1 items into one group and prunes emptied groups")]
#[command(version)]
struct Cli {
    /// Address to listen on
    #[arg(long, default_value = "0.0.0.0:3000", env = "B1_CLEANUP_BIND")]
    bind: String,

    /// JSON config file; B1_* environment variables override it
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error); overrides the config
    #[arg(short, long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(cli.config.as_deref())?;

    // Initialize logging
    let level = cli.log_level.as_deref().unwrap_or(&config.log_level);
    init_logging(level, &config.log_format);

    app::serve(config, &cli.bind).await?;

    Ok(())
}
