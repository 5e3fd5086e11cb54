//! Storyloom CLI binary.
//!
//! - `serve`: poll on a timer, reveal phrases on the console, serve HTTP
//! - `cycle`: run one poll cycle and print what was accepted
//! - `story`: print the stored story
//! - `reset`: clear story, cursor and used-set

use clap::Parser;
use storyloom_core::{TelemetryConfig, init_telemetry, shutdown_telemetry};

mod cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    use cli::{Cli, Commands, print_story, reset_story, run_once, serve};

    // Load .env before anything reads the API key
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let telemetry = TelemetryConfig {
        level: if cli.verbose { "debug" } else { "info" }.to_string(),
        json: cli.json_logs,
    };
    init_telemetry(&telemetry)
        .map_err(|e| anyhow::anyhow!("Failed to initialise logging: {}", e))?;

    let config = storyloom_bot::StoryloomConfig::load(cli.config.as_deref())?;

    let result = match cli.command {
        Commands::Serve { bind } => serve(config, bind).await,
        Commands::Cycle => run_once(config).await,
        Commands::Story { json } => print_story(config, json).await,
        Commands::Reset => reset_story(config).await,
    };

    shutdown_telemetry();
    result
}
