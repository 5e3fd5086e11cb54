//! CLI command definitions.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Storyloom - a collaborative story woven from live wiki edits
#[derive(Parser, Debug)]
#[command(name = "storyloom")]
#[command(about = "A collaborative story woven from live wiki edits", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file layered over the defaults
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Log as JSON lines
    #[arg(long, global = true)]
    pub json_logs: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Poll on a timer, reveal new phrases and serve the HTTP API
    Serve {
        /// Listen address, overriding `server.bind`
        #[arg(long)]
        bind: Option<String>,
    },

    /// Run a single poll cycle and print the accepted phrases
    Cycle,

    /// Print the stored story, one phrase per line
    Story {
        /// Print phrases with their sources as JSON
        #[arg(long)]
        json: bool,
    },

    /// Clear the story, cursor and used-phrase set
    Reset,
}
