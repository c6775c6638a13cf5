//! CLI argument parsing.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use duebell_core::Config;

/// Time-triggered task reminder dispatcher.
#[derive(Parser, Debug)]
#[command(name = "duebell", version, about)]
pub struct Cli {
    /// Path to the JSON tasks file (overrides DUEBELL_TASKS_FILE).
    #[arg(long, global = true)]
    pub tasks_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the HTTP trigger and the periodic timer (default).
    Serve {
        /// Listen port (overrides PORT).
        #[arg(long)]
        port: Option<u16>,

        /// Timer period in seconds (overrides DUEBELL_TICK_INTERVAL_SECS).
        #[arg(long)]
        tick_secs: Option<u64>,

        /// Serve the HTTP trigger only, without the periodic timer.
        #[arg(long)]
        no_timer: bool,
    },

    /// Run a single pass and print the summary as JSON.
    RunOnce {
        /// Evaluate as of this instant (ISO-8601) instead of now.
        #[arg(long)]
        at: Option<String>,
    },

    /// Print the effective (redacted) configuration and validate it.
    CheckConfig,
}

impl Cli {
    /// Apply flag overrides on top of env-derived config.
    pub fn apply_overrides(&self, config: &mut Config) {
        if let Some(path) = &self.tasks_file {
            config.store.tasks_file = path.clone();
        }
        if let Some(Command::Serve { port, tick_secs, .. }) = &self.command {
            if let Some(port) = port {
                config.server.port = *port;
            }
            if let Some(secs) = tick_secs {
                config.dispatch.tick_interval_secs = *secs;
            }
        }
    }
}
