//! CLI argument definitions using clap
//!
//! Commands:
//! - vitalsdb init --config <path>
//! - vitalsdb start --config <path>
//! - vitalsdb exec --config <path>

use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub const DEFAULT_CONFIG_PATH: &str = "./vitalsdb.json";

/// vitalsdb - validated patient records with derived body-mass metrics
#[derive(Parser, Debug)]
#[command(name = "vitalsdb")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create the data directory and an empty record store
    Init {
        /// Path to configuration file
        #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
        config: PathBuf,
    },

    /// Serve JSON requests from stdin, one per line
    Start {
        /// Path to configuration file
        #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
        config: PathBuf,
    },

    /// Execute a single request from stdin and exit
    Exec {
        /// Path to configuration file
        #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
        config: PathBuf,
    },
}

impl Cli {
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
