//! CLI module for vitalsdb
//!
//! Provides command-line interface for:
//! - init: Create the data directory and an empty store
//! - start: Open the store and serve stdin requests until end of input
//! - exec: One-shot request execution

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command, DEFAULT_CONFIG_PATH};
pub use commands::{exec, init, run, run_command, serve, start, Config};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{read_request, write_json};
