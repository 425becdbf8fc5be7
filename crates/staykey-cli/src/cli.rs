//! Command-line interface definition.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// staykey - short-term-rental calendar reconciliation and check-in tooling
#[derive(Debug, Parser)]
#[command(name = "staykey")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable debug output
    #[arg(long, short = 'v')]
    pub debug: bool,

    /// Emit logs as JSON
    #[arg(long)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Decode a calendar file and print its events
    Decode {
        /// Path to an .ics file
        file: PathBuf,

        /// Print events as JSON instead of a table
        #[arg(long)]
        json: bool,

        /// Include events that already ended
        #[arg(long)]
        all: bool,
    },

    /// Run a one-shot reconciliation over the apartments in a config file
    Sync {
        /// Path to the staykey.toml config file
        #[arg(long, short, env = "STAYKEY_CONFIG")]
        config: PathBuf,

        /// Only sync the apartment with this name
        #[arg(long)]
        apartment: Option<String>,
    },
}
