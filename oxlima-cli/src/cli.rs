//! Command-line argument parsing.

use clap::{Parser, Subcommand};

/// oxlima - manage Linux virtual machines
#[derive(Parser, Debug)]
#[command(name = "oxlima")]
#[command(about = "oxlima - manage Linux virtual machines")]
#[command(version)]
pub struct Args {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "warn")]
    pub log_level: String,

    /// Register the in-memory mock driver (development mode)
    #[arg(long)]
    pub dev: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List instances and their status
    List {
        /// Emit machine-readable JSON
        #[arg(long)]
        json: bool,

        /// Only print instance names
        #[arg(short, long)]
        quiet: bool,
    },

    /// List disk names
    Disks,

    /// Print the data directory, or an instance directory
    Dir {
        /// Instance name
        name: Option<String>,
    },

    /// Check the integrity of the data directory
    Validate,

    /// Show registered drivers and whether each is usable on this host
    Info,
}
