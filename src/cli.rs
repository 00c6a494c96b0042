//! CLI argument parsing using clap v4
//!
//! Defines the command-line interface for fleetwatch.

use clap::{Parser, Subcommand};

/// fleetwatch - fleet status aggregator
///
/// Polls a set of peer agents for health, recent exchanges and shared
/// tasks, and keeps one consistent snapshot of the fleet and its mesh.
#[derive(Parser, Debug)]
#[command(name = "fleetwatch")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the aggregator until interrupted
    Run {
        /// Path to configuration file
        #[arg(short, long, env = "FLEETWATCH_CONFIG")]
        config: Option<String>,

        /// Serve the HTTP query API on this address (enables the API)
        #[arg(long)]
        listen: Option<String>,

        /// Auto-refresh interval in milliseconds
        #[arg(long)]
        interval_ms: Option<u64>,

        /// Do not start auto-refresh; rounds run only on request
        #[arg(long)]
        no_auto_refresh: bool,
    },

    /// Run a single round and print the snapshot as JSON
    Snapshot {
        /// Path to configuration file
        #[arg(short, long, env = "FLEETWATCH_CONFIG")]
        config: Option<String>,

        /// Extra peer address to include for this round (repeatable)
        #[arg(long = "peer", value_name = "URL")]
        peers: Vec<String>,

        /// Print the topology (layout and edges) instead of the snapshot
        #[arg(long)]
        topology: bool,

        /// Pretty-print the JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// Display version and build information
    Version {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },
}

/// Configuration subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum ConfigSubcommand {
    /// Display the current configuration
    Show {
        /// Path to configuration file
        #[arg(short, long)]
        config: Option<String>,
    },

    /// Initialize a new configuration file
    Init {
        /// Path where to create the config file
        #[arg(short, long)]
        path: Option<String>,

        /// Overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },

    /// Validate a configuration file
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        config: Option<String>,
    },
}
