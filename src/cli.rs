// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, Subcommand, ValueEnum};

use crate::model::{ActivityId, RelationshipId, RelationshipType};

/// Command-line arguments for `schedgraph`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "schedgraph",
    version,
    about = "Maintain a project schedule as a precedence graph.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// A missing file means built-in defaults.
    #[arg(long, value_name = "PATH", default_value = "Schedgraph.toml", global = true)]
    pub config: String,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `SCHEDGRAPH_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL", global = true)]
    pub log_level: Option<LogLevel>,

    /// Print results as JSON instead of text.
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Create an activity.
    AddActivity {
        #[arg(long)]
        name: String,

        #[arg(long, default_value = "")]
        description: String,

        /// A number, or tri(a,m,b) / pert(a,m,b) / uniform(a,b) / normal(mu,sigma).
        #[arg(long)]
        duration: String,
    },

    /// Create a relationship between two activities.
    AddRelationship {
        /// FS, SS, FF or SF.
        #[arg(long = "type", value_name = "TYPE", default_value = "FS")]
        relationship_type: RelationshipType,

        #[arg(long)]
        predecessor: ActivityId,

        #[arg(long)]
        successor: ActivityId,

        /// Negative values are leads.
        #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
        lag: f64,
    },

    /// Delete an activity and every relationship attached to it.
    DeleteActivity { id: ActivityId },

    DeleteRelationship { id: RelationshipId },

    /// Remove an activity, reconnecting its predecessors to its successors.
    Dissolve { id: ActivityId },

    /// Print the longest path through the schedule.
    CriticalPath,

    /// List indexed activities and relationships.
    List,

    /// Compare both stores and report inconsistencies.
    Audit,

    /// Ping both stores.
    Status,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
