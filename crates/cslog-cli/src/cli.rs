//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Coding assistant session log inspector.
///
/// Parses JSONL session logs and reports conversation structure, cost and
/// tool usage per session or per project.
#[derive(Debug, Parser)]
#[command(name = "cslog", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Summarize a single session log file.
    Session {
        /// Path to the `.jsonl` session file.
        path: PathBuf,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Summarize every session of a project.
    Project {
        /// Project directory, encoded project id (e.g. -home-dev-app), or
        /// the working directory the sessions were recorded in.
        #[arg(allow_hyphen_values = true)]
        target: String,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// List projects under the configured projects directory.
    Projects {
        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },
}
