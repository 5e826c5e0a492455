//! Command-line interface built on clap.
//!
//! [`Cli`] carries the global flags (`--config`, `--verbose`) and a
//! [`Command`]: `show` for the full stage overview, `summary` for counts and
//! rerun gating only.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};

use crate::stage::JobFilter;

/// stage-progress: job progress bars and stage summaries from a stage's job
/// transition history.
#[derive(Debug, Parser)]
#[command(name = "stage-progress", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Path to a TOML config file. Defaults to ./stage-progress.toml if present.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug logging.
    #[arg(long, short, global = true, default_value_t = false)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Render every job's progress bar plus the stage summary.
    Show {
        /// Stage JSON as served by the stage API.
        #[arg(long)]
        stage: PathBuf,

        /// JSON array of `{uuid, hostname}` agents.
        #[arg(long)]
        agents: Option<PathBuf>,

        /// Reference time for in-flight jobs (RFC 3339). Defaults to now.
        #[arg(long)]
        now: Option<DateTime<Utc>>,

        /// Job selected for "Rerun Selected". Repeatable.
        #[arg(long = "select")]
        select: Vec<String>,

        /// Show the tooltip of this job, as if the pointer were over its bar.
        #[arg(long)]
        hover: Option<String>,

        /// Only show jobs in this bucket: all, building, passed, failed, cancelled.
        #[arg(long, default_value = "all")]
        filter: JobFilter,

        /// Print the overview as JSON instead of drawing it.
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Print job counts and rerun button state.
    Summary {
        #[arg(long)]
        stage: PathBuf,

        #[arg(long = "select")]
        select: Vec<String>,
    },
}
