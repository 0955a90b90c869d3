//! # urtree CLI Module
//!
//! ## Available Commands
//!
//! - `stats` - Compute statistics for every post in a JSON Lines file
//! - `show` - Print the stored statistics of one post
//! - `columns` - List output column names

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use urtree::{Order, OutputFormat};
use urtree_core::UrTreeError;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// urtree - reply-tree and ur-tree statistics
///
/// Reads posts grouped by conversation and writes, for every post, the
/// shape and engagement of the tree hanging below it.
#[derive(Parser, Debug)]
#[command(name = "urtree")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Compute statistics for every post in the input
    Stats {
        /// JSON Lines input, one post per line with its group_id
        #[arg(short, long)]
        input: PathBuf,

        /// Output path (stdout for jsonl when omitted; required for redb)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output format
        #[arg(short = 't', long, value_enum)]
        format: Option<OutputFormat>,

        /// Groups processed concurrently
        #[arg(short, long)]
        workers: Option<usize>,

        /// Output records per sink write
        #[arg(short, long)]
        batch_size: Option<usize>,

        /// Record order inside each group
        #[arg(long, value_enum)]
        order: Option<Order>,

        /// TOML configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Print the stored statistics of one post
    Show {
        /// Path to a redb result database
        #[arg(short = 'D', long)]
        database: PathBuf,

        /// Tweet id to look up
        #[arg(short, long)]
        tweet: u64,
    },

    /// List output column names in record order
    Columns,
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub async fn execute(cli: Cli) -> Result<(), UrTreeError> {
    let json_mode = cli.json_mode;

    match cli.command {
        Commands::Stats {
            input,
            output,
            format,
            workers,
            batch_size,
            order,
            config,
        } => {
            let overrides = urtree::Overrides {
                workers,
                batch_size,
                order,
                format,
            };
            cmd_stats(
                &input,
                output.as_deref(),
                config.as_deref(),
                &overrides,
                json_mode,
            )
            .await
        }
        Commands::Show { database, tweet } => cmd_show(&database, tweet, json_mode),
        Commands::Columns => cmd_columns(json_mode),
    }
}
