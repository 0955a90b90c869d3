//! # urtree
//!
//! Batch computation of per-post reply-tree and ur-tree statistics.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │                    apps/urtree (THE BINARY)                   │
//! │                                                               │
//! │  ┌───────────┐    ┌────────────────┐    ┌─────────────────┐  │
//! │  │ producer  │───▶│ runner         │───▶│ sink            │  │
//! │  │ (JSONL)   │    │ (tokio tasks)  │    │ (JSONL / redb)  │  │
//! │  └───────────┘    └───────┬────────┘    └─────────────────┘  │
//! │                           ▼                                   │
//! │                   ┌───────────────┐                           │
//! │                   │  urtree-core  │                           │
//! │                   │  (THE LOGIC)  │                           │
//! │                   └───────────────┘                           │
//! └───────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! urtree stats -i posts.jsonl -o stats.jsonl
//! urtree stats -i posts.jsonl -o stats.redb -t redb --workers 8
//! urtree show -D stats.redb --tweet 1234
//! urtree columns
//! ```

mod cli;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

#[tokio::main]
async fn main() {
    let cli = cli::Cli::parse();

    // URTREE_LOG_FORMAT=json enables machine-parseable output. Logs go to
    // stderr; stdout may carry results.
    let log_format = std::env::var("URTREE_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let default_filter = if cli.verbose {
        "urtree=debug,urtree_core=debug"
    } else {
        "urtree=info,urtree_core=info"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(std::io::stderr),
                )
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }

    if let Err(e) = cli::execute(cli).await {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}
