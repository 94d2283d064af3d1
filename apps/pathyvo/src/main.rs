//! # Pathyvo - Terminal Client
//!
//! Command-line client for the Pathyvo career-mentoring backend.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │                apps/pathyvo (THE BINARY)             │
//! │                                                      │
//! │  ┌──────────┐    ┌──────────────┐    ┌───────────┐   │
//! │  │   CLI    │───►│ RoadmapView  │───►│ ApiClient │───┼──► REST API
//! │  │  (clap)  │    │ (re-fetch)   │    │ (reqwest) │   │
//! │  └──────────┘    └──────┬───────┘    └───────────┘   │
//! │                         ▼                            │
//! │                 ┌───────────────┐                    │
//! │                 │ pathyvo-core  │                    │
//! │                 │  (THE LOGIC)  │                    │
//! │                 └───────────────┘                    │
//! └──────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! pathyvo login --email ada@example.com
//! pathyvo dashboard
//! pathyvo roadmap show 12
//! pathyvo roadmap complete 12 102
//! ```

use clap::Parser;
use pathyvo::cli;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

#[tokio::main]
async fn main() {
    let cli = cli::Cli::parse();

    // PATHYVO_LOG_FORMAT=json enables machine-parseable logs. Logs go to
    // stderr; stdout carries command output.
    let log_format = std::env::var("PATHYVO_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let default_filter = if cli.verbose {
        "pathyvo=debug"
    } else if cli.quiet {
        "pathyvo=warn"
    } else {
        "pathyvo=info"
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

    if !cli.quiet && !cli.json_mode {
        print_banner();
    }

    if let Err(e) = cli::execute(cli).await {
        tracing::error!("Error: {}", e);
        if e.needs_login() {
            eprintln!("Run `pathyvo login --email <EMAIL>` to sign in.");
        }
        std::process::exit(1);
    }
}

/// Print the Pathyvo banner.
fn print_banner() {
    println!("Pathyvo v{}", env!("CARGO_PKG_VERSION"));
    println!();
}
