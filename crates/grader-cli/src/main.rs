//! Batch grader CLI
//!
//! Grades every `*.json` submission in a folder and writes one grade document
//! per submission into an output subfolder.
//!
//! # Usage
//!
//! ```bash
//! # Grade ./homework, writing ./homework/out/*.json out of 100 points
//! grade-assignments ./homework
//!
//! # Custom output folder and point ceiling
//! grade-assignments ./homework graded 50
//!
//! # Penalties from AG_*_PENALTY_PCT environment variables
//! grade-assignments ./homework --rubric-from-env
//! ```
//!
//! # Exit Codes
//!
//! - 0: Success - all submissions graded
//! - 3: Invalid input or arguments
//! - 4: File not found or inaccessible
//! - 5: Rubric or contract configuration error
//! - 10: Internal error

mod cli;
mod error;

use clap::Parser;
use cli::GradeCli;

fn main() {
    let cli = GradeCli::parse();

    let level = match (cli.quiet, cli.verbose) {
        (true, _) => tracing::Level::ERROR,
        (false, 0) => tracing::Level::WARN,
        (false, 1) => tracing::Level::INFO,
        (false, 2) => tracing::Level::DEBUG,
        (false, _) => tracing::Level::TRACE,
    };

    // Initialize tracing subscriber for logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let exit_code = cli::run_cli(cli);
    std::process::exit(exit_code.into());
}
