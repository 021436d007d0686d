//! # landed CLI entry point
//!
//! Parses command-line arguments and dispatches to subcommand handlers.

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use landed_cli::bands::{run_bands, BandsArgs};
use landed_cli::check::{run_check, CheckArgs};
use landed_cli::quote::{run_quote, QuoteArgs};

/// Landed-cost rate table toolchain.
///
/// Quotes parcels offline, checks rate tables for overlapping bands, and
/// lists bands in resolution order.
#[derive(Parser, Debug)]
#[command(name = "landed", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Compute a landed-cost quote against a rate table.
    Quote(QuoteArgs),

    /// Run the overlap validator over every band in a rate table.
    Check(CheckArgs),

    /// List bands in origin and weight order.
    Bands(BandsArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Quote(args) => run_quote(&args),
        Commands::Check(args) => run_check(&args),
        Commands::Bands(args) => run_bands(&args),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}
