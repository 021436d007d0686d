//! # Bands Subcommand
//!
//! Lists the bands of a rate table in `(origin, min_weight)` order, the order
//! the resolver scans them in.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use landed_core::{OriginCountry, RateBand};

/// Arguments for the `landed bands` subcommand.
#[derive(Args, Debug)]
pub struct BandsArgs {
    /// Path to the rate table (YAML or JSON).
    #[arg(long, value_name = "FILE")]
    pub table: PathBuf,

    /// Only list bands for this origin (USA or UK).
    #[arg(long)]
    pub origin: Option<String>,

    /// Print JSON instead of one line per band.
    #[arg(long)]
    pub json: bool,
}

/// Return the table's bands, sorted, optionally filtered to one origin.
pub fn list_bands(args: &BandsArgs) -> Result<Vec<RateBand>> {
    let origin = args
        .origin
        .as_deref()
        .map(str::parse::<OriginCountry>)
        .transpose()
        .context("invalid --origin")?;

    let table = crate::load_table(&args.table)?;
    Ok(table
        .bands()
        .iter()
        .filter(|b| origin.map_or(true, |o| b.origin_country == o))
        .cloned()
        .collect())
}

/// Execute the bands subcommand.
pub fn run_bands(args: &BandsArgs) -> Result<u8> {
    let bands = list_bands(args)?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&bands)?);
    } else {
        for band in &bands {
            println!("{band}");
        }
    }
    Ok(0)
}
