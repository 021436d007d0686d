//! # Check Subcommand
//!
//! Runs the overlap validator over every band of a rate table in document
//! order, exactly as the API would have accepted them one write at a time,
//! and reports every rejection. Categories and configuration are validated
//! too.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use landed_core::{RateTable, TableDocument, TableError};

/// Arguments for the `landed check` subcommand.
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Path to the rate table (YAML or JSON).
    #[arg(long, value_name = "FILE")]
    pub table: PathBuf,
}

/// Collect every problem in `doc`: band rejections first, then the first
/// category or configuration error.
pub fn table_problems(doc: &TableDocument) -> Vec<TableError> {
    let mut problems = doc.band_conflicts();
    let without_bands = TableDocument {
        bands: Vec::new(),
        ..doc.clone()
    };
    if let Err(e) = RateTable::from_document(without_bands) {
        problems.push(e);
    }
    problems
}

/// Execute the check subcommand.
///
/// Returns exit code: 0 if the table is valid, 1 if any problem was found.
pub fn run_check(args: &CheckArgs) -> Result<u8> {
    let doc = crate::load_document(&args.table)?;
    let problems = table_problems(&doc);

    if problems.is_empty() {
        println!(
            "OK: {} bands, {} categories",
            doc.bands.len(),
            doc.categories.len()
        );
        return Ok(0);
    }

    for problem in &problems {
        println!("  FAIL: {problem}");
    }
    println!(
        "{} problem(s) found in {}",
        problems.len(),
        args.table.display()
    );
    tracing::warn!(problems = problems.len(), "rate table check failed");
    Ok(1)
}
