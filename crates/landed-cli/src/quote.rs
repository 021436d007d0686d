//! # Quote Subcommand
//!
//! Computes a landed-cost quote offline against a rate table file, using the
//! same request parsing and calculation as the HTTP calculator.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use landed_core::{breakdown, CalculationRequest};
use serde_json::Value;

/// Arguments for the `landed quote` subcommand.
#[derive(Args, Debug)]
pub struct QuoteArgs {
    /// Path to the rate table (YAML or JSON).
    #[arg(long, value_name = "FILE")]
    pub table: PathBuf,

    /// Origin country code (USA or UK).
    #[arg(long)]
    pub origin: String,

    /// Category name, matched exactly.
    #[arg(long)]
    pub category: String,

    /// Actual weight in kilograms.
    #[arg(long)]
    pub weight: String,

    /// Parcel length in centimetres.
    #[arg(long)]
    pub length: Option<String>,

    /// Parcel width in centimetres.
    #[arg(long)]
    pub width: Option<String>,

    /// Parcel height in centimetres.
    #[arg(long)]
    pub height: Option<String>,

    /// Declared value of the goods.
    #[arg(long)]
    pub item_value: Option<String>,

    /// Print the unrounded breakdown instead of the presented quote.
    #[arg(long)]
    pub full: bool,
}

impl QuoteArgs {
    fn request(&self) -> CalculationRequest {
        let amount = |v: &Option<String>| v.as_ref().map(|s| Value::String(s.clone()));
        CalculationRequest {
            weight: Some(Value::String(self.weight.clone())),
            length: amount(&self.length),
            width: amount(&self.width),
            height: amount(&self.height),
            item_value: amount(&self.item_value),
            category: Some(self.category.clone()),
            origin: Some(self.origin.clone()),
        }
    }
}

/// Execute the quote subcommand and return the JSON it prints.
pub fn quote_json(args: &QuoteArgs) -> Result<Value> {
    let table = crate::load_table(&args.table)?;
    let input = args.request().parse()?;
    let result = breakdown(&table, &input)
        .with_context(|| format!("cannot quote from {}", args.table.display()))?;

    tracing::info!(
        origin = %input.origin,
        category = %input.category,
        billable_weight = %result.billable_weight,
        "quote calculated"
    );

    let value = if args.full {
        serde_json::to_value(&result)?
    } else {
        serde_json::to_value(result.to_quote())?
    };
    Ok(value)
}

/// Execute the quote subcommand.
///
/// Returns exit code: 0 on success. Calculation failures are errors.
pub fn run_quote(args: &QuoteArgs) -> Result<u8> {
    let value = quote_json(args)?;
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;
    use rust_decimal::Decimal;

    fn args(table: PathBuf, weight: &str) -> QuoteArgs {
        QuoteArgs {
            table,
            origin: "USA".into(),
            category: "Electronics".into(),
            weight: weight.into(),
            length: Some("10".into()),
            width: Some("10".into()),
            height: Some("10".into()),
            item_value: Some("100".into()),
            full: false,
        }
    }

    #[test]
    fn quotes_worked_example() {
        let (_dir, path) = fixtures::write("rates.yaml", fixtures::TABLE);
        let value = quote_json(&args(path, "2")).unwrap();
        assert_eq!(value["total"], 92.12);
        assert_eq!(value["currency"], "USD");
        assert_eq!(value["breakdown"]["vat"], 23.1);
    }

    #[test]
    fn full_breakdown_keeps_precision() {
        let (_dir, path) = fixtures::write("rates.yaml", fixtures::TABLE);
        let mut a = args(path, "2");
        a.full = true;
        let value = quote_json(&a).unwrap();
        assert_eq!(decimal(&value["final_total"]), "92.115".parse().unwrap());
        assert_eq!(decimal(&value["margin"]), "12.015".parse().unwrap());
        assert_eq!(decimal(&value["cif_value"]), Decimal::from(120));
    }

    fn decimal(value: &Value) -> Decimal {
        match value {
            Value::String(s) => s.parse().unwrap(),
            other => other.to_string().parse().unwrap(),
        }
    }

    #[test]
    fn weight_outside_every_band_fails() {
        let (_dir, path) = fixtures::write("rates.yaml", fixtures::TABLE);
        let err = quote_json(&args(path, "40")).unwrap_err();
        assert!(format!("{err:#}").contains("No rate band found for 40kg from USA"));
    }

    #[test]
    fn unparseable_weight_fails() {
        let (_dir, path) = fixtures::write("rates.yaml", fixtures::TABLE);
        let err = quote_json(&args(path, "two")).unwrap_err();
        assert!(format!("{err:#}").contains("weight"));
    }
}
