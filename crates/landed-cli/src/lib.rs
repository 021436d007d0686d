//! # landed-cli: CLI Tool for Landed-Cost Rate Tables
//!
//! Provides the `landed` command-line interface over a rate table file
//! (YAML or JSON, see [`landed_core::TableDocument`]).
//!
//! ## Subcommands
//!
//! - `landed quote`: compute a quote offline against the table.
//! - `landed check`: run the overlap validator over every band, in order.
//! - `landed bands`: list bands in `(origin, min_weight)` order.
//!
//! ```bash
//! landed quote --table rates.yaml --origin USA --category Electronics --weight 2
//! landed check --table rates.yaml
//! landed bands --table rates.yaml --origin UK
//! ```

pub mod bands;
pub mod check;
pub mod quote;

use std::path::Path;

use anyhow::{Context, Result};
use landed_core::{RateTable, TableDocument};

/// Read and parse a rate table document.
///
/// Files ending in `.json` are parsed as JSON; everything else as YAML.
pub fn load_document(path: &Path) -> Result<TableDocument> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read rate table: {}", path.display()))?;

    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    let doc: TableDocument = if is_json {
        serde_json::from_str(&content)
            .with_context(|| format!("failed to parse rate table JSON: {}", path.display()))?
    } else {
        serde_yaml::from_str(&content)
            .with_context(|| format!("failed to parse rate table YAML: {}", path.display()))?
    };

    tracing::debug!(
        path = %path.display(),
        bands = doc.bands.len(),
        categories = doc.categories.len(),
        "loaded rate table document"
    );
    Ok(doc)
}

/// Load a document and build a validated [`RateTable`] from it.
pub fn load_table(path: &Path) -> Result<RateTable> {
    let doc = load_document(path)?;
    RateTable::from_document(doc)
        .with_context(|| format!("invalid rate table: {}", path.display()))
}

#[cfg(test)]
pub(crate) mod fixtures {
    use std::path::PathBuf;

    pub const TABLE: &str = r#"
config:
  vat_rate: 17.5
  local_handling_fee: 25
  margin_rate: 15
categories:
  - name: Electronics
    duty_rate: 0.1
  - name: Books
    duty_rate: 0
bands:
  - {origin_country: USA, min_weight: 5, max_weight: 10, price: 35}
  - {origin_country: USA, min_weight: 0, max_weight: 5, price: 20}
  - {origin_country: UK, min_weight: 0, max_weight: 5, price: 18}
"#;

    /// Write `content` to `name` inside a fresh temporary directory.
    pub fn write(name: &str, content: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(name);
        std::fs::write(&path, content).unwrap();
        (dir, path)
    }
}
