//! # Rate Store
//!
//! The read interface the calculator needs, plus [`RateTable`], an in-memory
//! implementation loadable from a YAML or JSON document.
//!
//! A table document looks like:
//!
//! ```yaml
//! config:
//!   vat_rate: 17.5
//!   local_handling_fee: 25
//!   margin_rate: 15
//! categories:
//!   - name: Electronics
//!     duty_rate: 0.1
//! bands:
//!   - origin_country: USA
//!     min_weight: 0
//!     max_weight: 5
//!     price: 20
//! ```
//!
//! `config` may be omitted, in which case defaults apply. Record ids are
//! optional and generated when absent.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::band::{sort_bands, RateBand};
use crate::category::Category;
use crate::config::ShippingConfig;
use crate::country::OriginCountry;
use crate::error::{BandError, TableError, ValidationError};
use crate::overlap;

/// Read access to rate records.
pub trait RateStore {
    /// Every band for `origin`, in any order.
    fn bands_for(&self, origin: OriginCountry) -> Vec<RateBand>;

    /// The category with exactly this name, if any.
    fn category_by_name(&self, name: &str) -> Option<Category>;

    /// The configuration singleton. Implementations create it with
    /// [`ShippingConfig::default`] when absent.
    fn config(&self) -> ShippingConfig;
}

/// In-memory rate table.
///
/// Bands are kept in `(origin_country, min_weight)` order and every insert
/// passes the overlap validator. Category names are unique.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RateTable {
    config: ShippingConfig,
    categories: Vec<Category>,
    bands: Vec<RateBand>,
}

impl RateTable {
    /// Build a table from a parsed document, stopping at the first invalid
    /// record.
    pub fn from_document(doc: TableDocument) -> Result<Self, TableError> {
        let mut table = RateTable::default();
        if let Some(config) = doc.config {
            config.validate().map_err(TableError::Config)?;
            table.config = config;
        }
        for (index, record) in doc.categories.into_iter().enumerate() {
            let category = record.into_category();
            table
                .insert_category(category)
                .map_err(|e| match e {
                    CategoryInsertError::Invalid(source) => TableError::Category { index, source },
                    CategoryInsertError::Duplicate(name) => TableError::DuplicateCategory(name),
                })?;
        }
        for (index, record) in doc.bands.into_iter().enumerate() {
            let band = record.into_band();
            let (origin, min, max) = (band.origin_country, band.min_weight, band.max_weight);
            table.insert_band(band).map_err(|source| TableError::Band {
                index,
                origin,
                min,
                max,
                source,
            })?;
        }
        Ok(table)
    }

    /// All bands, sorted.
    pub fn bands(&self) -> &[RateBand] {
        &self.bands
    }

    /// All categories, in insertion order.
    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    /// Validate and insert a band.
    pub fn insert_band(&mut self, band: RateBand) -> Result<(), BandError> {
        overlap::validate(&band, &self.bands, None)?;
        self.bands.push(band);
        sort_bands(&mut self.bands);
        Ok(())
    }

    /// Validate and insert a category. Names must be unique.
    pub fn insert_category(&mut self, category: Category) -> Result<(), CategoryInsertError> {
        category.validate().map_err(CategoryInsertError::Invalid)?;
        if self.categories.iter().any(|c| c.name == category.name) {
            return Err(CategoryInsertError::Duplicate(category.name));
        }
        self.categories.push(category);
        Ok(())
    }

    /// Replace the category with the same id. Returns `Ok(false)` when no
    /// such category exists.
    pub fn replace_category(&mut self, category: Category) -> Result<bool, CategoryInsertError> {
        category.validate().map_err(CategoryInsertError::Invalid)?;
        if self
            .categories
            .iter()
            .any(|c| c.name == category.name && c.id != category.id)
        {
            return Err(CategoryInsertError::Duplicate(category.name));
        }
        match self.categories.iter_mut().find(|c| c.id == category.id) {
            Some(slot) => {
                *slot = category;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

impl RateStore for RateTable {
    fn bands_for(&self, origin: OriginCountry) -> Vec<RateBand> {
        self.bands
            .iter()
            .filter(|b| b.origin_country == origin)
            .cloned()
            .collect()
    }

    fn category_by_name(&self, name: &str) -> Option<Category> {
        self.categories.iter().find(|c| c.name == name).cloned()
    }

    fn config(&self) -> ShippingConfig {
        self.config.clone()
    }
}

/// Why a category insert or replace was refused.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CategoryInsertError {
    /// Field validation failed.
    #[error(transparent)]
    Invalid(ValidationError),
    /// Another category already uses this name.
    #[error("a category named \"{0}\" already exists")]
    Duplicate(String),
}

// ---------------------------------------------------------------------------
// Documents
// ---------------------------------------------------------------------------

/// Serialized form of a [`RateTable`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableDocument {
    /// Configuration; defaults apply when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<ShippingConfig>,
    /// Category records.
    #[serde(default)]
    pub categories: Vec<CategoryRecord>,
    /// Band records, validated in document order.
    #[serde(default)]
    pub bands: Vec<BandRecord>,
}

impl TableDocument {
    /// Run every band through the overlap validator in document order and
    /// collect all rejections.
    ///
    /// A rejected band is not added to the accepted set, so a single bad band
    /// produces one report rather than cascading into its neighbours.
    pub fn band_conflicts(&self) -> Vec<TableError> {
        let mut accepted: Vec<RateBand> = Vec::with_capacity(self.bands.len());
        let mut errors = Vec::new();
        for (index, record) in self.bands.iter().enumerate() {
            let band = record.clone().into_band();
            match overlap::validate(&band, &accepted, None) {
                Ok(()) => accepted.push(band),
                Err(source) => errors.push(TableError::Band {
                    index,
                    origin: band.origin_country,
                    min: band.min_weight,
                    max: band.max_weight,
                    source,
                }),
            }
        }
        errors
    }
}

/// A category entry in a [`TableDocument`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRecord {
    /// Optional fixed identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    /// Category name.
    pub name: String,
    /// Fractional duty rate.
    pub duty_rate: Decimal,
}

impl CategoryRecord {
    fn into_category(self) -> Category {
        let mut category = Category::new(self.name, self.duty_rate);
        if let Some(id) = self.id {
            category.id = id;
        }
        category
    }
}

/// A band entry in a [`TableDocument`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BandRecord {
    /// Optional fixed identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    /// Origin country code.
    pub origin_country: OriginCountry,
    /// Lower weight bound in kilograms.
    pub min_weight: Decimal,
    /// Upper weight bound in kilograms.
    pub max_weight: Decimal,
    /// Flat shipping price.
    pub price: Decimal,
}

impl BandRecord {
    fn into_band(self) -> RateBand {
        let mut band = RateBand::new(
            self.origin_country,
            self.min_weight,
            self.max_weight,
            self.price,
        );
        if let Some(id) = self.id {
            band.id = id;
        }
        band
    }
}
