//! # Product Categories
//!
//! A category carries the duty rate applied to a parcel's CIF value.
//!
//! Calculations reference a category by its `name`, not by `id`. Renaming a
//! category therefore breaks callers still sending the old name; the lookup
//! is an exact, case-sensitive match.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;

/// Maximum length of a category name.
pub const MAX_CATEGORY_NAME_LEN: usize = 50;

/// A product category and its duty rate.
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    /// Record identifier.
    pub id: Uuid,
    /// Unique label used by calculation requests.
    pub name: String,
    /// Fractional duty rate applied to the CIF value (0.1 means 10%).
    #[serde(serialize_with = "rust_decimal::serde::float::serialize")]
    pub duty_rate: Decimal,
}

impl Category {
    /// Create a category with a fresh identifier. No validation is performed.
    pub fn new(name: impl Into<String>, duty_rate: Decimal) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            duty_rate,
        }
    }

    /// Check the name is non-empty and within length limits, and the duty
    /// rate is non-negative. Uniqueness is the store's concern.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyCategoryName);
        }
        let len = self.name.chars().count();
        if len > MAX_CATEGORY_NAME_LEN {
            return Err(ValidationError::CategoryNameTooLong {
                max: MAX_CATEGORY_NAME_LEN,
                actual: len,
            });
        }
        if self.duty_rate < Decimal::ZERO {
            return Err(ValidationError::Negative {
                field: "duty_rate",
                value: self.duty_rate,
            });
        }
        Ok(())
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_category_passes() {
        let c = Category::new("Electronics", "0.1".parse().unwrap());
        assert!(c.validate().is_ok());
    }

    #[test]
    fn zero_duty_is_allowed() {
        let c = Category::new("Books", Decimal::ZERO);
        assert!(c.validate().is_ok());
    }

    #[test]
    fn blank_name_rejected() {
        let c = Category::new("   ", Decimal::ZERO);
        assert_eq!(c.validate(), Err(ValidationError::EmptyCategoryName));
    }

    #[test]
    fn long_name_rejected() {
        let c = Category::new("x".repeat(51), Decimal::ZERO);
        assert!(matches!(
            c.validate(),
            Err(ValidationError::CategoryNameTooLong { actual: 51, .. })
        ));
        let ok = Category::new("x".repeat(50), Decimal::ZERO);
        assert!(ok.validate().is_ok());
    }

    #[test]
    fn negative_duty_rejected() {
        let c = Category::new("Toys", "-0.05".parse().unwrap());
        assert!(matches!(
            c.validate(),
            Err(ValidationError::Negative {
                field: "duty_rate",
                ..
            })
        ));
    }

    #[test]
    fn duty_rate_serializes_as_number() {
        let c = Category::new("Toys", "0.25".parse().unwrap());
        let json = serde_json::to_value(&c).unwrap();
        assert_eq!(json["name"], "Toys");
        assert_eq!(json["duty_rate"], 0.25);
    }
}
