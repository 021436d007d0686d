//! # Error Hierarchy
//!
//! Structured error types for the landed-cost domain, built with `thiserror`.
//!
//! Every variant is recoverable. Callers surface them as client errors with
//! the `Display` text as the human-readable message. None of them should
//! terminate a serving process.

use rust_decimal::Decimal;
use thiserror::Error;

use crate::country::OriginCountry;

/// Rejection of a rate band write.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BandError {
    /// `min_weight` is not strictly below `max_weight`.
    #[error("Min weight must be less than Max weight (got {min}kg - {max}kg).")]
    InvalidRange {
        /// Submitted lower bound.
        min: Decimal,
        /// Submitted upper bound.
        max: Decimal,
    },

    /// The candidate interval intersects an existing band for the same origin.
    #[error("Weight range conflicts with existing band: {min}kg - {max}kg")]
    Overlap {
        /// Lower bound of the conflicting band.
        min: Decimal,
        /// Upper bound of the conflicting band.
        max: Decimal,
    },

    /// Weight bounds must be non-negative.
    #[error("min_weight must not be negative (got {0})")]
    NegativeWeight(Decimal),

    /// A band cannot carry a negative price.
    #[error("price must not be negative (got {0})")]
    NegativePrice(Decimal),
}

/// Failure of a landed-cost calculation.
///
/// No breakdown is ever produced alongside one of these.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CalculationError {
    /// The named category does not exist.
    #[error("Invalid Category: \"{0}\" not found")]
    CategoryNotFound(String),

    /// No band for the origin covers the billable weight.
    #[error("No rate band found for {billable_weight}kg from {origin}. Please contact support.")]
    NoRateBand {
        /// Billable weight that was looked up.
        billable_weight: Decimal,
        /// Origin country that was searched.
        origin: String,
    },

    /// A request field is missing, unparseable or out of range.
    #[error("invalid input for '{field}': {reason}")]
    InvalidInput {
        /// Name of the offending request field.
        field: &'static str,
        /// Why the value was rejected.
        reason: String,
    },
}

impl CalculationError {
    /// Build an [`CalculationError::InvalidInput`] for `field`.
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            field,
            reason: reason.into(),
        }
    }

    /// Build a [`CalculationError::NoRateBand`] for a typed origin.
    pub fn no_band(billable_weight: Decimal, origin: OriginCountry) -> Self {
        Self::NoRateBand {
            billable_weight: billable_weight.normalize(),
            origin: origin.as_str().to_string(),
        }
    }
}

/// Field-level validation errors for categories and configuration records.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Category name is empty or whitespace-only.
    #[error("category name must not be empty")]
    EmptyCategoryName,

    /// Category name exceeds the storage limit.
    #[error("category name must not exceed {max} characters (got {actual})")]
    CategoryNameTooLong {
        /// Maximum accepted length.
        max: usize,
        /// Submitted length.
        actual: usize,
    },

    /// A rate or fee that must be non-negative was negative.
    #[error("{field} must not be negative (got {value})")]
    Negative {
        /// Name of the offending field.
        field: &'static str,
        /// Submitted value.
        value: Decimal,
    },

    /// Origin country code is not in the supported set.
    #[error("unsupported origin country: \"{0}\" (expected one of USA, UK)")]
    UnsupportedCountry(String),
}

/// Errors raised while assembling a [`crate::RateTable`] from raw records.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TableError {
    /// A band was rejected by the overlap validator.
    #[error("band #{index} ({origin} {min}kg - {max}kg): {source}")]
    Band {
        /// Zero-based position of the band in the source document.
        index: usize,
        /// Origin of the rejected band.
        origin: OriginCountry,
        /// Lower bound of the rejected band.
        min: Decimal,
        /// Upper bound of the rejected band.
        max: Decimal,
        /// Underlying validator error.
        #[source]
        source: BandError,
    },

    /// A category record failed validation.
    #[error("category #{index}: {source}")]
    Category {
        /// Zero-based position of the category in the source document.
        index: usize,
        /// Underlying validation error.
        #[source]
        source: ValidationError,
    },

    /// Two categories share a name.
    #[error("duplicate category name: \"{0}\"")]
    DuplicateCategory(String),

    /// The configuration record failed validation.
    #[error("config: {0}")]
    Config(#[source] ValidationError),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn overlap_message_names_conflicting_bounds() {
        let err = BandError::Overlap {
            min: d("0"),
            max: d("5"),
        };
        assert_eq!(
            err.to_string(),
            "Weight range conflicts with existing band: 0kg - 5kg"
        );
    }

    #[test]
    fn invalid_range_message() {
        let err = BandError::InvalidRange {
            min: d("5"),
            max: d("5"),
        };
        assert!(err.to_string().starts_with("Min weight must be less than Max weight"));
    }

    #[test]
    fn no_rate_band_echoes_weight_and_origin() {
        let err = CalculationError::no_band(d("12.500"), OriginCountry::Uk);
        let msg = err.to_string();
        assert!(msg.contains("12.5kg"), "got: {msg}");
        assert!(msg.contains("from UK"), "got: {msg}");
    }

    #[test]
    fn category_not_found_names_category() {
        let err = CalculationError::CategoryNotFound("Toys".into());
        assert!(err.to_string().contains("Toys"));
    }

    #[test]
    fn invalid_input_names_field() {
        let err = CalculationError::invalid("weight", "not a number");
        let msg = err.to_string();
        assert!(msg.contains("weight"));
        assert!(msg.contains("not a number"));
    }

    #[test]
    fn table_error_wraps_band_error() {
        let err = TableError::Band {
            index: 3,
            origin: OriginCountry::Usa,
            min: d("4"),
            max: d("8"),
            source: BandError::Overlap {
                min: d("0"),
                max: d("5"),
            },
        };
        let msg = err.to_string();
        assert!(msg.contains("band #3"));
        assert!(msg.contains("USA"));
        assert!(msg.contains("0kg - 5kg"));
    }

    #[test]
    fn unsupported_country_lists_choices() {
        let err = ValidationError::UnsupportedCountry("FR".into());
        assert!(err.to_string().contains("USA, UK"));
    }
}
