//! # Shipping Configuration
//!
//! The singleton record holding the VAT rate, local handling fee and service
//! margin. Exactly one logical instance exists; stores materialize
//! [`ShippingConfig::default`] the first time it is read.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Global pricing parameters.
///
/// `vat_rate` and `margin_rate` are percentage points: `17.5` means 17.5%.
/// `local_handling_fee` is a flat amount in the quote currency.
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingConfig {
    /// VAT in percentage points, applied to CIF value plus duty.
    #[serde(serialize_with = "rust_decimal::serde::float::serialize")]
    pub vat_rate: Decimal,
    /// Flat handling fee added to every quote.
    #[serde(serialize_with = "rust_decimal::serde::float::serialize")]
    pub local_handling_fee: Decimal,
    /// Service margin in percentage points, applied to the subtotal.
    #[serde(serialize_with = "rust_decimal::serde::float::serialize")]
    pub margin_rate: Decimal,
}

impl Default for ShippingConfig {
    /// VAT 17.5%, handling 25.00, margin 15%.
    fn default() -> Self {
        Self {
            vat_rate: Decimal::new(175, 1),
            local_handling_fee: Decimal::new(25, 0),
            margin_rate: Decimal::new(15, 0),
        }
    }
}

impl ShippingConfig {
    /// Reject negative rates and fees.
    pub fn validate(&self) -> Result<(), ValidationError> {
        for (field, value) in [
            ("vat_rate", self.vat_rate),
            ("local_handling_fee", self.local_handling_fee),
            ("margin_rate", self.margin_rate),
        ] {
            if value < Decimal::ZERO {
                return Err(ValidationError::Negative { field, value });
            }
        }
        Ok(())
    }

    /// VAT as a fraction (`vat_rate / 100`).
    pub fn vat_fraction(&self) -> Decimal {
        self.vat_rate / Decimal::ONE_HUNDRED
    }

    /// Margin as a fraction (`margin_rate / 100`).
    pub fn margin_fraction(&self) -> Decimal {
        self.margin_rate / Decimal::ONE_HUNDRED
    }
}
