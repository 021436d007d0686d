//! # Origin Countries & Currencies
//!
//! The closed set of origin countries a rate band can be scoped to, and the
//! fixed mapping from origin to quote currency.
//!
//! Adding an origin means adding a variant here; every `match` in the
//! workspace then forces a decision about its currency.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Supported origin country for rate bands and calculations.
///
/// Serialized as the upper-case codes used on the wire (`"USA"`, `"UK"`).
/// Variants are declared in code order so the derived `Ord` sorts the same
/// way the codes do as strings.
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum OriginCountry {
    /// United Kingdom.
    #[serde(rename = "UK")]
    Uk,
    /// United States.
    #[serde(rename = "USA")]
    Usa,
}

impl OriginCountry {
    /// Return the wire code for this origin.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Usa => "USA",
            Self::Uk => "UK",
        }
    }

    /// Currency quotes from this origin are denominated in.
    pub fn currency(&self) -> Currency {
        match self {
            Self::Usa => Currency::Usd,
            Self::Uk => Currency::Gbp,
        }
    }

    /// Return all supported origins, in sort order.
    pub fn all() -> &'static [OriginCountry] {
        &[Self::Uk, Self::Usa]
    }
}

impl std::fmt::Display for OriginCountry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OriginCountry {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "USA" => Ok(Self::Usa),
            "UK" => Ok(Self::Uk),
            other => Err(ValidationError::UnsupportedCountry(other.to_string())),
        }
    }
}

/// ISO 4217 currency a quote is expressed in.
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    /// US dollar.
    Usd,
    /// Pound sterling.
    Gbp,
}

impl Currency {
    /// Return the ISO code.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Usd => "USD",
            Self::Gbp => "GBP",
        }
    }
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
