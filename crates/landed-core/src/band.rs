//! # Rate Bands
//!
//! A rate band is a weight interval with a flat shipping price, scoped to one
//! origin country. Bands for the same origin must never overlap; see
//! [`crate::overlap`] for the write-time check and [`crate::resolver`] for the
//! read-time lookup.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::country::OriginCountry;
use crate::error::BandError;

/// Weight-banded price rule for one origin country.
///
/// The write-time invariant treats the band as the half-open interval
/// `[min_weight, max_weight)`. Lookup treats both bounds as inclusive.
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateBand {
    /// Record identifier.
    pub id: Uuid,
    /// Origin the band applies to.
    pub origin_country: OriginCountry,
    /// Lower weight bound in kilograms.
    #[serde(serialize_with = "rust_decimal::serde::float::serialize")]
    pub min_weight: Decimal,
    /// Upper weight bound in kilograms.
    #[serde(serialize_with = "rust_decimal::serde::float::serialize")]
    pub max_weight: Decimal,
    /// Flat shipping price for any weight in the band.
    #[serde(serialize_with = "rust_decimal::serde::float::serialize")]
    pub price: Decimal,
}

impl RateBand {
    /// Create a band with a fresh identifier. No validation is performed.
    pub fn new(
        origin_country: OriginCountry,
        min_weight: Decimal,
        max_weight: Decimal,
        price: Decimal,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            origin_country,
            min_weight,
            max_weight,
            price,
        }
    }

    /// Check the record's own fields: non-negative lower bound and price,
    /// and `min_weight < max_weight`.
    pub fn check_fields(&self) -> Result<(), BandError> {
        if self.min_weight < Decimal::ZERO {
            return Err(BandError::NegativeWeight(self.min_weight));
        }
        if self.price < Decimal::ZERO {
            return Err(BandError::NegativePrice(self.price));
        }
        if self.min_weight >= self.max_weight {
            return Err(BandError::InvalidRange {
                min: self.min_weight,
                max: self.max_weight,
            });
        }
        Ok(())
    }

    /// Strict interval intersection. Bands that only touch at an endpoint do
    /// not overlap.
    pub fn overlaps(&self, other: &RateBand) -> bool {
        self.min_weight < other.max_weight && self.max_weight > other.min_weight
    }

    /// Inclusive containment used at lookup time.
    pub fn covers(&self, weight: Decimal) -> bool {
        self.min_weight <= weight && weight <= self.max_weight
    }
}

impl std::fmt::Display for RateBand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: {}kg - {}kg = {}",
            self.origin_country,
            self.min_weight.normalize(),
            self.max_weight.normalize(),
            self.price.normalize()
        )
    }
}

/// Sort bands by `(origin_country, min_weight)` ascending.
///
/// Ties fall back to `max_weight` then `id` so the order is total and
/// resolution never depends on storage iteration order.
pub fn sort_bands(bands: &mut [RateBand]) {
    bands.sort_by(|a, b| {
        a.origin_country
            .cmp(&b.origin_country)
            .then(a.min_weight.cmp(&b.min_weight))
            .then(a.max_weight.cmp(&b.max_weight))
            .then(a.id.cmp(&b.id))
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn band(origin: OriginCountry, min: &str, max: &str) -> RateBand {
        RateBand::new(origin, d(min), d(max), d("10"))
    }

    #[test]
    fn touching_bands_do_not_overlap() {
        let a = band(OriginCountry::Usa, "0", "5");
        let b = band(OriginCountry::Usa, "5", "10");
        assert!(!a.overlaps(&b));
        assert!(!b.overlaps(&a));
    }

    #[test]
    fn nested_band_overlaps() {
        let outer = band(OriginCountry::Usa, "0", "10");
        let inner = band(OriginCountry::Usa, "2", "3");
        assert!(outer.overlaps(&inner));
        assert!(inner.overlaps(&outer));
    }

    #[test]
    fn covers_is_inclusive_on_both_ends() {
        let b = band(OriginCountry::Uk, "1", "5");
        assert!(b.covers(d("1")));
        assert!(b.covers(d("5")));
        assert!(b.covers(d("5.000")));
        assert!(!b.covers(d("5.0001")));
        assert!(!b.covers(d("0.9999")));
    }

    #[test]
    fn check_fields_rejects_inverted_range() {
        let b = band(OriginCountry::Usa, "5", "1");
        assert!(matches!(
            b.check_fields(),
            Err(BandError::InvalidRange { .. })
        ));
    }

    #[test]
    fn check_fields_rejects_empty_range() {
        let b = band(OriginCountry::Usa, "5", "5");
        assert!(matches!(
            b.check_fields(),
            Err(BandError::InvalidRange { .. })
        ));
    }

    #[test]
    fn check_fields_rejects_negative_values() {
        let b = band(OriginCountry::Usa, "-1", "5");
        assert_eq!(b.check_fields(), Err(BandError::NegativeWeight(d("-1"))));

        let mut priced = band(OriginCountry::Usa, "0", "5");
        priced.price = d("-0.01");
        assert_eq!(
            priced.check_fields(),
            Err(BandError::NegativePrice(d("-0.01")))
        );
    }

    #[test]
    fn check_fields_accepts_free_band_from_zero() {
        let mut b = band(OriginCountry::Usa, "0", "0.5");
        b.price = Decimal::ZERO;
        assert!(b.check_fields().is_ok());
    }

    #[test]
    fn sort_orders_by_origin_then_min_weight() {
        let mut bands = vec![
            band(OriginCountry::Usa, "5", "10"),
            band(OriginCountry::Uk, "2", "4"),
            band(OriginCountry::Usa, "0", "5"),
            band(OriginCountry::Uk, "0", "2"),
        ];
        sort_bands(&mut bands);
        let keys: Vec<(OriginCountry, Decimal)> = bands
            .iter()
            .map(|b| (b.origin_country, b.min_weight))
            .collect();
        assert_eq!(
            keys,
            vec![
                (OriginCountry::Uk, d("0")),
                (OriginCountry::Uk, d("2")),
                (OriginCountry::Usa, d("0")),
                (OriginCountry::Usa, d("5")),
            ]
        );
    }

    #[test]
    fn serializes_weights_as_numbers() {
        let b = RateBand::new(OriginCountry::Usa, d("0"), d("5.5"), d("20"));
        let json = serde_json::to_value(&b).unwrap();
        assert_eq!(json["origin_country"], "USA");
        assert_eq!(json["max_weight"], 5.5);
        assert_eq!(json["price"], 20.0);
    }

    #[test]
    fn deserializes_numbers_and_strings() {
        let id = Uuid::new_v4();
        let json = serde_json::json!({
            "id": id,
            "origin_country": "UK",
            "min_weight": 0,
            "max_weight": "2.5",
            "price": 12.75
        });
        let b: RateBand = serde_json::from_value(json).unwrap();
        assert_eq!(b.id, id);
        assert_eq!(b.max_weight, d("2.5"));
        assert_eq!(b.price, d("12.75"));
    }

    #[test]
    fn display_reads_like_a_price_list_line() {
        let b = RateBand::new(OriginCountry::Usa, d("0.0"), d("5.00"), d("20"));
        assert_eq!(b.to_string(), "USA: 0kg - 5kg = 20");
    }
}
