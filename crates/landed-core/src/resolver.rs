//! # Rate Resolver
//!
//! Read-time lookup of the band covering a billable weight.
//!
//! Lookup bounds are inclusive on both ends, which differs from the half-open
//! intervals the overlap validator enforces. Where two bands share an
//! endpoint both cover it; the band sorted first (the lower one) wins.

use rust_decimal::Decimal;

use crate::band::{sort_bands, RateBand};
use crate::country::OriginCountry;

/// Find the band for `origin` covering `billable_weight`.
///
/// Bands are considered in `(origin_country, min_weight)` order and the first
/// covering band is returned. `None` means no band covers the weight; callers
/// decide how to report it.
pub fn resolve(
    bands: &[RateBand],
    origin: OriginCountry,
    billable_weight: Decimal,
) -> Option<RateBand> {
    let mut candidates: Vec<RateBand> = bands
        .iter()
        .filter(|band| band.origin_country == origin)
        .cloned()
        .collect();
    sort_bands(&mut candidates);
    candidates
        .into_iter()
        .find(|band| band.covers(billable_weight))
}
