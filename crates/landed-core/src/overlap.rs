//! # Overlap Validator
//!
//! Write-time guard for the rate band invariant: within one origin country,
//! no two bands' `[min_weight, max_weight)` intervals intersect.
//!
//! Two bands overlap when `existing.min < candidate.max` and
//! `existing.max > candidate.min`. Both comparisons are strict, so bands
//! that share an endpoint (`[0,5)` and `[5,10)`) are accepted.
//!
//! The validator is pure. Storage layers run it against their current
//! contents before committing a create or update.

use uuid::Uuid;

use crate::band::{sort_bands, RateBand};
use crate::error::BandError;

/// Validate `candidate` against `existing`.
///
/// When editing, pass the record's own id as `exclude_id` so the band is not
/// compared with its previous version. Bands for other origins are ignored.
///
/// Field checks run first ([`RateBand::check_fields`]). The overlap scan
/// visits bands in `(origin_country, min_weight)` order and reports the
/// first conflict, carrying its bounds.
pub fn validate(
    candidate: &RateBand,
    existing: &[RateBand],
    exclude_id: Option<Uuid>,
) -> Result<(), BandError> {
    candidate.check_fields()?;

    let mut same_origin: Vec<RateBand> = existing
        .iter()
        .filter(|band| band.origin_country == candidate.origin_country)
        .filter(|band| Some(band.id) != exclude_id)
        .cloned()
        .collect();
    sort_bands(&mut same_origin);

    match same_origin.iter().find(|band| band.overlaps(candidate)) {
        Some(conflict) => Err(BandError::Overlap {
            min: conflict.min_weight,
            max: conflict.max_weight,
        }),
        None => Ok(()),
    }
}
