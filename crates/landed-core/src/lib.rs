#![deny(missing_docs)]

//! # landed-core: Landed Cost Domain Core
//!
//! Pure domain logic for estimating the landed cost of a parcel: shipping,
//! duty, VAT, local handling and service margin. No I/O, no async, no HTTP.
//! The API and CLI crates supply storage and transport around it.
//!
//! ## Pipeline
//!
//! ```text
//! CalculationRequest ─parse─▶ CalculationInput
//!        │
//!        ├─ billable weight = max(actual, L×W×H / 5000)
//!        ├─ RateStore::category_by_name
//!        ├─ resolver::resolve (first covering band, inclusive bounds)
//!        └─ calculator::calculate ─▶ CostBreakdown ─round─▶ Quote
//! ```
//!
//! ## Design Principles
//!
//! 1. **Decimal money.** Every amount, rate and weight is a
//!    [`rust_decimal::Decimal`]. Full precision is kept through the pipeline
//!    and rounding (half away from zero, 2 places) happens only in
//!    [`CostBreakdown::to_quote`].
//!
//! 2. **Validation before persistence.** [`overlap::validate`] is the single
//!    gate for rate band writes. Storage layers call it before committing.
//!
//! 3. **Storage is a collaborator.** The core reads through the
//!    [`RateStore`] trait: filtered band listing, unique category lookup and
//!    a get-or-create configuration singleton.

pub mod band;
pub mod calculator;
pub mod category;
pub mod config;
pub mod country;
pub mod error;
pub mod overlap;
pub mod resolver;
pub mod store;

pub use band::{sort_bands, RateBand};
pub use calculator::{
    billable_weight, breakdown, calculate, quote, volumetric_weight, CalculationInput, CalculationRequest,
    CostBreakdown, Quote, QuoteBreakdown, VOLUMETRIC_DIVISOR,
};
pub use category::Category;
pub use config::ShippingConfig;
pub use country::{Currency, OriginCountry};
pub use error::{BandError, CalculationError, TableError, ValidationError};
pub use resolver::resolve;
pub use store::{
    BandRecord, CategoryInsertError, CategoryRecord, RateStore, RateTable, TableDocument,
};
