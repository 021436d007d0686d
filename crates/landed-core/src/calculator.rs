//! # Cost Calculator
//!
//! Turns a parcel description into a landed-cost quote.
//!
//! The steps run in a fixed order:
//!
//! 1. `volumetric = length × width × height / 5000`
//! 2. `billable = max(weight, volumetric)`
//! 3. resolve the band for `(origin, billable)`
//! 4. `shipping = band.price`
//! 5. `cif = item_value + shipping`
//! 6. `duty = cif × category.duty_rate`
//! 7. `vat = (cif + duty) × vat_rate / 100`
//! 8. `subtotal = shipping + duty + vat + local_handling_fee`
//! 9. `margin = subtotal × margin_rate / 100`
//! 10. `total = subtotal + margin`
//!
//! Intermediate values keep full decimal precision. Rounding to two places
//! (half away from zero) happens once, in [`CostBreakdown::to_quote`].
//!
//! All arithmetic is checked. Inputs large enough to overflow the decimal
//! range are rejected as [`CalculationError::InvalidInput`].

use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::band::RateBand;
use crate::category::Category;
use crate::config::ShippingConfig;
use crate::country::{Currency, OriginCountry};
use crate::error::CalculationError;
use crate::resolver::resolve;
use crate::store::RateStore;

/// Divisor converting cubic centimetres into volumetric kilograms.
pub const VOLUMETRIC_DIVISOR: Decimal = Decimal::from_parts(5000, 0, 0, false, 0);

/// Decimal places used in quotes.
const QUOTE_DP: u32 = 2;

// ---------------------------------------------------------------------------
// Request parsing
// ---------------------------------------------------------------------------

/// Calculation request as received from a client.
///
/// Numeric fields accept JSON numbers or numeric strings. Missing or `null`
/// numeric fields default to zero. Use [`CalculationRequest::parse`] to obtain
/// a typed [`CalculationInput`].
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CalculationRequest {
    /// Actual weight in kilograms.
    #[serde(default)]
    #[cfg_attr(feature = "openapi", schema(value_type = Option<f64>))]
    pub weight: Option<Value>,
    /// Parcel length in centimetres.
    #[serde(default)]
    #[cfg_attr(feature = "openapi", schema(value_type = Option<f64>))]
    pub length: Option<Value>,
    /// Parcel width in centimetres.
    #[serde(default)]
    #[cfg_attr(feature = "openapi", schema(value_type = Option<f64>))]
    pub width: Option<Value>,
    /// Parcel height in centimetres.
    #[serde(default)]
    #[cfg_attr(feature = "openapi", schema(value_type = Option<f64>))]
    pub height: Option<Value>,
    /// Declared value of the goods.
    #[serde(default)]
    #[cfg_attr(feature = "openapi", schema(value_type = Option<f64>))]
    pub item_value: Option<Value>,
    /// Category name.
    #[serde(default)]
    pub category: Option<String>,
    /// Origin country code.
    #[serde(default)]
    pub origin: Option<String>,
}

impl CalculationRequest {
    /// Validate and convert into a typed [`CalculationInput`].
    ///
    /// Fails with [`CalculationError::InvalidInput`] naming the first field
    /// that is unparseable, negative, or (for `category` and `origin`)
    /// missing.
    pub fn parse(&self) -> Result<CalculationInput, CalculationError> {
        let weight = parse_amount("weight", self.weight.as_ref())?;
        let length = parse_amount("length", self.length.as_ref())?;
        let width = parse_amount("width", self.width.as_ref())?;
        let height = parse_amount("height", self.height.as_ref())?;
        let item_value = parse_amount("item_value", self.item_value.as_ref())?;

        let category = match self.category.as_deref() {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => return Err(CalculationError::invalid("category", "is required")),
        };
        let origin = match self.origin.as_deref() {
            Some(code) => OriginCountry::from_str(code)
                .map_err(|e| CalculationError::invalid("origin", e.to_string()))?,
            None => return Err(CalculationError::invalid("origin", "is required")),
        };

        Ok(CalculationInput {
            weight,
            length,
            width,
            height,
            item_value,
            category,
            origin,
        })
    }
}

impl TryFrom<&CalculationRequest> for CalculationInput {
    type Error = CalculationError;

    fn try_from(req: &CalculationRequest) -> Result<Self, Self::Error> {
        req.parse()
    }
}

fn parse_amount(field: &'static str, value: Option<&Value>) -> Result<Decimal, CalculationError> {
    let amount = match value {
        None | Some(Value::Null) => return Ok(Decimal::ZERO),
        Some(Value::Number(n)) => parse_decimal(field, &n.to_string())?,
        Some(Value::String(s)) => parse_decimal(field, s.trim())?,
        Some(_) => return Err(CalculationError::invalid(field, "expected a number")),
    };
    if amount < Decimal::ZERO {
        return Err(CalculationError::invalid(
            field,
            format!("must not be negative (got {amount})"),
        ));
    }
    Ok(amount)
}

fn parse_decimal(field: &'static str, raw: &str) -> Result<Decimal, CalculationError> {
    Decimal::from_str(raw)
        .or_else(|_| Decimal::from_scientific(raw))
        .map_err(|_| CalculationError::invalid(field, format!("\"{raw}\" is not a number")))
}

// ---------------------------------------------------------------------------
// Typed input
// ---------------------------------------------------------------------------

/// Validated calculation input. All amounts are non-negative.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalculationInput {
    /// Actual weight in kilograms.
    pub weight: Decimal,
    /// Parcel length in centimetres.
    pub length: Decimal,
    /// Parcel width in centimetres.
    pub width: Decimal,
    /// Parcel height in centimetres.
    pub height: Decimal,
    /// Declared value of the goods.
    pub item_value: Decimal,
    /// Category name, matched exactly.
    pub category: String,
    /// Origin country.
    pub origin: OriginCountry,
}

impl CalculationInput {
    /// Input with the given weight and no dimensions or declared value.
    pub fn new(origin: OriginCountry, category: impl Into<String>, weight: Decimal) -> Self {
        Self {
            weight,
            length: Decimal::ZERO,
            width: Decimal::ZERO,
            height: Decimal::ZERO,
            item_value: Decimal::ZERO,
            category: category.into(),
            origin,
        }
    }

    /// Set the parcel dimensions in centimetres.
    pub fn with_dimensions(mut self, length: Decimal, width: Decimal, height: Decimal) -> Self {
        self.length = length;
        self.width = width;
        self.height = height;
        self
    }

    /// Set the declared value of the goods.
    pub fn with_item_value(mut self, item_value: Decimal) -> Self {
        self.item_value = item_value;
        self
    }
}

// ---------------------------------------------------------------------------
// Weights
// ---------------------------------------------------------------------------

/// `length × width × height / 5000`.
pub fn volumetric_weight(
    length: Decimal,
    width: Decimal,
    height: Decimal,
) -> Result<Decimal, CalculationError> {
    length
        .checked_mul(width)
        .and_then(|area| area.checked_mul(height))
        .and_then(|volume| volume.checked_div(VOLUMETRIC_DIVISOR))
        .ok_or_else(|| CalculationError::invalid("length", "dimensions out of range"))
}

/// The greater of actual and volumetric weight.
pub fn billable_weight(weight: Decimal, volumetric: Decimal) -> Decimal {
    weight.max(volumetric)
}

// ---------------------------------------------------------------------------
// Breakdown
// ---------------------------------------------------------------------------

/// Full-precision result of a calculation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CostBreakdown {
    /// Weight derived from the parcel dimensions.
    pub volumetric_weight: Decimal,
    /// Weight used for band lookup.
    pub billable_weight: Decimal,
    /// Price of the resolved band.
    pub base_shipping: Decimal,
    /// Cost, insurance and freight: declared value plus shipping.
    pub cif_value: Decimal,
    /// Duty on the CIF value.
    pub duty_amount: Decimal,
    /// VAT on CIF value plus duty.
    pub vat_amount: Decimal,
    /// Flat handling fee from the configuration.
    pub local_handling_fee: Decimal,
    /// Shipping, duty, VAT and handling.
    pub subtotal: Decimal,
    /// Service margin on the subtotal.
    pub margin: Decimal,
    /// Subtotal plus margin.
    pub final_total: Decimal,
    /// Quote currency, fixed by origin.
    pub currency: Currency,
}

impl CostBreakdown {
    /// Round every presented amount to two places, half away from zero.
    pub fn to_quote(&self) -> Quote {
        Quote {
            billable_weight: round(self.billable_weight),
            breakdown: QuoteBreakdown {
                shipping: round(self.base_shipping),
                duties: round(self.duty_amount),
                vat: round(self.vat_amount),
                local_fees: round(self.local_handling_fee),
                margin: round(self.margin),
                subtotal: round(self.subtotal),
            },
            total: round(self.final_total),
            currency: self.currency,
        }
    }
}

fn round(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(QUOTE_DP, RoundingStrategy::MidpointAwayFromZero)
}

/// Presented quote. All amounts are rounded to two decimal places and
/// serialize as JSON numbers.
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    /// Billable weight in kilograms.
    #[serde(serialize_with = "rust_decimal::serde::float::serialize")]
    pub billable_weight: Decimal,
    /// Itemized charges.
    pub breakdown: QuoteBreakdown,
    /// Amount payable.
    #[serde(serialize_with = "rust_decimal::serde::float::serialize")]
    pub total: Decimal,
    /// Currency of every amount in the quote.
    pub currency: Currency,
}

/// Itemized charges of a [`Quote`].
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteBreakdown {
    /// Band price.
    #[serde(serialize_with = "rust_decimal::serde::float::serialize")]
    pub shipping: Decimal,
    /// Duty amount.
    #[serde(serialize_with = "rust_decimal::serde::float::serialize")]
    pub duties: Decimal,
    /// VAT amount.
    #[serde(serialize_with = "rust_decimal::serde::float::serialize")]
    pub vat: Decimal,
    /// Local handling fee.
    #[serde(serialize_with = "rust_decimal::serde::float::serialize")]
    pub local_fees: Decimal,
    /// Service margin.
    #[serde(serialize_with = "rust_decimal::serde::float::serialize")]
    pub margin: Decimal,
    /// Subtotal before margin.
    #[serde(serialize_with = "rust_decimal::serde::float::serialize")]
    pub subtotal: Decimal,
}

// ---------------------------------------------------------------------------
// Calculation
// ---------------------------------------------------------------------------

/// Price `input` against an already-fetched configuration, category and band.
///
/// The band must belong to the input's origin and cover its billable
/// weight; otherwise [`CalculationError::NoRateBand`] is returned.
pub fn calculate(
    input: &CalculationInput,
    config: &ShippingConfig,
    category: &Category,
    band: &RateBand,
) -> Result<CostBreakdown, CalculationError> {
    let volumetric = volumetric_weight(input.length, input.width, input.height)?;
    let billable = billable_weight(input.weight, volumetric);

    if band.origin_country != input.origin || !band.covers(billable) {
        return Err(CalculationError::no_band(billable, input.origin));
    }

    let base_shipping = band.price;
    let cif_value = checked(input.item_value.checked_add(base_shipping), "item_value")?;
    let duty_amount = checked(cif_value.checked_mul(category.duty_rate), "item_value")?;
    let vat_amount = checked(
        cif_value
            .checked_add(duty_amount)
            .and_then(|taxable| taxable.checked_mul(config.vat_fraction())),
        "item_value",
    )?;
    let subtotal = checked(
        base_shipping
            .checked_add(duty_amount)
            .and_then(|s| s.checked_add(vat_amount))
            .and_then(|s| s.checked_add(config.local_handling_fee)),
        "item_value",
    )?;
    let margin = checked(subtotal.checked_mul(config.margin_fraction()), "item_value")?;
    let final_total = checked(subtotal.checked_add(margin), "item_value")?;

    Ok(CostBreakdown {
        volumetric_weight: volumetric,
        billable_weight: billable,
        base_shipping,
        cif_value,
        duty_amount,
        vat_amount,
        local_handling_fee: config.local_handling_fee,
        subtotal,
        margin,
        final_total,
        currency: input.origin.currency(),
    })
}

fn checked(value: Option<Decimal>, field: &'static str) -> Result<Decimal, CalculationError> {
    value.ok_or_else(|| CalculationError::invalid(field, "amount out of range"))
}

/// Look up configuration, category and band in `store`, then calculate.
///
/// Lookups run in that order, so an unknown category is reported before a
/// missing band.
pub fn breakdown<S: RateStore + ?Sized>(
    store: &S,
    input: &CalculationInput,
) -> Result<CostBreakdown, CalculationError> {
    let config = store.config();
    let category = store
        .category_by_name(&input.category)
        .ok_or_else(|| CalculationError::CategoryNotFound(input.category.clone()))?;

    let volumetric = volumetric_weight(input.length, input.width, input.height)?;
    let billable = billable_weight(input.weight, volumetric);
    let band = resolve(&store.bands_for(input.origin), input.origin, billable)
        .ok_or_else(|| CalculationError::no_band(billable, input.origin))?;

    calculate(input, &config, &category, &band)
}

/// [`breakdown`] followed by [`CostBreakdown::to_quote`].
pub fn quote<S: RateStore + ?Sized>(
    store: &S,
    input: &CalculationInput,
) -> Result<Quote, CalculationError> {
    breakdown(store, input).map(|b| b.to_quote())
}
