//! Rate band persistence operations.
//!
//! All functions take a `&PgPool` and operate on the `rate_bands` table.

use landed_core::{OriginCountry, RateBand};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

/// Insert a new band.
pub async fn insert(pool: &PgPool, band: &RateBand) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO rate_bands (id, origin_country, min_weight, max_weight, price)
         VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(band.id)
    .bind(band.origin_country.as_str())
    .bind(band.min_weight)
    .bind(band.max_weight)
    .bind(band.price)
    .execute(pool)
    .await?;

    Ok(())
}

/// Overwrite every column of an existing band. Returns `false` if no row matched.
pub async fn update(pool: &PgPool, band: &RateBand) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE rate_bands
         SET origin_country = $2, min_weight = $3, max_weight = $4, price = $5
         WHERE id = $1",
    )
    .bind(band.id)
    .bind(band.origin_country.as_str())
    .bind(band.min_weight)
    .bind(band.max_weight)
    .bind(band.price)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Delete a band. Returns `false` if no row matched.
pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM rate_bands WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Load all bands on startup.
pub async fn load_all(pool: &PgPool) -> Result<Vec<RateBand>, sqlx::Error> {
    let rows = sqlx::query_as::<_, RateBandRow>(
        "SELECT id, origin_country, min_weight, max_weight, price
         FROM rate_bands ORDER BY origin_country, min_weight",
    )
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(RateBandRow::into_band).collect()
}

/// Internal row type for SQLx mapping.
#[derive(sqlx::FromRow)]
struct RateBandRow {
    id: Uuid,
    origin_country: String,
    min_weight: Decimal,
    max_weight: Decimal,
    price: Decimal,
}

impl RateBandRow {
    fn into_band(self) -> Result<RateBand, sqlx::Error> {
        let origin_country: OriginCountry = self
            .origin_country
            .parse()
            .map_err(|e| sqlx::Error::Decode(Box::new(e)))?;
        Ok(RateBand {
            id: self.id,
            origin_country,
            min_weight: self.min_weight,
            max_weight: self.max_weight,
            price: self.price,
        })
    }
}
