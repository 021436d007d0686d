//! Shipping configuration persistence.
//!
//! The `shipping_config` table holds at most one row, `id = 1`.

use landed_core::ShippingConfig;
use rust_decimal::Decimal;
use sqlx::PgPool;

const SINGLETON_ID: i16 = 1;

/// Insert or replace the configuration row.
pub async fn upsert(pool: &PgPool, config: &ShippingConfig) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO shipping_config (id, vat_rate, local_handling_fee, margin_rate)
         VALUES ($1, $2, $3, $4)
         ON CONFLICT (id) DO UPDATE SET
             vat_rate = EXCLUDED.vat_rate,
             local_handling_fee = EXCLUDED.local_handling_fee,
             margin_rate = EXCLUDED.margin_rate",
    )
    .bind(SINGLETON_ID)
    .bind(config.vat_rate)
    .bind(config.local_handling_fee)
    .bind(config.margin_rate)
    .execute(pool)
    .await?;

    Ok(())
}

/// Load the configuration row, if it has been created.
pub async fn load(pool: &PgPool) -> Result<Option<ShippingConfig>, sqlx::Error> {
    let row = sqlx::query_as::<_, ShippingConfigRow>(
        "SELECT vat_rate, local_handling_fee, margin_rate FROM shipping_config WHERE id = $1",
    )
    .bind(SINGLETON_ID)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|r| ShippingConfig {
        vat_rate: r.vat_rate,
        local_handling_fee: r.local_handling_fee,
        margin_rate: r.margin_rate,
    }))
}

#[derive(sqlx::FromRow)]
struct ShippingConfigRow {
    vat_rate: Decimal,
    local_handling_fee: Decimal,
    margin_rate: Decimal,
}
