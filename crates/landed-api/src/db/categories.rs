//! Category persistence operations.
//!
//! All functions take a `&PgPool` and operate on the `categories` table.

use landed_core::Category;
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

/// Insert a new category.
pub async fn insert(pool: &PgPool, category: &Category) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT INTO categories (id, name, duty_rate) VALUES ($1, $2, $3)")
        .bind(category.id)
        .bind(&category.name)
        .bind(category.duty_rate)
        .execute(pool)
        .await?;

    Ok(())
}

/// Overwrite an existing category. Returns `false` if no row matched.
pub async fn update(pool: &PgPool, category: &Category) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("UPDATE categories SET name = $2, duty_rate = $3 WHERE id = $1")
        .bind(category.id)
        .bind(&category.name)
        .bind(category.duty_rate)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Delete a category. Returns `false` if no row matched.
pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM categories WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Load all categories on startup.
pub async fn load_all(pool: &PgPool) -> Result<Vec<Category>, sqlx::Error> {
    let rows = sqlx::query_as::<_, CategoryRow>(
        "SELECT id, name, duty_rate FROM categories ORDER BY name",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(CategoryRow::into_category).collect())
}

#[derive(sqlx::FromRow)]
struct CategoryRow {
    id: Uuid,
    name: String,
    duty_rate: Decimal,
}

impl CategoryRow {
    fn into_category(self) -> Category {
        Category {
            id: self.id,
            name: self.name,
            duty_rate: self.duty_rate,
        }
    }
}
