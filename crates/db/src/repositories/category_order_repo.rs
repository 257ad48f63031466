//! Repository for the `category_order` singleton table.

use linkshelf_core::types::DbId;
use sqlx::PgPool;

use crate::models::category_order::CategoryOrderRow;

const COLUMNS: &str = "id, ordered_categories, created_at, updated_at";

/// Provides access to the category order singleton.
pub struct CategoryOrderRepo;

impl CategoryOrderRepo {
    /// Fetch the singleton. When several rows exist the lowest id wins.
    pub async fn find_singleton(pool: &PgPool) -> Result<Option<CategoryOrderRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM category_order ORDER BY id ASC LIMIT 2");
        let mut rows = sqlx::query_as::<_, CategoryOrderRow>(&query)
            .fetch_all(pool)
            .await?;
        if rows.len() > 1 {
            tracing::warn!(
                kept = rows[0].id,
                "Multiple category order rows found, using the lowest id"
            );
        }
        rows.truncate(1);
        Ok(rows.pop())
    }

    /// Insert a new order row, returning it.
    pub async fn create(pool: &PgPool, labels: &[String]) -> Result<CategoryOrderRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO category_order (ordered_categories) VALUES ($1) RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, CategoryOrderRow>(&query)
            .bind(labels)
            .fetch_one(pool)
            .await
    }

    /// Replace the labels of row `id`. Returns `true` if the row exists.
    pub async fn update(pool: &PgPool, id: DbId, labels: &[String]) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE category_order SET ordered_categories = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(labels)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
