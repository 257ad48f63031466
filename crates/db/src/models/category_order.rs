//! Category order row model.

use linkshelf_core::category_order::CategoryOrderRecord;
use linkshelf_core::types::{DbId, Timestamp};
use sqlx::FromRow;

/// A row from the `category_order` table.
#[derive(Debug, Clone, FromRow)]
pub struct CategoryOrderRow {
    pub id: DbId,
    /// NOT NULL in the database; defaults to `{}`.
    pub ordered_categories: Vec<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl From<CategoryOrderRow> for CategoryOrderRecord {
    fn from(row: CategoryOrderRow) -> Self {
        Self {
            id: row.id,
            ordered_categories: row.ordered_categories,
        }
    }
}
