//! Link row model.

use linkshelf_core::link::Link;
use linkshelf_core::types::{LinkId, Timestamp};
use sqlx::FromRow;
use uuid::Uuid;

/// A row from the `links` table.
#[derive(Debug, Clone, FromRow)]
pub struct LinkRow {
    pub id: LinkId,
    pub title: String,
    pub url: String,
    pub category: Option<String>,
    pub author: String,
    pub migration_batch: Option<Uuid>,
    pub content_hash: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl TryFrom<LinkRow> for Link {
    type Error = String;

    fn try_from(row: LinkRow) -> Result<Self, Self::Error> {
        let link = Link {
            id: row.id,
            title: row.title,
            url: row.url,
            category: row.category,
            author: row.author,
            migration_batch: row.migration_batch,
            content_hash: row.content_hash,
        };
        link.check_stored()?;
        Ok(link)
    }
}
