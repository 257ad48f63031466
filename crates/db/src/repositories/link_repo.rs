//! Repository for the `links` table.

use linkshelf_core::link::{Link, LinkMatch, LinkPatch, UNCATEGORIZED};
use linkshelf_core::store::LinkOrder;
use linkshelf_core::types::LinkId;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::link::LinkRow;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, title, url, category, author, migration_batch, content_hash, \
                       created_at, updated_at";

/// `WHERE` fragment for a matcher, using placeholder `$n`.
///
/// A category label matches links whose category is missing or empty when
/// the label is the uncategorized group.
fn match_clause(matcher: &LinkMatch, n: usize) -> String {
    match matcher {
        LinkMatch::Id(_) => format!("id = ${n}"),
        LinkMatch::CategoryLabel(_) => {
            format!("COALESCE(NULLIF(category, ''), '{UNCATEGORIZED}') = ${n}")
        }
    }
}

/// Provides list, batch insert, and match-based update/delete for links.
pub struct LinkRepo;

impl LinkRepo {
    /// List every link ordered by id.
    pub async fn list(pool: &PgPool, order: LinkOrder) -> Result<Vec<LinkRow>, sqlx::Error> {
        let direction = match order {
            LinkOrder::IdDescending => "DESC",
            LinkOrder::IdAscending => "ASC",
        };
        let query = format!("SELECT {COLUMNS} FROM links ORDER BY id {direction}");
        sqlx::query_as::<_, LinkRow>(&query).fetch_all(pool).await
    }

    /// Find a link by id.
    pub async fn find_by_id(pool: &PgPool, id: LinkId) -> Result<Option<LinkRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM links WHERE id = $1");
        sqlx::query_as::<_, LinkRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Insert a batch of links in a single statement.
    ///
    /// The statement is atomic: a duplicate id or content hash rejects the
    /// whole batch.
    pub async fn insert_batch(pool: &PgPool, links: &[Link]) -> Result<Vec<LinkRow>, sqlx::Error> {
        if links.is_empty() {
            return Ok(vec![]);
        }

        let ids: Vec<LinkId> = links.iter().map(|l| l.id).collect();
        let titles: Vec<String> = links.iter().map(|l| l.title.clone()).collect();
        let urls: Vec<String> = links.iter().map(|l| l.url.clone()).collect();
        let categories: Vec<Option<String>> = links.iter().map(|l| l.category.clone()).collect();
        let authors: Vec<String> = links.iter().map(|l| l.author.clone()).collect();
        let batches: Vec<Option<Uuid>> = links.iter().map(|l| l.migration_batch).collect();
        let hashes: Vec<Option<String>> = links.iter().map(|l| l.content_hash.clone()).collect();

        let query = format!(
            "INSERT INTO links \
                (id, title, url, category, author, migration_batch, content_hash) \
             SELECT * FROM UNNEST($1::bigint[], $2::text[], $3::text[], $4::text[], \
                                  $5::text[], $6::uuid[], $7::text[]) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, LinkRow>(&query)
            .bind(&ids)
            .bind(&titles)
            .bind(&urls)
            .bind(&categories)
            .bind(&authors)
            .bind(&batches)
            .bind(&hashes)
            .fetch_all(pool)
            .await
    }

    /// Apply a patch to every matching link. Returns the number of rows changed.
    ///
    /// `None` patch fields leave the column unchanged; a `Some(None)` category
    /// clears it.
    pub async fn update_matching(
        pool: &PgPool,
        matcher: &LinkMatch,
        patch: &LinkPatch,
    ) -> Result<u64, sqlx::Error> {
        let query = format!(
            "UPDATE links SET
                title = COALESCE($1, title),
                url = COALESCE($2, url),
                category = CASE WHEN $3::BOOLEAN THEN $4 ELSE category END,
                author = COALESCE($5, author),
                updated_at = NOW()
             WHERE {}",
            match_clause(matcher, 6)
        );
        let q = sqlx::query(&query)
            .bind(&patch.title)
            .bind(&patch.url)
            .bind(patch.category.is_some())
            .bind(patch.category.clone().flatten())
            .bind(&patch.author);
        let q = match matcher {
            LinkMatch::Id(id) => q.bind(*id),
            LinkMatch::CategoryLabel(label) => q.bind(label.clone()),
        };
        let result = q.execute(pool).await?;
        Ok(result.rows_affected())
    }

    /// Delete every matching link. Returns the number of rows removed.
    pub async fn delete_matching(pool: &PgPool, matcher: &LinkMatch) -> Result<u64, sqlx::Error> {
        let query = format!("DELETE FROM links WHERE {}", match_clause(matcher, 1));
        let q = sqlx::query(&query);
        let q = match matcher {
            LinkMatch::Id(id) => q.bind(*id),
            LinkMatch::CategoryLabel(label) => q.bind(label.clone()),
        };
        let result = q.execute(pool).await?;
        Ok(result.rows_affected())
    }
}
