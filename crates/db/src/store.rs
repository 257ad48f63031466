//! [`RecordStore`] over PostgreSQL.

use async_trait::async_trait;
use linkshelf_core::category_order::CategoryOrderRecord;
use linkshelf_core::link::{Link, LinkMatch, LinkPatch};
use linkshelf_core::store::{
    LinkOrder, RecordStore, StoreError, StoreResult, LINKS_COLLECTION,
};
use linkshelf_core::types::DbId;

use crate::models::link::LinkRow;
use crate::repositories::{CategoryOrderRepo, LinkRepo};
use crate::DbPool;

/// Map a sqlx failure to the store error the core understands.
///
/// Connection-level failures are `Unavailable`; anything the server itself
/// rejected is `Backend`.
pub fn store_error(err: sqlx::Error) -> StoreError {
    match &err {
        sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed => StoreError::Unavailable(err.to_string()),
        _ => StoreError::Backend(err.to_string()),
    }
}

/// Record store backed by a Postgres pool.
#[derive(Clone)]
pub struct PgRecordStore {
    pool: DbPool,
}

impl PgRecordStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

/// Convert rows, skipping (and logging) any that break link invariants.
fn valid_links(rows: Vec<LinkRow>) -> Vec<Link> {
    rows.into_iter()
        .filter_map(|row| {
            let id = row.id;
            Link::try_from(row)
                .map_err(|reason| tracing::warn!(id, %reason, "Skipping invalid link row"))
                .ok()
        })
        .collect()
}

#[async_trait]
impl RecordStore for PgRecordStore {
    async fn list_links(&self, order: LinkOrder) -> StoreResult<Vec<Link>> {
        let rows = LinkRepo::list(&self.pool, order).await.map_err(store_error)?;
        Ok(valid_links(rows))
    }

    async fn insert_links(&self, links: &[Link]) -> StoreResult<Vec<Link>> {
        let rows = LinkRepo::insert_batch(&self.pool, links)
            .await
            .map_err(store_error)?;
        rows.into_iter()
            .map(|row| {
                Link::try_from(row).map_err(|reason| StoreError::Malformed {
                    collection: LINKS_COLLECTION,
                    reason,
                })
            })
            .collect()
    }

    async fn update_links(&self, matcher: &LinkMatch, patch: &LinkPatch) -> StoreResult<u64> {
        LinkRepo::update_matching(&self.pool, matcher, patch)
            .await
            .map_err(store_error)
    }

    async fn delete_links(&self, matcher: &LinkMatch) -> StoreResult<u64> {
        LinkRepo::delete_matching(&self.pool, matcher)
            .await
            .map_err(store_error)
    }

    async fn get_category_order(&self) -> StoreResult<Option<CategoryOrderRecord>> {
        let row = CategoryOrderRepo::find_singleton(&self.pool)
            .await
            .map_err(store_error)?;
        Ok(row.map(Into::into))
    }

    async fn insert_category_order(&self, labels: &[String]) -> StoreResult<CategoryOrderRecord> {
        let row = CategoryOrderRepo::create(&self.pool, labels)
            .await
            .map_err(store_error)?;
        Ok(row.into())
    }

    async fn update_category_order(&self, id: DbId, labels: &[String]) -> StoreResult<bool> {
        CategoryOrderRepo::update(&self.pool, id, labels)
            .await
            .map_err(store_error)
    }

    async fn ping(&self) -> StoreResult<()> {
        crate::health_check(&self.pool).await.map_err(store_error)
    }
}
