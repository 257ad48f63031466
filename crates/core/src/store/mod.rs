//! The record store seam.
//!
//! The catalog only ever talks to the remote store through [`RecordStore`].
//! Two collections are addressed: `links` and the singleton `category_order`.
//! Implementations: [`memory::MemoryStore`] here, `PgRecordStore` in
//! `linkshelf-db`.

pub mod memory;

use async_trait::async_trait;

use crate::category_order::CategoryOrderRecord;
use crate::link::{Link, LinkMatch, LinkPatch};
use crate::types::DbId;

pub use memory::MemoryStore;

/// Collection holding link records, named in [`StoreError::Malformed`].
pub const LINKS_COLLECTION: &str = "links";

/// Failure reported by a record store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Transport or connection failure.
    #[error("connection failed: {0}")]
    Unavailable(String),

    /// The store answered with something that is not a valid record.
    #[error("malformed record in {collection}: {reason}")]
    Malformed {
        collection: &'static str,
        reason: String,
    },

    /// Any other failure reported by the backing engine.
    #[error("backend error: {0}")]
    Backend(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Sort order for [`RecordStore::list_links`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LinkOrder {
    /// Most recently created first.
    #[default]
    IdDescending,
    IdAscending,
}

/// Minimal CRUD surface the catalog needs from the remote store.
///
/// Every call is a suspension point; none of them is cancelled or timed out
/// by the core.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// List every link in the given order.
    async fn list_links(&self, order: LinkOrder) -> StoreResult<Vec<Link>>;

    /// Insert a batch of links, returning them as persisted.
    async fn insert_links(&self, links: &[Link]) -> StoreResult<Vec<Link>>;

    /// Apply `patch` to every link matched by `matcher`. Returns the number of
    /// links changed.
    async fn update_links(&self, matcher: &LinkMatch, patch: &LinkPatch) -> StoreResult<u64>;

    /// Delete every link matched by `matcher`. Returns the number removed.
    async fn delete_links(&self, matcher: &LinkMatch) -> StoreResult<u64>;

    /// Fetch the category order singleton. `Ok(None)` means it does not exist
    /// yet; errors are real failures.
    async fn get_category_order(&self) -> StoreResult<Option<CategoryOrderRecord>>;

    /// Create the category order record.
    async fn insert_category_order(&self, labels: &[String]) -> StoreResult<CategoryOrderRecord>;

    /// Replace the labels of the record with `id`. Returns `false` if no such
    /// record exists.
    async fn update_category_order(&self, id: DbId, labels: &[String]) -> StoreResult<bool>;

    /// Cheap reachability probe used by health checks.
    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}
