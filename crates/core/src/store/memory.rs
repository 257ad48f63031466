//! In-process [`RecordStore`] used by tests and local runs.
//!
//! Supports fault injection per operation so failure paths (migration retry,
//! partial rename, reorder persistence) can be exercised without a database.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use super::{LinkOrder, RecordStore, StoreError, StoreResult};
use crate::category_order::CategoryOrderRecord;
use crate::link::{Link, LinkMatch, LinkPatch};
use crate::types::DbId;

/// Store operations that can be counted or made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    ListLinks,
    InsertLinks,
    UpdateLinks,
    DeleteLinks,
    GetCategoryOrder,
    InsertCategoryOrder,
    UpdateCategoryOrder,
}

#[derive(Debug, Default)]
struct MemoryState {
    links: Vec<Link>,
    orders: Vec<CategoryOrderRecord>,
    next_order_id: DbId,
    failing: HashSet<StoreOp>,
    /// Insert only this many records of the next batch, then fail.
    partial_insert: Option<usize>,
    calls: HashMap<StoreOp, usize>,
}

/// A [`RecordStore`] held entirely in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with existing links.
    pub fn with_links(links: Vec<Link>) -> Self {
        let store = Self::new();
        store.lock().links = links;
        store
    }

    /// Seed the store with an existing category order record.
    pub fn with_category_order(self, labels: Vec<String>) -> Self {
        {
            let mut state = self.lock();
            state.next_order_id += 1;
            let id = state.next_order_id;
            state.orders.push(CategoryOrderRecord {
                id,
                ordered_categories: labels,
            });
        }
        self
    }

    /// Make every subsequent `op` fail until [`recover`](Self::recover).
    pub fn fail(&self, op: StoreOp) {
        self.lock().failing.insert(op);
    }

    pub fn recover(&self, op: StoreOp) {
        self.lock().failing.remove(&op);
    }

    /// Make the next insert persist only its first `count` records and fail.
    pub fn fail_insert_after(&self, count: usize) {
        self.lock().partial_insert = Some(count);
    }

    /// How many times `op` has been invoked (including failed calls).
    pub fn calls(&self, op: StoreOp) -> usize {
        self.lock().calls.get(&op).copied().unwrap_or(0)
    }

    /// Snapshot of the stored links in insertion order.
    pub fn links(&self) -> Vec<Link> {
        self.lock().links.clone()
    }

    /// Snapshot of every stored category order record.
    pub fn category_orders(&self) -> Vec<CategoryOrderRecord> {
        self.lock().orders.clone()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record the call and return the guard, or an injected failure.
    fn begin(&self, op: StoreOp) -> StoreResult<MutexGuard<'_, MemoryState>> {
        let mut state = self.lock();
        *state.calls.entry(op).or_insert(0) += 1;
        if state.failing.contains(&op) {
            return Err(StoreError::Unavailable(format!("injected failure on {op:?}")));
        }
        Ok(state)
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn list_links(&self, order: LinkOrder) -> StoreResult<Vec<Link>> {
        let state = self.begin(StoreOp::ListLinks)?;
        let mut links = state.links.clone();
        match order {
            LinkOrder::IdDescending => links.sort_by(|a, b| b.id.cmp(&a.id)),
            LinkOrder::IdAscending => links.sort_by_key(|l| l.id),
        }
        Ok(links)
    }

    async fn insert_links(&self, links: &[Link]) -> StoreResult<Vec<Link>> {
        let mut state = self.begin(StoreOp::InsertLinks)?;

        let mut seen: HashSet<i64> = state.links.iter().map(|l| l.id).collect();
        for link in links {
            if !seen.insert(link.id) {
                return Err(StoreError::Backend(format!(
                    "duplicate key value violates primary key: id {}",
                    link.id
                )));
            }
        }

        if let Some(count) = state.partial_insert.take() {
            let applied: Vec<Link> = links.iter().take(count).cloned().collect();
            state.links.extend(applied);
            return Err(StoreError::Unavailable(format!(
                "connection lost after inserting {count} records"
            )));
        }

        state.links.extend(links.iter().cloned());
        Ok(links.to_vec())
    }

    async fn update_links(&self, matcher: &LinkMatch, patch: &LinkPatch) -> StoreResult<u64> {
        let mut state = self.begin(StoreOp::UpdateLinks)?;
        let mut changed = 0;
        for link in state.links.iter_mut().filter(|l| matcher.matches(l)) {
            patch.apply(link);
            changed += 1;
        }
        Ok(changed)
    }

    async fn delete_links(&self, matcher: &LinkMatch) -> StoreResult<u64> {
        let mut state = self.begin(StoreOp::DeleteLinks)?;
        let before = state.links.len();
        state.links.retain(|l| !matcher.matches(l));
        Ok((before - state.links.len()) as u64)
    }

    async fn get_category_order(&self) -> StoreResult<Option<CategoryOrderRecord>> {
        let state = self.begin(StoreOp::GetCategoryOrder)?;
        Ok(state.orders.iter().min_by_key(|r| r.id).cloned())
    }

    async fn insert_category_order(&self, labels: &[String]) -> StoreResult<CategoryOrderRecord> {
        let mut state = self.begin(StoreOp::InsertCategoryOrder)?;
        state.next_order_id += 1;
        let record = CategoryOrderRecord {
            id: state.next_order_id,
            ordered_categories: labels.to_vec(),
        };
        state.orders.push(record.clone());
        Ok(record)
    }

    async fn update_category_order(&self, id: DbId, labels: &[String]) -> StoreResult<bool> {
        let mut state = self.begin(StoreOp::UpdateCategoryOrder)?;
        match state.orders.iter_mut().find(|r| r.id == id) {
            Some(record) => {
                record.ordered_categories = labels.to_vec();
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn link(id: i64, category: Option<&str>) -> Link {
        Link {
            id,
            title: format!("Link {id}"),
            url: format!("https://example.com/{id}"),
            category: category.map(str::to_string),
            author: "ana".into(),
            migration_batch: None,
            content_hash: None,
        }
    }

    #[tokio::test]
    async fn list_orders_by_id() {
        let store = MemoryStore::with_links(vec![link(2, None), link(3, None), link(1, None)]);
        let desc = store.list_links(LinkOrder::IdDescending).await.unwrap();
        assert_eq!(desc.iter().map(|l| l.id).collect::<Vec<_>>(), vec![3, 2, 1]);
        let asc = store.list_links(LinkOrder::IdAscending).await.unwrap();
        assert_eq!(asc.iter().map(|l| l.id).collect::<Vec<_>>(), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn duplicate_id_rejects_whole_batch() {
        let store = MemoryStore::with_links(vec![link(1, None)]);
        let result = store.insert_links(&[link(2, None), link(1, None)]).await;
        assert!(matches!(result, Err(StoreError::Backend(_))));
        assert_eq!(store.links().len(), 1);
    }

    #[tokio::test]
    async fn partial_insert_keeps_prefix() {
        let store = MemoryStore::new();
        store.fail_insert_after(1);
        let result = store.insert_links(&[link(1, None), link(2, None)]).await;
        assert!(result.is_err());
        assert_eq!(store.links().len(), 1);
        // The knob only applies once.
        store.insert_links(&[link(2, None)]).await.unwrap();
        assert_eq!(store.links().len(), 2);
    }

    #[tokio::test]
    async fn injected_failure_is_counted() {
        let store = MemoryStore::new();
        store.fail(StoreOp::ListLinks);
        assert!(store.list_links(LinkOrder::default()).await.is_err());
        store.recover(StoreOp::ListLinks);
        assert!(store.list_links(LinkOrder::default()).await.is_ok());
        assert_eq!(store.calls(StoreOp::ListLinks), 2);
    }

    #[tokio::test]
    async fn update_by_label_matches_uncategorized() {
        let store = MemoryStore::with_links(vec![link(1, None), link(2, Some("Docs"))]);
        let changed = store
            .update_links(
                &LinkMatch::CategoryLabel("uncategorized".into()),
                &LinkPatch::category(Some("Misc".into())),
            )
            .await
            .unwrap();
        assert_eq!(changed, 1);
        assert_eq!(store.links()[0].category.as_deref(), Some("Misc"));
    }

    #[tokio::test]
    async fn singleton_prefers_lowest_id() {
        let store = MemoryStore::new()
            .with_category_order(vec!["A".into()])
            .with_category_order(vec!["B".into()]);
        let record = store.get_category_order().await.unwrap().unwrap();
        assert_eq!(record.ordered_categories, vec!["A".to_string()]);
    }

    #[tokio::test]
    async fn update_unknown_order_returns_false() {
        let store = MemoryStore::new();
        assert!(!store.update_category_order(99, &[]).await.unwrap());
    }
}
