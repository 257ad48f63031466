//! Persisted, user-controlled ordering of category labels.
//!
//! The order lives in a singleton record discovered lazily: [`CategoryOrderStore::load`]
//! creates it when absent. Labels that no longer match any link are kept in
//! storage and only filtered when the view is derived.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::store::RecordStore;
use crate::types::DbId;

/// The singleton category order record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryOrderRecord {
    pub id: DbId,
    pub ordered_categories: Vec<String>,
}

/// Remove duplicate labels (first occurrence wins) and reject empty ones.
pub fn normalize_order(labels: Vec<String>) -> CoreResult<Vec<String>> {
    let mut out: Vec<String> = Vec::with_capacity(labels.len());
    for label in labels {
        if label.is_empty() {
            return Err(CoreError::Validation(
                "category order must not contain empty labels".into(),
            ));
        }
        if !out.contains(&label) {
            out.push(label);
        }
    }
    Ok(out)
}

/// Replace `old` with `new` in place.
///
/// If `new` is already present its existing slot is kept and `old` is dropped,
/// so the sequence stays distinct. Absent `old` leaves the order unchanged.
pub fn rename_in_order(order: &[String], old: &str, new: &str) -> Vec<String> {
    if !order.iter().any(|l| l == old) {
        return order.to_vec();
    }
    let new_present = order.iter().any(|l| l == new);
    order
        .iter()
        .filter_map(|label| {
            if label == old {
                (!new_present).then(|| new.to_string())
            } else {
                Some(label.clone())
            }
        })
        .collect()
}

/// Client-side handle on the category order singleton.
pub struct CategoryOrderStore {
    store: Arc<dyn RecordStore>,
    id: Option<DbId>,
    order: Vec<String>,
}

impl CategoryOrderStore {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self {
            store,
            id: None,
            order: Vec::new(),
        }
    }

    /// Identifier of the singleton, known after a successful [`load`](Self::load).
    pub fn id(&self) -> Option<DbId> {
        self.id
    }

    pub fn is_loaded(&self) -> bool {
        self.id.is_some()
    }

    /// The current in-memory order.
    pub fn order(&self) -> &[String] {
        &self.order
    }

    /// Fetch the singleton, creating it with an empty order if absent.
    pub async fn load(&mut self) -> CoreResult<DbId> {
        let record = match self.store.get_category_order().await? {
            Some(record) => record,
            None => {
                let record = self.store.insert_category_order(&[]).await?;
                tracing::info!(id = record.id, "Created category order record");
                record
            }
        };
        self.id = Some(record.id);
        // Tolerate duplicated labels from older writers.
        self.order = dedup(record.ordered_categories);
        Ok(record.id)
    }

    /// Adopt `order` in memory without persisting it.
    ///
    /// Used for optimistic updates; the next [`load`](Self::load) reconciles
    /// against whatever was actually persisted.
    pub fn adopt(&mut self, order: Vec<String>) -> CoreResult<()> {
        self.order = normalize_order(order)?;
        Ok(())
    }

    /// Persist a full replacement of the order.
    ///
    /// Must follow a successful [`load`](Self::load). On failure the in-memory
    /// order is left as it was.
    pub async fn save(&mut self, order: Vec<String>) -> CoreResult<()> {
        let id = self.id.ok_or_else(|| {
            CoreError::Internal("category order saved before it was loaded".into())
        })?;
        let order = normalize_order(order)?;

        if !self.store.update_category_order(id, &order).await? {
            return Err(CoreError::NotFound {
                entity: "CategoryOrder",
                id,
            });
        }
        tracing::debug!(id, count = order.len(), "Category order saved");
        self.order = order;
        Ok(())
    }
}

fn dedup(labels: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(labels.len());
    for label in labels {
        if !label.is_empty() && !out.contains(&label) {
            out.push(label);
        }
    }
    out
}
