//! Category rename across the link collection and the category order.
//!
//! The store offers no multi-record transaction, so each rename is recorded
//! in a [`RenameJournal`] before any store call and cleared once both steps
//! succeed. [`reconcile_pending`] heals entries left behind by a failure in
//! the second step.

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::cache::{LocalCache, PENDING_RENAMES_KEY};
use crate::category_order::{rename_in_order, CategoryOrderStore};
use crate::error::{CoreError, CoreResult};
use crate::link::{Link, LinkMatch, LinkPatch, UNCATEGORIZED};
use crate::store::RecordStore;
use crate::types::Timestamp;

// ---------------------------------------------------------------------------
// Journal
// ---------------------------------------------------------------------------

/// A rename whose order update has not been confirmed yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingRename {
    pub old: String,
    pub new: String,
    pub recorded_at: Timestamp,
}

impl PendingRename {
    fn is_for(&self, old: &str, new: &str) -> bool {
        self.old == old && self.new == new
    }
}

/// Persistent log of in-flight renames, stored in the local cache.
///
/// Journal I/O failures are logged and never block a rename.
#[derive(Clone)]
pub struct RenameJournal {
    cache: Arc<dyn LocalCache>,
}

impl RenameJournal {
    pub fn new(cache: Arc<dyn LocalCache>) -> Self {
        Self { cache }
    }

    /// Entries that have not been cleared.
    pub fn pending(&self) -> Vec<PendingRename> {
        let raw = match self.cache.get(PENDING_RENAMES_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read rename journal");
                return Vec::new();
            }
        };
        serde_json::from_str(&raw).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Discarding unreadable rename journal");
            Vec::new()
        })
    }

    pub fn record(&self, old: &str, new: &str) {
        let mut entries = self.pending();
        if !entries.iter().any(|p| p.is_for(old, new)) {
            entries.push(PendingRename {
                old: old.to_string(),
                new: new.to_string(),
                recorded_at: Utc::now(),
            });
        }
        self.write(&entries);
    }

    pub fn clear(&self, old: &str, new: &str) {
        let mut entries = self.pending();
        let before = entries.len();
        entries.retain(|p| !p.is_for(old, new));
        if entries.len() != before {
            self.write(&entries);
        }
    }

    fn write(&self, entries: &[PendingRename]) {
        let result = if entries.is_empty() {
            self.cache.remove(PENDING_RENAMES_KEY)
        } else {
            match serde_json::to_string(entries) {
                Ok(raw) => self.cache.set(PENDING_RENAMES_KEY, &raw),
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to encode rename journal");
                    return;
                }
            }
        };
        if let Err(e) = result {
            tracing::warn!(error = %e, "Failed to write rename journal");
        }
    }
}

// ---------------------------------------------------------------------------
// Coordinator
// ---------------------------------------------------------------------------

/// Result of a rename request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RenameOutcome {
    /// Empty or identical new label: no store calls were made.
    Unchanged,
    /// Both steps applied. The caller must refresh its links from the store.
    Renamed { links_updated: u64, order_updated: bool },
}

impl RenameOutcome {
    pub fn refresh_required(&self) -> bool {
        matches!(self, Self::Renamed { .. })
    }
}

/// Renames a category in the link collection, then in the category order.
pub struct CategoryRenameCoordinator<'a> {
    store: &'a dyn RecordStore,
    orders: &'a mut CategoryOrderStore,
    journal: &'a RenameJournal,
}

impl<'a> CategoryRenameCoordinator<'a> {
    pub fn new(
        store: &'a dyn RecordStore,
        orders: &'a mut CategoryOrderStore,
        journal: &'a RenameJournal,
    ) -> Self {
        Self {
            store,
            orders,
            journal,
        }
    }

    /// Rename `old` to `new`.
    ///
    /// A failure of the link update aborts before the order is touched. A
    /// failure of the order update after the links were renamed is reported
    /// as [`CoreError::PartialFailure`]; the journal entry stays so the next
    /// reconcile pass can heal it.
    pub async fn rename(&mut self, old: &str, new: &str) -> CoreResult<RenameOutcome> {
        let old = old.trim();
        let new = new.trim();
        if old.is_empty() || new.is_empty() || new == old {
            return Ok(RenameOutcome::Unchanged);
        }
        if new == UNCATEGORIZED {
            return Err(CoreError::Validation(format!(
                "'{UNCATEGORIZED}' is reserved for links without a category"
            )));
        }

        self.journal.record(old, new);

        // Step 1: links.
        let links_updated = match self
            .store
            .update_links(
                &LinkMatch::CategoryLabel(old.to_string()),
                &LinkPatch::category(Some(new.to_string())),
            )
            .await
        {
            Ok(n) => n,
            Err(e) => {
                self.journal.clear(old, new);
                tracing::error!(old, new, error = %e, "Category rename aborted");
                return Err(e.into());
            }
        };
        tracing::info!(old, new, links_updated, "Links renamed");

        // Step 2: order record.
        let order_updated = match self.rename_in_persisted_order(old, new).await {
            Ok(updated) => updated,
            Err(e) => {
                tracing::error!(
                    old,
                    new,
                    error = %e,
                    "Category order left referencing the old label"
                );
                return Err(CoreError::PartialFailure {
                    completed: "link category rename",
                    failed: "category order update",
                    source: Box::new(e),
                });
            }
        };

        self.journal.clear(old, new);
        Ok(RenameOutcome::Renamed {
            links_updated,
            order_updated,
        })
    }

    async fn rename_in_persisted_order(&mut self, old: &str, new: &str) -> CoreResult<bool> {
        if !self.orders.is_loaded() {
            self.orders.load().await?;
        }
        if !self.orders.order().iter().any(|l| l == old) {
            return Ok(false);
        }
        let renamed = rename_in_order(self.orders.order(), old, new);
        self.orders.save(renamed).await?;
        Ok(true)
    }
}

// ---------------------------------------------------------------------------
// Reconcile pass
// ---------------------------------------------------------------------------

/// Heal journal entries left by partially failed renames.
///
/// For each pending `old -> new`:
/// - links still carry `old`: the link step never applied, drop the entry;
/// - the order still holds `old`: replace it and save, drop on success;
/// - otherwise nothing diverged, drop the entry.
///
/// Returns the entries that were healed. Entries whose heal failed stay
/// pending for the next pass.
pub async fn reconcile_pending(
    links: &[Link],
    orders: &mut CategoryOrderStore,
    journal: &RenameJournal,
) -> Vec<PendingRename> {
    let pending = journal.pending();
    if pending.is_empty() {
        return Vec::new();
    }

    if !orders.is_loaded() {
        if let Err(e) = orders.load().await {
            tracing::warn!(error = %e, "Skipping rename reconcile, category order unavailable");
            return Vec::new();
        }
    }

    let mut healed = Vec::new();
    for entry in pending {
        let links_diverge = links.iter().any(|l| l.category_label() == entry.old);
        let order_diverges = orders.order().iter().any(|l| *l == entry.old);

        if links_diverge || !order_diverges {
            journal.clear(&entry.old, &entry.new);
            continue;
        }

        let renamed = rename_in_order(orders.order(), &entry.old, &entry.new);
        match orders.save(renamed).await {
            Ok(()) => {
                tracing::info!(old = %entry.old, new = %entry.new, "Healed category order after partial rename");
                journal.clear(&entry.old, &entry.new);
                healed.push(entry);
            }
            Err(e) => {
                tracing::warn!(old = %entry.old, new = %entry.new, error = %e, "Rename heal failed, will retry");
            }
        }
    }
    healed
}
