//! One-time transfer of links cached locally into the record store.
//!
//! The reconciler runs once at startup, before the first canonical list is
//! fetched. It is idempotent: every accepted legacy record carries a content
//! hash, and candidates whose hash already exists in the store are skipped,
//! so a retry after a partially applied batch never duplicates rows. A legacy
//! id already used by a different link is replaced with a fresh one.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;
use validator::ValidateUrl;

use crate::cache::{is_truthy, LocalCache, LEGACY_LINKS_KEY, MIGRATION_COMPLETE_KEY};
use crate::error::CoreResult;
use crate::hashing::sha256_hex;
use crate::link::{normalize_category, IdGenerator, Link};
use crate::store::{LinkOrder, RecordStore};
use crate::types::{LinkId, Timestamp};

/// Outcome of a reconciler run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MigrationStatus {
    /// Flag already set, or nothing cached.
    Skipped,
    /// The batch was inserted (possibly empty after de-duplication) and the
    /// flag is now set.
    Migrated,
    /// The flag stays unset; the next startup retries.
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigrationReport {
    pub status: MigrationStatus,
    pub batch_id: Option<Uuid>,
    pub inserted: usize,
    pub already_present: usize,
    /// Inserted under a fresh id because the legacy id was taken.
    pub reassigned: usize,
    pub rejected: usize,
    pub error: Option<String>,
    pub finished_at: Timestamp,
}

impl MigrationReport {
    fn new(status: MigrationStatus) -> Self {
        Self {
            status,
            batch_id: None,
            inserted: 0,
            already_present: 0,
            reassigned: 0,
            rejected: 0,
            error: None,
            finished_at: chrono::Utc::now(),
        }
    }

    fn skipped() -> Self {
        Self::new(MigrationStatus::Skipped)
    }

    fn failed(error: impl ToString) -> Self {
        Self {
            error: Some(error.to_string()),
            ..Self::new(MigrationStatus::Failed)
        }
    }
}

// ---------------------------------------------------------------------------
// Legacy records
// ---------------------------------------------------------------------------

/// A link as it was kept in the local cache. Every field may be missing.
#[derive(Debug, Default, Deserialize)]
struct LegacyLink {
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    author: Option<String>,
}

/// A legacy record that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Candidate {
    legacy_id: Option<LinkId>,
    title: String,
    url: String,
    category: Option<String>,
    author: String,
    content_hash: String,
}

impl Candidate {
    fn into_link(self, id: LinkId, batch: Uuid) -> Link {
        Link {
            id,
            title: self.title,
            url: self.url,
            category: self.category,
            author: self.author,
            migration_batch: Some(batch),
            content_hash: Some(self.content_hash),
        }
    }
}

/// `Ok(None)` when the id is missing and a fresh one must be assigned.
fn parse_legacy_id(value: Option<&Value>) -> Result<Option<LinkId>, String> {
    let id = match value {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::Number(n)) => match (n.as_i64(), n.as_f64()) {
            (Some(id), _) => id,
            (None, Some(f)) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => f as i64,
            _ => return Err(format!("id {n} is not an integer")),
        },
        Some(Value::String(s)) => s
            .trim()
            .parse::<i64>()
            .map_err(|_| format!("id {s:?} is not numeric"))?,
        Some(other) => return Err(format!("id {other} has an unsupported type")),
    };
    if id <= 0 {
        return Err(format!("id {id} is not positive"));
    }
    Ok(Some(id))
}

fn required(field: Option<String>, name: &str) -> Result<String, String> {
    field
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| format!("missing {name}"))
}

fn content_hash(
    legacy_id: Option<LinkId>,
    title: &str,
    url: &str,
    category: Option<&str>,
    author: &str,
) -> String {
    let canonical = (legacy_id, title, url, category, author);
    // Serializing a tuple of plain values cannot fail.
    let bytes = serde_json::to_vec(&canonical).unwrap_or_default();
    sha256_hex(&bytes)
}

fn parse_candidate(value: Value) -> Result<Candidate, String> {
    let legacy: LegacyLink =
        serde_json::from_value(value).map_err(|e| format!("unreadable record: {e}"))?;
    let legacy_id = parse_legacy_id(legacy.id.as_ref())?;
    let title = required(legacy.title, "title")?;
    let url = required(legacy.url, "url")?;
    if !url.validate_url() {
        return Err(format!("url {url:?} is not a valid URL"));
    }
    let author = required(legacy.author, "author")?;
    let category = normalize_category(legacy.category.as_deref());
    let content_hash = content_hash(legacy_id, &title, &url, category.as_deref(), &author);
    Ok(Candidate {
        legacy_id,
        title,
        url,
        category,
        author,
        content_hash,
    })
}

// ---------------------------------------------------------------------------
// Reconciler
// ---------------------------------------------------------------------------

pub struct MigrationReconciler<'a> {
    store: &'a dyn RecordStore,
    cache: &'a dyn LocalCache,
    ids: &'a IdGenerator,
}

impl<'a> MigrationReconciler<'a> {
    pub fn new(store: &'a dyn RecordStore, cache: &'a dyn LocalCache, ids: &'a IdGenerator) -> Self {
        Self { store, cache, ids }
    }

    /// Migrate, then load the canonical list ordered by id descending.
    ///
    /// A failed list is returned as an error alongside the report; the caller
    /// keeps whatever list it already had.
    pub async fn run(&self) -> (MigrationReport, CoreResult<Vec<Link>>) {
        let report = self.reconcile().await;
        let links = self
            .store
            .list_links(LinkOrder::IdDescending)
            .await
            .map_err(Into::into);
        if let Ok(links) = &links {
            for link in links {
                self.ids.observe(link.id);
            }
        }
        (report, links)
    }

    /// Perform the migration step alone. Never fails; failures are reported.
    pub async fn reconcile(&self) -> MigrationReport {
        match self.cache.get(MIGRATION_COMPLETE_KEY) {
            Ok(Some(flag)) if is_truthy(&flag) => {
                tracing::debug!("Legacy migration already complete");
                return MigrationReport::skipped();
            }
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(error = %e, "Cannot read migration flag");
                return MigrationReport::failed(e);
            }
        }

        let raw = match self.cache.get(LEGACY_LINKS_KEY) {
            Ok(Some(raw)) if !raw.trim().is_empty() => raw,
            Ok(_) => return MigrationReport::skipped(),
            Err(e) => {
                tracing::warn!(error = %e, "Cannot read legacy links");
                return MigrationReport::failed(e);
            }
        };

        let records: Vec<Value> = match serde_json::from_str(&raw) {
            Ok(records) => records,
            Err(e) => {
                tracing::warn!(error = %e, "Legacy link cache is not a JSON array");
                return MigrationReport::failed(format!("malformed legacy cache: {e}"));
            }
        };
        if records.is_empty() {
            return MigrationReport::skipped();
        }

        self.migrate(records).await
    }

    async fn migrate(&self, records: Vec<Value>) -> MigrationReport {
        let batch_id = Uuid::new_v4();
        let mut report = MigrationReport {
            batch_id: Some(batch_id),
            ..MigrationReport::new(MigrationStatus::Migrated)
        };

        let existing = match self.store.list_links(LinkOrder::IdAscending).await {
            Ok(links) => links,
            Err(e) => {
                tracing::error!(error = %e, "Legacy migration failed listing existing links");
                return MigrationReport {
                    batch_id: Some(batch_id),
                    ..MigrationReport::failed(e)
                };
            }
        };
        let mut seen_ids: HashSet<LinkId> = existing.iter().map(|l| l.id).collect();
        let mut seen_hashes: HashSet<String> = existing
            .iter()
            .filter_map(|l| l.content_hash.clone())
            .collect();
        for id in &seen_ids {
            self.ids.observe(*id);
        }

        let mut batch = Vec::with_capacity(records.len());
        for (index, value) in records.into_iter().enumerate() {
            let candidate = match parse_candidate(value) {
                Ok(candidate) => candidate,
                Err(reason) => {
                    tracing::warn!(index, %reason, "Rejected legacy link");
                    report.rejected += 1;
                    continue;
                }
            };

            if seen_hashes.contains(&candidate.content_hash) {
                report.already_present += 1;
                continue;
            }

            // The legacy id stays part of the hash, so a reassigned record is
            // still recognised on retry.
            let id = match candidate.legacy_id {
                Some(id) if seen_ids.contains(&id) => {
                    let fresh = self.ids.next_id();
                    tracing::warn!(
                        index,
                        legacy_id = id,
                        id = fresh,
                        "Legacy id taken by another link, reassigned"
                    );
                    report.reassigned += 1;
                    fresh
                }
                Some(id) => {
                    self.ids.observe(id);
                    id
                }
                None => self.ids.next_id(),
            };
            seen_ids.insert(id);
            seen_hashes.insert(candidate.content_hash.clone());
            batch.push(candidate.into_link(id, batch_id));
        }

        if !batch.is_empty() {
            if let Err(e) = self.store.insert_links(&batch).await {
                tracing::error!(%batch_id, error = %e, "Legacy migration insert failed, will retry");
                return MigrationReport {
                    status: MigrationStatus::Failed,
                    error: Some(e.to_string()),
                    ..report
                };
            }
        }
        report.inserted = batch.len();

        if let Err(e) = self.cache.set(MIGRATION_COMPLETE_KEY, "true") {
            tracing::warn!(error = %e, "Migrated links but could not set completion flag");
        }
        tracing::info!(
            %batch_id,
            inserted = report.inserted,
            already_present = report.already_present,
            reassigned = report.reassigned,
            rejected = report.rejected,
            "Legacy links migrated"
        );
        report
    }
}
