//! The single writer session over the link collection.
//!
//! `Catalog` owns the in-memory copy of links and category order, the current
//! view query, and the derived view. Every write goes to the store first; the
//! local copy and the view are only updated from successful results, so a
//! failure leaves the previous state in place.

use std::sync::{Arc, PoisonError, RwLock};

use crate::cache::LocalCache;
use crate::category_order::CategoryOrderStore;
use crate::error::{CoreError, CoreResult};
use crate::export::{view_to_csv, ExportRegistration, ExportRegistry};
use crate::link::{IdGenerator, Link, LinkInput, LinkMatch, LinkPatch};
use crate::migration::{MigrationReconciler, MigrationReport};
use crate::rename::{reconcile_pending, CategoryRenameCoordinator, RenameJournal, RenameOutcome};
use crate::reorder::{apply_gesture, ReorderGesture};
use crate::store::{LinkOrder, RecordStore};
use crate::types::LinkId;
use crate::view::{available_categories, derive_view, DerivedView, ViewQuery};

pub struct Catalog {
    store: Arc<dyn RecordStore>,
    cache: Arc<dyn LocalCache>,
    ids: IdGenerator,
    links: Vec<Link>,
    orders: CategoryOrderStore,
    journal: RenameJournal,
    query: ViewQuery,
    view: Arc<RwLock<DerivedView>>,
    last_migration: Option<MigrationReport>,
    export: Option<ExportRegistration>,
}

impl Catalog {
    pub fn new(store: Arc<dyn RecordStore>, cache: Arc<dyn LocalCache>) -> Self {
        Self {
            orders: CategoryOrderStore::new(Arc::clone(&store)),
            journal: RenameJournal::new(Arc::clone(&cache)),
            store,
            cache,
            ids: IdGenerator::new(),
            links: Vec::new(),
            query: ViewQuery::default(),
            view: Arc::new(RwLock::new(DerivedView::default())),
            last_migration: None,
            export: None,
        }
    }

    /// Startup sequence: migration, canonical list, order, rename heal.
    ///
    /// Never fails. Each step that fails is logged and the catalog keeps its
    /// previous (initially empty) state for that part.
    pub async fn start(&mut self) -> MigrationReport {
        let (report, links) =
            MigrationReconciler::new(self.store.as_ref(), self.cache.as_ref(), &self.ids)
                .run()
                .await;

        match links {
            Ok(links) => self.links = links,
            Err(e) => tracing::error!(error = %e, "Failed to load links"),
        }
        if let Err(e) = self.orders.load().await {
            tracing::error!(error = %e, "Failed to load category order");
        }
        reconcile_pending(&self.links, &mut self.orders, &self.journal).await;
        self.recompute();

        tracing::info!(
            links = self.links.len(),
            migration = ?report.status,
            "Catalog started"
        );
        self.last_migration = Some(report.clone());
        report
    }

    /// Reload links and order from the store, then heal pending renames.
    pub async fn refresh(&mut self) -> CoreResult<()> {
        let links = self.store.list_links(LinkOrder::IdDescending).await?;
        for link in &links {
            self.ids.observe(link.id);
        }
        self.links = links;

        let order_result = self.orders.load().await;
        reconcile_pending(&self.links, &mut self.orders, &self.journal).await;
        self.recompute();
        order_result.map(|_| ())
    }

    /// Links newest first.
    pub fn links(&self) -> &[Link] {
        &self.links
    }

    pub fn find(&self, id: LinkId) -> CoreResult<&Link> {
        self.links
            .iter()
            .find(|l| l.id == id)
            .ok_or(CoreError::NotFound { entity: "Link", id })
    }

    pub async fn add_link(&mut self, input: LinkInput) -> CoreResult<Link> {
        input.check()?;
        let link = input.into_link(self.ids.next_id());

        let inserted = self.store.insert_links(std::slice::from_ref(&link)).await?;
        let link = inserted.into_iter().next().unwrap_or(link);

        tracing::info!(id = link.id, "Link added");
        self.links.insert(0, link.clone());
        self.recompute();
        Ok(link)
    }

    pub async fn update_link(&mut self, id: LinkId, input: LinkInput) -> CoreResult<Link> {
        input.check()?;
        let patch = LinkPatch::from_input(input);

        let updated = self.store.update_links(&LinkMatch::Id(id), &patch).await?;
        if updated == 0 {
            return Err(CoreError::NotFound { entity: "Link", id });
        }

        let link = match self.links.iter_mut().find(|l| l.id == id) {
            Some(link) => {
                patch.apply(link);
                link.clone()
            }
            None => {
                // Stored but not in our copy: another writer added it.
                self.refresh().await?;
                self.find(id)?.clone()
            }
        };

        tracing::info!(id, "Link updated");
        self.recompute();
        Ok(link)
    }

    pub async fn delete_link(&mut self, id: LinkId) -> CoreResult<()> {
        let deleted = self.store.delete_links(&LinkMatch::Id(id)).await?;
        if deleted == 0 {
            return Err(CoreError::NotFound { entity: "Link", id });
        }
        self.links.retain(|l| l.id != id);
        tracing::info!(id, "Link deleted");
        self.recompute();
        Ok(())
    }

    pub fn query(&self) -> &ViewQuery {
        &self.query
    }

    pub fn set_query(&mut self, query: ViewQuery) {
        self.query = query;
        self.recompute();
    }

    /// Snapshot of the derived view for the current query.
    pub fn view(&self) -> DerivedView {
        self.view
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Distinct categories for the filter selector.
    pub fn categories(&self) -> Vec<String> {
        available_categories(&self.links)
    }

    /// The persisted category order as last loaded or saved.
    pub fn category_order(&self) -> &[String] {
        self.orders.order()
    }

    /// Rename a category, then refresh links from the store.
    ///
    /// Links are refreshed after a partial failure too, since the link step
    /// already applied.
    pub async fn rename_category(&mut self, old: &str, new: &str) -> CoreResult<RenameOutcome> {
        let result = CategoryRenameCoordinator::new(self.store.as_ref(), &mut self.orders, &self.journal)
            .rename(old, new)
            .await;

        let refresh_needed = match &result {
            Ok(outcome) => outcome.refresh_required(),
            Err(CoreError::PartialFailure { .. }) => true,
            Err(_) => false,
        };
        if refresh_needed {
            if let Err(e) = self.refresh_links().await {
                tracing::warn!(error = %e, "Refresh after rename failed");
            }
        }
        self.recompute();
        result
    }

    /// Apply a drag gesture to the displayed category sequence.
    pub async fn reorder(&mut self, gesture: ReorderGesture) -> CoreResult<Option<Vec<String>>> {
        if !self.orders.is_loaded() {
            self.orders.load().await?;
        }
        let displayed = self.view().labels();
        let result = apply_gesture(&mut self.orders, &displayed, gesture).await;
        // The optimistic order is shown even when persisting failed.
        self.recompute();
        result
    }

    /// Register this catalog's CSV export with `registry`.
    pub fn mount_export(&mut self, registry: &Arc<ExportRegistry>) {
        let view = Arc::clone(&self.view);
        self.export = Some(registry.register(move || {
            let view = view.read().unwrap_or_else(PoisonError::into_inner);
            view_to_csv(&view)
        }));
    }

    pub fn unmount_export(&mut self) {
        self.export = None;
    }

    pub fn last_migration(&self) -> Option<&MigrationReport> {
        self.last_migration.as_ref()
    }

    async fn refresh_links(&mut self) -> CoreResult<()> {
        self.links = self.store.list_links(LinkOrder::IdDescending).await?;
        Ok(())
    }

    fn recompute(&self) {
        let view = derive_view(&self.links, &self.query, self.orders.order());
        *self.view.write().unwrap_or_else(PoisonError::into_inner) = view;
    }
}
