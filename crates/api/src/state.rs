use std::sync::Arc;

use linkshelf_core::catalog::Catalog;
use linkshelf_core::export::ExportRegistry;
use linkshelf_core::store::RecordStore;
use tokio::sync::Mutex;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable; everything lives behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// The single writer session. Each request holds the lock for its whole
    /// operation so catalog updates never interleave.
    pub catalog: Arc<Mutex<Catalog>>,
    /// Record store, for health probes outside the catalog lock.
    pub store: Arc<dyn RecordStore>,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Export action slot read by the nav payload and the CSV route.
    pub export: Arc<ExportRegistry>,
}
