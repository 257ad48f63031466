use axum::routing::{get, post};
use axum::Router;

use crate::handlers::view;
use crate::state::AppState;

/// View, navigation, and export routes (merged at the `/api/v1` root).
///
/// ```text
/// GET    /view          -> get_view
/// POST   /view/sort     -> toggle_sort
/// GET    /nav           -> nav
/// GET    /export.csv    -> export_csv
/// GET    /migration     -> migration_report
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/view", get(view::get_view))
        .route("/view/sort", post(view::toggle_sort))
        .route("/nav", get(view::nav))
        .route("/export.csv", get(view::export_csv))
        .route("/migration", get(view::migration_report))
}
