//! Handlers for the derived view, header payload, and export.

use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::Json;
use linkshelf_core::migration::MigrationReport;
use linkshelf_core::view::{DerivedView, SortKey};
use serde::Serialize;

use crate::error::{AppError, AppResult};
use crate::query::{SortRequest, ViewParams};
use crate::response::DataResponse;
use crate::state::AppState;

/// Header/nav payload.
#[derive(Debug, Serialize)]
pub struct NavResponse {
    /// Whether the export action is currently offered.
    pub export_available: bool,
}

/// GET /api/v1/view
///
/// Merge the query parameters into the session query and return the
/// resulting grouped view. The CSV export follows the latest query.
pub async fn get_view(
    State(state): State<AppState>,
    Query(params): Query<ViewParams>,
) -> AppResult<Json<DataResponse<DerivedView>>> {
    let mut catalog = state.catalog.lock().await;
    let query = params.apply_to(catalog.query())?;
    catalog.set_query(query);
    Ok(Json(DataResponse {
        data: catalog.view(),
    }))
}

/// POST /api/v1/view/sort
///
/// Column-header click: same key while ascending flips to descending,
/// anything else sorts ascending.
pub async fn toggle_sort(
    State(state): State<AppState>,
    Json(input): Json<SortRequest>,
) -> AppResult<Json<DataResponse<DerivedView>>> {
    let key: SortKey = input.key.parse()?;
    let mut catalog = state.catalog.lock().await;
    let mut query = catalog.query().clone();
    query.sort = query.sort.request(key);
    catalog.set_query(query);
    Ok(Json(DataResponse {
        data: catalog.view(),
    }))
}

/// GET /api/v1/nav
pub async fn nav(State(state): State<AppState>) -> Json<DataResponse<NavResponse>> {
    Json(DataResponse {
        data: NavResponse {
            export_available: state.export.is_available(),
        },
    })
}

/// GET /api/v1/export.csv
///
/// Invoke the registered export action. Returns `text/csv`.
pub async fn export_csv(
    State(state): State<AppState>,
) -> AppResult<(
    StatusCode,
    [(header::HeaderName, &'static str); 2],
    String,
)> {
    let csv = state
        .export
        .invoke()
        .ok_or_else(|| AppError::NotFound("No export action is registered".into()))?;
    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/csv"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"links.csv\"",
            ),
        ],
        csv,
    ))
}

/// GET /api/v1/migration
///
/// Report of the migration run at startup (`null` before startup finished).
pub async fn migration_report(
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Option<MigrationReport>>>> {
    let catalog = state.catalog.lock().await;
    Ok(Json(DataResponse {
        data: catalog.last_migration().cloned(),
    }))
}
