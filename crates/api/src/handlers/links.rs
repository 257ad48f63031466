//! Handlers for the `/links` resource.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use linkshelf_core::link::{Link, LinkInput};
use linkshelf_core::types::LinkId;

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/links
///
/// The session's copy of the link list, newest first.
pub async fn list(State(state): State<AppState>) -> AppResult<Json<DataResponse<Vec<Link>>>> {
    let catalog = state.catalog.lock().await;
    Ok(Json(DataResponse {
        data: catalog.links().to_vec(),
    }))
}

/// POST /api/v1/links
pub async fn create(
    State(state): State<AppState>,
    Json(input): Json<LinkInput>,
) -> AppResult<(StatusCode, Json<DataResponse<Link>>)> {
    let mut catalog = state.catalog.lock().await;
    let link = catalog.add_link(input).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: link })))
}

/// GET /api/v1/links/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<LinkId>,
) -> AppResult<Json<DataResponse<Link>>> {
    let catalog = state.catalog.lock().await;
    let link = catalog.find(id)?.clone();
    Ok(Json(DataResponse { data: link }))
}

/// PUT /api/v1/links/{id}
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<LinkId>,
    Json(input): Json<LinkInput>,
) -> AppResult<Json<DataResponse<Link>>> {
    let mut catalog = state.catalog.lock().await;
    let link = catalog.update_link(id, input).await?;
    Ok(Json(DataResponse { data: link }))
}

/// DELETE /api/v1/links/{id}
pub async fn delete(State(state): State<AppState>, Path(id): Path<LinkId>) -> AppResult<StatusCode> {
    let mut catalog = state.catalog.lock().await;
    catalog.delete_link(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/links/refresh
///
/// Reload links and category order from the store. Also heals category
/// renames that were left half-applied.
pub async fn refresh(State(state): State<AppState>) -> AppResult<Json<DataResponse<Vec<Link>>>> {
    let mut catalog = state.catalog.lock().await;
    catalog.refresh().await?;
    Ok(Json(DataResponse {
        data: catalog.links().to_vec(),
    }))
}
