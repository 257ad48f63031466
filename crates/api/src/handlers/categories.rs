//! Handlers for category listing, ordering, and rename.

use axum::extract::State;
use axum::Json;
use linkshelf_core::rename::RenameOutcome;
use linkshelf_core::reorder::ReorderGesture;
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// Request body for `POST /categories/rename`.
#[derive(Debug, Deserialize)]
pub struct RenameCategoryRequest {
    pub old_name: String,
    pub new_name: String,
}

/// GET /api/v1/categories
///
/// Distinct categories in first-seen order, for the filter selector.
pub async fn list(State(state): State<AppState>) -> AppResult<Json<DataResponse<Vec<String>>>> {
    let catalog = state.catalog.lock().await;
    Ok(Json(DataResponse {
        data: catalog.categories(),
    }))
}

/// GET /api/v1/categories/order
pub async fn get_order(
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<String>>>> {
    let catalog = state.catalog.lock().await;
    Ok(Json(DataResponse {
        data: catalog.category_order().to_vec(),
    }))
}

/// PUT /api/v1/categories/order
///
/// Apply a drag gesture over the displayed categories and return the
/// resulting order. A gesture without a destination changes nothing.
pub async fn reorder(
    State(state): State<AppState>,
    Json(gesture): Json<ReorderGesture>,
) -> AppResult<Json<DataResponse<Vec<String>>>> {
    let mut catalog = state.catalog.lock().await;
    catalog.reorder(gesture).await?;
    Ok(Json(DataResponse {
        data: catalog.category_order().to_vec(),
    }))
}

/// POST /api/v1/categories/rename
pub async fn rename(
    State(state): State<AppState>,
    Json(input): Json<RenameCategoryRequest>,
) -> AppResult<Json<DataResponse<RenameOutcome>>> {
    let old_name = input.old_name.trim();
    if old_name.is_empty() {
        return Err(AppError::BadRequest("old_name must not be empty".into()));
    }
    let mut catalog = state.catalog.lock().await;
    let outcome = catalog.rename_category(old_name, &input.new_name).await?;
    Ok(Json(DataResponse { data: outcome }))
}
