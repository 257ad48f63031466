use axum::routing::{get, post};
use axum::Router;

use crate::handlers::links;
use crate::state::AppState;

/// Routes mounted at `/links`.
///
/// ```text
/// GET    /              -> list
/// POST   /              -> create
/// POST   /refresh       -> refresh
/// GET    /{id}          -> get_by_id
/// PUT    /{id}          -> update
/// DELETE /{id}          -> delete
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(links::list).post(links::create))
        .route("/refresh", post(links::refresh))
        .route(
            "/{id}",
            get(links::get_by_id)
                .put(links::update)
                .delete(links::delete),
        )
}
