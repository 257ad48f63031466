use axum::routing::{get, post};
use axum::Router;

use crate::handlers::categories;
use crate::state::AppState;

/// Routes mounted at `/categories`.
///
/// ```text
/// GET    /              -> list
/// GET    /order         -> get_order
/// PUT    /order         -> reorder
/// POST   /rename        -> rename
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(categories::list))
        .route(
            "/order",
            get(categories::get_order).put(categories::reorder),
        )
        .route("/rename", post(categories::rename))
}
