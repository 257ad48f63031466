pub mod categories;
pub mod health;
pub mod links;
pub mod view;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /links                                   list, add
/// /links/refresh                           reload from the store
/// /links/{id}                              get, edit, delete
///
/// /categories                              available categories
/// /categories/order                        persisted order, reorder gesture
/// /categories/rename                       rename across links and order
///
/// /view                                    derived grouped view
/// /view/sort                               column-toggle sort
/// /nav                                     header payload
/// /export.csv                              CSV export of the current view
/// /migration                               last startup migration report
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/links", links::router())
        .nest("/categories", categories::router())
        .merge(view::router())
}
