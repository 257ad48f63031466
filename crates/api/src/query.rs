//! Query parameter types shared by view handlers.

use linkshelf_core::error::CoreResult;
use linkshelf_core::view::{SortConfig, SortDirection, SortKey, ViewQuery};
use serde::Deserialize;

/// View parameters (`?search=&category=&sort=&direction=`).
///
/// Omitted parameters keep the session's current value, so a bare
/// `GET /view` re-renders the last query.
#[derive(Debug, Default, Deserialize)]
pub struct ViewParams {
    pub search: Option<String>,
    pub category: Option<String>,
    pub sort: Option<String>,
    pub direction: Option<String>,
}

impl ViewParams {
    /// Merge these parameters over `current`. Unknown sort names are a
    /// validation error.
    pub fn apply_to(self, current: &ViewQuery) -> CoreResult<ViewQuery> {
        let key = match self.sort.as_deref() {
            Some(name) => name.parse::<SortKey>()?,
            None => current.sort.key,
        };
        let direction = match self.direction.as_deref() {
            Some(name) => name.parse::<SortDirection>()?,
            None => current.sort.direction,
        };
        Ok(ViewQuery {
            search: self.search.unwrap_or_else(|| current.search.clone()),
            category: self.category.unwrap_or_else(|| current.category.clone()),
            sort: SortConfig::new(key, direction),
        })
    }
}

/// Body of `POST /view/sort`: the column header that was clicked.
#[derive(Debug, Deserialize)]
pub struct SortRequest {
    pub key: String,
}
