//! Process-wide slot for the "export" action.
//!
//! The list view registers a callback while it is mounted; the header reads
//! the slot on every render to decide whether to offer the action. Dropping
//! the returned [`ExportRegistration`] empties the slot again.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use crate::view::DerivedView;

/// Produces the export payload on demand.
pub type ExportFn = Arc<dyn Fn() -> String + Send + Sync>;

#[derive(Default)]
pub struct ExportRegistry {
    slot: RwLock<Option<(u64, ExportFn)>>,
    next_token: AtomicU64,
}

impl ExportRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install `export`, replacing any previous producer.
    ///
    /// The slot stays filled until the returned guard is dropped. A guard
    /// whose producer has since been replaced leaves the slot alone.
    pub fn register<F>(self: &Arc<Self>, export: F) -> ExportRegistration
    where
        F: Fn() -> String + Send + Sync + 'static,
    {
        let token = self.next_token.fetch_add(1, Ordering::Relaxed) + 1;
        *self.slot.write().unwrap_or_else(PoisonError::into_inner) = Some((token, Arc::new(export)));
        tracing::debug!(token, "Export action registered");
        ExportRegistration {
            registry: Arc::clone(self),
            token,
        }
    }

    pub fn is_available(&self) -> bool {
        self.slot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Run the registered producer, if any.
    pub fn invoke(&self) -> Option<String> {
        // Clone the callback out so it runs without holding the lock.
        let export = self
            .slot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|(_, f)| Arc::clone(f))?;
        Some(export())
    }

    fn unregister(&self, token: u64) {
        let mut slot = self.slot.write().unwrap_or_else(PoisonError::into_inner);
        if slot.as_ref().is_some_and(|(current, _)| *current == token) {
            *slot = None;
            tracing::debug!(token, "Export action unregistered");
        }
    }
}

/// Keeps an export producer registered for as long as it lives.
#[must_use = "the export action is unregistered when this guard is dropped"]
pub struct ExportRegistration {
    registry: Arc<ExportRegistry>,
    token: u64,
}

impl Drop for ExportRegistration {
    fn drop(&mut self) {
        self.registry.unregister(self.token);
    }
}

// ---------------------------------------------------------------------------
// CSV rendering
// ---------------------------------------------------------------------------

pub const CSV_HEADER: &str = "id,title,url,category,author,created_at";

/// Escape a value for CSV output.
fn csv_escape(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Render the links of `view` in display order.
pub fn view_to_csv(view: &DerivedView) -> String {
    let mut lines = Vec::with_capacity(view.link_count() + 1);
    lines.push(CSV_HEADER.to_string());

    for link in view.links() {
        let created_at = link
            .created_at()
            .map(|t| t.to_rfc3339())
            .unwrap_or_default();
        let row = [
            link.id.to_string(),
            csv_escape(&link.title),
            csv_escape(&link.url),
            csv_escape(link.category_str()),
            csv_escape(&link.author),
            created_at,
        ];
        lines.push(row.join(","));
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::link::Link;
    use crate::view::CategoryGroup;

    fn link(id: i64, title: &str, category: Option<&str>) -> Link {
        Link {
            id,
            title: title.to_string(),
            url: format!("https://example.com/{id}"),
            category: category.map(str::to_string),
            author: "ana".into(),
            migration_batch: None,
            content_hash: None,
        }
    }

    // -- registry -------------------------------------------------------------

    #[test]
    fn empty_registry_has_no_action() {
        let registry = ExportRegistry::new();
        assert!(!registry.is_available());
        assert_eq!(registry.invoke(), None);
    }

    #[test]
    fn registration_lives_with_guard() {
        let registry = Arc::new(ExportRegistry::new());
        let guard = registry.register(|| "payload".to_string());

        assert!(registry.is_available());
        assert_eq!(registry.invoke().as_deref(), Some("payload"));

        drop(guard);
        assert!(!registry.is_available());
    }

    #[test]
    fn stale_guard_does_not_clear_newer_producer() {
        let registry = Arc::new(ExportRegistry::new());
        let first = registry.register(|| "first".to_string());
        let _second = registry.register(|| "second".to_string());

        drop(first);

        assert_eq!(registry.invoke().as_deref(), Some("second"));
    }

    // -- csv --------------------------------------------------------------------

    #[test]
    fn escapes_commas_quotes_and_newlines() {
        assert_eq!(csv_escape("plain"), "plain");
        assert_eq!(csv_escape("a,b"), "\"a,b\"");
        assert_eq!(csv_escape("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(csv_escape("two\nlines"), "\"two\nlines\"");
    }

    #[test]
    fn csv_follows_display_order() {
        let view = DerivedView {
            groups: vec![
                CategoryGroup {
                    label: "X".into(),
                    links: vec![link(1_700_000_000_000, "Hello, world", Some("X"))],
                },
                CategoryGroup {
                    label: "uncategorized".into(),
                    links: vec![link(1_600_000_000_000, "Plain", None)],
                },
            ],
        };

        let csv = view_to_csv(&view);
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines[0], CSV_HEADER);
        assert_eq!(
            lines[1],
            "1700000000000,\"Hello, world\",https://example.com/1700000000000,X,ana,2023-11-14T22:13:20+00:00"
        );
        assert!(lines[2].starts_with("1600000000000,Plain,https://example.com/1600000000000,,ana,"));
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn empty_view_is_header_only() {
        assert_eq!(view_to_csv(&DerivedView::default()), CSV_HEADER);
    }
}
