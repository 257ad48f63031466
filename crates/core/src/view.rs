//! Derived catalog view: filter, sort, group, and order categories.
//!
//! [`derive_view`] is a pure function of its inputs. It holds no state and is
//! re-run whenever links, the query, or the persisted category order change.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::link::{Link, UNCATEGORIZED};

// ---------------------------------------------------------------------------
// Sort configuration
// ---------------------------------------------------------------------------

/// Field a view is sorted by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    /// Creation order.
    #[default]
    Id,
    Title,
    Category,
    Author,
}

impl SortKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Title => "title",
            Self::Category => "category",
            Self::Author => "author",
        }
    }

    /// All valid key names.
    pub const ALL: &'static [&'static str] = &["id", "title", "category", "author"];
}

impl FromStr for SortKey {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "id" => Ok(Self::Id),
            "title" => Ok(Self::Title),
            "category" => Ok(Self::Category),
            "author" => Ok(Self::Author),
            other => Err(CoreError::Validation(format!(
                "Invalid sort key '{other}'. Must be one of: {}",
                Self::ALL.join(", ")
            ))),
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    Ascending,
    #[default]
    Descending,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ascending => "ascending",
            Self::Descending => "descending",
        }
    }
}

impl FromStr for SortDirection {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ascending" | "asc" => Ok(Self::Ascending),
            "descending" | "desc" => Ok(Self::Descending),
            other => Err(CoreError::Validation(format!(
                "Invalid sort direction '{other}'. Must be ascending or descending"
            ))),
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sort key plus direction. Defaults to newest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SortConfig {
    pub key: SortKey,
    pub direction: SortDirection,
}

impl SortConfig {
    pub fn new(key: SortKey, direction: SortDirection) -> Self {
        Self { key, direction }
    }

    /// Column-toggle rule: re-selecting the current key while ascending flips
    /// to descending; anything else starts ascending.
    pub fn request(self, key: SortKey) -> Self {
        let direction = if self.key == key && self.direction == SortDirection::Ascending {
            SortDirection::Descending
        } else {
            SortDirection::Ascending
        };
        Self { key, direction }
    }
}

// ---------------------------------------------------------------------------
// Query and output
// ---------------------------------------------------------------------------

/// User-controlled view state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewQuery {
    /// Case-insensitive substring searched in title, url, category, author.
    #[serde(default)]
    pub search: String,
    /// Exact (case-sensitive) category; empty means all.
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub sort: SortConfig,
}

/// One displayed category with its links in sort order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryGroup {
    pub label: String,
    pub links: Vec<Link>,
}

/// The ordered groups shown to the user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DerivedView {
    pub groups: Vec<CategoryGroup>,
}

impl DerivedView {
    /// `true` when no link survived filtering.
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Displayed category sequence, as used by drag reorder gestures.
    pub fn labels(&self) -> Vec<String> {
        self.groups.iter().map(|g| g.label.clone()).collect()
    }

    pub fn link_count(&self) -> usize {
        self.groups.iter().map(|g| g.links.len()).sum()
    }

    /// All links in display order.
    pub fn links(&self) -> impl Iterator<Item = &Link> {
        self.groups.iter().flat_map(|g| g.links.iter())
    }
}

// ---------------------------------------------------------------------------
// Filtering
// ---------------------------------------------------------------------------

/// Whether `term` (case-insensitive) occurs in any searchable field.
pub fn matches_search(link: &Link, term: &str) -> bool {
    let needle = term.to_lowercase();
    [
        link.title.as_str(),
        link.url.as_str(),
        link.category_str(),
        link.author.as_str(),
    ]
    .iter()
    .any(|field| field.to_lowercase().contains(&needle))
}

/// Whether the link passes the category filter (empty filter passes all).
pub fn matches_category(link: &Link, filter: &str) -> bool {
    filter.is_empty() || link.category.as_deref() == Some(filter)
}

pub fn filter_links<'a>(links: &'a [Link], query: &ViewQuery) -> Vec<&'a Link> {
    links
        .iter()
        .filter(|l| matches_search(l, &query.search) && matches_category(l, &query.category))
        .collect()
}

// ---------------------------------------------------------------------------
// Sorting
// ---------------------------------------------------------------------------

fn compare(a: &Link, b: &Link, key: SortKey) -> Ordering {
    match key {
        SortKey::Id => a.id.cmp(&b.id),
        SortKey::Title => a.title.to_lowercase().cmp(&b.title.to_lowercase()),
        SortKey::Category => a
            .category_str()
            .to_lowercase()
            .cmp(&b.category_str().to_lowercase()),
        SortKey::Author => a.author.to_lowercase().cmp(&b.author.to_lowercase()),
    }
}

/// Stable sort; equal keys keep their input order in both directions.
pub fn sort_links(links: &mut [&Link], sort: SortConfig) {
    links.sort_by(|a, b| {
        let ord = compare(a, b, sort.key);
        match sort.direction {
            SortDirection::Ascending => ord,
            SortDirection::Descending => ord.reverse(),
        }
    });
}

// ---------------------------------------------------------------------------
// Grouping and category order
// ---------------------------------------------------------------------------

/// Partition links by group label, in order of first appearance.
pub fn group_links<'a>(links: &[&'a Link]) -> Vec<(String, Vec<&'a Link>)> {
    let mut groups: Vec<(String, Vec<&'a Link>)> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for &link in links {
        let label = link.category_label();
        match index.get(label) {
            Some(&i) => groups[i].1.push(link),
            None => {
                index.insert(label, groups.len());
                groups.push((label.to_string(), vec![link]));
            }
        }
    }
    groups
}

/// Final category sequence: persisted labels that still have a group, then
/// the remaining groups in first-appearance order.
pub fn order_categories(group_labels: &[&str], persisted: &[String]) -> Vec<String> {
    let mut ordered: Vec<String> = persisted
        .iter()
        .filter(|label| group_labels.contains(&label.as_str()))
        .cloned()
        .collect();
    for label in group_labels {
        if !persisted.iter().any(|p| p == label) {
            ordered.push((*label).to_string());
        }
    }
    ordered
}

/// Distinct non-empty categories in first-seen order, for the filter selector.
pub fn available_categories(links: &[Link]) -> Vec<String> {
    let mut seen: Vec<String> = Vec::new();
    for category in links.iter().filter_map(|l| l.category.as_deref()) {
        if !category.is_empty() && !seen.iter().any(|s| s == category) {
            seen.push(category.to_string());
        }
    }
    seen
}

/// Derive the grouped, ordered view.
pub fn derive_view(links: &[Link], query: &ViewQuery, persisted_order: &[String]) -> DerivedView {
    let mut filtered = filter_links(links, query);
    sort_links(&mut filtered, query.sort);
    let grouped = group_links(&filtered);

    let labels: Vec<&str> = grouped.iter().map(|(label, _)| label.as_str()).collect();
    let ordered = order_categories(&labels, persisted_order);

    let mut by_label: HashMap<String, Vec<&Link>> = grouped.into_iter().collect();
    let groups = ordered
        .into_iter()
        .filter_map(|label| {
            by_label.remove(&label).map(|links| CategoryGroup {
                links: links.into_iter().cloned().collect(),
                label,
            })
        })
        .collect();

    DerivedView { groups }
}
