//! Link records, their input DTO, and the creation-time id generator.

use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{TimeZone, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::error::{CoreError, CoreResult};
use crate::types::{LinkId, Timestamp};

/// Group label used for links without a category.
pub const UNCATEGORIZED: &str = "uncategorized";

/// A stored bookmark.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub id: LinkId,
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub category: Option<String>,
    pub author: String,
    /// Reconciler run that inserted this row (migrated rows only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub migration_batch: Option<Uuid>,
    /// Fingerprint of the legacy record this row was migrated from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_hash: Option<String>,
}

impl Link {
    /// The category as a plain string, empty when absent.
    pub fn category_str(&self) -> &str {
        self.category.as_deref().unwrap_or("")
    }

    /// The label of the group this link is displayed under.
    pub fn category_label(&self) -> &str {
        match self.category.as_deref() {
            Some(c) if !c.is_empty() => c,
            _ => UNCATEGORIZED,
        }
    }

    /// Creation time recovered from the millisecond id.
    pub fn created_at(&self) -> Option<Timestamp> {
        Utc.timestamp_millis_opt(self.id).single()
    }

    /// Check the invariants every persisted link must hold.
    ///
    /// Used at the store boundary so rows missing required fields never reach
    /// sort/filter logic.
    pub fn check_stored(&self) -> Result<(), String> {
        if self.title.trim().is_empty() {
            return Err(format!("link {} has an empty title", self.id));
        }
        if self.url.trim().is_empty() {
            return Err(format!("link {} has an empty url", self.id));
        }
        if self.author.trim().is_empty() {
            return Err(format!("link {} has an empty author", self.id));
        }
        Ok(())
    }
}

/// Add/Edit form payload.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LinkInput {
    #[validate(length(min = 1, message = "title is required"))]
    pub title: String,
    #[validate(url(message = "url must be a valid URL"))]
    pub url: String,
    #[serde(default)]
    pub category: Option<String>,
    #[validate(length(min = 1, message = "author is required"))]
    pub author: String,
}

impl LinkInput {
    /// Validate the payload, mapping failures to [`CoreError::Validation`].
    pub fn check(&self) -> CoreResult<()> {
        self.validate()
            .map_err(|e| CoreError::Validation(e.to_string()))?;
        if self.title.trim().is_empty() || self.author.trim().is_empty() {
            return Err(CoreError::Validation(
                "title and author must not be blank".into(),
            ));
        }
        Ok(())
    }

    /// Category with surrounding whitespace removed; blank becomes `None`.
    pub fn normalized_category(&self) -> Option<String> {
        normalize_category(self.category.as_deref())
    }

    /// Build a new link with the given id.
    pub fn into_link(self, id: LinkId) -> Link {
        let category = self.normalized_category();
        Link {
            id,
            title: self.title.trim().to_string(),
            url: self.url.trim().to_string(),
            category,
            author: self.author.trim().to_string(),
            migration_batch: None,
            content_hash: None,
        }
    }
}

/// Trim a category; blank or missing means uncategorized.
pub fn normalize_category(category: Option<&str>) -> Option<String> {
    category
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string)
}

/// Matches links for bulk update and delete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkMatch {
    /// A single link by id.
    Id(LinkId),
    /// Every link displayed under the given group label. `"uncategorized"`
    /// therefore also matches links with no category.
    CategoryLabel(String),
}

impl LinkMatch {
    pub fn matches(&self, link: &Link) -> bool {
        match self {
            Self::Id(id) => link.id == *id,
            Self::CategoryLabel(label) => link.category_label() == label,
        }
    }
}

/// Partial update applied to matched links. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkPatch {
    pub title: Option<String>,
    pub url: Option<String>,
    /// `Some(None)` clears the category.
    pub category: Option<Option<String>>,
    pub author: Option<String>,
}

impl LinkPatch {
    /// Patch that only changes the category.
    pub fn category(category: Option<String>) -> Self {
        Self {
            category: Some(category),
            ..Self::default()
        }
    }

    /// Patch carrying every editable field of a form submission.
    pub fn from_input(input: LinkInput) -> Self {
        let category = input.normalized_category();
        Self {
            title: Some(input.title.trim().to_string()),
            url: Some(input.url.trim().to_string()),
            category: Some(category),
            author: Some(input.author.trim().to_string()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.url.is_none() && self.category.is_none() && self.author.is_none()
    }

    /// Apply the patch to an in-memory link.
    pub fn apply(&self, link: &mut Link) {
        if let Some(title) = &self.title {
            link.title = title.clone();
        }
        if let Some(url) = &self.url {
            link.url = url.clone();
        }
        if let Some(category) = &self.category {
            link.category = category.clone();
        }
        if let Some(author) = &self.author {
            link.author = author.clone();
        }
    }
}

/// Hands out creation-timestamp ids that never repeat within a session, even
/// when two links are created in the same millisecond.
#[derive(Debug, Default)]
pub struct IdGenerator {
    last: AtomicI64,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make sure future ids are greater than `id`.
    pub fn observe(&self, id: LinkId) {
        self.last.fetch_max(id, Ordering::SeqCst);
    }

    pub fn next_id(&self) -> LinkId {
        let now = Utc::now().timestamp_millis();
        let mut prev = self.last.load(Ordering::SeqCst);
        loop {
            let candidate = now.max(prev + 1);
            match self
                .last
                .compare_exchange(prev, candidate, Ordering::SeqCst, Ordering::SeqCst)
            {
                Ok(_) => return candidate,
                Err(actual) => prev = actual,
            }
        }
    }
}
