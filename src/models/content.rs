use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Every item is tagged with this platform, whatever its URL points at.
pub const DEFAULT_PLATFORM: &str = "Facebook";

pub fn default_category() -> String {
    "General".to_string()
}

/// A saved bookmark.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentItem {
    pub id: String,
    pub url: String,
    pub title: String,
    pub description: String,
    pub thumbnail: String,
    pub tags: Vec<String>,
    pub category: String,
    pub date_saved: Option<DateTime<Utc>>,
    pub platform: String,
}

/// Title, description and thumbnail scraped from a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMetadata {
    pub title: String,
    pub description: String,
    pub thumbnail: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewContent {
    pub url: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default = "default_category")]
    pub category: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContentUpdate {
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default = "default_category")]
    pub category: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchRequest {
    pub query: String,
}

/// One row of a category or tag aggregation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountEntry {
    pub name: String,
    pub count: i64,
}

impl ContentItem {
    /// Builds a fresh item with a new id, stamped with the current time.
    /// The timestamp is kept at microsecond precision, matching what the store persists.
    pub fn create(new: NewContent, metadata: PageMetadata) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            url: new.url,
            title: metadata.title,
            description: metadata.description,
            thumbnail: metadata.thumbnail,
            tags: new.tags,
            category: new.category,
            date_saved: Some(Utc::now().trunc_subsecs(6)),
            platform: DEFAULT_PLATFORM.to_string(),
        }
    }

    /// Case-insensitive substring match on title, description or category,
    /// or an exact match against one of the tags. `needle` must already be lowercased.
    pub fn matches_query(&self, needle: &str) -> bool {
        self.title.to_lowercase().contains(needle)
            || self.description.to_lowercase().contains(needle)
            || self.category.to_lowercase().contains(needle)
            || self.tags.iter().any(|tag| tag == needle)
    }
}
