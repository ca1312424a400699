use std::collections::HashMap;
use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, OptionalExtension, Row};
use tokio_rusqlite::Connection;

use crate::config::IN_MEMORY;
use crate::error::{AppError, Result};
use crate::models::{ContentItem, CountEntry, DEFAULT_PLATFORM};

use super::schema::SCHEMA;

const ITEM_COLUMNS: &str =
    "id, url, title, description, thumbnail, tags, category, date_saved, platform";

/// Handle on the content collection. Cheap to share behind an `Arc`.
pub struct Repository {
    conn: Connection,
}

impl Repository {
    /// Opens (or creates) the database at `db_path` and ensures the schema exists.
    pub async fn open(db_path: &str) -> Result<Self> {
        if db_path == IN_MEMORY {
            return Self::open_in_memory().await;
        }
        if let Some(parent) = Path::new(db_path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(db_path).await?;
        Self::init(conn).await
    }

    pub async fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().await?;
        Self::init(conn).await
    }

    async fn init(conn: Connection) -> Result<Self> {
        conn.call(|conn| {
            conn.execute_batch(SCHEMA)?;
            Ok(())
        })
        .await?;

        Ok(Self { conn })
    }

    /// Releases the underlying connection.
    pub async fn close(self) -> Result<()> {
        self.conn.close().await?;
        Ok(())
    }

    pub async fn insert(&self, item: &ContentItem) -> Result<()> {
        let tags_json = serde_json::to_string(&item.tags)?;
        let item = item.clone();
        self.conn
            .call(move |conn| {
                conn.execute(
                    r#"INSERT INTO content_items
                           (id, url, title, description, thumbnail, tags, category, date_saved, platform)
                       VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)"#,
                    params![
                        item.id,
                        item.url,
                        item.title,
                        item.description,
                        item.thumbnail,
                        tags_json,
                        item.category,
                        item.date_saved.map(format_datetime),
                        item.platform,
                    ],
                )?;
                Ok(())
            })
            .await?;
        Ok(())
    }

    pub async fn get(&self, id: &str) -> Result<Option<ContentItem>> {
        let id = id.to_string();
        let item = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {} FROM content_items WHERE id = ?1",
                    ITEM_COLUMNS
                ))?;
                let item = stmt.query_row(params![id], item_from_row).optional()?;
                Ok(item)
            })
            .await?;
        Ok(item)
    }

    /// Every item, newest first. Items without a timestamp come last.
    pub async fn list_all(&self) -> Result<Vec<ContentItem>> {
        let mut items = self
            .conn
            .call(|conn| {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {} FROM content_items ORDER BY rowid DESC",
                    ITEM_COLUMNS
                ))?;
                let items = stmt
                    .query_map([], item_from_row)?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(items)
            })
            .await?;
        sort_newest_first(&mut items);
        Ok(items)
    }

    /// Items whose title, description or category contain `query` (ignoring case),
    /// or that carry the lowercased query as a tag.
    pub async fn search(&self, query: &str) -> Result<Vec<ContentItem>> {
        let needle = query.to_lowercase();
        let items = self
            .list_all()
            .await?
            .into_iter()
            .filter(|item| item.matches_query(&needle))
            .collect();
        Ok(items)
    }

    /// Replaces the tags and category of an item and returns the stored result.
    pub async fn update(
        &self,
        id: &str,
        tags: Vec<String>,
        category: String,
    ) -> Result<ContentItem> {
        let tags_json = serde_json::to_string(&tags)?;
        let target = id.to_string();
        let changed = self
            .conn
            .call(move |conn| {
                let changed = conn.execute(
                    "UPDATE content_items SET tags = ?1, category = ?2 WHERE id = ?3",
                    params![tags_json, category, target],
                )?;
                Ok(changed)
            })
            .await?;

        if changed == 0 {
            return Err(AppError::NotFound("Content".to_string()));
        }
        self.get(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Content".to_string()))
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        let id = id.to_string();
        let deleted = self
            .conn
            .call(move |conn| {
                let deleted = conn.execute("DELETE FROM content_items WHERE id = ?1", params![id])?;
                Ok(deleted)
            })
            .await?;

        if deleted == 0 {
            return Err(AppError::NotFound("Content".to_string()));
        }
        Ok(())
    }

    // Aggregations

    pub async fn aggregate_categories(&self) -> Result<Vec<CountEntry>> {
        let counts = self
            .conn
            .call(|conn| {
                let mut stmt = conn.prepare(
                    r#"SELECT category, COUNT(*) AS count
                       FROM content_items
                       WHERE category IS NOT NULL AND category <> ''
                       GROUP BY category
                       ORDER BY count DESC, category ASC"#,
                )?;
                let counts = stmt
                    .query_map([], count_from_row)?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(counts)
            })
            .await?;
        Ok(counts)
    }

    /// Tag counts over the decoded items, so rows whose tags were coerced
    /// to an empty list contribute nothing.
    pub async fn aggregate_tags(&self) -> Result<Vec<CountEntry>> {
        let mut counts: HashMap<String, i64> = HashMap::new();
        for item in self.list_all().await? {
            for tag in item.tags.into_iter().filter(|t| !t.is_empty()) {
                *counts.entry(tag).or_insert(0) += 1;
            }
        }

        let mut counts: Vec<CountEntry> = counts
            .into_iter()
            .map(|(name, count)| CountEntry { name, count })
            .collect();
        counts.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));
        Ok(counts)
    }
}

fn format_datetime(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    // SQLite datetime('now') format
    if let Ok(naive) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Some(naive.and_utc());
    }
    None
}

/// Stable sort so rows with equal timestamps keep their insertion order (newest first).
fn sort_newest_first(items: &mut [ContentItem]) {
    items.sort_by(|a, b| b.date_saved.cmp(&a.date_saved));
}

fn item_from_row(row: &Row) -> rusqlite::Result<ContentItem> {
    let id: String = row.get("id")?;

    let tags = match row.get::<_, Option<String>>("tags")? {
        Some(raw) => serde_json::from_str(&raw).unwrap_or_else(|e| {
            tracing::warn!("Item {} has malformed tags {:?}: {}", id, raw, e);
            Vec::new()
        }),
        None => Vec::new(),
    };

    let date_saved = row
        .get::<_, Option<String>>("date_saved")?
        .and_then(|s| {
            let parsed = parse_datetime(&s);
            if parsed.is_none() {
                tracing::warn!("Item {} has unparseable date_saved {:?}", id, s);
            }
            parsed
        });

    Ok(ContentItem {
        url: row.get("url")?,
        title: row.get::<_, Option<String>>("title")?.unwrap_or_default(),
        description: row.get::<_, Option<String>>("description")?.unwrap_or_default(),
        thumbnail: row.get::<_, Option<String>>("thumbnail")?.unwrap_or_default(),
        tags,
        category: row.get::<_, Option<String>>("category")?.unwrap_or_default(),
        date_saved,
        platform: row
            .get::<_, Option<String>>("platform")?
            .unwrap_or_else(|| DEFAULT_PLATFORM.to_string()),
        id,
    })
}

fn count_from_row(row: &Row) -> rusqlite::Result<CountEntry> {
    Ok(CountEntry {
        name: row.get(0)?,
        count: row.get(1)?,
    })
}
