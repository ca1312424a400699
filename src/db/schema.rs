pub const SCHEMA: &str = r#"
-- content_items table
CREATE TABLE IF NOT EXISTS content_items (
    id TEXT PRIMARY KEY NOT NULL,
    url TEXT NOT NULL,
    title TEXT NOT NULL DEFAULT '',
    description TEXT NOT NULL DEFAULT '',
    thumbnail TEXT NOT NULL DEFAULT '',
    tags TEXT NOT NULL DEFAULT '[]',
    category TEXT,
    date_saved TEXT,
    platform TEXT NOT NULL DEFAULT 'Facebook'
);

CREATE INDEX IF NOT EXISTS idx_content_items_date_saved ON content_items(date_saved DESC);
CREATE INDEX IF NOT EXISTS idx_content_items_category ON content_items(category);
"#;
