use std::time::Duration;

use regex::Regex;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use reqwest::Client;
use url::Url;

use crate::error::Result;
use crate::models::PageMetadata;

const USER_AGENT_STRING: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

pub const FALLBACK_TITLE: &str = "Unable to fetch title";
pub const FALLBACK_DESCRIPTION: &str = "Unable to fetch description";
pub const DEFAULT_TITLE: &str = "Untitled";
pub const DEFAULT_DESCRIPTION: &str = "No description available";

const TITLE_PATTERNS: &[&str] = &[r#"(?i)<title[^>]*>([^<]+)</title>"#];

const DESCRIPTION_PATTERNS: &[&str] = &[
    r#"(?i)<meta\s+name=["']description["']\s+content=["']([^"']*)["']"#,
    r#"(?i)<meta\s+property=["']og:description["']\s+content=["']([^"']*)["']"#,
    // content before name
    r#"(?i)<meta\s+content=["']([^"']*)["'][^>]*name=["']description["']"#,
];

const THUMBNAIL_PATTERNS: &[&str] = &[
    r#"(?i)<meta\s+property=["']og:image["']\s+content=["']([^"']*)["']"#,
    r#"(?i)<meta\s+name=["']twitter:image["']\s+content=["']([^"']*)["']"#,
    // content before property
    r#"(?i)<meta\s+content=["']([^"']*)["'][^>]*property=["']og:image["']"#,
];

impl PageMetadata {
    /// Values reported when the page could not be fetched at all.
    pub fn unavailable() -> Self {
        Self {
            title: FALLBACK_TITLE.to_string(),
            description: FALLBACK_DESCRIPTION.to_string(),
            thumbnail: String::new(),
        }
    }
}

/// Ordered pattern lists, one per field. The first pattern that matches wins.
pub struct ExtractionRules {
    title: Vec<Regex>,
    description: Vec<Regex>,
    thumbnail: Vec<Regex>,
}

impl ExtractionRules {
    pub fn new() -> Result<Self> {
        Ok(Self {
            title: compile(TITLE_PATTERNS)?,
            description: compile(DESCRIPTION_PATTERNS)?,
            thumbnail: compile(THUMBNAIL_PATTERNS)?,
        })
    }

    /// Scans raw markup. Fields with no match get their defaults.
    pub fn scan(&self, html: &str) -> PageMetadata {
        let title = first_match(&self.title, html)
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| DEFAULT_TITLE.to_string());
        let description = first_match(&self.description, html)
            .filter(|d| !d.is_empty())
            .unwrap_or_else(|| DEFAULT_DESCRIPTION.to_string());
        let thumbnail = first_match(&self.thumbnail, html).unwrap_or_default();

        PageMetadata {
            title,
            description,
            thumbnail,
        }
    }
}

fn compile(patterns: &[&str]) -> Result<Vec<Regex>> {
    let compiled = patterns
        .iter()
        .map(|p| Regex::new(p))
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(compiled)
}

fn first_match(rules: &[Regex], html: &str) -> Option<String> {
    rules.iter().find_map(|re| {
        re.captures(html)
            .and_then(|cap| cap.get(1))
            .map(|m| m.as_str().trim().to_string())
    })
}

pub struct MetadataExtractor {
    client: Client,
    rules: ExtractionRules,
}

impl MetadataExtractor {
    pub fn new(timeout: Duration) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_STRING));

        let client = Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            rules: ExtractionRules::new()?,
        })
    }

    /// Best-effort title, description and thumbnail for `url`. Never fails:
    /// network errors and timeouts yield [`PageMetadata::unavailable`].
    pub async fn extract(&self, url: &str) -> PageMetadata {
        match self.fetch_page(url).await {
            Ok(html) => self.rules.scan(&html),
            Err(e) => {
                tracing::warn!("Error extracting metadata from {}: {}", url, e);
                PageMetadata::unavailable()
            }
        }
    }

    async fn fetch_page(&self, url: &str) -> Result<String> {
        let url = Url::parse(url)?;
        let response = self.client.get(url.clone()).send().await?;

        // Error pages still carry a title worth keeping, so the body is scanned regardless.
        if !response.status().is_success() {
            tracing::debug!("Fetched {} with status {}", url, response.status());
        }

        let html = response.text().await?;
        Ok(html)
    }
}
