//! Data models for Moco
//!
//! Defines the saved [`Article`] and the [`ArticleDraft`] produced by the
//! link extractor, plus the normalization rules applied before persistence.

use chrono::{DateTime, Utc};
use reqwest::Url;
use serde::{Deserialize, Serialize};

/// A saved article
///
/// Field names match the remote JSON document, so the same shape is used
/// for local rows and the synced payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Article {
    /// The article URL, unique per store
    pub link: String,
    /// Display title
    pub title: String,
    /// Free-text description
    pub desc: String,
    /// Creation time in epoch milliseconds, as text
    pub date: String,
    /// Comma or space separated, lower-cased tags
    pub tags: String,
}

impl Article {
    /// Create a new article stamped with the current time
    pub fn new(
        link: impl Into<String>,
        title: impl Into<String>,
        desc: impl Into<String>,
        tags: &str,
    ) -> Self {
        Self {
            link: link.into(),
            title: title.into(),
            desc: desc.into(),
            date: now_millis(),
            tags: normalize_tags(tags),
        }
    }

    /// Individual tags, split on commas and whitespace
    pub fn tag_list(&self) -> Vec<&str> {
        self.tags
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|t| !t.is_empty())
            .collect()
    }

    /// Creation time, if `date` holds a valid epoch-millisecond value
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        let millis: i64 = self.date.trim().parse().ok()?;
        DateTime::from_timestamp_millis(millis)
    }

    /// Creation date formatted as `dd/MM/yyyy`
    pub fn display_date(&self) -> Option<String> {
        self.created_at()
            .map(|dt| dt.format("%d/%m/%Y").to_string())
    }

    /// Whether the title contains `term`, ignoring case
    pub fn title_matches(&self, term: &str) -> bool {
        self.title.to_lowercase().contains(&term.to_lowercase())
    }

    /// Copy with the link in canonical form and tags lower-cased, as stored
    pub(crate) fn normalized(&self) -> Self {
        Self {
            link: canonical_link(&self.link),
            tags: normalize_tags(&self.tags),
            ..self.clone()
        }
    }
}

/// Partial article derived from a web page
///
/// `tags` and `date` are filled in by the caller when the draft is saved.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArticleDraft {
    pub link: String,
    pub title: Option<String>,
    pub desc: Option<String>,
}

impl ArticleDraft {
    pub fn new(link: impl Into<String>) -> Self {
        Self {
            link: link.into(),
            ..Self::default()
        }
    }

    /// Turn the draft into a saveable article
    ///
    /// Returns `None` when the draft has no title, since a title is required
    /// at save time.
    pub fn into_article(self, tags: &str) -> Option<Article> {
        let title = self.title.filter(|t| !t.trim().is_empty())?;
        Some(Article::new(
            self.link,
            title,
            self.desc.unwrap_or_default(),
            tags,
        ))
    }
}

/// Current time in epoch milliseconds, as stored in `Article::date`
pub fn now_millis() -> String {
    Utc::now().timestamp_millis().to_string()
}

/// Lower-case and trim a tag string
pub fn normalize_tags(tags: &str) -> String {
    tags.trim().to_lowercase()
}

/// Normalize a user-supplied link
///
/// Links without a scheme are assumed to be `https`. Returns `None` for empty
/// input or anything that is not an absolute http(s) URL.
pub fn normalize_link(input: &str) -> Option<String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }

    let url = match Url::parse(trimmed) {
        Ok(url) => url,
        Err(_) => Url::parse(&format!("https://{}", trimmed)).ok()?,
    };

    match url.scheme() {
        "http" | "https" if url.host_str().is_some() => Some(url.to_string()),
        _ => None,
    }
}

/// Link used as the article's identity
///
/// Valid http(s) links are normalized; anything else is kept as given so it
/// still matches itself.
pub fn canonical_link(link: &str) -> String {
    normalize_link(link).unwrap_or_else(|| link.to_string())
}

/// Articles whose title contains `term` (case-insensitive)
///
/// A blank term matches everything.
pub fn filter_by_title(articles: &[Article], term: &str) -> Vec<Article> {
    let term = term.trim();
    if term.is_empty() {
        return articles.to_vec();
    }
    articles
        .iter()
        .filter(|a| a.title_matches(term))
        .cloned()
        .collect()
}
