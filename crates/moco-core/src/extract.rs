//! Link extraction
//!
//! Fetches a page and derives a draft article from it: the first `<h1>` is
//! the title, and the first few long `<p>` texts form the description.

use std::time::Duration;

use scraper::{ElementRef, Html, Selector};
use thiserror::Error;
use tracing::debug;

use crate::config::Config;
use crate::models::{normalize_link, ArticleDraft};

/// Paragraphs must be longer than this many characters to count
const MIN_PARAGRAPH_CHARS: usize = 50;

/// At most this many paragraphs make up the description
const MAX_PARAGRAPHS: usize = 3;

/// Why a link could not be turned into a draft
#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("Not a valid http(s) link: '{0}'")]
    InvalidUrl(String),

    #[error("Failed to fetch page: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Page returned HTTP {0}")]
    Status(u16),
}

/// Page fetcher and HTML heuristics
#[derive(Debug, Clone)]
pub struct Extractor {
    client: reqwest::Client,
}

impl Extractor {
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self, ExtractError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()?;
        Ok(Self { client })
    }

    pub fn from_config(config: &Config) -> Result<Self, ExtractError> {
        Self::new(
            Duration::from_secs(config.fetch_timeout_secs),
            &config.user_agent,
        )
    }

    /// Use a preconfigured HTTP client
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Fetch `url` and build a draft from the page
    ///
    /// No retry is attempted.
    pub async fn extract(&self, url: &str) -> Result<ArticleDraft, ExtractError> {
        let link = normalize_link(url).ok_or_else(|| ExtractError::InvalidUrl(url.to_string()))?;

        let response = self.client.get(&link).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ExtractError::Status(status.as_u16()));
        }

        let html = response.text().await?;
        let draft = parse_article(&link, &html);
        debug!(
            %link,
            has_title = draft.title.is_some(),
            has_desc = draft.desc.is_some(),
            "Extracted draft"
        );
        Ok(draft)
    }
}

/// Build a draft from HTML already in hand
pub fn parse_article(link: &str, html: &str) -> ArticleDraft {
    let document = Html::parse_document(html);

    ArticleDraft {
        link: link.to_string(),
        title: extract_title(&document),
        desc: extract_description(&document),
    }
}

/// Text of the first `<h1>`
fn extract_title(document: &Html) -> Option<String> {
    let selector = Selector::parse("h1").ok()?;
    document
        .select(&selector)
        .next()
        .map(element_text)
        .filter(|s| !s.is_empty())
}

/// First long paragraphs, joined by blank lines
fn extract_description(document: &Html) -> Option<String> {
    let selector = Selector::parse("p").ok()?;
    let paragraphs: Vec<String> = document
        .select(&selector)
        .map(element_text)
        .filter(|text| text.chars().count() > MIN_PARAGRAPH_CHARS)
        .take(MAX_PARAGRAPHS)
        .collect();

    if paragraphs.is_empty() {
        None
    } else {
        Some(paragraphs.join("\n\n"))
    }
}

/// Element text with runs of whitespace collapsed to one space
fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
