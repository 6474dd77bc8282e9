//! Remote payload to articles
//!
//! The remote document is expected to be a JSON array of objects with string
//! fields `link`, `title`, `desc`, `date` and `tags`. Extra fields are ignored.

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::ParsePolicy;
use crate::models::Article;

/// Why a pulled document was rejected as a whole
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Remote article data is a {0}, not an array")]
    NotAnArray(&'static str),

    #[error("Malformed remote article at index {index}: {source}")]
    Malformed {
        index: usize,
        #[source]
        source: serde_json::Error,
    },
}

/// Parse a pulled document into articles
///
/// Absent or `null` data is an empty list with a warning. A document that is
/// not an array is rejected. Under [`ParsePolicy::FailFast`] one malformed
/// element rejects the whole document; under [`ParsePolicy::SkipMalformed`]
/// it is dropped alone.
pub fn parse_remote_articles(
    value: Option<&Value>,
    policy: ParsePolicy,
) -> Result<Vec<Article>, ParseError> {
    let elements = match value {
        None | Some(Value::Null) => {
            warn!("No remote article data");
            return Ok(Vec::new());
        }
        Some(Value::Array(elements)) => elements,
        Some(other) => return Err(ParseError::NotAnArray(json_kind(other))),
    };

    let mut articles = Vec::with_capacity(elements.len());
    for (index, element) in elements.iter().enumerate() {
        match Article::deserialize(element) {
            Ok(article) => articles.push(article),
            Err(source) => match policy {
                ParsePolicy::FailFast => return Err(ParseError::Malformed { index, source }),
                ParsePolicy::SkipMalformed => {
                    warn!(index, error = %source, "Skipping malformed remote article");
                }
            },
        }
    }

    debug!(count = articles.len(), "Parsed remote articles");
    Ok(articles)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
