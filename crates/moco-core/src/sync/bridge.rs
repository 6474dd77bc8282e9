//! Per-user bridge to the remote article document
//!
//! Push and pull use the same node, `/{user_id}/articles`, holding a JSON
//! array of articles.

use serde_json::Value;
use tracing::{debug, info};

use super::remote::{RemoteError, RemoteResult, RemoteStore};
use crate::models::Article;

/// Characters a user id may not contain, since it becomes a path segment
const FORBIDDEN_KEY_CHARS: &[char] = &['/', '.', '#', '$', '[', ']'];

/// Remote node holding a user's articles
pub fn articles_path(user_id: &str) -> RemoteResult<String> {
    let trimmed = user_id.trim();
    if trimmed.is_empty() || trimmed.contains(FORBIDDEN_KEY_CHARS) {
        return Err(RemoteError::InvalidUserId(user_id.to_string()));
    }
    Ok(format!("/{}/articles", trimmed))
}

/// Pulls and pushes a user's article collection
#[derive(Debug, Clone)]
pub struct SyncBridge<R> {
    remote: R,
}

impl<R: RemoteStore> SyncBridge<R> {
    pub fn new(remote: R) -> Self {
        Self { remote }
    }

    /// Fetch the raw article document; `None` when the user has no data
    pub async fn pull(&self, user_id: &str) -> RemoteResult<Option<Value>> {
        let path = articles_path(user_id)?;
        let value = self.remote.get(&path).await?;
        debug!(%path, found = value.is_some(), "pulled articles");
        Ok(value)
    }

    /// Overwrite the remote document with `articles`
    pub async fn push(&self, user_id: &str, articles: &[Article]) -> RemoteResult<()> {
        let path = articles_path(user_id)?;
        let value = serde_json::to_value(articles)?;
        self.remote.set(&path, value).await?;
        info!(%path, count = articles.len(), "pushed articles");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::remote::MemoryRemote;

    fn article(link: &str) -> Article {
        Article {
            link: link.to_string(),
            title: "Title".to_string(),
            desc: "Desc".to_string(),
            date: "1".to_string(),
            tags: "news".to_string(),
        }
    }

    #[test]
    fn test_articles_path() {
        assert_eq!(articles_path("u1").unwrap(), "/u1/articles");
        assert!(articles_path("").is_err());
        assert!(articles_path("a/b").is_err());
        assert!(articles_path("a.b").is_err());
        assert!(articles_path("a$b").is_err());
    }

    #[tokio::test]
    async fn test_pull_without_data_is_none() {
        let bridge = SyncBridge::new(MemoryRemote::new());
        assert!(bridge.pull("u1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_push_then_pull_same_path() {
        let bridge = SyncBridge::new(MemoryRemote::new());
        let articles = vec![article("https://a.example"), article("https://b.example")];

        bridge.push("u1", &articles).await.unwrap();

        let value = bridge.pull("u1").await.unwrap().unwrap();
        let pulled: Vec<Article> = serde_json::from_value(value).unwrap();
        assert_eq!(pulled, articles);

        // Scoped per user
        assert!(bridge.pull("u2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_invalid_user_rejected() {
        let remote = MemoryRemote::new();
        let bridge = SyncBridge::new(remote.clone());
        let err = bridge.push("bad/user", &[]).await.unwrap_err();
        assert!(matches!(err, RemoteError::InvalidUserId(_)));
        assert!(remote.is_empty().await);
    }
}
