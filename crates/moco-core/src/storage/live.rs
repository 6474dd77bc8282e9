//! Live query views over the article store
//!
//! The store publishes a fresh snapshot on a `watch` channel after every
//! mutation. A view is a receiver plus a projection of the snapshot, so
//! observers re-emit without re-subscribing. Dropping a view unsubscribes.

use std::fmt;
use std::sync::Arc;

use tokio::sync::watch;

use crate::models::{filter_by_title, Article};

/// Snapshot published by the store
pub type Snapshot = Arc<Vec<Article>>;

type Projection<T> = Arc<dyn Fn(&[Article]) -> T + Send + Sync>;

/// A continuously updating read view
pub struct LiveQuery<T> {
    rx: watch::Receiver<Snapshot>,
    project: Projection<T>,
}

impl<T> LiveQuery<T> {
    pub(crate) fn new(
        rx: watch::Receiver<Snapshot>,
        project: impl Fn(&[Article]) -> T + Send + Sync + 'static,
    ) -> Self {
        Self {
            rx,
            project: Arc::new(project),
        }
    }

    /// Current value of the view
    pub fn current(&self) -> T {
        let snapshot = self.rx.borrow().clone();
        (self.project)(&snapshot)
    }

    /// Whether the store published a value this view hasn't returned yet
    pub fn has_changed(&self) -> bool {
        self.rx.has_changed().unwrap_or(false)
    }

    /// Wait for the next publication and return the new value
    ///
    /// Returns `None` once the store has been dropped.
    pub async fn changed(&mut self) -> Option<T> {
        self.rx.changed().await.ok()?;
        let snapshot = self.rx.borrow_and_update().clone();
        Some((self.project)(&snapshot))
    }
}

impl<T> Clone for LiveQuery<T> {
    fn clone(&self) -> Self {
        Self {
            rx: self.rx.clone(),
            project: Arc::clone(&self.project),
        }
    }
}

impl<T> fmt::Debug for LiveQuery<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LiveQuery")
            .field("articles", &self.rx.borrow().len())
            .finish()
    }
}

/// All articles filtered by a settable search term
///
/// Re-emits when either the store or the search term changes.
pub struct FilteredArticles {
    articles: watch::Receiver<Snapshot>,
    search: watch::Receiver<String>,
}

impl FilteredArticles {
    pub(crate) fn new(articles: watch::Receiver<Snapshot>, search: watch::Receiver<String>) -> Self {
        Self { articles, search }
    }

    /// Articles matching the current search term
    pub fn current(&self) -> Vec<Article> {
        let snapshot = self.articles.borrow().clone();
        let term = self.search.borrow().clone();
        filter_by_title(&snapshot, &term)
    }

    /// Wait for a store mutation or search change and return the new result
    ///
    /// Returns `None` once either source has been dropped.
    pub async fn changed(&mut self) -> Option<Vec<Article>> {
        tokio::select! {
            res = self.articles.changed() => res.ok()?,
            res = self.search.changed() => res.ok()?,
        }
        let snapshot = self.articles.borrow_and_update().clone();
        let term = self.search.borrow_and_update().clone();
        Some(filter_by_title(&snapshot, &term))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn article(link: &str, title: &str) -> Article {
        Article {
            link: link.to_string(),
            title: title.to_string(),
            desc: String::new(),
            date: "1".to_string(),
            tags: String::new(),
        }
    }

    #[tokio::test]
    async fn test_live_query_reemits() {
        let (tx, rx) = watch::channel::<Snapshot>(Arc::new(Vec::new()));
        let mut count = LiveQuery::new(rx, |articles| articles.len());
        assert_eq!(count.current(), 0);

        tx.send_replace(Arc::new(vec![article("a", "A")]));
        assert!(count.has_changed());
        assert_eq!(count.changed().await, Some(1));
        assert!(!count.has_changed());
    }

    #[tokio::test]
    async fn test_live_query_ends_when_source_dropped() {
        let (tx, rx) = watch::channel::<Snapshot>(Arc::new(Vec::new()));
        let mut view = LiveQuery::new(rx, |articles| articles.len());
        drop(tx);
        assert_eq!(view.changed().await, None);
    }

    #[tokio::test]
    async fn test_filtered_reacts_to_search() {
        let (_articles_tx, articles_rx) = watch::channel::<Snapshot>(Arc::new(vec![
            article("a", "Go Concurrency"),
            article("b", "Rust Ownership"),
        ]));
        let (search_tx, search_rx) = watch::channel(String::new());
        let mut filtered = FilteredArticles::new(articles_rx, search_rx);

        assert_eq!(filtered.current().len(), 2);

        search_tx.send_replace("RUST".to_string());
        let result = filtered.changed().await.unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].link, "b");
    }
}
