//! Local article store
//!
//! SQLite table of articles keyed by canonical link. Every mutation that
//! touches a row re-reads the table and publishes the snapshot to live views;
//! a batch publishes once when it commits.
//!
//! The store is a cheap `Clone` handle; clones share one connection and one
//! publication channel.

use std::sync::{Arc, Mutex, MutexGuard};

use rusqlite::{params, Connection, OptionalExtension, Row, Transaction};
use tokio::sync::watch;
use tracing::debug;

use super::error::{StoreError, StoreResult};
use super::live::{LiveQuery, Snapshot};
use super::schema::{init_schema, needs_init};
use crate::config::{Config, ConflictPolicy};
use crate::models::{canonical_link, Article};

const SELECT_COLUMNS: &str = "SELECT link, title, description, date, tags FROM articles";

/// Durable article table with live queries
#[derive(Clone)]
pub struct ArticleStore {
    conn: Arc<Mutex<Connection>>,
    snapshot: Arc<watch::Sender<Snapshot>>,
    policy: ConflictPolicy,
}

impl ArticleStore {
    /// Open or create the SQLite database in the configured data directory
    pub fn open(config: &Config) -> StoreResult<Self> {
        let path = config.sqlite_path();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| StoreError::from_io(e, parent.to_path_buf()))?;
        }

        let conn = Connection::open(&path)?;
        Self::from_connection(conn, config.conflict_policy)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> StoreResult<Self> {
        Self::from_connection(Connection::open_in_memory()?, ConflictPolicy::default())
    }

    fn from_connection(conn: Connection, policy: ConflictPolicy) -> StoreResult<Self> {
        if needs_init(&conn) {
            init_schema(&conn)?;
        }
        let initial = query_all(&conn)?;
        let (tx, _rx) = watch::channel(Arc::new(initial));

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            snapshot: Arc::new(tx),
            policy,
        })
    }

    /// Use a different duplicate-link policy for inserts
    pub fn with_conflict_policy(mut self, policy: ConflictPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn conflict_policy(&self) -> ConflictPolicy {
        self.policy
    }

    // ==================== Mutations ====================

    /// Insert an article, resolving duplicate links with the conflict policy
    ///
    /// Returns `true` if a row was written. Under the ignore policy a
    /// duplicate link is a silent no-op and returns `false`.
    pub fn insert(&self, article: &Article) -> StoreResult<bool> {
        let conn = self.lock()?;
        let changed = write_insert(&conn, self.policy, article)?;
        self.publish_if(&conn, changed)?;
        Ok(changed > 0)
    }

    /// Replace the row matching the article's link
    ///
    /// Returns `false` without writing if no such row exists.
    pub fn update(&self, article: &Article) -> StoreResult<bool> {
        let conn = self.lock()?;
        let changed = write_update(&conn, article)?;
        self.publish_if(&conn, changed)?;
        Ok(changed > 0)
    }

    /// Run several writes in one transaction and publish once at the end
    ///
    /// If `f` fails the transaction is rolled back and nothing is published.
    pub fn batch<T>(&self, f: impl FnOnce(&mut Batch<'_>) -> StoreResult<T>) -> StoreResult<T> {
        let mut conn = self.lock()?;
        let (value, changed) = {
            let mut batch = Batch {
                tx: conn.transaction()?,
                policy: self.policy,
                changed: 0,
            };
            let value = f(&mut batch)?;

            let changed = batch.changed;
            batch.tx.commit()?;
            (value, changed)
        };
        debug!(changed, "committed batch");
        self.publish_if(&conn, changed)?;
        Ok(value)
    }

    /// Remove the row matching the article's link
    pub fn delete(&self, article: &Article) -> StoreResult<bool> {
        self.delete_by_link(&article.link)
    }

    /// Remove the row with the given link
    pub fn delete_by_link(&self, link: &str) -> StoreResult<bool> {
        let link = canonical_link(link);
        let conn = self.lock()?;
        let changed = conn.execute("DELETE FROM articles WHERE link = ?1", params![link])?;
        debug!(%link, changed, "delete article");
        self.publish_if(&conn, changed)?;
        Ok(changed > 0)
    }

    /// Clear the table, returning the number of removed rows
    pub fn delete_all(&self) -> StoreResult<usize> {
        let conn = self.lock()?;
        let changed = conn.execute("DELETE FROM articles", [])?;
        debug!(changed, "delete all articles");
        self.publish_if(&conn, changed)?;
        Ok(changed)
    }

    // ==================== Reads ====================

    /// One-shot read of all articles, newest first
    pub fn all(&self) -> StoreResult<Vec<Article>> {
        let conn = self.lock()?;
        query_all(&conn)
    }

    /// One-shot read of a single article
    pub fn get(&self, link: &str) -> StoreResult<Option<Article>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!("{} WHERE link = ?1", SELECT_COLUMNS))?;
        let article = stmt
            .query_row(params![canonical_link(link)], row_to_article)
            .optional()?;
        Ok(article)
    }

    /// Number of stored articles
    pub fn count(&self) -> StoreResult<i64> {
        let conn = self.lock()?;
        let count = conn.query_row("SELECT COUNT(*) FROM articles", [], |row| row.get(0))?;
        Ok(count)
    }

    // ==================== Live queries ====================

    /// Live view of every article, newest first
    pub fn get_all(&self) -> LiveQuery<Vec<Article>> {
        LiveQuery::new(self.subscribe(), |articles| articles.to_vec())
    }

    /// Live view of one article; `None` while it is absent
    pub fn get_by_link(&self, link: &str) -> LiveQuery<Option<Article>> {
        let link = canonical_link(link);
        LiveQuery::new(self.subscribe(), move |articles| {
            articles.iter().find(|a| a.link == link).cloned()
        })
    }

    /// Raw snapshot receiver, for views that combine other sources
    pub(crate) fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.snapshot.subscribe()
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StoreError::LockPoisoned)
    }

    /// Re-read the table and notify observers when rows changed
    ///
    /// Runs while the connection lock is held so publications follow write order.
    fn publish_if(&self, conn: &Connection, changed: usize) -> StoreResult<()> {
        if changed == 0 {
            return Ok(());
        }
        let articles = query_all(conn)?;
        self.snapshot.send_replace(Arc::new(articles));
        Ok(())
    }
}

/// Writes made inside [`ArticleStore::batch`]
pub struct Batch<'a> {
    tx: Transaction<'a>,
    policy: ConflictPolicy,
    changed: usize,
}

impl Batch<'_> {
    /// Same as [`ArticleStore::insert`], published when the batch commits
    pub fn insert(&mut self, article: &Article) -> StoreResult<bool> {
        let changed = write_insert(&self.tx, self.policy, article)?;
        self.changed += changed;
        Ok(changed > 0)
    }

    /// Same as [`ArticleStore::update`], published when the batch commits
    pub fn update(&mut self, article: &Article) -> StoreResult<bool> {
        let changed = write_update(&self.tx, article)?;
        self.changed += changed;
        Ok(changed > 0)
    }
}

fn write_insert(conn: &Connection, policy: ConflictPolicy, article: &Article) -> StoreResult<usize> {
    validate(article)?;
    let article = article.normalized();
    let sql = match policy {
        ConflictPolicy::Replace => {
            "INSERT OR REPLACE INTO articles (link, title, description, date, tags) VALUES (?1, ?2, ?3, ?4, ?5)"
        }
        ConflictPolicy::Ignore => {
            "INSERT OR IGNORE INTO articles (link, title, description, date, tags) VALUES (?1, ?2, ?3, ?4, ?5)"
        }
    };

    let changed = conn.execute(
        sql,
        params![
            article.link,
            article.title,
            article.desc,
            article.date,
            article.tags
        ],
    )?;
    debug!(link = %article.link, changed, "insert article");
    Ok(changed)
}

fn write_update(conn: &Connection, article: &Article) -> StoreResult<usize> {
    validate(article)?;
    let article = article.normalized();

    let changed = conn.execute(
        "UPDATE articles SET title = ?2, description = ?3, date = ?4, tags = ?5 WHERE link = ?1",
        params![
            article.link,
            article.title,
            article.desc,
            article.date,
            article.tags
        ],
    )?;
    debug!(link = %article.link, changed, "update article");
    Ok(changed)
}

fn validate(article: &Article) -> StoreResult<()> {
    if article.link.trim().is_empty() {
        return Err(StoreError::InvalidArticle(
            "link must not be empty".to_string(),
        ));
    }
    Ok(())
}

fn query_all(conn: &Connection) -> StoreResult<Vec<Article>> {
    let mut stmt = conn.prepare(&format!(
        "{} ORDER BY CAST(date AS INTEGER) DESC, link ASC",
        SELECT_COLUMNS
    ))?;
    let rows = stmt.query_map([], row_to_article)?;

    let mut articles = Vec::new();
    for row in rows {
        articles.push(row?);
    }
    Ok(articles)
}

fn row_to_article(row: &Row<'_>) -> rusqlite::Result<Article> {
    Ok(Article {
        link: row.get(0)?,
        title: row.get(1)?,
        desc: row.get(2)?,
        date: row.get(3)?,
        tags: row.get(4)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn article(link: &str, title: &str, date: &str) -> Article {
        Article {
            link: link.to_string(),
            title: title.to_string(),
            desc: format!("About {}", title),
            date: date.to_string(),
            tags: String::new(),
        }
    }

    #[test]
    fn test_insert_then_get() {
        let store = ArticleStore::open_in_memory().unwrap();
        let a = article("https://a.example/", "A", "1");

        assert!(store.insert(&a).unwrap());
        assert_eq!(store.get(&a.link).unwrap(), Some(a.clone()));
        assert_eq!(store.get_by_link(&a.link).current(), Some(a));
    }

    #[test]
    fn test_replace_policy_keeps_latest() {
        let store = ArticleStore::open_in_memory().unwrap();
        let first = article("https://a.example/", "First", "1");
        let second = article("https://a.example/", "Second", "2");

        store.insert(&first).unwrap();
        store.insert(&second).unwrap();

        let all = store.all().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].title, "Second");
    }

    #[test]
    fn test_ignore_policy_keeps_first() {
        let store = ArticleStore::open_in_memory()
            .unwrap()
            .with_conflict_policy(ConflictPolicy::Ignore);
        let first = article("https://a.example/", "First", "1");
        let second = article("https://a.example/", "Second", "2");

        assert!(store.insert(&first).unwrap());
        assert!(!store.insert(&second).unwrap());

        assert_eq!(store.count().unwrap(), 1);
        assert_eq!(store.get(&first.link).unwrap().unwrap().title, "First");
    }

    #[test]
    fn test_insert_lowercases_tags() {
        let store = ArticleStore::open_in_memory().unwrap();
        let mut a = article("https://a.example/", "A", "1");
        a.tags = "Rust, WASM".to_string();

        store.insert(&a).unwrap();
        assert_eq!(store.get(&a.link).unwrap().unwrap().tags, "rust, wasm");

        a.tags = "Async".to_string();
        store.update(&a).unwrap();
        assert_eq!(store.get(&a.link).unwrap().unwrap().tags, "async");
    }

    #[test]
    fn test_insert_rejects_empty_link() {
        let store = ArticleStore::open_in_memory().unwrap();
        let err = store.insert(&article("  ", "Blank", "1")).unwrap_err();
        assert!(matches!(err, StoreError::InvalidArticle(_)));
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn test_update_absent_is_noop() {
        let store = ArticleStore::open_in_memory().unwrap();
        assert!(!store.update(&article("https://a.example/", "A", "1")).unwrap());
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn test_update_replaces_content() {
        let store = ArticleStore::open_in_memory().unwrap();
        let mut a = article("https://a.example/", "A", "1");
        store.insert(&a).unwrap();

        a.title = "Edited".to_string();
        assert!(store.update(&a).unwrap());

        let stored = store.get(&a.link).unwrap().unwrap();
        assert_eq!(stored.title, "Edited");
        assert_eq!(stored.date, "1");
    }

    #[test]
    fn test_delete_removes_row() {
        let store = ArticleStore::open_in_memory().unwrap();
        let a = article("https://a.example/", "A", "1");
        store.insert(&a).unwrap();

        assert!(store.delete(&a).unwrap());
        assert!(store.get(&a.link).unwrap().is_none());
        assert_eq!(store.get_by_link(&a.link).current(), None);
    }

    #[test]
    fn test_delete_all_clears_store() {
        let store = ArticleStore::open_in_memory().unwrap();
        store.insert(&article("https://a.example/", "A", "1")).unwrap();
        store.insert(&article("https://b.example/", "B", "2")).unwrap();

        assert_eq!(store.delete_all().unwrap(), 2);
        assert!(store.get_all().current().is_empty());
    }

    #[test]
    fn test_all_is_newest_first() {
        let store = ArticleStore::open_in_memory().unwrap();
        store.insert(&article("https://old.example/", "Old", "100")).unwrap();
        store.insert(&article("https://new.example/", "New", "2000")).unwrap();

        let titles: Vec<_> = store.all().unwrap().into_iter().map(|a| a.title).collect();
        assert_eq!(titles, vec!["New", "Old"]);
    }

    #[tokio::test]
    async fn test_live_views_reemit_on_mutation() {
        let store = ArticleStore::open_in_memory().unwrap();
        let a = article("https://a.example/", "A", "1");

        let mut all = store.get_all();
        let mut single = store.get_by_link(&a.link);
        assert!(all.current().is_empty());
        assert_eq!(single.current(), None);

        store.insert(&a).unwrap();
        assert_eq!(all.changed().await.unwrap().len(), 1);
        assert_eq!(single.changed().await.unwrap(), Some(a.clone()));

        store.delete(&a).unwrap();
        assert!(all.changed().await.unwrap().is_empty());
        assert_eq!(single.changed().await.unwrap(), None);
    }

    #[test]
    fn test_noop_mutation_does_not_publish() {
        let store = ArticleStore::open_in_memory().unwrap();
        let view = store.get_all();

        store.delete_by_link("https://missing.example/").unwrap();
        assert!(!view.has_changed());
    }

    #[test]
    fn test_batch_publishes_on_commit() {
        let store = ArticleStore::open_in_memory().unwrap();
        let view = store.get_all();

        let written = store
            .batch(|batch| {
                batch.insert(&article("https://a.example/", "A", "1"))?;
                batch.insert(&article("https://b.example/", "B", "2"))?;
                batch.update(&article("https://b.example/", "B2", "2"))
            })
            .unwrap();

        assert!(written);
        assert!(view.has_changed());
        let titles: Vec<_> = view.current().into_iter().map(|a| a.title).collect();
        assert_eq!(titles, vec!["B2", "A"]);
    }

    #[test]
    fn test_batch_rolls_back_on_error() {
        let store = ArticleStore::open_in_memory().unwrap();
        let view = store.get_all();

        let result = store.batch(|batch| {
            batch.insert(&article("https://a.example/", "A", "1"))?;
            batch.insert(&article("", "No link", "2"))
        });

        assert!(matches!(result, Err(StoreError::InvalidArticle(_))));
        assert_eq!(store.count().unwrap(), 0);
        assert!(!view.has_changed());
    }

    #[test]
    fn test_links_stored_in_canonical_form() {
        let store = ArticleStore::open_in_memory().unwrap();
        store.insert(&article("https://a.example", "A", "1")).unwrap();
        store.insert(&article("https://a.example/", "A again", "2")).unwrap();

        assert_eq!(store.count().unwrap(), 1);
        let stored = store.get("https://a.example").unwrap().unwrap();
        assert_eq!(stored.link, "https://a.example/");
        assert_eq!(stored.title, "A again");
        assert!(store.get_by_link("https://a.example").current().is_some());

        assert!(store.delete_by_link("https://a.example").unwrap());
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn test_data_persists_across_reopens() {
        let temp_dir = TempDir::new().unwrap();
        let config = Config::with_data_dir(temp_dir.path());

        {
            let store = ArticleStore::open(&config).unwrap();
            store.insert(&article("https://a.example/", "Kept", "1")).unwrap();
        }

        let store = ArticleStore::open(&config).unwrap();
        assert_eq!(store.count().unwrap(), 1);
        assert_eq!(store.get_all().current()[0].title, "Kept");
        assert!(config.sqlite_path().exists());
    }

    #[test]
    fn test_open_uses_configured_policy() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = Config::with_data_dir(temp_dir.path());
        config.conflict_policy = ConflictPolicy::Ignore;

        let store = ArticleStore::open(&config).unwrap();
        assert_eq!(store.conflict_policy(), ConflictPolicy::Ignore);
    }
}
