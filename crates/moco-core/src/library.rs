//! Facade for the presentation layer
//!
//! `Library` wires the store, the extractor and the sync bridge together and
//! is the only type a front end needs. Its operations never return errors:
//! failures are logged and reported as `false`, `None` or a [`SyncOutcome`].
//!
//! ## Usage
//!
//! ```ignore
//! let library = Library::open(&config)?;
//!
//! if let Some(draft) = library.extract("https://example.com/post").await {
//!     library.save_draft(draft, "reading").await;
//! }
//!
//! library.set_search("rust");
//! let mut articles = library.articles_by_filter();
//! while let Some(list) = articles.changed().await {
//!     render(&list);
//! }
//! ```

use anyhow::Context;
use tokio::sync::watch;
use tracing::{error, info, warn};

use crate::config::{Config, ParsePolicy};
use crate::extract::Extractor;
use crate::identity::Identity;
use crate::models::{normalize_link, Article, ArticleDraft};
use crate::storage::{ArticleStore, FilteredArticles, LiveQuery, StoreResult};
use crate::sync::{parse_remote_articles, reconcile, ReconcileReport, RemoteStore, SyncBridge, SyncGuard};

/// Result of a sync request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Nobody is signed in; nothing was done
    NotAuthenticated,
    /// Another sync for the same user is running; nothing was done
    InFlight,
    /// Remote articles were merged into the local store
    Pulled(ReconcileReport),
    /// The local store was written to the remote
    Pushed { count: usize },
    /// Network, payload, remote or store failure; the local store is untouched
    Failed(String),
}

impl SyncOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, SyncOutcome::Pulled(_) | SyncOutcome::Pushed { .. })
    }
}

/// Entry point for front ends
pub struct Library {
    store: ArticleStore,
    extractor: Extractor,
    search: watch::Sender<String>,
    guard: SyncGuard,
    parse_policy: ParsePolicy,
}

impl Library {
    pub fn new(store: ArticleStore, extractor: Extractor) -> Self {
        let (search, _) = watch::channel(String::new());
        Self {
            store,
            extractor,
            search,
            guard: SyncGuard::new(),
            parse_policy: ParsePolicy::default(),
        }
    }

    /// Open the store and build the extractor from configuration
    pub fn open(config: &Config) -> anyhow::Result<Self> {
        let store = ArticleStore::open(config).context("Failed to open article store")?;
        let extractor = Extractor::from_config(config).context("Failed to build HTTP client")?;
        Ok(Self::new(store, extractor).with_parse_policy(config.parse_policy))
    }

    pub fn with_parse_policy(mut self, policy: ParsePolicy) -> Self {
        self.parse_policy = policy;
        self
    }

    pub fn store(&self) -> &ArticleStore {
        &self.store
    }

    // ==================== Queries ====================

    /// Set the title filter used by [`Library::articles_by_filter`]
    pub fn set_search(&self, term: impl Into<String>) {
        self.search.send_replace(term.into());
    }

    /// Current title filter
    pub fn search(&self) -> String {
        self.search.borrow().clone()
    }

    /// Live list of articles whose title contains the search term
    pub fn articles_by_filter(&self) -> FilteredArticles {
        FilteredArticles::new(self.store.subscribe(), self.search.subscribe())
    }

    /// Live view of the article with `link`
    pub fn article_specified(&self, link: &str) -> LiveQuery<Option<Article>> {
        self.store.get_by_link(link)
    }

    // ==================== Mutations ====================

    /// Save a new article stamped with the current time
    ///
    /// The link is normalized and the title must not be blank.
    pub async fn insert_article(&self, link: &str, title: &str, desc: &str, tags: &str) -> bool {
        let Some(link) = normalize_link(link) else {
            warn!(link, "Refusing to save article with invalid link");
            return false;
        };
        if title.trim().is_empty() {
            warn!(%link, "Refusing to save article without title");
            return false;
        }

        let article = Article::new(link, title.trim(), desc.trim(), tags);
        self.write("insert", article, |store, article| store.insert(article).map(|_| ()))
            .await
    }

    /// Save a draft from the extractor with the given tags
    pub async fn save_draft(&self, draft: ArticleDraft, tags: &str) -> bool {
        let link = draft.link.clone();
        let Some(article) = draft.into_article(tags) else {
            warn!(%link, "Refusing to save draft without title");
            return false;
        };
        self.write("insert", article, |store, article| store.insert(article).map(|_| ()))
            .await
    }

    /// Overwrite the stored article with the same link
    ///
    /// The title must not be blank. Returns `false` if there is no such
    /// article.
    pub async fn update_article(&self, article: Article) -> bool {
        if article.title.trim().is_empty() {
            warn!(link = %article.link, "Refusing to save article without title");
            return false;
        }
        self.write("update", article, |store, article| {
            if store.update(article)? {
                Ok(())
            } else {
                Err(crate::storage::StoreError::InvalidArticle(format!(
                    "no article with link {}",
                    article.link
                )))
            }
        })
        .await
    }

    /// Remove the article with the same link
    pub async fn delete_article(&self, article: &Article) -> bool {
        self.write("delete", article.clone(), |store, article| {
            store.delete(article).map(|_| ())
        })
        .await
    }

    /// Remove every article
    pub async fn delete_all_articles(&self) -> bool {
        let store = self.store.clone();
        match run_blocking(move || store.delete_all()).await {
            Ok(removed) => {
                info!(removed, "Deleted all articles");
                true
            }
            Err(e) => {
                error!(error = %format!("{:#}", e), "Failed to delete all articles");
                false
            }
        }
    }

    /// Sign out and clear the local store
    pub async fn sign_out(&self, identity: &mut Identity) -> bool {
        let signed_out = match identity.sign_out() {
            Ok(()) => true,
            Err(e) => {
                error!(error = %format!("{:#}", e), "Failed to sign out");
                false
            }
        };
        let cleared = self.delete_all_articles().await;
        signed_out && cleared
    }

    // ==================== Extraction ====================

    /// Fetch `url` and derive a draft; `None` on any failure
    pub async fn extract(&self, url: &str) -> Option<ArticleDraft> {
        match self.extractor.extract(url).await {
            Ok(draft) => Some(draft),
            Err(e) => {
                error!(url, error = %e, "Failed to read the link");
                None
            }
        }
    }

    // ==================== Sync ====================

    /// Pull the user's remote articles and merge them into the local store
    pub async fn sync_from_database<R: RemoteStore>(
        &self,
        bridge: &SyncBridge<R>,
        identity: &Identity,
    ) -> SyncOutcome {
        let Some(user_id) = identity.user_id() else {
            warn!("Sync from remote skipped: not signed in");
            return SyncOutcome::NotAuthenticated;
        };
        let Some(_permit) = self.guard.try_acquire(user_id) else {
            info!(user_id, "Sync already running");
            return SyncOutcome::InFlight;
        };

        let value = match bridge.pull(user_id).await {
            Ok(value) => value,
            Err(e) => {
                error!(user_id, error = %e, "Failed to pull remote articles");
                return SyncOutcome::Failed(e.to_string());
            }
        };
        let remote = match parse_remote_articles(value.as_ref(), self.parse_policy) {
            Ok(articles) => articles,
            Err(e) => {
                error!(user_id, error = %e, "Rejected remote articles");
                return SyncOutcome::Failed(e.to_string());
            }
        };

        let store = self.store.clone();
        match run_blocking(move || reconcile(&store, &remote)).await {
            Ok(report) => SyncOutcome::Pulled(report),
            Err(e) => {
                let message = format!("{:#}", e);
                error!(user_id, error = %message, "Failed to apply remote articles");
                SyncOutcome::Failed(message)
            }
        }
    }

    /// Overwrite the user's remote articles with the local store
    pub async fn sync_to_database<R: RemoteStore>(
        &self,
        bridge: &SyncBridge<R>,
        identity: &Identity,
    ) -> SyncOutcome {
        let Some(user_id) = identity.user_id() else {
            warn!("Sync to remote skipped: not signed in");
            return SyncOutcome::NotAuthenticated;
        };
        let Some(_permit) = self.guard.try_acquire(user_id) else {
            info!(user_id, "Sync already running");
            return SyncOutcome::InFlight;
        };

        let store = self.store.clone();
        let articles = match run_blocking(move || store.all()).await {
            Ok(articles) => articles,
            Err(e) => {
                let message = format!("{:#}", e);
                error!(user_id, error = %message, "Failed to read local articles");
                return SyncOutcome::Failed(message);
            }
        };

        match bridge.push(user_id, &articles).await {
            Ok(()) => SyncOutcome::Pushed {
                count: articles.len(),
            },
            Err(e) => {
                error!(user_id, error = %e, "Failed to push articles");
                SyncOutcome::Failed(e.to_string())
            }
        }
    }

    /// Run a single-article write on the blocking pool and log failures
    async fn write<F>(&self, op: &'static str, article: Article, f: F) -> bool
    where
        F: FnOnce(&ArticleStore, &Article) -> StoreResult<()> + Send + 'static,
    {
        let store = self.store.clone();
        let link = article.link.clone();
        match run_blocking(move || f(&store, &article)).await {
            Ok(()) => true,
            Err(e) => {
                error!(op, %link, error = %format!("{:#}", e), "Cannot write article");
                false
            }
        }
    }
}

/// Run store work off the async threads
async fn run_blocking<T, F>(f: F) -> anyhow::Result<T>
where
    F: FnOnce() -> StoreResult<T> + Send + 'static,
    T: Send + 'static,
{
    let value = tokio::task::spawn_blocking(f)
        .await
        .context("Store task panicked")??;
    Ok(value)
}
