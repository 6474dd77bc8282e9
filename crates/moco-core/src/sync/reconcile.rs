//! Merge of remote articles into the local store
//!
//! One-way and non-destructive: remote articles are inserted when their link
//! is unknown locally and overwrite the local row when content differs.
//! Local articles missing from the remote are never deleted.

use std::collections::HashMap;

use tracing::{debug, info, warn};

use crate::models::Article;
use crate::storage::{ArticleStore, StoreResult};

/// What a reconciliation changed
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileReport {
    pub inserted: usize,
    pub updated: usize,
    pub unchanged: usize,
    /// Remote articles without a usable link
    pub skipped: usize,
}

impl ReconcileReport {
    /// Whether any local row was written
    pub fn changed(&self) -> bool {
        self.inserted + self.updated > 0
    }
}

/// Apply `remote` onto the local store, matching by canonical link
///
/// All writes happen in one store batch, so observers see a single update.
/// Duplicate links in `remote` are applied in order, so the last one wins.
pub fn reconcile(store: &ArticleStore, remote: &[Article]) -> StoreResult<ReconcileReport> {
    let mut local: HashMap<String, Article> = store
        .all()?
        .into_iter()
        .map(|a| (a.link.clone(), a))
        .collect();

    let report = store.batch(|batch| {
        let mut report = ReconcileReport::default();

        for incoming in remote {
            if incoming.link.trim().is_empty() {
                warn!(title = %incoming.title, "Skipping remote article without link");
                report.skipped += 1;
                continue;
            }
            let incoming = incoming.normalized();

            match local.get(&incoming.link) {
                Some(existing) if *existing == incoming => {
                    report.unchanged += 1;
                }
                Some(_) => {
                    debug!(link = %incoming.link, "Updating local article from remote");
                    batch.update(&incoming)?;
                    report.updated += 1;
                }
                None => {
                    debug!(link = %incoming.link, "Inserting remote article");
                    batch.insert(&incoming)?;
                    report.inserted += 1;
                }
            }
            local.insert(incoming.link.clone(), incoming);
        }
        Ok(report)
    })?;

    info!(
        inserted = report.inserted,
        updated = report.updated,
        unchanged = report.unchanged,
        skipped = report.skipped,
        "Reconciled remote articles"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn article(link: &str, desc: &str) -> Article {
        Article {
            link: link.to_string(),
            title: format!("Title of {}", link),
            desc: desc.to_string(),
            date: "1700000000000".to_string(),
            tags: "news".to_string(),
        }
    }

    #[test]
    fn test_empty_local_bulk_insert() {
        let store = ArticleStore::open_in_memory().unwrap();
        let x = article("https://x.example/", "x");
        let y = article("https://y.example/", "y");

        let report = reconcile(&store, &[x.clone(), y.clone()]).unwrap();

        assert_eq!(report.inserted, 2);
        let mut all = store.all().unwrap();
        all.sort_by(|a, b| a.link.cmp(&b.link));
        assert_eq!(all, vec![x, y]);
    }

    #[test]
    fn test_non_destructive_merge() {
        let store = ArticleStore::open_in_memory().unwrap();
        let a = article("https://a.example/", "old");
        let local_only = article("https://local.example/", "mine");
        store.insert(&a).unwrap();
        store.insert(&local_only).unwrap();

        let a_remote = article("https://a.example/", "new");
        let b = article("https://b.example/", "b");

        let report = reconcile(&store, &[a_remote, b.clone()]).unwrap();

        assert_eq!(report.updated, 1);
        assert_eq!(report.inserted, 1);
        assert_eq!(store.count().unwrap(), 3);
        assert_eq!(store.get(&a.link).unwrap().unwrap().desc, "new");
        assert_eq!(store.get(&b.link).unwrap(), Some(b));
        assert_eq!(store.get(&local_only.link).unwrap(), Some(local_only));
    }

    #[test]
    fn test_order_independent_matching() {
        let store = ArticleStore::open_in_memory().unwrap();
        let a = article("https://a.example/", "a");
        let b = article("https://b.example/", "b");
        store.insert(&a).unwrap();
        store.insert(&b).unwrap();

        // Same content, reversed order: nothing to do
        let report = reconcile(&store, &[b, a]).unwrap();
        assert_eq!(report.unchanged, 2);
        assert!(!report.changed());
    }

    #[test]
    fn test_tag_case_is_not_a_difference() {
        let store = ArticleStore::open_in_memory().unwrap();
        let a = article("https://a.example/", "a");
        store.insert(&a).unwrap();

        let mut shouting = a.clone();
        shouting.tags = "NEWS".to_string();

        let report = reconcile(&store, &[shouting]).unwrap();
        assert_eq!(report.unchanged, 1);
    }

    #[test]
    fn test_duplicate_remote_links_last_wins() {
        let store = ArticleStore::open_in_memory().unwrap();
        let first = article("https://a.example/", "first");
        let second = article("https://a.example/", "second");

        let report = reconcile(&store, &[first, second]).unwrap();

        assert_eq!(report.inserted, 1);
        assert_eq!(report.updated, 1);
        assert_eq!(store.count().unwrap(), 1);
        assert_eq!(store.get("https://a.example/").unwrap().unwrap().desc, "second");
    }

    #[test]
    fn test_skips_blank_links() {
        let store = ArticleStore::open_in_memory().unwrap();
        let report = reconcile(&store, &[article("", "nothing")]).unwrap();

        assert_eq!(report.skipped, 1);
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn test_raw_remote_link_matches_stored_link() {
        let store = ArticleStore::open_in_memory().unwrap();
        let local = article("https://a.example/", "same");
        store.insert(&local).unwrap();

        let mut raw = local.clone();
        raw.link = "https://a.example".to_string();

        let report = reconcile(&store, &[raw]).unwrap();
        assert_eq!(report.unchanged, 1);
        assert_eq!(report.inserted, 0);
        assert_eq!(store.count().unwrap(), 1);
    }

    #[test]
    fn test_raw_remote_link_updates_in_place() {
        let store = ArticleStore::open_in_memory().unwrap();
        store.insert(&article("https://a.example/", "old")).unwrap();

        let mut raw = article("https://a.example", "new");
        raw.link = "HTTPS://A.EXAMPLE".to_string();

        let report = reconcile(&store, &[raw]).unwrap();
        assert_eq!(report.updated, 1);
        assert_eq!(store.count().unwrap(), 1);
        assert_eq!(store.get("https://a.example/").unwrap().unwrap().desc, "new");
    }

    #[test]
    fn test_empty_remote_changes_nothing() {
        let store = ArticleStore::open_in_memory().unwrap();
        store.insert(&article("https://a.example/", "a")).unwrap();

        let report = reconcile(&store, &[]).unwrap();
        assert_eq!(report, ReconcileReport::default());
        assert_eq!(store.count().unwrap(), 1);
    }
}
