//! Moco Core Library
//!
//! This crate provides the core of Moco, a read-it-later app: a local
//! article store, a link extractor and sync with a per-user remote document.
//!
//! # Architecture
//!
//! - **SQLite**: The local store is the source of truth for the UI
//! - **Remote JSON store**: Each user's articles are mirrored as one array
//!
//! The remote is only read on an explicit pull, and pulling never deletes
//! local articles.
//!
//! # Quick Start
//!
//! ```text
//! let library = Library::open(&Config::load()?)?;
//!
//! // Save a link
//! library.insert_article("https://example.com", "Example", "", "web").await;
//!
//! // Query articles
//! let articles = library.articles_by_filter().current();
//! ```
//!
//! # Modules
//!
//! - `library`: Facade for front ends (main entry point)
//! - `models`: Article and draft types
//! - `storage`: SQLite article store with live queries
//! - `sync`: Remote bridge, payload parser and reconciler
//! - `extract`: Page fetcher and title/description heuristics
//! - `identity`: Signed-in user
//! - `config`: Application configuration

pub mod config;
pub mod extract;
pub mod identity;
pub mod library;
pub mod models;
pub mod storage;
pub mod sync;

#[cfg(test)]
mod test_server;

pub use config::{Config, ConflictPolicy, ParsePolicy};
pub use extract::{ExtractError, Extractor};
pub use identity::{Identity, Session};
pub use library::{Library, SyncOutcome};
pub use models::{Article, ArticleDraft};
pub use storage::{ArticleStore, FilteredArticles, LiveQuery, StoreError};
pub use sync::{HttpRemote, MemoryRemote, ReconcileReport, RemoteError, RemoteStore, SyncBridge};
