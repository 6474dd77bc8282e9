//! Storage layer
//!
//! The on-device article table and the live views over it.
//!
//! ## Architecture
//!
//! - **SQLite**: durable table of articles keyed by link
//! - **watch channel**: every mutation publishes a fresh snapshot, so live
//!   views update without re-subscribing

pub mod articles;
pub mod error;
pub mod live;
pub mod schema;

pub use articles::{ArticleStore, Batch};
pub use error::{StoreError, StoreResult};
pub use live::{FilteredArticles, LiveQuery, Snapshot};
pub use schema::{init_schema, needs_init, SCHEMA_VERSION};
