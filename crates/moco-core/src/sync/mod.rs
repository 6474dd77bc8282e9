//! Remote sync
//!
//! Mirrors the local store to a per-user document in a remote JSON store.
//!
//! ## Flow
//!
//! Pull: fetch `/{user}/articles` → parse into articles → reconcile into the
//! local store. Push: read the local store → overwrite `/{user}/articles`.
//!
//! ## Usage
//!
//! ```ignore
//! let bridge = SyncBridge::new(HttpRemote::from_config(&config)?);
//! let value = bridge.pull("user-id").await?;
//! let articles = parse_remote_articles(value.as_ref(), ParsePolicy::FailFast)?;
//! reconcile(&store, &articles)?;
//! ```

mod bridge;
mod guard;
mod parser;
mod reconcile;
mod remote;

pub use bridge::{articles_path, SyncBridge};
pub use guard::{SyncGuard, SyncPermit};
pub use parser::{parse_remote_articles, ParseError};
pub use reconcile::{reconcile, ReconcileReport};
pub use remote::{HttpRemote, MemoryRemote, RemoteError, RemoteResult, RemoteStore};
