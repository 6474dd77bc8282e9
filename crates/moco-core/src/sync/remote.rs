//! Remote document store backends
//!
//! The remote is a JSON key-value tree addressed by slash-separated paths,
//! in the shape of the Firebase Realtime Database REST API:
//! `GET {base}/{path}.json` reads a node, `PUT` replaces it.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::debug;

use crate::config::Config;

/// Errors talking to the remote store
#[derive(Error, Debug)]
pub enum RemoteError {
    /// No remote URL configured
    #[error("Remote store not configured. Set remote_url in the config.")]
    NotConfigured,

    /// User id cannot be used as a path segment
    #[error("Invalid user id '{0}': must be non-empty and contain none of / . # $ [ ]")]
    InvalidUserId(String),

    /// Transport failure
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success status from the remote
    #[error("Remote store returned {status}: {body}")]
    Status { status: u16, body: String },

    /// Body was not valid JSON, or articles could not be serialized
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for remote operations
pub type RemoteResult<T> = Result<T, RemoteError>;

/// A remote JSON document store
pub trait RemoteStore: Send + Sync {
    /// Read the node at `path`; `None` when nothing is stored there
    fn get(&self, path: &str) -> impl Future<Output = RemoteResult<Option<Value>>> + Send;

    /// Replace the node at `path` with `value`
    fn set(&self, path: &str, value: Value) -> impl Future<Output = RemoteResult<()>> + Send;
}

/// REST client for a Realtime-Database-style remote
#[derive(Debug, Clone)]
pub struct HttpRemote {
    base_url: String,
    auth_token: Option<String>,
    client: reqwest::Client,
}

impl HttpRemote {
    /// Create a client for `base_url` with a request timeout
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> RemoteResult<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(base_url, client))
    }

    /// Create a client from the configured remote URL and timeout
    pub fn from_config(config: &Config) -> RemoteResult<Self> {
        let base_url = config
            .remote_url
            .as_deref()
            .ok_or(RemoteError::NotConfigured)?;
        Self::new(base_url, Duration::from_secs(config.fetch_timeout_secs))
    }

    /// Use a preconfigured HTTP client
    pub fn with_client(base_url: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            auth_token: None,
            client,
        }
    }

    /// Attach an auth token, sent as the `auth` query parameter
    pub fn with_auth(mut self, token: Option<String>) -> Self {
        self.auth_token = token.filter(|t| !t.is_empty());
        self
    }

    fn url_for(&self, path: &str) -> String {
        format!("{}/{}.json", self.base_url, path.trim_matches('/'))
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.auth_token {
            Some(ref token) => request.query(&[("auth", token)]),
            None => request,
        }
    }
}

impl RemoteStore for HttpRemote {
    async fn get(&self, path: &str) -> RemoteResult<Option<Value>> {
        let url = self.url_for(path);
        debug!(%url, "remote get");

        let response = self.authorize(self.client.get(&url)).send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RemoteError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await?;
        if body.trim().is_empty() {
            return Ok(None);
        }
        match serde_json::from_str(&body)? {
            Value::Null => Ok(None),
            value => Ok(Some(value)),
        }
    }

    async fn set(&self, path: &str, value: Value) -> RemoteResult<()> {
        let url = self.url_for(path);
        debug!(%url, "remote set");

        let response = self
            .authorize(self.client.put(&url))
            .json(&value)
            .send()
            .await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RemoteError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }
}

/// In-process remote, shared between clones
#[derive(Debug, Clone, Default)]
pub struct MemoryRemote {
    nodes: Arc<RwLock<HashMap<String, Value>>>,
}

impl MemoryRemote {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored nodes
    pub async fn len(&self) -> usize {
        self.nodes.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.nodes.read().await.is_empty()
    }
}

impl RemoteStore for MemoryRemote {
    async fn get(&self, path: &str) -> RemoteResult<Option<Value>> {
        let nodes = self.nodes.read().await;
        Ok(nodes.get(path.trim_matches('/')).cloned())
    }

    async fn set(&self, path: &str, value: Value) -> RemoteResult<()> {
        let mut nodes = self.nodes.write().await;
        let key = path.trim_matches('/').to_string();
        if value.is_null() {
            nodes.remove(&key);
        } else {
            nodes.insert(key, value);
        }
        Ok(())
    }
}
