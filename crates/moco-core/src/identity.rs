//! Signed-in user identity
//!
//! The identity is the auth handle passed to sync operations. Signing in is
//! done elsewhere; this module only records who is signed in, in
//! `session.json` inside the data directory.
//!
//! Sync is a no-op while nobody is signed in.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::Config;

/// A signed-in user
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Session {
    /// Identifier that scopes the user's remote document
    pub user_id: String,
    /// Token presented to the remote store
    #[serde(default)]
    pub id_token: Option<String>,
}

/// Who is signed in on this device, if anyone
#[derive(Debug, Clone, Default)]
pub struct Identity {
    session: Option<Session>,
    /// Where the session is persisted; `None` keeps it in memory
    path: Option<PathBuf>,
}

impl Identity {
    /// Load the identity recorded in the data directory
    pub fn load(config: &Config) -> Result<Self> {
        let path = config.session_path();
        let session = if path.exists() {
            let content = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read session file: {:?}", path))?;
            Some(
                serde_json::from_str(&content)
                    .with_context(|| format!("Failed to parse session file: {:?}", path))?,
            )
        } else {
            None
        };

        Ok(Self {
            session,
            path: Some(path),
        })
    }

    /// In-memory identity with nobody signed in
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// In-memory identity for `user_id`
    pub fn signed_in(user_id: impl Into<String>) -> Self {
        Self {
            session: Some(Session {
                user_id: user_id.into(),
                id_token: None,
            }),
            path: None,
        }
    }

    pub fn is_signed_in(&self) -> bool {
        self.session.is_some()
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn user_id(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.user_id.as_str())
    }

    pub fn id_token(&self) -> Option<&str> {
        self.session.as_ref().and_then(|s| s.id_token.as_deref())
    }

    /// Record `user_id` as signed in
    pub fn sign_in(&mut self, user_id: &str, id_token: Option<String>) -> Result<()> {
        let user_id = user_id.trim();
        if user_id.is_empty() {
            bail!("User id must not be empty");
        }

        let session = Session {
            user_id: user_id.to_string(),
            id_token,
        };
        if let Some(ref path) = self.path {
            let json = serde_json::to_vec_pretty(&session)?;
            atomic_write(path, &json)?;
        }

        info!(user_id, "Signed in");
        self.session = Some(session);
        Ok(())
    }

    /// Forget the signed-in user
    pub fn sign_out(&mut self) -> Result<()> {
        if let Some(ref path) = self.path {
            if path.exists() {
                fs::remove_file(path)
                    .with_context(|| format!("Failed to remove session file: {:?}", path))?;
            }
        }
        if let Some(session) = self.session.take() {
            info!(user_id = %session.user_id, "Signed out");
        }
        Ok(())
    }
}

/// Write to a temp file in the same directory, then rename over `path`
fn atomic_write(path: &Path, data: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {:?}", parent))?;
    }

    let temp_path = path.with_extension("tmp");
    let mut file = File::create(&temp_path)
        .with_context(|| format!("Failed to create temp file {:?}", temp_path))?;
    file.write_all(data)
        .with_context(|| format!("Failed to write to temp file {:?}", temp_path))?;
    file.sync_all()
        .with_context(|| format!("Failed to sync temp file {:?}", temp_path))?;

    fs::rename(&temp_path, path)
        .with_context(|| format!("Failed to rename {:?} to {:?}", temp_path, path))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_fresh_identity_is_anonymous() {
        let temp_dir = TempDir::new().unwrap();
        let identity = Identity::load(&Config::with_data_dir(temp_dir.path())).unwrap();

        assert!(!identity.is_signed_in());
        assert!(identity.user_id().is_none());
    }

    #[test]
    fn test_sign_in_persists() {
        let temp_dir = TempDir::new().unwrap();
        let config = Config::with_data_dir(temp_dir.path());

        let mut identity = Identity::load(&config).unwrap();
        identity
            .sign_in("user-42", Some("token".to_string()))
            .unwrap();
        assert!(config.session_path().exists());

        let reloaded = Identity::load(&config).unwrap();
        assert_eq!(reloaded.user_id(), Some("user-42"));
        assert_eq!(reloaded.id_token(), Some("token"));
    }

    #[test]
    fn test_sign_out_removes_session() {
        let temp_dir = TempDir::new().unwrap();
        let config = Config::with_data_dir(temp_dir.path());

        let mut identity = Identity::load(&config).unwrap();
        identity.sign_in("user-42", None).unwrap();
        identity.sign_out().unwrap();

        assert!(!identity.is_signed_in());
        assert!(!config.session_path().exists());
        assert!(!Identity::load(&config).unwrap().is_signed_in());
    }

    #[test]
    fn test_sign_in_rejects_blank_user() {
        let mut identity = Identity::anonymous();
        assert!(identity.sign_in("  ", None).is_err());
        assert!(!identity.is_signed_in());
    }

    #[test]
    fn test_in_memory_identity() {
        let mut identity = Identity::signed_in("u1");
        assert_eq!(identity.user_id(), Some("u1"));
        identity.sign_out().unwrap();
        assert!(identity.user_id().is_none());
    }
}
