//! File-backed cache for exchanged service tokens.
//!
//! A missing or corrupt cache only forces a fresh exchange, so nothing here
//! propagates failure: `load` reports a miss and `store` is best-effort.
//! There is no file locking; concurrent writers race and the last one wins,
//! which is safe because every written token is a valid token.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

const CACHE_DIR_NAME: &str = "generative_agents";
const CACHE_FILE_NAME: &str = "github-copilot.token.json";

/// The persisted token record. Field names match the on-disk JSON document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedToken {
    pub token: String,
    /// Expiry, milliseconds since epoch.
    #[serde(rename = "expiresAt")]
    pub expires_at: i64,
    /// Write time, milliseconds since epoch.
    #[serde(rename = "updatedAt")]
    pub updated_at: i64,
    #[serde(rename = "baseUrl", skip_serializing_if = "Option::is_none", default)]
    pub base_url: Option<String>,
}

/// Single-record token cache at a fixed path.
#[derive(Debug, Clone)]
pub struct TokenCache {
    path: PathBuf,
}

impl TokenCache {
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Cache at `<cache-root>/generative_agents/github-copilot.token.json`,
    /// where cache-root is `$XDG_CACHE_HOME`, else the platform cache
    /// directory, else `~/.cache`. The containing directory is created if
    /// absent.
    pub fn default_location() -> Self {
        let root = env::var_os("XDG_CACHE_HOME")
            .map(PathBuf::from)
            .filter(|p| !p.as_os_str().is_empty())
            .or_else(dirs::cache_dir)
            .or_else(|| dirs::home_dir().map(|home| home.join(".cache")))
            .unwrap_or_else(|| PathBuf::from(".cache"));
        let dir = root.join(CACHE_DIR_NAME);
        if let Err(err) = fs::create_dir_all(&dir) {
            tracing::warn!(path = %dir.display(), error = %err, "could not create token cache directory");
        }
        Self {
            path: dir.join(CACHE_FILE_NAME),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the cached record. Any I/O or parse failure is a miss.
    pub fn load(&self) -> Option<CachedToken> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) => {
                if err.kind() != std::io::ErrorKind::NotFound {
                    tracing::warn!(path = %self.path.display(), error = %err, "token cache unreadable, treating as miss");
                }
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(record) => Some(record),
            Err(err) => {
                tracing::warn!(path = %self.path.display(), error = %err, "token cache corrupt, treating as miss");
                None
            }
        }
    }

    /// Write the record. Failures are logged and swallowed.
    pub fn store(&self, record: &CachedToken) {
        if let Some(parent) = self.path.parent() {
            if let Err(err) = fs::create_dir_all(parent) {
                tracing::warn!(path = %parent.display(), error = %err, "could not create token cache directory");
                return;
            }
        }
        let json = match serde_json::to_string(record) {
            Ok(json) => json,
            Err(err) => {
                tracing::warn!(error = %err, "could not serialize token cache record");
                return;
            }
        };
        if let Err(err) = fs::write(&self.path, json) {
            tracing::warn!(path = %self.path.display(), error = %err, "could not write token cache");
        }
    }
}
