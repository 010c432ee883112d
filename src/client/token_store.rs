//! Persistent storage for the bearer token.

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;
use tracing::debug;

/// Key under which the bearer token is stored.
pub const TOKEN_STORAGE_KEY: &str = "token";

#[async_trait]
pub trait TokenStore: Send + Sync {
    async fn load(&self) -> Result<Option<String>>;

    async fn save(&self, token: &str) -> Result<()>;

    async fn clear(&self) -> Result<()>;
}

/// Key/value JSON file, shaped like browser local storage.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_entries(&self) -> Result<HashMap<String, String>> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) if bytes.is_empty() => Ok(HashMap::new()),
            Ok(bytes) => serde_json::from_slice(&bytes)
                .with_context(|| format!("Corrupt token store at {}", self.path.display())),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(HashMap::new()),
            Err(e) => Err(e).with_context(|| format!("Failed to read {}", self.path.display())),
        }
    }

    async fn write_entries(&self, entries: &HashMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        // atomic replace
        let tmp = self.path.with_extension("tmp");
        let bytes = serde_json::to_vec_pretty(entries)?;
        tokio::fs::write(&tmp, bytes)
            .await
            .with_context(|| format!("Failed to write {}", tmp.display()))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .with_context(|| format!("Failed to replace {}", self.path.display()))?;
        Ok(())
    }
}

#[async_trait]
impl TokenStore for FileTokenStore {
    async fn load(&self) -> Result<Option<String>> {
        let mut entries = self.read_entries().await?;
        Ok(entries.remove(TOKEN_STORAGE_KEY).filter(|t| !t.is_empty()))
    }

    async fn save(&self, token: &str) -> Result<()> {
        let mut entries = self.read_entries().await?;
        entries.insert(TOKEN_STORAGE_KEY.to_string(), token.to_string());
        self.write_entries(&entries).await?;
        debug!("Stored session token in {}", self.path.display());
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        let mut entries = self.read_entries().await?;
        if entries.remove(TOKEN_STORAGE_KEY).is_some() {
            self.write_entries(&entries).await?;
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryTokenStore {
    pub fn with_token(token: &str) -> Self {
        let mut entries = HashMap::new();
        entries.insert(TOKEN_STORAGE_KEY.to_string(), token.to_string());
        Self {
            entries: RwLock::new(entries),
        }
    }
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    async fn load(&self) -> Result<Option<String>> {
        Ok(self.entries.read().await.get(TOKEN_STORAGE_KEY).cloned())
    }

    async fn save(&self, token: &str) -> Result<()> {
        self.entries
            .write()
            .await
            .insert(TOKEN_STORAGE_KEY.to_string(), token.to_string());
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        self.entries.write().await.remove(TOKEN_STORAGE_KEY);
        Ok(())
    }
}
