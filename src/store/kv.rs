//! Durable key-value storage for small client-side state.
//!
//! The whole store is one JSON object on disk. Every write rewrites the file
//! through a temporary sibling and an atomic rename, so a crash never leaves a
//! half-written store behind.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::error::AppResult;

#[derive(Clone)]
pub struct KeyValueStore {
    inner: Arc<Inner>,
}

struct Inner {
    path: PathBuf,
    values: Mutex<Map<String, Value>>,
}

impl KeyValueStore {
    /// Opens the store at `path`. A missing or empty file yields an empty store.
    pub async fn open(path: impl Into<PathBuf>) -> AppResult<Self> {
        let path = path.into();
        let values = match tokio::fs::read_to_string(&path).await {
            Ok(content) if content.trim().is_empty() => Map::new(),
            Ok(content) => serde_json::from_str(&content)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Map::new(),
            Err(e) => return Err(e.into()),
        };

        tracing::debug!(path = %path.display(), keys = values.len(), "Key-value store opened");

        Ok(Self {
            inner: Arc::new(Inner {
                path,
                values: Mutex::new(values),
            }),
        })
    }

    /// Reads a value. Entries that no longer decode as `T` are treated as absent.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let values = self.inner.values.lock().await;
        let raw = values.get(key)?.clone();
        match serde_json::from_value(raw) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Ignoring undecodable stored value");
                None
            }
        }
    }

    pub async fn set<T: Serialize>(&self, key: &str, value: &T) -> AppResult<()> {
        let value = serde_json::to_value(value)?;
        self.update(|values| {
            values.insert(key.to_string(), value);
        })
        .await
    }

    /// Applies `f` to the in-memory map and persists the result as one write.
    pub async fn update<F>(&self, f: F) -> AppResult<()>
    where
        F: FnOnce(&mut Map<String, Value>),
    {
        self.try_update(|values| {
            f(values);
            Ok(())
        })
        .await
    }

    /// Read-modify-write under the store lock. If `f` fails nothing is written.
    pub async fn try_update<F, R>(&self, f: F) -> AppResult<R>
    where
        F: FnOnce(&mut Map<String, Value>) -> AppResult<R>,
    {
        let mut values = self.inner.values.lock().await;
        let mut next = values.clone();
        let result = f(&mut next)?;
        persist(&self.inner.path, &next).await?;
        *values = next;
        Ok(result)
    }

    pub async fn remove(&self, keys: &[&str]) -> AppResult<()> {
        self.update(|values| {
            for key in keys {
                values.remove(*key);
            }
        })
        .await
    }
}

async fn persist(path: &Path, values: &Map<String, Value>) -> AppResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }

    let body = serde_json::to_vec_pretty(values)?;
    let tmp_path = path.with_extension("json.tmp");

    let mut tmp = tokio::fs::File::create(&tmp_path).await?;
    tmp.write_all(&body).await?;
    tmp.sync_all().await?;
    drop(tmp);

    tokio::fs::rename(&tmp_path, path).await?;
    Ok(())
}
