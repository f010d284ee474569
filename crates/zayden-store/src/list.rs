use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, warn};
use zayden_core::{error::ZaydenError, phone};

/// One persisted list of strings.
///
/// Reads and writes are serialized by the mutex; every change is written to
/// a sibling temp file and renamed over the original, so readers of the file
/// never observe a half-written array.
#[derive(Debug)]
pub struct ListStore {
    path: PathBuf,
    items: Mutex<Vec<String>>,
}

impl ListStore {
    /// Load the list at `path`. A missing file is an empty list.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, ZaydenError> {
        let path = path.into();
        let items = match tokio::fs::read_to_string(&path).await {
            Ok(content) if content.trim().is_empty() => Vec::new(),
            Ok(content) => serde_json::from_str::<Vec<String>>(&content).map_err(|e| {
                ZaydenError::Store(format!("{} is not a JSON string array: {e}", path.display()))
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("{} not found, starting empty", path.display());
                Vec::new()
            }
            Err(e) => {
                return Err(ZaydenError::Store(format!(
                    "failed to read {}: {e}",
                    path.display()
                )))
            }
        };
        Ok(Self {
            path,
            items: Mutex::new(items),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Snapshot of the entries, in insertion order.
    pub async fn list(&self) -> Vec<String> {
        self.items.lock().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.items.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.items.lock().await.is_empty()
    }

    /// Exact membership.
    pub async fn contains(&self, item: &str) -> bool {
        self.items.lock().await.iter().any(|i| i == item)
    }

    /// Membership by phone digits.
    pub async fn contains_number(&self, id: &str) -> bool {
        phone::contains(&self.items.lock().await, id)
    }

    /// Append `item` and persist. Returns `false` if it was already present.
    pub async fn add(&self, item: &str) -> Result<bool, ZaydenError> {
        let mut items = self.items.lock().await;
        if items.iter().any(|i| i == item) {
            return Ok(false);
        }
        items.push(item.to_string());
        if let Err(e) = self.persist(&items).await {
            items.pop();
            return Err(e);
        }
        Ok(true)
    }

    /// Remove `item` and persist. Returns `false` if it was absent.
    pub async fn remove(&self, item: &str) -> Result<bool, ZaydenError> {
        let mut items = self.items.lock().await;
        let Some(pos) = items.iter().position(|i| i == item) else {
            return Ok(false);
        };
        let removed = items.remove(pos);
        if let Err(e) = self.persist(&items).await {
            items.insert(pos, removed);
            return Err(e);
        }
        Ok(true)
    }

    /// Remove every entry with the same phone digits as `id`.
    pub async fn remove_number(&self, id: &str) -> Result<bool, ZaydenError> {
        let key = phone::digits(id);
        if key.is_empty() {
            return Ok(false);
        }
        let mut items = self.items.lock().await;
        let before = items.clone();
        items.retain(|i| phone::digits(i) != key);
        if items.len() == before.len() {
            return Ok(false);
        }
        if let Err(e) = self.persist(&items).await {
            *items = before;
            return Err(e);
        }
        Ok(true)
    }

    async fn persist(&self, items: &[String]) -> Result<(), ZaydenError> {
        let json = serde_json::to_string_pretty(items)?;
        let tmp = self.path.with_extension("json.tmp");
        if let Err(e) = tokio::fs::write(&tmp, json).await {
            warn!("failed to write {}: {e}", tmp.display());
            return Err(ZaydenError::Store(format!(
                "failed to write {}: {e}",
                tmp.display()
            )));
        }
        tokio::fs::rename(&tmp, &self.path).await.map_err(|e| {
            ZaydenError::Store(format!("failed to replace {}: {e}", self.path.display()))
        })
    }
}
