//! # zayden-store
//!
//! Persisted string lists: premium members, known users, anti-link groups
//! and the Pinterest query block-list. Each list is one JSON array on disk.

mod list;

pub use list::ListStore;

use std::path::Path;
use tracing::info;
use zayden_core::error::ZaydenError;

/// File names under `{data_dir}/data/`.
pub const PREMIUM_FILE: &str = "premium.json";
pub const USERS_FILE: &str = "users.json";
pub const ANTILINK_FILE: &str = "antilink.json";
pub const PINTEREST_FILE: &str = "pinterest.json";

/// All persisted lists of the bot.
#[derive(Debug)]
pub struct Lists {
    /// Premium member numbers (digits only).
    pub premium: ListStore,
    /// Senders seen at least once.
    pub users: ListStore,
    /// Group chat ids with anti-link enabled.
    pub antilink: ListStore,
    /// Blocked Pinterest query fragments.
    pub pinterest: ListStore,
}

impl Lists {
    /// Open (or create) every list under `dir`.
    pub async fn open(dir: &Path) -> Result<Self, ZaydenError> {
        tokio::fs::create_dir_all(dir).await.map_err(|e| {
            ZaydenError::Store(format!("failed to create {}: {e}", dir.display()))
        })?;

        let lists = Self {
            premium: ListStore::open(dir.join(PREMIUM_FILE)).await?,
            users: ListStore::open(dir.join(USERS_FILE)).await?,
            antilink: ListStore::open(dir.join(ANTILINK_FILE)).await?,
            pinterest: ListStore::open(dir.join(PINTEREST_FILE)).await?,
        };
        info!(
            "Lists loaded from {}: {} premium, {} users, {} anti-link groups, {} pin rules",
            dir.display(),
            lists.premium.len().await,
            lists.users.len().await,
            lists.antilink.len().await,
            lists.pinterest.len().await
        );
        Ok(lists)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_open_creates_directory_and_empty_lists() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("data");
        let lists = Lists::open(&dir).await.unwrap();
        assert!(dir.is_dir());
        assert_eq!(lists.premium.len().await, 0);
        assert_eq!(lists.pinterest.len().await, 0);
    }

    #[tokio::test]
    async fn test_lists_are_independent_files() {
        let tmp = tempfile::tempdir().unwrap();
        let lists = Lists::open(tmp.path()).await.unwrap();
        lists.premium.add("6281234567890").await.unwrap();
        lists.antilink.add("120363@g.us").await.unwrap();

        let reopened = Lists::open(tmp.path()).await.unwrap();
        assert_eq!(reopened.premium.list().await, vec!["6281234567890"]);
        assert_eq!(reopened.antilink.list().await, vec!["120363@g.us"]);
        assert!(reopened.users.list().await.is_empty());
    }
}
