//! Favorites persistence.
//!
//! The whole list lives in one named slot as a JSON array of
//! `{ "animation": ..., "screenshot": ... }` objects, in insertion order.
//! A missing or unreadable slot is an empty list.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::StoreError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FavoriteEntry {
    pub animation: String,
    /// Preview image as a `data:` URL, when one could be captured.
    #[serde(default)]
    pub screenshot: Option<String>,
}

/// A single persistent storage slot.
pub trait FavoritesSlot {
    /// Raw slot content, `None` when the slot has never been written.
    fn read(&self) -> Option<String>;
    fn write(&mut self, content: &str) -> Result<(), StoreError>;
}

/// Slot backed by a JSON file on disk.
#[derive(Debug, Clone)]
pub struct FileSlot {
    path: PathBuf,
}

impl FileSlot {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl FavoritesSlot for FileSlot {
    fn read(&self) -> Option<String> {
        std::fs::read_to_string(&self.path).ok()
    }

    fn write(&mut self, content: &str) -> Result<(), StoreError> {
        let write_err = |source: std::io::Error| StoreError::Write {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(write_err)?;
        }
        std::fs::write(&self.path, content).map_err(write_err)
    }
}

/// In-process slot; nothing survives the process.
#[derive(Debug, Clone, Default)]
pub struct MemorySlot {
    content: Option<String>,
}

impl MemorySlot {
    pub fn with_content(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
        }
    }
}

impl FavoritesSlot for MemorySlot {
    fn read(&self) -> Option<String> {
        self.content.clone()
    }

    fn write(&mut self, content: &str) -> Result<(), StoreError> {
        self.content = Some(content.to_string());
        Ok(())
    }
}

/// Ordered, deduplicated favorites on top of a [`FavoritesSlot`].
///
/// Every operation re-reads the slot, so the store never holds a stale copy.
pub struct FavoritesStore {
    slot: Box<dyn FavoritesSlot>,
}

impl FavoritesStore {
    pub fn new(slot: Box<dyn FavoritesSlot>) -> Self {
        Self { slot }
    }

    pub fn in_memory() -> Self {
        Self::new(Box::new(MemorySlot::default()))
    }

    pub fn list(&self) -> Vec<FavoriteEntry> {
        let Some(content) = self.slot.read() else {
            return Vec::new();
        };
        match serde_json::from_str(&content) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("favorites: ignoring corrupt slot: {}", e);
                Vec::new()
            }
        }
    }

    pub fn contains(&self, animation: &str) -> bool {
        self.list().iter().any(|e| e.animation == animation)
    }

    /// Append `animation` unless it is already present.  Returns whether the
    /// list changed.
    pub fn add(&mut self, animation: &str, screenshot: Option<String>) -> Result<bool, StoreError> {
        let mut entries = self.list();
        if entries.iter().any(|e| e.animation == animation) {
            return Ok(false);
        }
        entries.push(FavoriteEntry {
            animation: animation.to_string(),
            screenshot,
        });
        self.save(&entries)?;
        debug!("favorites: added {} ({} total)", animation, entries.len());
        Ok(true)
    }

    /// Drop `animation` if present.  Returns whether the list changed.
    pub fn remove(&mut self, animation: &str) -> Result<bool, StoreError> {
        let mut entries = self.list();
        let before = entries.len();
        entries.retain(|e| e.animation != animation);
        self.save(&entries)?;
        let removed = entries.len() != before;
        if removed {
            debug!("favorites: removed {} ({} left)", animation, entries.len());
        }
        Ok(removed)
    }

    fn save(&mut self, entries: &[FavoriteEntry]) -> Result<(), StoreError> {
        let json = serde_json::to_string(entries)?;
        self.slot.write(&json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_and_corrupt_slots_read_as_empty() {
        assert!(FavoritesStore::in_memory().list().is_empty());
        let store = FavoritesStore::new(Box::new(MemorySlot::with_content("{not json")));
        assert!(store.list().is_empty());
        assert!(!store.contains("a"));
    }

    #[test]
    fn add_is_deduplicated_and_ordered() {
        let mut store = FavoritesStore::in_memory();
        assert!(store.add("b", None).unwrap());
        assert!(store.add("a", Some("data:image/png;base64,AA==".into())).unwrap());
        assert!(!store.add("b", Some("ignored".into())).unwrap());

        let list = store.list();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].animation, "b");
        assert_eq!(list[0].screenshot, None);
        assert_eq!(list[1].animation, "a");
        assert!(store.contains("a"));
    }

    #[test]
    fn add_then_remove_restores_previous_content() {
        let mut store = FavoritesStore::in_memory();
        store.add("x", None).unwrap();
        let before = store.list();

        store.add("y", Some("shot".into())).unwrap();
        assert!(store.remove("y").unwrap());
        assert_eq!(store.list(), before);

        assert!(!store.remove("never-added").unwrap());
        assert_eq!(store.list(), before);
    }

    #[test]
    fn reads_entries_written_without_screenshot_field() {
        let store = FavoritesStore::new(Box::new(MemorySlot::with_content(
            r#"[{"animation":"a"},{"animation":"b","screenshot":null}]"#,
        )));
        let list = store.list();
        assert_eq!(list.len(), 2);
        assert!(list.iter().all(|e| e.screenshot.is_none()));
    }

    #[test]
    fn file_slot_persists_across_stores() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state").join("favorites.json");

        let mut store = FavoritesStore::new(Box::new(FileSlot::new(path.clone())));
        store.add("a", Some("data:image/png;base64,AA==".into())).unwrap();
        drop(store);

        let reopened = FavoritesStore::new(Box::new(FileSlot::new(path)));
        let list = reopened.list();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].screenshot.as_deref(), Some("data:image/png;base64,AA=="));
    }
}
