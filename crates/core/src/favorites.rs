//! Favorite projects persisted in a key-value store

use std::collections::HashMap;
use tracing::warn;

use crate::error::Result;

/// Storage key holding the JSON array of favorite project ids
pub const FAVORITES_KEY: &str = "mopsos-favorites";

/// Minimal string key-value storage, last write wins
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
}

/// In-memory store, mainly for tests
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Ordered set of favorite project ids
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Favorites {
    ids: Vec<String>,
}

impl Favorites {
    /// Read favorites from the store; unreadable contents count as empty
    pub fn load<S: KeyValueStore + ?Sized>(store: &S) -> Result<Self> {
        let Some(raw) = store.get(FAVORITES_KEY)? else {
            return Ok(Self::default());
        };

        match serde_json::from_str::<Vec<String>>(&raw) {
            Ok(ids) => Ok(Self { ids }),
            Err(e) => {
                warn!("Ignoring unreadable favorites: {}", e);
                Ok(Self::default())
            }
        }
    }

    /// Write the current set back to the store
    pub fn save<S: KeyValueStore + ?Sized>(&self, store: &mut S) -> Result<()> {
        let raw = serde_json::to_string(&self.ids)?;
        store.set(FAVORITES_KEY, &raw)
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    pub fn contains(&self, project_id: &str) -> bool {
        self.ids.iter().any(|id| id == project_id)
    }

    /// Add or remove a project, returns whether it is now a favorite
    pub fn toggle(&mut self, project_id: &str) -> bool {
        if self.contains(project_id) {
            self.ids.retain(|id| id != project_id);
            false
        } else {
            self.ids.push(project_id.to_string());
            true
        }
    }

    /// Toggle and persist in one step
    pub fn toggle_in<S: KeyValueStore + ?Sized>(
        &mut self,
        store: &mut S,
        project_id: &str,
    ) -> Result<bool> {
        let now_favorite = self.toggle(project_id);
        self.save(store)?;
        Ok(now_favorite)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_key_is_empty() {
        let store = MemoryStore::new();
        let favorites = Favorites::load(&store).unwrap();
        assert!(favorites.ids().is_empty());
    }

    #[test]
    fn test_toggle_persists() {
        let mut store = MemoryStore::new();
        let mut favorites = Favorites::load(&store).unwrap();

        assert!(favorites.toggle_in(&mut store, "sol").unwrap());
        assert!(favorites.toggle_in(&mut store, "eth").unwrap());

        assert_eq!(
            store.get(FAVORITES_KEY).unwrap().as_deref(),
            Some(r#"["sol","eth"]"#)
        );
        let reloaded = Favorites::load(&store).unwrap();
        assert_eq!(reloaded, favorites);
    }

    #[test]
    fn test_double_toggle_restores_original() {
        let mut store = MemoryStore::new();
        store.set(FAVORITES_KEY, r#"["a","b"]"#).unwrap();
        let mut favorites = Favorites::load(&store).unwrap();
        let original = favorites.clone();

        assert!(!favorites.toggle_in(&mut store, "a").unwrap());
        assert!(favorites.toggle_in(&mut store, "a").unwrap());

        let mut ids = favorites.ids().to_vec();
        ids.sort();
        assert_eq!(ids, original.ids());

        favorites.toggle("c");
        favorites.toggle("c");
        assert!(!favorites.contains("c"));
    }

    #[test]
    fn test_corrupt_value_is_treated_as_empty() {
        let mut store = MemoryStore::new();
        store.set(FAVORITES_KEY, "not json").unwrap();
        let favorites = Favorites::load(&store).unwrap();
        assert!(favorites.ids().is_empty());
    }
}
