//! Keyed cache store holding serialized entries.

use clonegpt_types::CacheKey;
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;

/// Lazily applied transformation of one entry. `None` means absent.
pub type Updater = Box<dyn FnOnce(Option<Value>) -> Option<Value> + Send>;

/// Key-value cache shared by everything in one tab.
///
/// Writing `None` removes the entry. Writes are applied in call order.
pub trait CacheStore: Send + Sync {
    fn get(&self, key: &CacheKey) -> Option<Value>;

    fn set(&self, key: &CacheKey, value: Option<Value>);

    /// Replace the entry with `updater(old)`. The updater runs inside the
    /// store and must not call back into it.
    fn update(&self, key: &CacheKey, updater: Updater);

    /// Drop every entry whose key starts with `prefix`. Returns the count removed.
    fn remove_prefix(&self, prefix: &CacheKey) -> usize;

    fn clear(&self);
}

/// Typed access on top of any [`CacheStore`].
pub trait CacheStoreExt: CacheStore {
    fn get_as<T: DeserializeOwned>(&self, key: &CacheKey) -> Option<T> {
        let value = self.get(key)?;
        match serde_json::from_value(value) {
            Ok(v) => Some(v),
            Err(e) => {
                tracing::warn!("[QueryCache] Entry {} does not decode: {}", key, e);
                None
            }
        }
    }

    fn set_as<T: Serialize>(&self, key: &CacheKey, value: Option<&T>) {
        match value.map(serde_json::to_value).transpose() {
            Ok(v) => self.set(key, v),
            Err(e) => tracing::error!("[QueryCache] Failed to encode entry {}: {}", key, e),
        }
    }
}

impl<S: CacheStore + ?Sized> CacheStoreExt for S {}

/// In-memory [`CacheStore`].
#[derive(Default)]
pub struct QueryCache {
    entries: RwLock<HashMap<CacheKey, Value>>,
}

impl QueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    pub fn contains(&self, key: &CacheKey) -> bool {
        self.entries.read().contains_key(key)
    }
}

impl CacheStore for QueryCache {
    fn get(&self, key: &CacheKey) -> Option<Value> {
        self.entries.read().get(key).cloned()
    }

    fn set(&self, key: &CacheKey, value: Option<Value>) {
        let mut entries = self.entries.write();
        match value {
            Some(v) => {
                entries.insert(key.clone(), v);
            }
            None => {
                entries.remove(key);
            }
        }
    }

    fn update(&self, key: &CacheKey, updater: Updater) {
        let mut entries = self.entries.write();
        let old = entries.remove(key);
        if let Some(new) = updater(old) {
            entries.insert(key.clone(), new);
        }
    }

    fn remove_prefix(&self, prefix: &CacheKey) -> usize {
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|k, _| !k.starts_with(prefix));
        let removed = before - entries.len();
        if removed > 0 {
            tracing::debug!("[QueryCache] Dropped {} entries under {}", removed, prefix);
        }
        removed
    }

    fn clear(&self) {
        let mut entries = self.entries.write();
        let count = entries.len();
        entries.clear();
        tracing::debug!("[QueryCache] Cleared {} entries", count);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_set_none_removes_entry() {
        let cache = QueryCache::new();
        let key = CacheKey::new(["chat", "1"]);
        cache.set(&key, Some(json!({ "id": "1" })));
        assert!(cache.contains(&key));
        cache.set(&key, None);
        assert!(!cache.contains(&key));
    }

    #[test]
    fn test_update_receives_old_value() {
        let cache = QueryCache::new();
        let key = CacheKey::new(["counter"]);
        cache.set(&key, Some(json!(1)));
        cache.update(&key, Box::new(|old| old.and_then(|v| v.as_i64()).map(|n| json!(n + 1))));
        assert_eq!(cache.get(&key), Some(json!(2)));

        cache.update(&key, Box::new(|_| None));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_remove_prefix() {
        let cache = QueryCache::new();
        cache.set(&CacheKey::new(["rate-limit", "messages", "u1"]), Some(json!(1)));
        cache.set(&CacheKey::new(["rate-limit", "files", "u1"]), Some(json!(2)));
        cache.set(&CacheKey::new(["chats", "u1"]), Some(json!([])));

        assert_eq!(cache.remove_prefix(&CacheKey::new(["rate-limit"])), 2);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_typed_access() {
        let cache = QueryCache::new();
        let key = CacheKey::new(["title"]);
        cache.set_as(&key, Some(&"hello".to_string()));
        assert_eq!(cache.get_as::<String>(&key).as_deref(), Some("hello"));
        assert_eq!(cache.get_as::<u32>(&key), None);
    }
}
