//! Optimistic cache writes with single-shot rollback.
//!
//! Every mutating call first snapshots the entry it is about to touch. Only
//! the most recent snapshot is retained, across all keys: a mutation on key B
//! after a mutation on key A makes A unrevertable. Callers pair exactly one
//! optimistic write with one `revert()` on failure.

use clonegpt_types::CacheKey;
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::marker::PhantomData;
use std::sync::Arc;

use super::store::CacheStore;

/// An entity that lives in the cache. Must serialize its identifier as `"id"`.
pub trait CacheItem: Serialize + DeserializeOwned + Clone + Send + 'static {
    fn id(&self) -> &str;
}

/// Pre-mutation copy of one cache entry. `value == None` means the entry was absent.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheSnapshot {
    key: CacheKey,
    value: Option<Value>,
}

impl CacheSnapshot {
    pub fn key(&self) -> &CacheKey {
        &self.key
    }

    pub fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }
}

pub struct CacheReconciler<T> {
    store: Arc<dyn CacheStore>,
    snapshot: Mutex<Option<CacheSnapshot>>,
    _item: PhantomData<fn() -> T>,
}

impl<T: CacheItem> CacheReconciler<T> {
    pub fn new(store: Arc<dyn CacheStore>) -> Self {
        Self { store, snapshot: Mutex::new(None), _item: PhantomData }
    }

    pub fn get(&self, key: &CacheKey) -> Option<T> {
        self.store.get(key).and_then(|v| decode(key, v))
    }

    /// Overwrite the entry with `item`.
    pub fn set(&self, key: &CacheKey, item: T) {
        let Some(value) = encode(key, &item) else {
            return;
        };
        self.take_snapshot(key);
        self.store.set(key, Some(value));
    }

    /// Replace the entry with `updater(old)`, evaluated by the store.
    pub fn update<F>(&self, key: &CacheKey, updater: F)
    where
        F: FnOnce(Option<T>) -> Option<T> + Send + 'static,
    {
        self.take_snapshot(key);
        let label = key.clone();
        self.store.update(
            key,
            Box::new(move |old| {
                let current = old.clone().and_then(|v| decode::<T>(&label, v));
                match updater(current) {
                    Some(next) => encode(&label, &next).or(old),
                    None => None,
                }
            }),
        );
    }

    /// Shallow-merge the top-level fields of `partial` onto the entry, or
    /// store `partial` alone when the entry is absent. Non-object partials
    /// are ignored.
    pub fn patch(&self, key: &CacheKey, partial: Value) {
        let Value::Object(fields) = partial else {
            tracing::warn!("[CacheReconciler] Ignoring non-object patch for {}", key);
            return;
        };
        self.take_snapshot(key);
        self.store.update(
            key,
            Box::new(move |old| match old {
                Some(Value::Object(mut existing)) => {
                    existing.extend(fields);
                    Some(Value::Object(existing))
                }
                _ => Some(Value::Object(fields)),
            }),
        );
    }

    /// Mark the entry absent.
    pub fn remove(&self, key: &CacheKey) {
        self.take_snapshot(key);
        self.store.set(key, None);
    }

    /// Restore the last snapshot and forget it. Returns false when there was
    /// nothing to restore.
    pub fn revert(&self) -> bool {
        let Some(snapshot) = self.snapshot.lock().take() else {
            tracing::debug!("[CacheReconciler] Nothing to revert");
            return false;
        };
        tracing::debug!("[CacheReconciler] Reverting {}", snapshot.key);
        self.store.set(&snapshot.key, snapshot.value);
        true
    }

    pub fn has_snapshot(&self) -> bool {
        self.snapshot.lock().is_some()
    }

    pub fn snapshot(&self) -> Option<CacheSnapshot> {
        self.snapshot.lock().clone()
    }

    /// For list-valued entries: replace the element with the same id, or
    /// prepend `item` when none matches.
    pub fn upsert_in_list(&self, key: &CacheKey, item: T) {
        let Some(value) = encode(key, &item) else {
            return;
        };
        let id = item.id().to_string();
        self.take_snapshot(key);
        self.store.update(
            key,
            Box::new(move |old| {
                let mut list = into_list(old);
                match list.iter_mut().find(|v| element_id(v) == Some(id.as_str())) {
                    Some(slot) => *slot = value,
                    None => list.insert(0, value),
                }
                Some(Value::Array(list))
            }),
        );
    }

    /// For list-valued entries: drop the element with `id`.
    pub fn remove_from_list(&self, key: &CacheKey, id: &str) {
        let id = id.to_string();
        self.take_snapshot(key);
        self.store.update(
            key,
            Box::new(move |old| {
                let mut list = into_list(old);
                list.retain(|v| element_id(v) != Some(id.as_str()));
                Some(Value::Array(list))
            }),
        );
    }

    fn take_snapshot(&self, key: &CacheKey) {
        let value = self.store.get(key);
        *self.snapshot.lock() = Some(CacheSnapshot { key: key.clone(), value });
    }
}

fn encode<T: Serialize>(key: &CacheKey, item: &T) -> Option<Value> {
    match serde_json::to_value(item) {
        Ok(v) => Some(v),
        Err(e) => {
            tracing::error!("[CacheReconciler] Failed to encode entry for {}: {}", key, e);
            None
        }
    }
}

fn decode<T: DeserializeOwned>(key: &CacheKey, value: Value) -> Option<T> {
    match serde_json::from_value(value) {
        Ok(item) => Some(item),
        Err(e) => {
            tracing::warn!("[CacheReconciler] Entry {} does not decode: {}", key, e);
            None
        }
    }
}

fn into_list(value: Option<Value>) -> Vec<Value> {
    match value {
        Some(Value::Array(list)) => list,
        _ => Vec::new(),
    }
}

fn element_id(value: &Value) -> Option<&str> {
    value.get("id").and_then(Value::as_str)
}
