//! Client-side query cache and optimistic updates.

mod reconciler;
mod store;

pub use reconciler::{CacheItem, CacheReconciler, CacheSnapshot};
pub use store::{CacheStore, CacheStoreExt, QueryCache, Updater};
