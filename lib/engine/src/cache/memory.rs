use crate::cache::{CacheBackendError, CacheKey, CacheValue, KeyValueCache};
use async_trait::async_trait;
use dashmap::DashMap;
use rustc_hash::FxHasher;
use std::hash::BuildHasherDefault;

/// An in-memory [KeyValueCache] backed by a concurrent hash map.
#[derive(Debug, Default)]
pub struct MemKeyValueCache {
    values: DashMap<CacheKey, CacheValue, BuildHasherDefault<FxHasher>>,
}

impl MemKeyValueCache {
    /// Creates a new empty [MemKeyValueCache].
    pub fn new() -> Self {
        Self {
            values: DashMap::with_hasher(BuildHasherDefault::default()),
        }
    }

    /// Returns the number of keys in the cache.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if the cache holds no keys.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Returns all keys of the cache in sorted order.
    pub fn keys(&self) -> Vec<CacheKey> {
        let mut keys = self
            .values
            .iter()
            .map(|entry| entry.key().clone())
            .collect::<Vec<_>>();
        keys.sort_unstable();
        keys
    }

    /// Returns the value of `key` without going through the async interface.
    pub fn peek(&self, key: &CacheKey) -> Option<CacheValue> {
        self.values.get(key).map(|value| value.value().clone())
    }
}

#[async_trait]
impl KeyValueCache for MemKeyValueCache {
    async fn get(&self, key: &CacheKey) -> Result<Option<CacheValue>, CacheBackendError> {
        Ok(self.peek(key))
    }

    async fn set(&self, key: CacheKey, value: CacheValue) -> Result<(), CacheBackendError> {
        self.values.insert(key, value);
        Ok(())
    }

    async fn delete(&self, key: &CacheKey) -> Result<(), CacheBackendError> {
        self.values.remove(key);
        Ok(())
    }
}
