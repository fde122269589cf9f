use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::error::StoreResult;
use crate::traits::{validate_key, KvStore, Scope, StoredValue};

/// In-memory, HashMap-based blob store.
///
/// Intended for tests and embedding. Values are held behind a `RwLock` and
/// cloned on read. The lock is never held across an await point.
pub struct InMemoryKvStore {
    blobs: RwLock<HashMap<(Scope, String), String>>,
}

impl InMemoryKvStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self {
            blobs: RwLock::new(HashMap::new()),
        }
    }

    /// Number of blobs across both scopes.
    pub fn len(&self) -> usize {
        self.blobs.read().expect("lock poisoned").len()
    }

    /// Returns `true` if no blob is stored.
    pub fn is_empty(&self) -> bool {
        self.blobs.read().expect("lock poisoned").is_empty()
    }

    /// Sorted keys present in one scope.
    pub fn keys(&self, scope: Scope) -> Vec<String> {
        let map = self.blobs.read().expect("lock poisoned");
        let mut keys: Vec<String> = map
            .keys()
            .filter(|(s, _)| *s == scope)
            .map(|(_, k)| k.clone())
            .collect();
        keys.sort();
        keys
    }

    /// Synchronous peek, for assertions in tests.
    pub fn peek(&self, key: &str, scope: Scope) -> Option<String> {
        let map = self.blobs.read().expect("lock poisoned");
        map.get(&(scope, key.to_string())).cloned()
    }

    /// Remove every blob.
    pub fn clear(&self) {
        self.blobs.write().expect("lock poisoned").clear();
    }
}

impl Default for InMemoryKvStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KvStore for InMemoryKvStore {
    async fn get(&self, key: &str, scope: Scope) -> StoreResult<Option<StoredValue>> {
        validate_key(key)?;
        Ok(self.peek(key, scope).map(StoredValue::new))
    }

    async fn set(&self, key: &str, value: String, scope: Scope) -> StoreResult<()> {
        validate_key(key)?;
        let mut map = self.blobs.write().expect("lock poisoned");
        map.insert((scope, key.to_string()), value);
        Ok(())
    }

    async fn delete(&self, key: &str, scope: Scope) -> StoreResult<()> {
        validate_key(key)?;
        let mut map = self.blobs.write().expect("lock poisoned");
        map.remove(&(scope, key.to_string()));
        Ok(())
    }
}

impl std::fmt::Debug for InMemoryKvStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryKvStore")
            .field("blob_count", &self.len())
            .finish()
    }
}
