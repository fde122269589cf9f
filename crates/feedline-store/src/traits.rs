use std::fmt;

use async_trait::async_trait;

use crate::error::StoreResult;

/// Visibility scope of a stored blob.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Scope {
    /// Readable by every session on the same backing store.
    Shared,
    /// Private to the current installation.
    Local,
}

impl Scope {
    pub fn is_shared(&self) -> bool {
        matches!(self, Self::Shared)
    }

    /// Directory / namespace name used by backends.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Shared => "shared",
            Self::Local => "local",
        }
    }
}

impl From<bool> for Scope {
    fn from(shared: bool) -> Self {
        if shared {
            Self::Shared
        } else {
            Self::Local
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A blob read back from the store.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoredValue {
    pub value: String,
}

impl StoredValue {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
        }
    }
}

/// Asynchronous key-value blob store.
///
/// All implementations must satisfy these invariants:
/// - `get` of a key that was never written returns `Ok(None)`.
/// - `set` overwrites the full value atomically from the reader's view.
/// - `delete` is idempotent.
/// - The same key in different scopes names different blobs.
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Read a blob. Returns `Ok(None)` if absent.
    async fn get(&self, key: &str, scope: Scope) -> StoreResult<Option<StoredValue>>;

    /// Write (create or replace) a blob.
    async fn set(&self, key: &str, value: String, scope: Scope) -> StoreResult<()>;

    /// Remove a blob. Removing a missing blob succeeds.
    async fn delete(&self, key: &str, scope: Scope) -> StoreResult<()>;
}

/// Check that a key is usable by every adapter: non-empty ASCII
/// alphanumerics, `_`, `-`, and `.`, not starting with a dot.
pub fn validate_key(key: &str) -> StoreResult<()> {
    use crate::error::StoreError;

    if key.is_empty() {
        return Err(StoreError::InvalidKey {
            key: key.to_string(),
            reason: "key must not be empty".into(),
        });
    }
    if key.starts_with('.') {
        return Err(StoreError::InvalidKey {
            key: key.to_string(),
            reason: "key must not start with '.'".into(),
        });
    }
    if let Some(c) = key
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.')))
    {
        return Err(StoreError::InvalidKey {
            key: key.to_string(),
            reason: format!("illegal character {c:?}"),
        });
    }
    Ok(())
}
