//! Directory-backed blob store.
//!
//! Layout:
//! ```text
//! <root>/shared/<key>
//! <root>/local/<key>
//! ```
//!
//! Writes go to a hidden temporary file in the same directory and are then
//! renamed over the target, so a concurrent reader sees either the old or the
//! new value, never a torn one.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::fs;
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::traits::{validate_key, KvStore, Scope, StoredValue};

/// File-per-key implementation of [`KvStore`].
#[derive(Debug)]
pub struct FileKvStore {
    root: PathBuf,
    tmp_counter: AtomicU64,
}

impl FileKvStore {
    /// Open a store rooted at `root`. Directories are created lazily on the
    /// first write.
    pub fn open(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            tmp_counter: AtomicU64::new(0),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn scope_dir(&self, scope: Scope) -> PathBuf {
        self.root.join(scope.as_str())
    }

    fn blob_path(&self, key: &str, scope: Scope) -> StoreResult<PathBuf> {
        validate_key(key)?;
        Ok(self.scope_dir(scope).join(key))
    }

    fn tmp_path(&self, key: &str, scope: Scope) -> PathBuf {
        let n = self.tmp_counter.fetch_add(1, Ordering::Relaxed);
        self.scope_dir(scope)
            .join(format!(".{key}.tmp.{}.{n}", std::process::id()))
    }
}

#[async_trait]
impl KvStore for FileKvStore {
    async fn get(&self, key: &str, scope: Scope) -> StoreResult<Option<StoredValue>> {
        let path = self.blob_path(key, scope)?;
        match fs::read(&path).await {
            Ok(bytes) => {
                let value = String::from_utf8(bytes).map_err(|_| StoreError::InvalidEncoding {
                    key: key.to_string(),
                })?;
                Ok(Some(StoredValue { value }))
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn set(&self, key: &str, value: String, scope: Scope) -> StoreResult<()> {
        let path = self.blob_path(key, scope)?;
        fs::create_dir_all(self.scope_dir(scope)).await?;

        let tmp = self.tmp_path(key, scope);
        let len = value.len();
        if let Err(e) = fs::write(&tmp, value).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(e.into());
        }
        fs::rename(&tmp, &path).await?;

        debug!(key, scope = %scope, len, "blob written");
        Ok(())
    }

    async fn delete(&self, key: &str, scope: Scope) -> StoreResult<()> {
        let path = self.blob_path(key, scope)?;
        match fs::remove_file(&path).await {
            Ok(()) => {
                debug!(key, scope = %scope, "blob deleted");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
