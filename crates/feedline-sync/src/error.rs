use thiserror::Error;

use feedline_store::StoreError;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// A persisted blob exists but is not a valid encoding of its collection.
    #[error("blob {key} is corrupt: {source}")]
    Decode {
        key: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("no async runtime available to run background writes")]
    NoRuntime,
}

pub type SyncResult<T> = Result<T, SyncError>;
