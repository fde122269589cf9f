use thiserror::Error;

use feedline_core::{CoreError, ErrorKind};

#[derive(Debug, Error)]
pub enum SdkError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("persistence error: {0}")]
    Sync(#[from] feedline_sync::SyncError),
}

impl SdkError {
    /// The core error category, if this came from a core operation.
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Core(e) => Some(e.kind()),
            _ => None,
        }
    }
}

pub type SdkResult<T> = Result<T, SdkError>;
