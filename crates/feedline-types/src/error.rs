use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("identifier must not be empty")]
    EmptyId,

    #[error("unknown media kind: {0} (expected \"image\" or \"video\")")]
    UnknownMediaKind(String),

    #[error("media needs both a url and a kind (got {0} only)")]
    IncompleteMedia(&'static str),
}
