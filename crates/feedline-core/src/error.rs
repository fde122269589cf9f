use std::fmt;

/// Kind of entity named in a [`CoreError::NotFound`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EntityKind {
    User,
    Post,
    Message,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Post => write!(f, "post"),
            Self::Message => write!(f, "message"),
        }
    }
}

/// Coarse error category, for callers that only branch on the class of
/// failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Missing or empty required input.
    Validation,
    /// The request collides with existing state.
    Conflict,
    /// Bad credentials or no signed-in user.
    Auth,
    /// The operation names an entity that does not exist.
    NotFound,
}

/// Errors produced by store and session operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CoreError {
    #[error("missing required field: {field}")]
    MissingField { field: &'static str },

    #[error("a post needs text or media")]
    EmptyPost,

    #[error("message must not be blank")]
    EmptyMessage,

    #[error("a user cannot add themselves as a friend")]
    SelfReference,

    #[error("email already registered: {email}")]
    DuplicateEmail { email: String },

    #[error("invalid email or password")]
    InvalidCredentials,

    #[error("no user is signed in")]
    NoSession,

    #[error("{kind} not found: {id}")]
    NotFound { kind: EntityKind, id: String },
}

impl CoreError {
    pub fn not_found(kind: EntityKind, id: impl fmt::Display) -> Self {
        Self::NotFound {
            kind,
            id: id.to_string(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingField { .. }
            | Self::EmptyPost
            | Self::EmptyMessage
            | Self::SelfReference => ErrorKind::Validation,
            Self::DuplicateEmail { .. } => ErrorKind::Conflict,
            Self::InvalidCredentials | Self::NoSession => ErrorKind::Auth,
            Self::NotFound { .. } => ErrorKind::NotFound,
        }
    }
}

/// Result alias for core operations.
pub type CoreResult<T> = Result<T, CoreError>;
