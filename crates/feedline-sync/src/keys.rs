use std::fmt;

use feedline_store::Scope;

/// The four blobs Feedline persists.
///
/// Key names match what the first web client wrote, so existing stores load
/// as-is.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BlobKey {
    Users,
    Posts,
    Messages,
    Session,
}

impl BlobKey {
    /// Startup load order.
    pub const LOAD_ORDER: [BlobKey; 4] = [
        BlobKey::Users,
        BlobKey::Posts,
        BlobKey::Messages,
        BlobKey::Session,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Users => "app_users",
            Self::Posts => "app_posts",
            Self::Messages => "app_messages",
            Self::Session => "app_current_user",
        }
    }

    /// Collections are shared; the session is private to the installation.
    pub fn scope(self) -> Scope {
        match self {
            Self::Session => Scope::Local,
            _ => Scope::Shared,
        }
    }

    pub(crate) fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for BlobKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.scope(), self.name())
    }
}
