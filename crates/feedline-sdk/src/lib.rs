//! High-level API for Feedline.
//!
//! [`Feedline`] is the entry point for front ends: open it over any
//! [`KvStore`](feedline_store::KvStore), call mutations and views on it, and
//! `flush` before exiting.

pub mod draft;
pub mod error;
pub mod feedline;

pub use draft::{PostDraft, Profile, PublicUser};
pub use error::{SdkError, SdkResult};
pub use feedline::Feedline;

// Re-export key types
pub use feedline_core::{Chat, Comment, ErrorKind, Message, Post, ProfileStats, Session, User};
pub use feedline_store::{FileKvStore, InMemoryKvStore, KvStore, Scope};
pub use feedline_sync::WriteStats;
pub use feedline_types::{CommentId, Media, MediaKind, MessageId, PostId, Timestamp, UserId};
