//! In-memory social data store for Feedline.
//!
//! This crate is the heart of Feedline. It provides:
//! - Entity records ([`User`], [`Post`], [`Comment`], [`Message`]) in the
//!   on-disk JSON shape
//! - Immutable collection [`Snapshot`]s; every mutation returns a new one
//! - The mutation engine (posts, likes, comments, friends, messages)
//! - The [`Session`] context: register, login, logout, avatar changes
//! - The [`Aggregator`]: chats, transcripts, search, and profile views
//!
//! Nothing in this crate performs I/O. Persistence is layered on top by
//! `feedline-sync`.

pub mod aggregate;
pub mod error;
pub mod model;
pub mod session;
pub mod snapshot;
pub mod store;

pub use aggregate::{Aggregator, Chat, ProfileStats};
pub use error::{CoreError, CoreResult, EntityKind, ErrorKind};
pub use model::{Comment, Message, Post, User};
pub use session::Session;
pub use snapshot::{Messages, Posts, Snapshot, Users};
