//! Foundation types for Feedline.
//!
//! Every other Feedline crate depends on `feedline-types`. Nothing here knows
//! about collections or storage; these are the small value types that flow
//! through all of them.
//!
//! # Key Types
//!
//! - [`UserId`], [`PostId`], [`CommentId`], [`MessageId`] -- opaque entity ids
//! - [`Timestamp`] -- milliseconds since the UNIX epoch
//! - [`Clock`] -- source of timestamps ([`SystemClock`], [`ManualClock`])
//! - [`Media`] -- an already-encoded `(url, kind)` media reference

pub mod error;
pub mod id;
pub mod media;
pub mod temporal;

pub use error::TypeError;
pub use id::{CommentId, MessageId, PostId, UserId};
pub use media::{Media, MediaKind};
pub use temporal::{Clock, ManualClock, SystemClock, Timestamp};
