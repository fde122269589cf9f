//! Persistence for Feedline.
//!
//! Loads the entity collections and the session from a
//! [`KvStore`](feedline_store::KvStore) once at startup, then mirrors every
//! new snapshot back with a fire-and-forget, full-collection overwrite.

pub mod error;
pub mod keys;
pub mod synchronizer;
pub mod writer;

pub use error::{SyncError, SyncResult};
pub use keys::BlobKey;
pub use synchronizer::{LoadedState, Synchronizer};
pub use writer::WriteStats;
