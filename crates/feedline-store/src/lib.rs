//! Blob storage contract for Feedline.
//!
//! The rest of the system persists through a tiny asynchronous key-value
//! interface: named string blobs, each living in one of two scopes.
//!
//! # Scopes
//!
//! - [`Scope::Shared`] -- visible to every session using the same backing
//!   store (the entity collections live here)
//! - [`Scope::Local`] -- private to this installation (the signed-in
//!   session lives here)
//!
//! # Adapters
//!
//! All adapters implement the [`KvStore`] trait:
//!
//! - [`InMemoryKvStore`] -- `HashMap`-based store for tests and embedding
//! - [`FileKvStore`] -- one file per key under a root directory
//!
//! # Design Rules
//!
//! 1. A missing key is `Ok(None)`, never an error.
//! 2. `set` replaces the whole value; there are no partial updates.
//! 3. `delete` of a missing key succeeds.
//! 4. The store never interprets values.

pub mod error;
pub mod file;
pub mod memory;
pub mod traits;

pub use error::{StoreError, StoreResult};
pub use file::FileKvStore;
pub use memory::InMemoryKvStore;
pub use traits::{validate_key, KvStore, Scope, StoredValue};
