use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use feedline_types::{PostId, UserId};

use crate::model::{Message, Post, User};

/// Immutable value of a collection at one point in time.
///
/// Cloning is an `Arc` bump. Mutations never touch an existing snapshot;
/// they copy the elements, apply the change, and return a fresh one, so a
/// reader holding an older snapshot keeps a consistent view.
pub struct Snapshot<T>(Arc<Vec<T>>);

pub type Users = Snapshot<User>;
pub type Posts = Snapshot<Post>;
pub type Messages = Snapshot<Message>;

impl<T> Snapshot<T> {
    pub fn new(items: Vec<T>) -> Self {
        Self(Arc::new(items))
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    pub fn as_slice(&self) -> &[T] {
        &self.0
    }

    /// Returns `true` if both handles point at the same snapshot (not merely
    /// equal contents).
    pub fn same_as(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl<T: Clone> Snapshot<T> {
    /// Produce a new snapshot by applying `f` to a copy of the elements.
    pub(crate) fn derive(&self, f: impl FnOnce(&mut Vec<T>)) -> Self {
        let mut items = self.0.as_ref().clone();
        f(&mut items);
        Self::new(items)
    }

    pub fn to_vec(&self) -> Vec<T> {
        self.0.as_ref().clone()
    }
}

impl Snapshot<User> {
    pub fn find(&self, id: &UserId) -> Option<&User> {
        self.iter().find(|u| &u.id == id)
    }

    pub fn find_by_email(&self, email: &str) -> Option<&User> {
        self.iter().find(|u| u.email == email)
    }

    pub fn contains(&self, id: &UserId) -> bool {
        self.find(id).is_some()
    }
}

impl Snapshot<Post> {
    pub fn find(&self, id: &PostId) -> Option<&Post> {
        self.iter().find(|p| &p.id == id)
    }
}

impl<T> Clone for Snapshot<T> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<T> Default for Snapshot<T> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<T> Deref for Snapshot<T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        &self.0
    }
}

impl<T> From<Vec<T>> for Snapshot<T> {
    fn from(items: Vec<T>) -> Self {
        Self::new(items)
    }
}

impl<T: PartialEq> PartialEq for Snapshot<T> {
    fn eq(&self, other: &Self) -> bool {
        self.same_as(other) || self.0 == other.0
    }
}

impl<T: Eq> Eq for Snapshot<T> {}

impl<T: fmt::Debug> fmt::Debug for Snapshot<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.0.iter()).finish()
    }
}

impl<T: Serialize> Serialize for Snapshot<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.as_slice().serialize(serializer)
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Snapshot<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Vec::<T>::deserialize(deserializer).map(Self::new)
    }
}
