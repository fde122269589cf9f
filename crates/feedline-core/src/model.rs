//! Entity records.
//!
//! Field names on the wire follow the blobs written by the first Feedline
//! web client (`userId`, `userAvatar`, `mediaUrl`, `timestamp`, ...), so
//! existing stores load without migration.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use feedline_types::{CommentId, Media, MessageId, PostId, Timestamp, TypeError, UserId};

/// A registered account.
///
/// `friends` is a directed, ordered list: it records who this user added, in
/// the order they were added, and says nothing about who added this user.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
    /// Stored as entered. Credential hardening is out of scope.
    pub password: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(default)]
    pub friends: Vec<UserId>,
}

impl User {
    pub fn new(
        username: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            id: UserId::new(),
            username: username.into(),
            email: email.into(),
            password: password.into(),
            avatar: None,
            bio: None,
            friends: Vec::new(),
        }
    }

    /// Returns `true` if this user has added `other` as a friend.
    pub fn follows(&self, other: &UserId) -> bool {
        self.friends.contains(other)
    }
}

/// A published post.
///
/// `author_username` and `author_avatar` are copied from the author at
/// creation time and never updated afterwards.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "PostRecord")]
pub struct Post {
    pub id: PostId,
    #[serde(rename = "userId")]
    pub author_id: UserId,
    #[serde(rename = "username")]
    pub author_username: String,
    #[serde(rename = "userAvatar", skip_serializing_if = "Option::is_none")]
    pub author_avatar: Option<String>,
    pub content: String,
    #[serde(flatten)]
    pub media: Option<Media>,
    pub likes: BTreeSet<UserId>,
    pub comments: Vec<Comment>,
    #[serde(rename = "timestamp")]
    pub created_at: Timestamp,
}

/// Stored form of a post. The two media fields are decoded separately so a
/// half-written or unknown media pair fails the load instead of vanishing.
#[derive(Deserialize)]
struct PostRecord {
    id: PostId,
    #[serde(rename = "userId")]
    author_id: UserId,
    #[serde(rename = "username")]
    author_username: String,
    #[serde(rename = "userAvatar", default)]
    author_avatar: Option<String>,
    #[serde(default)]
    content: String,
    #[serde(rename = "mediaUrl", default)]
    media_url: Option<String>,
    #[serde(rename = "mediaType", default)]
    media_kind: Option<String>,
    #[serde(default)]
    likes: BTreeSet<UserId>,
    #[serde(default)]
    comments: Vec<Comment>,
    #[serde(rename = "timestamp")]
    created_at: Timestamp,
}

impl TryFrom<PostRecord> for Post {
    type Error = TypeError;

    fn try_from(record: PostRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            media: Media::from_parts(record.media_url, record.media_kind.as_deref())?,
            id: record.id,
            author_id: record.author_id,
            author_username: record.author_username,
            author_avatar: record.author_avatar,
            content: record.content,
            likes: record.likes,
            comments: record.comments,
            created_at: record.created_at,
        })
    }
}

impl Post {
    pub fn is_liked_by(&self, user: &UserId) -> bool {
        self.likes.contains(user)
    }

    pub fn like_count(&self) -> usize {
        self.likes.len()
    }
}

/// A comment on a post. Append-only.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: CommentId,
    #[serde(rename = "userId")]
    pub author_id: UserId,
    #[serde(rename = "username")]
    pub author_username: String,
    pub content: String,
    #[serde(rename = "timestamp")]
    pub created_at: Timestamp,
}

/// A direct message between two users.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: MessageId,
    pub sender_id: UserId,
    pub receiver_id: UserId,
    pub content: String,
    #[serde(rename = "timestamp")]
    pub created_at: Timestamp,
    #[serde(default)]
    pub read: bool,
}

impl Message {
    /// Returns `true` if this message was exchanged between `a` and `b`, in
    /// either direction.
    pub fn is_between(&self, a: &UserId, b: &UserId) -> bool {
        (&self.sender_id == a && &self.receiver_id == b)
            || (&self.sender_id == b && &self.receiver_id == a)
    }

    /// Returns `true` if this message is still unread by `reader` and was
    /// sent by `from`.
    pub fn is_unread_from(&self, from: &UserId, reader: &UserId) -> bool {
        !self.read && &self.sender_id == from && &self.receiver_id == reader
    }
}
