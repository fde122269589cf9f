use serde::Serialize;

use feedline_core::{Post, ProfileStats, User};
use feedline_types::{Media, MediaKind};

/// A post before publication.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PostDraft {
    pub content: String,
    pub media: Option<Media>,
}

impl PostDraft {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            media: None,
        }
    }

    pub fn with_media(mut self, url: impl Into<String>, kind: MediaKind) -> Self {
        self.media = Some(Media::new(url, kind));
        self
    }

    pub fn with_image(self, url: impl Into<String>) -> Self {
        self.with_media(url, MediaKind::Image)
    }

    pub fn with_video(self, url: impl Into<String>) -> Self {
        self.with_media(url, MediaKind::Video)
    }
}

/// Public view of a user's profile.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub user: PublicUser,
    pub stats: ProfileStats,
    pub posts: Vec<Post>,
}

/// A user record without credentials.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: feedline_types::UserId,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
}

impl From<&User> for PublicUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            username: user.username.clone(),
            email: user.email.clone(),
            avatar: user.avatar.clone(),
            bio: user.bio.clone(),
        }
    }
}
