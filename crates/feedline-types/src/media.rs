use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Kind of an attached media item.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Image => write!(f, "image"),
            Self::Video => write!(f, "video"),
        }
    }
}

impl FromStr for MediaKind {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "image" => Ok(Self::Image),
            "video" => Ok(Self::Video),
            other => Err(TypeError::UnknownMediaKind(other.to_string())),
        }
    }
}

/// An already-encoded media reference.
///
/// `url` is opaque (commonly a `data:` URL). Size limits are the uploader's
/// concern; nothing downstream inspects the payload.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Media {
    #[serde(rename = "mediaUrl")]
    pub url: String,
    #[serde(rename = "mediaType")]
    pub kind: MediaKind,
}

impl Media {
    pub fn new(url: impl Into<String>, kind: MediaKind) -> Self {
        Self {
            url: url.into(),
            kind,
        }
    }

    pub fn image(url: impl Into<String>) -> Self {
        Self::new(url, MediaKind::Image)
    }

    pub fn video(url: impl Into<String>) -> Self {
        Self::new(url, MediaKind::Video)
    }

    /// Rebuild a media reference from its two stored fields. Both absent
    /// means no media; one without the other is rejected.
    pub fn from_parts(url: Option<String>, kind: Option<&str>) -> Result<Option<Self>, TypeError> {
        match (url, kind) {
            (None, None) => Ok(None),
            (Some(url), Some(kind)) => Ok(Some(Self::new(url, kind.parse()?))),
            (Some(_), None) => Err(TypeError::IncompleteMedia("mediaUrl")),
            (None, Some(_)) => Err(TypeError::IncompleteMedia("mediaType")),
        }
    }
}
