//! Represents a video metadata record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A video's metadata as kept by the video store.
///
/// The video payload itself lives elsewhere; this record only carries
/// descriptive fields and references (URLs) to the video and its thumbnail.
#[derive(Serialize, Deserialize, Clone, FromRow, Debug, PartialEq)]
pub struct Video {
    /// Externally assigned identifier.
    pub id: Uuid,

    /// When this record was created.
    pub created_at: DateTime<Utc>,

    /// When this record was last modified.
    pub updated_at: DateTime<Utc>,

    pub title: String,

    pub description: String,

    /// Locator for the current thumbnail: a data URL, an asset URL, or an API URL.
    pub thumbnail_url: Option<String>,

    pub video_url: Option<String>,

    /// ID of the user that owns this video. Only the owner may change the thumbnail.
    pub user_id: Uuid,
}

/// Fields required to create a new video record.
#[derive(Clone, Debug)]
pub struct NewVideo {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub user_id: Uuid,
}
