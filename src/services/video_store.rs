//! VideoStore: read and update video metadata records.
//!
//! The upload flow only ever reads one record and writes it back with a new
//! thumbnail reference. `create_video` exists so records can be seeded.

use crate::models::video::{NewVideo, Video};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum VideoStoreError {
    #[error("video `{0}` not found")]
    NotFound(Uuid),
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

pub type VideoStoreResult<T> = Result<T, VideoStoreError>;

#[async_trait]
pub trait VideoStore: Send + Sync {
    async fn create_video(&self, new_video: NewVideo) -> VideoStoreResult<Video>;

    /// Fetch a record by ID. Returns `NotFound` when no row matches.
    async fn get_video(&self, id: Uuid) -> VideoStoreResult<Video>;

    /// Overwrite the mutable fields of an existing record.
    async fn update_video(&self, video: &Video) -> VideoStoreResult<()>;
}

/// SQLite-backed video store.
#[derive(Clone)]
pub struct SqliteVideoStore {
    db: Arc<SqlitePool>,
}

impl SqliteVideoStore {
    pub fn new(db: Arc<SqlitePool>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl VideoStore for SqliteVideoStore {
    async fn create_video(&self, new_video: NewVideo) -> VideoStoreResult<Video> {
        let now = Utc::now();
        let video = sqlx::query_as::<_, Video>(
            r#"
            INSERT INTO videos (
                id, created_at, updated_at, title, description,
                thumbnail_url, video_url, user_id
            ) VALUES (?, ?, ?, ?, ?, NULL, NULL, ?)
            RETURNING id, created_at, updated_at, title, description,
                      thumbnail_url, video_url, user_id
            "#,
        )
        .bind(new_video.id)
        .bind(now)
        .bind(now)
        .bind(&new_video.title)
        .bind(&new_video.description)
        .bind(new_video.user_id)
        .fetch_one(&*self.db)
        .await?;

        debug!(video_id = %video.id, user_id = %video.user_id, "created video");
        Ok(video)
    }

    async fn get_video(&self, id: Uuid) -> VideoStoreResult<Video> {
        sqlx::query_as::<_, Video>(
            "SELECT id, created_at, updated_at, title, description,
                    thumbnail_url, video_url, user_id
             FROM videos WHERE id = ?",
        )
        .bind(id)
        .fetch_one(&*self.db)
        .await
        .map_err(|err| match err {
            sqlx::Error::RowNotFound => VideoStoreError::NotFound(id),
            other => VideoStoreError::Sqlx(other),
        })
    }

    async fn update_video(&self, video: &Video) -> VideoStoreResult<()> {
        let result = sqlx::query(
            "UPDATE videos
             SET title = ?, description = ?, thumbnail_url = ?, video_url = ?, updated_at = ?
             WHERE id = ?",
        )
        .bind(&video.title)
        .bind(&video.description)
        .bind(&video.thumbnail_url)
        .bind(&video.video_url)
        .bind(video.updated_at)
        .bind(video.id)
        .execute(&*self.db)
        .await?;

        if result.rows_affected() == 0 {
            return Err(VideoStoreError::NotFound(video.id));
        }
        Ok(())
    }
}
