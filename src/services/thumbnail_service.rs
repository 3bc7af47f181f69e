//! ThumbnailService: authenticates uploaders and attaches thumbnails to videos.
//!
//! The HTTP layer parses the request (video ID, credentials, multipart body)
//! and hands the buffered upload to `attach_thumbnail`, which checks
//! ownership, persists the bytes through the configured `ThumbnailStorage`
//! and writes the new reference back to the `VideoStore`.

use crate::{
    errors::{StoreOp, UploadError},
    models::{thumbnail::Thumbnail, video::Video},
    services::{
        auth_service::{JwtValidator, get_bearer_token},
        thumbnail_storage::{ThumbnailCache, ThumbnailStorage},
        video_store::{VideoStore, VideoStoreError},
    },
};
use axum::http::HeaderMap;
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

#[derive(Clone)]
pub struct ThumbnailService {
    /// Video metadata records.
    pub videos: Arc<dyn VideoStore>,

    /// Active persistence strategy.
    pub storage: Arc<dyn ThumbnailStorage>,

    /// Backing map for the memory strategy, read by the retrieval endpoint.
    pub cache: Arc<ThumbnailCache>,

    jwt: JwtValidator,
}

impl ThumbnailService {
    pub fn new(
        videos: Arc<dyn VideoStore>,
        storage: Arc<dyn ThumbnailStorage>,
        cache: Arc<ThumbnailCache>,
        jwt: JwtValidator,
    ) -> Self {
        Self {
            videos,
            storage,
            cache,
            jwt,
        }
    }

    /// Resolve the request's bearer token to a user ID.
    pub fn authenticate(&self, headers: &HeaderMap) -> Result<Uuid, UploadError> {
        let token = get_bearer_token(headers).map_err(UploadError::MissingCredential)?;
        self.jwt.validate(token).map_err(UploadError::InvalidCredential)
    }

    pub fn jwt(&self) -> &JwtValidator {
        &self.jwt
    }

    /// Store `thumbnail` for `video_id` on behalf of `user_id` and return the
    /// updated record.
    ///
    /// Nothing is rolled back on failure: a thumbnail persisted before a failed
    /// record update stays where it was written.
    pub async fn attach_thumbnail(
        &self,
        video_id: Uuid,
        user_id: Uuid,
        thumbnail: Thumbnail,
    ) -> Result<Video, UploadError> {
        let mut video = self
            .videos
            .get_video(video_id)
            .await
            .map_err(|err| match err {
                VideoStoreError::NotFound(id) => UploadError::NotFound(id),
                other => UploadError::StoreError {
                    op: StoreOp::Lookup,
                    source: other,
                },
            })?;

        if video.user_id != user_id {
            return Err(UploadError::Forbidden { user_id, video_id });
        }

        let reference = self.storage.persist(video_id, &thumbnail).await?;
        debug!(%video_id, reference_len = reference.len(), "thumbnail persisted");

        video.thumbnail_url = Some(reference);
        video.updated_at = Utc::now();
        self.videos
            .update_video(&video)
            .await
            .map_err(|source| UploadError::StoreError {
                op: StoreOp::Update,
                source,
            })?;

        info!(%video_id, %user_id, "thumbnail updated");
        Ok(video)
    }
}
