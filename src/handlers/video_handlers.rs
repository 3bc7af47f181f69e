//! Read-only video metadata handlers.

use crate::{
    app::AppState,
    errors::AppError,
    models::video::Video,
    services::video_store::{VideoStore, VideoStoreError},
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use uuid::Uuid;

/// `GET /api/videos/{videoID}`
pub async fn get_video(
    State(state): State<AppState>,
    Path(raw_video_id): Path<String>,
) -> Result<Json<Video>, AppError> {
    let video_id =
        Uuid::parse_str(&raw_video_id).map_err(|_| AppError::bad_request("Invalid video ID"))?;

    match state.thumbnails.videos.get_video(video_id).await {
        Ok(video) => Ok(Json(video)),
        Err(VideoStoreError::NotFound(_)) => Err(AppError::not_found("Video not found")),
        Err(err) => {
            tracing::warn!(%video_id, error = %err, "video lookup failed");
            Err(AppError::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Couldn't get video",
            ))
        }
    }
}
