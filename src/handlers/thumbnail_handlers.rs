//! HTTP handlers for thumbnail upload and retrieval.
//!
//! The upload body is buffered in memory (bounded by `MAX_UPLOAD_BYTES`) before
//! anything is persisted; storage and ownership concerns live in
//! `ThumbnailService`.

use crate::{
    app::AppState,
    errors::{AppError, UploadError},
    models::{thumbnail::Thumbnail, video::Video},
};
use axum::{
    Json,
    body::Body,
    extract::{Multipart, Path, State, multipart::MultipartRejection},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::Response,
};
use bytes::BytesMut;
use tracing::{debug, info};
use uuid::Uuid;

/// Largest multipart body (and thumbnail payload) accepted, 10 MiB.
pub const MAX_UPLOAD_BYTES: usize = 10 << 20;

/// Name of the form part carrying the image.
pub const THUMBNAIL_FIELD: &str = "thumbnail";

/// Content type served for cached thumbnails whose declared type is empty or
/// not a valid header value.
const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

/// `POST /api/thumbnail_upload/{videoID}`
///
/// Steps run in a fixed order and the first failure ends the request:
/// video ID, bearer token, multipart body, `thumbnail` part, then the
/// ownership check, persistence and record update in `ThumbnailService`.
pub async fn upload_thumbnail(
    State(state): State<AppState>,
    Path(raw_video_id): Path<String>,
    headers: HeaderMap,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<Video>, AppError> {
    handle_upload(&state, &raw_video_id, &headers, multipart)
        .await
        .map(Json)
        .map_err(|err| err.into_app_error(state.status_policy))
}

async fn handle_upload(
    state: &AppState,
    raw_video_id: &str,
    headers: &HeaderMap,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Video, UploadError> {
    let video_id = Uuid::parse_str(raw_video_id)
        .map_err(|err| UploadError::invalid_identifier(raw_video_id, err))?;
    let user_id = state.thumbnails.authenticate(headers)?;
    info!(%video_id, %user_id, "uploading thumbnail");

    let mut multipart =
        multipart.map_err(|rejection| UploadError::MalformedUpload(rejection.body_text()))?;
    let thumbnail = read_thumbnail_part(&mut multipart, MAX_UPLOAD_BYTES).await?;
    debug!(
        %video_id,
        media_type = %thumbnail.media_type,
        size = thumbnail.data.len(),
        "read thumbnail part"
    );

    state
        .thumbnails
        .attach_thumbnail(video_id, user_id, thumbnail)
        .await
}

/// Find the `thumbnail` part and buffer its whole payload.
///
/// Parts with other names are skipped. Fails with `MalformedUpload` when the
/// body cannot be parsed or the payload exceeds `limit` bytes.
async fn read_thumbnail_part(
    multipart: &mut Multipart,
    limit: usize,
) -> Result<Thumbnail, UploadError> {
    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|err| UploadError::MalformedUpload(err.body_text()))?
    {
        if field.name() != Some(THUMBNAIL_FIELD) {
            continue;
        }

        // Kept as declared. A part without a type stores the empty string.
        let media_type = field.content_type().unwrap_or_default().to_string();

        let mut data = BytesMut::new();
        while let Some(chunk) = field
            .chunk()
            .await
            .map_err(|err| UploadError::MalformedUpload(err.body_text()))?
        {
            if data.len() + chunk.len() > limit {
                return Err(UploadError::MalformedUpload(format!(
                    "thumbnail exceeds {} bytes",
                    limit
                )));
            }
            data.extend_from_slice(&chunk);
        }

        return Ok(Thumbnail::new(media_type, data.freeze()));
    }

    Err(UploadError::MissingField(THUMBNAIL_FIELD))
}

/// `GET /api/thumbnails/{videoID}`: serve a thumbnail kept by the memory strategy.
pub async fn get_thumbnail(
    State(state): State<AppState>,
    Path(raw_video_id): Path<String>,
) -> Result<Response, AppError> {
    let video_id =
        Uuid::parse_str(&raw_video_id).map_err(|_| AppError::bad_request("Invalid video ID"))?;

    let thumbnail = state
        .thumbnails
        .cache
        .get(video_id)
        .await
        .ok_or_else(|| AppError::not_found("Thumbnail not found"))?;

    let content_type = HeaderValue::from_str(&thumbnail.media_type)
        .ok()
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| HeaderValue::from_static(FALLBACK_CONTENT_TYPE));
    let length = thumbnail.data.len();

    let mut response = Response::new(Body::from(thumbnail.data));
    *response.status_mut() = StatusCode::OK;
    let headers = response.headers_mut();
    headers.insert(header::CONTENT_TYPE, content_type);
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(length));
    Ok(response)
}
