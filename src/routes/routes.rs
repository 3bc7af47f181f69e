//! Defines routes for thumbnail intake and its supporting endpoints.
//!
//! ## Structure
//! - `POST /api/thumbnail_upload/{videoID}`: upload a thumbnail (multipart, 10 MiB max)
//! - `GET  /api/thumbnails/{videoID}`: fetch a thumbnail held in memory
//! - `GET  /api/videos/{videoID}`: read a video record
//! - `GET  /assets/*`: files written by the filesystem strategy
//! - `GET  /healthz`, `GET /readyz`: probes

use crate::{
    app::AppState,
    handlers::{
        health_handlers::{healthz, readyz},
        thumbnail_handlers::{MAX_UPLOAD_BYTES, get_thumbnail, upload_thumbnail},
        video_handlers::get_video,
    },
};
use axum::{
    Router,
    extract::{DefaultBodyLimit, Request},
    http::StatusCode,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use std::path::Path;
use tower_http::services::ServeDir;

/// Build the router. `assets_root` is served read-only under `/assets`,
/// except for dot-files (in-flight temp files and readiness scratch files).
pub fn routes(assets_root: &Path) -> Router<AppState> {
    Router::new()
        // health endpoints (mounted at root)
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route(
            "/api/thumbnail_upload/{video_id}",
            post(upload_thumbnail).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route("/api/thumbnails/{video_id}", get(get_thumbnail))
        .route("/api/videos/{video_id}", get(get_video))
        .nest_service("/assets", assets(assets_root))
}

fn assets(assets_root: &Path) -> Router {
    Router::new()
        .fallback_service(ServeDir::new(assets_root))
        .layer(middleware::from_fn(hide_dot_files))
}

async fn hide_dot_files(req: Request, next: Next) -> Response {
    if req.uri().path().split('/').any(is_hidden_segment) {
        return StatusCode::NOT_FOUND.into_response();
    }
    next.run(req).await
}

fn is_hidden_segment(segment: &str) -> bool {
    segment.starts_with('.') || segment.get(..3).is_some_and(|p| p.eq_ignore_ascii_case("%2e"))
}
