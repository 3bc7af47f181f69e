//! Shared application state and router assembly.

use crate::{
    config::AppConfig,
    errors::StatusPolicy,
    routes,
    services::{
        auth_service::JwtValidator,
        thumbnail_service::ThumbnailService,
        thumbnail_storage::{ThumbnailCache, build_storage},
        video_store::SqliteVideoStore,
    },
};
use axum::Router;
use sqlx::SqlitePool;
use std::{path::PathBuf, sync::Arc};
use tower_http::trace::TraceLayer;

/// State handed to every handler.
#[derive(Clone)]
pub struct AppState {
    /// Shared SQLite connection pool (video records).
    pub db: Arc<SqlitePool>,

    /// Directory the filesystem strategy writes to; also served under `/assets`.
    pub assets_root: PathBuf,

    pub thumbnails: ThumbnailService,

    pub status_policy: StatusPolicy,
}

impl AppState {
    /// Wire the configured strategy, video store and token validator together.
    pub fn from_config(cfg: &AppConfig, db: Arc<SqlitePool>) -> Self {
        let assets_root = PathBuf::from(&cfg.assets_root);
        let cache = Arc::new(ThumbnailCache::new());
        let storage = build_storage(
            cfg.thumbnail_strategy,
            assets_root.clone(),
            &cfg.public_url,
            cache.clone(),
        );
        let videos = Arc::new(SqliteVideoStore::new(db.clone()));

        Self {
            db,
            assets_root,
            thumbnails: ThumbnailService::new(
                videos,
                storage,
                cache,
                JwtValidator::new(&cfg.jwt_secret),
            ),
            status_policy: cfg.status_policy,
        }
    }
}

/// Full application router with request tracing.
pub fn build_app(state: AppState) -> Router {
    routes::routes::routes(&state.assets_root)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
