//! Test helpers: build AppState and router for integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use axum_test::TestServer;
use chrono::Duration;
use std::sync::Arc;
use tempfile::TempDir;
use thumbnail_intake::{
    app::{AppState, build_app},
    config::AppConfig,
    db,
    errors::StatusPolicy,
    models::video::{NewVideo, Video},
    services::{
        thumbnail_service::ThumbnailService,
        thumbnail_storage::ThumbnailStrategy,
        video_store::{VideoStore, VideoStoreError, VideoStoreResult},
    },
};
use uuid::Uuid;

pub const TEST_JWT_SECRET: &str = "test-jwt-secret-at-least-32-characters-long";
pub const TEST_PUBLIC_URL: &str = "http://localhost:8091";

/// Test application: server, state, and a seeded video owned by `owner`.
pub struct TestApp {
    pub server: TestServer,
    pub state: AppState,
    pub owner: Uuid,
    pub video_id: Uuid,
    pub _assets_dir: TempDir,
}

impl TestApp {
    pub fn client(&self) -> &TestServer {
        &self.server
    }

    /// Token for the seeded video's owner.
    pub fn owner_token(&self) -> String {
        self.token_for(self.owner)
    }

    pub fn token_for(&self, user_id: Uuid) -> String {
        self.state
            .thumbnails
            .jwt()
            .issue(user_id, Duration::hours(1))
            .expect("Failed to issue token")
    }

    pub fn upload_path(&self) -> String {
        format!("/api/thumbnail_upload/{}", self.video_id)
    }
}

pub async fn setup_test_app(strategy: ThumbnailStrategy) -> TestApp {
    setup_test_app_with_policy(strategy, StatusPolicy::Legacy).await
}

pub async fn setup_test_app_with_policy(
    strategy: ThumbnailStrategy,
    status_policy: StatusPolicy,
) -> TestApp {
    setup_test_app_with_store(strategy, status_policy, |videos| videos).await
}

/// Like `setup_test_app_with_policy`, but every video store write fails.
pub async fn setup_test_app_with_failing_updates(
    strategy: ThumbnailStrategy,
    status_policy: StatusPolicy,
) -> TestApp {
    setup_test_app_with_store(strategy, status_policy, |videos| {
        Arc::new(FailingUpdates { inner: videos })
    })
    .await
}

/// Video store that reads through to `inner` but rejects every update.
struct FailingUpdates {
    inner: Arc<dyn VideoStore>,
}

#[async_trait]
impl VideoStore for FailingUpdates {
    async fn create_video(&self, new_video: NewVideo) -> VideoStoreResult<Video> {
        self.inner.create_video(new_video).await
    }

    async fn get_video(&self, id: Uuid) -> VideoStoreResult<Video> {
        self.inner.get_video(id).await
    }

    async fn update_video(&self, _video: &Video) -> VideoStoreResult<()> {
        Err(VideoStoreError::Sqlx(sqlx::Error::PoolClosed))
    }
}

async fn setup_test_app_with_store(
    strategy: ThumbnailStrategy,
    status_policy: StatusPolicy,
    wrap_store: impl FnOnce(Arc<dyn VideoStore>) -> Arc<dyn VideoStore>,
) -> TestApp {
    let assets_dir = tempfile::tempdir().expect("Failed to create assets dir");
    let cfg = AppConfig {
        host: "127.0.0.1".into(),
        port: 8091,
        database_url: "sqlite::memory:".into(),
        assets_root: assets_dir.path().to_string_lossy().into_owned(),
        public_url: TEST_PUBLIC_URL.into(),
        jwt_secret: TEST_JWT_SECRET.into(),
        thumbnail_strategy: strategy,
        status_policy,
    };

    let pool = db::memory_pool().await.expect("Failed to open database");
    let mut state = AppState::from_config(&cfg, Arc::new(pool));
    let service = &state.thumbnails;
    let thumbnails = ThumbnailService::new(
        wrap_store(service.videos.clone()),
        service.storage.clone(),
        service.cache.clone(),
        service.jwt().clone(),
    );
    state.thumbnails = thumbnails;

    let owner = Uuid::new_v4();
    let video = state
        .thumbnails
        .videos
        .create_video(NewVideo {
            id: Uuid::new_v4(),
            title: "Test video".into(),
            description: "seeded by integration tests".into(),
            user_id: owner,
        })
        .await
        .expect("Failed to seed video");

    let server = TestServer::new(build_app(state.clone())).expect("Failed to create test server");

    TestApp {
        server,
        state,
        owner,
        video_id: video.id,
        _assets_dir: assets_dir,
    }
}
