//! Thumbnail persistence strategies.
//!
//! A `ThumbnailStorage` takes the uploaded bytes for a video and returns the
//! reference (URL) clients use to fetch them later:
//! - `InlineThumbnailStorage` embeds the payload in a base64 `data:` URL.
//! - `FilesystemThumbnailStorage` writes `{video_id}.{ext}` under the assets root.
//! - `MemoryThumbnailStorage` keeps the payload in a shared `ThumbnailCache`.
//!
//! Exactly one strategy is active per process, chosen at startup.

use crate::models::thumbnail::Thumbnail;
use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose::STANDARD};
use clap::ValueEnum;
use mime_guess::mime::Mime;
use std::{
    collections::HashMap,
    io::{self, ErrorKind},
    path::{Path, PathBuf},
    sync::Arc,
};
use thiserror::Error;
use tokio::{
    fs::{self, File},
    io::AsyncWriteExt,
    sync::RwLock,
};
use tracing::debug;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("no file extension registered for media type `{0}`")]
    UnknownMediaType(String),
    #[error(transparent)]
    Io(#[from] io::Error),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Which persistence strategy the process runs with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum ThumbnailStrategy {
    Inline,
    #[default]
    Filesystem,
    Memory,
}

#[async_trait]
pub trait ThumbnailStorage: Send + Sync {
    /// Store the thumbnail for `video_id` and return its reference URL.
    async fn persist(&self, video_id: Uuid, thumbnail: &Thumbnail) -> StorageResult<String>;
}

/// Build the storage for `strategy`.
///
/// `cache` is only written to by the memory strategy, but is always shared
/// with the retrieval endpoint.
pub fn build_storage(
    strategy: ThumbnailStrategy,
    assets_root: impl Into<PathBuf>,
    public_url: &str,
    cache: Arc<ThumbnailCache>,
) -> Arc<dyn ThumbnailStorage> {
    match strategy {
        ThumbnailStrategy::Inline => Arc::new(InlineThumbnailStorage),
        ThumbnailStrategy::Filesystem => {
            Arc::new(FilesystemThumbnailStorage::new(assets_root, public_url))
        }
        ThumbnailStrategy::Memory => Arc::new(MemoryThumbnailStorage::new(cache, public_url)),
    }
}

/// Encodes the payload into a self-contained `data:{media_type};base64,...` URL.
///
/// The reference grows with the image and ends up in the video record.
#[derive(Clone, Copy, Debug, Default)]
pub struct InlineThumbnailStorage;

#[async_trait]
impl ThumbnailStorage for InlineThumbnailStorage {
    async fn persist(&self, _video_id: Uuid, thumbnail: &Thumbnail) -> StorageResult<String> {
        Ok(data_url(&thumbnail.media_type, &thumbnail.data))
    }
}

pub fn data_url(media_type: &str, data: &[u8]) -> String {
    format!("data:{};base64,{}", media_type, STANDARD.encode(data))
}

/// Writes `{video_id}.{ext}` beneath `assets_root` and returns its `/assets/` URL.
#[derive(Clone, Debug)]
pub struct FilesystemThumbnailStorage {
    assets_root: PathBuf,
    public_url: String,
}

impl FilesystemThumbnailStorage {
    pub fn new(assets_root: impl Into<PathBuf>, public_url: &str) -> Self {
        Self {
            assets_root: assets_root.into(),
            public_url: public_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn assets_root(&self) -> &Path {
        &self.assets_root
    }

    /// Write `data` to a temporary file next to `final_path`, fsync it, then
    /// rename over `final_path`. Readers never see a partially written file.
    async fn write_atomically(&self, final_path: &Path, data: &[u8]) -> StorageResult<()> {
        fs::create_dir_all(&self.assets_root).await?;
        let tmp_path = self.assets_root.join(format!(".tmp-{}", Uuid::new_v4()));

        if let Err(err) = write_file(&tmp_path, data).await {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(StorageError::Io(err));
        }

        if let Err(err) = fs::rename(&tmp_path, final_path).await {
            if err.kind() == ErrorKind::AlreadyExists {
                fs::remove_file(final_path).await?;
                fs::rename(&tmp_path, final_path).await?;
            } else {
                let _ = fs::remove_file(&tmp_path).await;
                return Err(StorageError::Io(err));
            }
        }
        Ok(())
    }
}

async fn write_file(path: &Path, data: &[u8]) -> io::Result<()> {
    let mut file = File::create(path).await?;
    file.write_all(data).await?;
    file.flush().await?;
    file.sync_all().await
}

#[async_trait]
impl ThumbnailStorage for FilesystemThumbnailStorage {
    async fn persist(&self, video_id: Uuid, thumbnail: &Thumbnail) -> StorageResult<String> {
        let ext = extension_for(&thumbnail.media_type)?;
        let file_name = format!("{}.{}", video_id, ext);
        let final_path = self.assets_root.join(&file_name);

        self.write_atomically(&final_path, &thumbnail.data).await?;
        debug!(
            "wrote {} bytes to {}",
            thumbnail.data.len(),
            final_path.display()
        );

        Ok(format!("{}/assets/{}", self.public_url, file_name))
    }
}

/// First registered file extension for `media_type`.
///
/// Parameters such as `; charset=...` are ignored. When a type maps to several
/// extensions the first in the registry wins, so the result is deterministic.
/// That is not always the most familiar one: `image/jpeg` yields `jfif`.
pub fn extension_for(media_type: &str) -> StorageResult<&'static str> {
    let unknown = || StorageError::UnknownMediaType(media_type.to_string());
    let mime: Mime = media_type.trim().parse().map_err(|_| unknown())?;
    mime_guess::get_mime_extensions_str(mime.essence_str())
        .and_then(|exts| exts.first().copied())
        .ok_or_else(unknown)
}

/// Process-wide thumbnail map keyed by video ID.
///
/// Entries are replaced whole under the write lock, so concurrent uploads for
/// the same video leave exactly one complete payload behind. Nothing is ever
/// evicted.
#[derive(Debug, Default)]
pub struct ThumbnailCache {
    entries: RwLock<HashMap<Uuid, Thumbnail>>,
}

impl ThumbnailCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `thumbnail` for `video_id`, returning the one it replaced.
    pub async fn insert(&self, video_id: Uuid, thumbnail: Thumbnail) -> Option<Thumbnail> {
        self.entries.write().await.insert(video_id, thumbnail)
    }

    pub async fn get(&self, video_id: Uuid) -> Option<Thumbnail> {
        self.entries.read().await.get(&video_id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}

/// Keeps thumbnails in a `ThumbnailCache` and points clients at `/api/thumbnails/{id}`.
#[derive(Clone, Debug)]
pub struct MemoryThumbnailStorage {
    cache: Arc<ThumbnailCache>,
    public_url: String,
}

impl MemoryThumbnailStorage {
    pub fn new(cache: Arc<ThumbnailCache>, public_url: &str) -> Self {
        Self {
            cache,
            public_url: public_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl ThumbnailStorage for MemoryThumbnailStorage {
    async fn persist(&self, video_id: Uuid, thumbnail: &Thumbnail) -> StorageResult<String> {
        if self.cache.insert(video_id, thumbnail.clone()).await.is_some() {
            debug!(%video_id, "replaced cached thumbnail");
        }
        Ok(format!("{}/api/thumbnails/{}", self.public_url, video_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PUBLIC_URL: &str = "http://localhost:8091";

    #[test]
    fn png_maps_to_png_extension() {
        assert_eq!(extension_for("image/png").unwrap(), "png");
        assert_eq!(extension_for("image/png; charset=binary").unwrap(), "png");
    }

    #[test]
    fn unregistered_media_type_is_rejected() {
        for media_type in ["application/x-not-registered", "", "not a mime"] {
            let err = extension_for(media_type).unwrap_err();
            assert!(
                matches!(err, StorageError::UnknownMediaType(ref mt) if mt == media_type),
                "{media_type}"
            );
        }
    }

    #[test]
    fn jpeg_uses_first_registered_extension() {
        assert_eq!(extension_for("image/jpeg").unwrap(), "jfif");
    }

    #[test]
    fn extension_choice_is_stable() {
        let first = extension_for("image/jpeg").unwrap();
        for _ in 0..10 {
            assert_eq!(extension_for("image/jpeg").unwrap(), first);
        }
    }

    #[tokio::test]
    async fn inline_data_url_decodes_to_original_bytes() {
        let payload: Vec<u8> = (0..=255u8).collect();
        let thumbnail = Thumbnail::new("image/jpeg", payload.clone());
        let reference = InlineThumbnailStorage
            .persist(Uuid::new_v4(), &thumbnail)
            .await
            .unwrap();

        let encoded = reference
            .strip_prefix("data:image/jpeg;base64,")
            .expect("data URL prefix");
        assert_eq!(STANDARD.decode(encoded).unwrap(), payload);
    }

    #[tokio::test]
    async fn filesystem_writes_deterministic_file() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FilesystemThumbnailStorage::new(dir.path(), "http://localhost:8091/");
        let video_id = Uuid::new_v4();

        let reference = storage
            .persist(video_id, &Thumbnail::new("image/png", &b"\x89PNG"[..]))
            .await
            .unwrap();

        assert_eq!(
            reference,
            format!("http://localhost:8091/assets/{}.png", video_id)
        );
        let on_disk = std::fs::read(dir.path().join(format!("{}.png", video_id))).unwrap();
        assert_eq!(on_disk, b"\x89PNG");
    }

    #[tokio::test]
    async fn filesystem_overwrites_and_leaves_no_temp_files() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FilesystemThumbnailStorage::new(dir.path().join("assets"), PUBLIC_URL);
        let video_id = Uuid::new_v4();

        for body in [&b"first upload"[..], &b"second"[..]] {
            storage
                .persist(video_id, &Thumbnail::new("image/png", body))
                .await
                .unwrap();
        }

        let names: Vec<String> = std::fs::read_dir(storage.assets_root())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec![format!("{}.png", video_id)]);
        let on_disk = std::fs::read(storage.assets_root().join(&names[0])).unwrap();
        assert_eq!(on_disk, b"second");
    }

    #[tokio::test]
    async fn filesystem_rejects_unknown_media_type_without_writing() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FilesystemThumbnailStorage::new(dir.path(), PUBLIC_URL);

        let err = storage
            .persist(
                Uuid::new_v4(),
                &Thumbnail::new("application/x-not-registered", &b"abc"[..]),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::UnknownMediaType(_)));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn memory_lookup_returns_uploaded_thumbnail() {
        let cache = Arc::new(ThumbnailCache::new());
        let storage = MemoryThumbnailStorage::new(cache.clone(), PUBLIC_URL);
        let video_id = Uuid::new_v4();
        let thumbnail = Thumbnail::new("image/gif", &b"GIF89a"[..]);

        let reference = storage.persist(video_id, &thumbnail).await.unwrap();

        assert_eq!(
            reference,
            format!("{}/api/thumbnails/{}", PUBLIC_URL, video_id)
        );
        assert_eq!(cache.get(video_id).await, Some(thumbnail));
        assert_eq!(cache.get(Uuid::new_v4()).await, None);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_memory_uploads_keep_one_complete_payload() {
        let cache = Arc::new(ThumbnailCache::new());
        let storage = Arc::new(MemoryThumbnailStorage::new(cache.clone(), PUBLIC_URL));
        let video_id = Uuid::new_v4();

        let payloads: Vec<Thumbnail> = (0..16u8)
            .map(|i| Thumbnail::new(format!("image/x-{}", i), vec![i; 64 * 1024]))
            .collect();

        let handles: Vec<_> = payloads
            .iter()
            .cloned()
            .map(|thumbnail| {
                let storage = storage.clone();
                tokio::spawn(async move { storage.persist(video_id, &thumbnail).await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let stored = cache.get(video_id).await.expect("thumbnail stored");
        assert!(payloads.contains(&stored));
        assert_eq!(cache.len().await, 1);
    }

    #[test]
    fn build_storage_honours_strategy() {
        let cache = Arc::new(ThumbnailCache::new());
        let rt = tokio::runtime::Runtime::new().unwrap();
        let video_id = Uuid::new_v4();
        let thumbnail = Thumbnail::new("image/png", &b"png"[..]);

        let inline = build_storage(ThumbnailStrategy::Inline, "unused", PUBLIC_URL, cache.clone());
        let reference = rt.block_on(inline.persist(video_id, &thumbnail)).unwrap();
        assert!(reference.starts_with("data:image/png;base64,"));

        let memory = build_storage(ThumbnailStrategy::Memory, "unused", PUBLIC_URL, cache.clone());
        let reference = rt.block_on(memory.persist(video_id, &thumbnail)).unwrap();
        assert!(reference.ends_with(&format!("/api/thumbnails/{}", video_id)));
        assert!(rt.block_on(cache.get(video_id)).is_some());
    }
}
