pub mod auth_service;
pub mod thumbnail_service;
pub mod thumbnail_storage;
pub mod video_store;
