//! Core data models for the thumbnail intake service.
//!
//! `Video` maps to the `videos` table via `sqlx::FromRow` and serializes
//! as JSON via `serde`. `Thumbnail` is the in-flight upload payload.

pub mod thumbnail;
pub mod video;
