//! Thumbnail intake service: accepts thumbnail uploads for videos, stores them
//! with a configurable strategy and records the resulting reference on the
//! video's metadata.

pub mod app;
pub mod config;
pub mod db;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;
