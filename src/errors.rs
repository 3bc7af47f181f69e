use crate::services::{
    auth_service::AuthError, thumbnail_storage::StorageError, video_store::VideoStoreError,
};
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use clap::ValueEnum;
use serde_json::json;
use std::{fmt, io};
use thiserror::Error;
use uuid::Uuid;

/// A lightweight wrapper for general errors that keeps the message local.
#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    /// Create a new AppError with a specific status and message.
    pub fn new(status: StatusCode, msg: impl Into<String>) -> Self {
        Self {
            status,
            message: msg.into(),
        }
    }

    /// Shortcut for 400 Bad Request
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, msg)
    }

    /// Shortcut for 404 Not Found
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, msg)
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": self.message,
            "status": self.status.as_u16()
        }));

        (self.status, body).into_response()
    }
}

/// How upload failures are mapped onto HTTP status codes.
///
/// `Legacy` keeps the codes existing clients depend on: authorization and
/// store-write failures both answer 401 and every lookup failure answers 400.
/// `Strict` answers 403 for ownership mismatches, 404 for unknown videos and
/// 500 for store failures.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum StatusPolicy {
    #[default]
    Legacy,
    Strict,
}

/// Which video store call failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOp {
    Lookup,
    Update,
}

impl fmt::Display for StoreOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreOp::Lookup => write!(f, "lookup"),
            StoreOp::Update => write!(f, "update"),
        }
    }
}

/// Every way a thumbnail upload can fail. All of them end the request.
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("video id `{raw}` is not a UUID")]
    InvalidIdentifier {
        raw: String,
        #[source]
        source: uuid::Error,
    },
    #[error("missing bearer credential: {0}")]
    MissingCredential(#[source] AuthError),
    #[error("invalid bearer credential: {0}")]
    InvalidCredential(#[source] AuthError),
    #[error("malformed multipart upload: {0}")]
    MalformedUpload(String),
    #[error("form field `{0}` not present")]
    MissingField(&'static str),
    #[error("no file extension registered for media type `{0}`")]
    UnknownMediaType(String),
    #[error("video `{0}` not found")]
    NotFound(Uuid),
    #[error("user `{user_id}` does not own video `{video_id}`")]
    Forbidden { user_id: Uuid, video_id: Uuid },
    #[error("video store {op} failed: {source}")]
    StoreError {
        op: StoreOp,
        #[source]
        source: VideoStoreError,
    },
    #[error("thumbnail storage failed: {0}")]
    Io(#[source] io::Error),
}

impl UploadError {
    pub fn invalid_identifier(raw: &str, source: uuid::Error) -> Self {
        Self::InvalidIdentifier {
            raw: raw.to_string(),
            source,
        }
    }

    /// Status code for this error under the given policy.
    pub fn status(&self, policy: StatusPolicy) -> StatusCode {
        let strict = policy == StatusPolicy::Strict;
        match self {
            UploadError::InvalidIdentifier { .. }
            | UploadError::MalformedUpload(_)
            | UploadError::MissingField(_)
            | UploadError::UnknownMediaType(_) => StatusCode::BAD_REQUEST,
            UploadError::MissingCredential(_) | UploadError::InvalidCredential(_) => {
                StatusCode::UNAUTHORIZED
            }
            UploadError::NotFound(_) if strict => StatusCode::NOT_FOUND,
            UploadError::NotFound(_) => StatusCode::BAD_REQUEST,
            UploadError::Forbidden { .. } if strict => StatusCode::FORBIDDEN,
            UploadError::Forbidden { .. } => StatusCode::UNAUTHORIZED,
            UploadError::StoreError { .. } if strict => StatusCode::INTERNAL_SERVER_ERROR,
            UploadError::StoreError {
                op: StoreOp::Lookup,
                ..
            } => StatusCode::BAD_REQUEST,
            UploadError::StoreError {
                op: StoreOp::Update,
                ..
            } => StatusCode::UNAUTHORIZED,
            UploadError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Short message safe to show to the client. Never includes the cause.
    pub fn public_message(&self) -> &'static str {
        match self {
            UploadError::InvalidIdentifier { .. } => "Invalid ID",
            UploadError::MissingCredential(_) => "Couldn't find JWT",
            UploadError::InvalidCredential(_) => "Couldn't validate JWT",
            UploadError::MalformedUpload(_) => "Unable to parse form file",
            UploadError::MissingField(_) => "Missing thumbnail form file",
            UploadError::UnknownMediaType(_) => "Unsupported thumbnail media type",
            UploadError::NotFound(_) => "Unable to get video",
            UploadError::Forbidden { .. } => "User is not authorized to access video",
            UploadError::StoreError {
                op: StoreOp::Lookup,
                ..
            } => "Unable to get video",
            UploadError::StoreError {
                op: StoreOp::Update,
                ..
            } => "Unable to update video",
            UploadError::Io(_) => "Unable to store thumbnail",
        }
    }

    /// Log the full cause and convert into the client-facing error.
    pub fn into_app_error(self, policy: StatusPolicy) -> AppError {
        let status = self.status(policy);
        tracing::warn!(status = status.as_u16(), error = %self, "thumbnail upload rejected");
        AppError::new(status, self.public_message())
    }
}

impl From<StorageError> for UploadError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::UnknownMediaType(media_type) => UploadError::UnknownMediaType(media_type),
            StorageError::Io(err) => UploadError::Io(err),
        }
    }
}
