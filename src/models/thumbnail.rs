//! An uploaded thumbnail payload.

use bytes::Bytes;

/// Raw thumbnail bytes together with the media type the client declared for them.
///
/// The media type is taken from the multipart part headers and is not verified
/// against the payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Thumbnail {
    pub media_type: String,
    pub data: Bytes,
}

impl Thumbnail {
    pub fn new(media_type: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            media_type: media_type.into(),
            data: data.into(),
        }
    }
}
