//! Error types for the resize pipeline.

use thiserror::Error;

/// Errors that can occur while decoding, carving, or encoding an image.
#[derive(Debug, Error)]
pub enum Error {
    /// The requested options are contradictory or out of range.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The input bytes could not be decoded as a supported image.
    #[error("failed to decode image: {0}")]
    Decode(String),

    /// The resized image could not be encoded.
    #[error("failed to encode image: {0}")]
    Encode(String),

    /// The destination extension is not one of jpg/jpeg/png/bmp/gif.
    #[error("unsupported output format: {0}")]
    UnsupportedFormat(String),

    /// The carving loop hit a degenerate buffer or a broken invariant.
    #[error("carve failed: {0}")]
    Carve(String),

    /// Cancellation was requested and observed at an iteration boundary.
    #[error("operation cancelled")]
    Cancelled,

    /// Reading the source or writing the destination failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Process exit code for a command-line front end: 1 invalid arguments,
    /// 2 I/O error, 3 decode error, 4 carve error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::UnsupportedFormat(_) => 1,
            Error::Io(_) | Error::Encode(_) => 2,
            Error::Decode(_) => 3,
            Error::InvalidRequest(_) | Error::Carve(_) | Error::Cancelled => 4,
        }
    }
}
