use std::io;

use thiserror::Error;

use crate::config::ECCLevel;

/// Everything that can go wrong while encoding, rendering or saving a symbol.
#[derive(Debug, Error)]
pub enum QrError {
    /// Empty data, a version outside 1..=40, a zero module size, or an image
    /// too large to address.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("{len} bytes of data do not fit in any QR version at error correction level {level:?}")]
    CapacityExceeded { len: usize, level: ECCLevel },

    /// Only produced by the strict color parser; the lenient one falls back
    /// to black.
    #[error("unrecognized color: {0:?}")]
    InvalidColor(String),

    #[error("failed to write image: {0}")]
    Io(#[from] io::Error),

    #[error("failed to encode image: {0}")]
    Image(image::ImageError),
}

impl From<image::ImageError> for QrError {
    fn from(err: image::ImageError) -> Self {
        match err {
            image::ImageError::IoError(io_err) => QrError::Io(io_err),
            other => QrError::Image(other),
        }
    }
}

impl QrError {
    pub(crate) fn invalid_input(msg: impl Into<String>) -> Self {
        QrError::InvalidInput(msg.into())
    }
}
