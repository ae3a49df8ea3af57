//! Error types for cartridge image operations

use std::io;
use thiserror::Error;

/// Result type alias for cartridge image operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for cartridge image operations
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error while loading or saving an image
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The cartridge header or filesystem tables are invalid
    #[error("Invalid ROM: {0}")]
    InvalidRom(String),

    /// A write does not fit the entry it targets
    #[error(
        "Write of {len} bytes at offset {offset} exceeds {path} ({available} bytes available)"
    )]
    OutOfRange {
        /// Asset path or marker description
        path: String,
        /// Offset of the write within the entry
        offset: usize,
        /// Number of bytes written
        len: usize,
        /// Bytes available from the start of the entry
        available: usize,
    },

    /// A path segment names nothing in the image
    #[error("Path not found: {0}")]
    PathNotFound(String),

    /// A path segment descends into something that is not a container
    #[error("Not a container: {0}")]
    NotAContainer(String),

    /// The target entry is only reachable through a compressed layer
    #[error("Entry {0} sits behind a compressed layer and cannot be written in place")]
    CompressedLayer(String),

    /// The marker does not occur in the image
    #[error("Marker not found: {0}")]
    MarkerNotFound(String),

    /// An asset path does not parse
    #[error("Invalid asset path: {0}")]
    InvalidPath(String),

    /// A field value does not match its encoding
    #[error("Invalid field: {0}")]
    InvalidField(String),

    /// Error from the archive layer
    #[error(transparent)]
    Container(#[from] nds_narc::Error),

    /// Error from the compression layer
    #[error(transparent)]
    Codec(#[from] nds_lz::Error),
}

impl Error {
    /// Create a new InvalidRom error
    pub fn invalid_rom<S: Into<String>>(msg: S) -> Self {
        Error::InvalidRom(msg.into())
    }

    /// Create a new InvalidField error
    pub fn invalid_field<S: Into<String>>(msg: S) -> Self {
        Error::InvalidField(msg.into())
    }

    /// Check if this error reports a write past the end of an entry
    pub fn is_out_of_range(&self) -> bool {
        matches!(self, Error::OutOfRange { .. })
    }
}
