//! Error types for the LZ codec

use thiserror::Error;

/// Result type alias for codec operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for codec operations
#[derive(Error, Debug)]
pub enum Error {
    /// The block cannot be decoded consistently with its declared length
    #[error("Corrupt compressed data: {0}")]
    CorruptData(String),

    /// The block header carries a tag this codec does not implement
    #[error("Unsupported compression format: tag 0x{0:02X}")]
    UnsupportedFormat(u8),

    /// The payload does not fit the 32-bit length field
    #[error("Payload too large to compress: {0} bytes")]
    PayloadTooLarge(usize),
}

impl Error {
    /// Create a new CorruptData error
    pub fn corrupt<S: Into<String>>(msg: S) -> Self {
        Error::CorruptData(msg.into())
    }

    /// Check if this error indicates damaged input rather than a caller mistake
    pub fn is_corruption(&self) -> bool {
        matches!(self, Error::CorruptData(_) | Error::UnsupportedFormat(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = Error::corrupt("input exhausted");
        assert_eq!(err.to_string(), "Corrupt compressed data: input exhausted");

        let err = Error::UnsupportedFormat(0x24);
        assert_eq!(err.to_string(), "Unsupported compression format: tag 0x24");
    }

    #[test]
    fn test_error_classification() {
        assert!(Error::corrupt("x").is_corruption());
        assert!(Error::UnsupportedFormat(0x30).is_corruption());
        assert!(!Error::PayloadTooLarge(usize::MAX).is_corruption());
    }
}
