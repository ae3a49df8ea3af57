//! Error types for patch operations

use thiserror::Error;

/// Result type alias for patch operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for patch operations
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error reading or writing an artifact
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The source image is not the one the patch was built against
    #[error("Source image does not match the patch baseline: expected MD5 {expected}, got {actual}")]
    SourceMismatch {
        /// Recorded source checksum(s), hex encoded
        expected: String,
        /// Checksum of the supplied image, hex encoded
        actual: String,
    },

    /// Replaying the control stream produced the wrong number of bytes
    #[error("Patch produced {actual} bytes, expected {expected}")]
    TruncatedPatch {
        /// Recorded target length
        expected: usize,
        /// Length produced (or about to be produced) by the replay
        actual: usize,
    },

    /// The patched image does not match the recorded target checksum
    #[error("Patched image MD5 mismatch: expected {expected}, got {actual}")]
    TargetMismatch {
        /// Recorded target checksum, hex encoded
        expected: String,
        /// Checksum of the produced image, hex encoded
        actual: String,
    },

    /// The artifact envelope or one of its blocks is damaged
    #[error("Malformed patch: {0}")]
    MalformedPatch(String),

    /// The artifact was written by an unknown format revision
    #[error("Unsupported patch format version: {0}")]
    UnsupportedVersion(u16),

    /// An input exceeds the 32-bit length fields of the artifact
    #[error("Input of {0} bytes is too large to diff")]
    InputTooLarge(usize),
}

impl Error {
    /// Create a new MalformedPatch error
    pub fn malformed<S: Into<String>>(msg: S) -> Self {
        Error::MalformedPatch(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::SourceMismatch {
            expected: "aa".into(),
            actual: "bb".into(),
        };
        assert_eq!(
            err.to_string(),
            "Source image does not match the patch baseline: expected MD5 aa, got bb"
        );

        let err = Error::TruncatedPatch {
            expected: 10,
            actual: 8,
        };
        assert_eq!(err.to_string(), "Patch produced 8 bytes, expected 10");
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        assert!(matches!(Error::from(io), Error::Io(_)));
    }
}
