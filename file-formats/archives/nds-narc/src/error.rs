//! Error types for archive operations

use thiserror::Error;

/// Result type alias for archive operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for archive operations
#[derive(Error, Debug)]
pub enum Error {
    /// The archive or name table does not parse
    #[error("Malformed container: {0}")]
    MalformedContainer(String),

    /// Entry index past the end of the allocation table
    #[error("Entry index {index} out of range (archive has {count} entries)")]
    IndexOutOfRange {
        /// Requested index
        index: usize,
        /// Entries in the archive
        count: usize,
    },

    /// No entry carries the requested name
    #[error("Entry not found: {0}")]
    EntryNotFound(String),

    /// An entry name cannot be stored in a name table
    #[error("Invalid entry name: {0}")]
    InvalidName(String),

    /// The archive would not fit the 32-bit length fields
    #[error("Container too large: {0}")]
    TooLarge(String),
}

impl Error {
    /// Create a new MalformedContainer error
    pub fn malformed<S: Into<String>>(msg: S) -> Self {
        Error::MalformedContainer(msg.into())
    }

    /// Create a new InvalidName error
    pub fn invalid_name<S: Into<String>>(msg: S) -> Self {
        Error::InvalidName(msg.into())
    }
}
