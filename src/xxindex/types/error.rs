//! Custom error types for the xxindex crate.

use thiserror::Error;

/// The primary error type for all operations in this crate.
#[derive(Debug, Error)]
pub enum XxIndexError {
    /// An error originating from I/O operations on the byte source.
    #[error("I/O error: {0:?}")]
    Io(#[from] std::io::Error),

    /// A closing tag did not match the element on top of the tag stack.
    ///
    /// Every offset recorded after this point would be wrong, so the build is aborted.
    #[error("Tag name mismatch at byte {offset} (line {line}): found '{found}' but '{expected}' is open (stack: {open_stack})")]
    TagMismatch {
        found: String,
        expected: String,
        offset: u64,
        line: u64,
        open_stack: String,
    },

    /// A closing tag was found while no element was open.
    #[error("Unexpected closing tag '{found}' at byte {offset} (line {line}): no element is open")]
    UnexpectedClosingTag { found: String, offset: u64, line: u64 },

    /// A start or closing tag without a name, such as `<>` or `</ a>`.
    #[error("Empty tag name at byte {offset} (line {line})")]
    EmptyTagName { offset: u64, line: u64 },

    /// The configured or detected charset name is not a known encoding label.
    #[error("Unknown character encoding: {0}")]
    UnknownEncoding(String),

    /// The requested range cannot be held in memory on this platform.
    #[error("Byte range [{start}, {stop}) is too large to read at once")]
    RangeTooLarge { start: u64, stop: u64 },

    /// The requested range ends before it starts.
    #[error("Invalid byte range: stop {stop} is before start {start}")]
    InvalidRange { start: u64, stop: u64 },

    /// A compressed-format source was requested over data in another format.
    #[error("Source format mismatch: {0}")]
    SourceFormatMismatch(String),

    /// A non-seekable source ended before the requested start offset.
    #[error("Could not position at byte {requested}: source ended after {reached} bytes")]
    PositionUnreachable { requested: u64, reached: u64 },

    /// A mutex lock was poisoned, indicating a panic in another thread holding the lock.
    #[error("A mutex lock was poisoned, indicating a panic in another thread holding the lock.")]
    LockPoisoned,
}

impl XxIndexError {
    /// Returns `true` for the errors that mean the tag stack became inconsistent.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            XxIndexError::TagMismatch { .. }
                | XxIndexError::UnexpectedClosingTag { .. }
                | XxIndexError::EmptyTagName { .. }
        )
    }
}

/// A convenience `Result` type alias using the crate's `XxIndexError` type.
pub type Result<T> = std::result::Result<T, XxIndexError>;
