//! Error types for serialized-file decoding

use thiserror::Error;

/// Result type for decoding operations
pub type Result<T> = std::result::Result<T, AssetError>;

/// Errors raised while decoding serialized files and their type metadata.
///
/// Every variant here is fatal for the file being processed, never for the
/// whole run. Conditions the decoder tolerates by design (a class id with no
/// type tree, a dangling cross-file pointer, a duplicate bundle name) are not
/// errors at all: they are skipped or counted by the dependency layer.
#[derive(Error, Debug)]
pub enum AssetError {
    /// I/O errors from the underlying source
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The stream ended before a fixed-size read could complete
    #[error("truncated input: needed {expected} bytes, {remaining} remaining")]
    TruncatedInput { expected: usize, remaining: usize },

    /// A null-terminated string ran past the end of the stream
    #[error("unterminated string starting at offset {offset}")]
    UnterminatedString { offset: u64 },

    /// The type-metadata section of a file could not be decoded. The file is
    /// unreadable without its schemas, so this aborts the file.
    #[error("corrupt type metadata: {context}")]
    CorruptMetadata {
        context: String,
        #[source]
        source: Box<AssetError>,
    },

    /// Structurally invalid data (bad UTF-8, impossible sizes, malformed schema)
    #[error("invalid data: {0}")]
    InvalidData(String),

    /// Report serialization failure
    #[error("report serialization failed: {0}")]
    Report(#[from] serde_json::Error),
}

impl AssetError {
    /// Create a truncated-input error
    pub fn truncated(expected: usize, remaining: usize) -> Self {
        Self::TruncatedInput {
            expected,
            remaining,
        }
    }

    /// Create an invalid-data error
    pub fn invalid_data<S: Into<String>>(msg: S) -> Self {
        Self::InvalidData(msg.into())
    }

    /// Wrap a lower-level failure as a corrupt-metadata error
    pub fn corrupt_metadata<S: Into<String>>(context: S, source: AssetError) -> Self {
        Self::CorruptMetadata {
            context: context.into(),
            source: Box::new(source),
        }
    }
}

impl From<std::string::FromUtf8Error> for AssetError {
    fn from(err: std::string::FromUtf8Error) -> Self {
        Self::invalid_data(format!("invalid UTF-8 string: {}", err))
    }
}

impl From<std::str::Utf8Error> for AssetError {
    fn from(err: std::str::Utf8Error) -> Self {
        Self::invalid_data(format!("invalid UTF-8 string: {}", err))
    }
}
