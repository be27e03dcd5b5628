//! Error types for the sanitization library.
//!
//! This module defines all error types that can occur while opening,
//! inspecting, and cleaning documents.

/// Result type alias for sanitization operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur during document processing.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Input bytes are not a readable container (bad magic, truncated
    /// archive, undecompressable member, unparseable PDF skeleton).
    #[error("Invalid container: {0}")]
    InvalidContainer(String),

    /// Format is not one of docx, pptx, xlsx, pdf.
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// A single part failed to parse. Recovered locally: the part is
    /// logged and skipped, the pipeline continues.
    #[error("Failed to parse part '{part}': {reason}")]
    PartParse {
        /// Archive path or PDF object label of the failing part
        part: String,
        /// Reason for the parse failure
        reason: String,
    },

    /// A part path was requested that does not exist in the container.
    #[error("Missing part: {0}")]
    MissingPart(String),

    /// The remote LLM stayed unavailable after all retries.
    #[error("Remote service unavailable: {0}")]
    RemoteUnavailable(String),

    /// Cooperative cancellation.
    #[error("Request cancelled")]
    Cancelled,

    /// A programming invariant was violated.
    #[error("Internal error: {0}")]
    Internal(String),

    /// Feature not supported by this build.
    #[error("Unsupported feature: {0}")]
    Unsupported(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// ZIP archive error
    #[error("Archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// XML parse error
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// UTF-8 decoding error
    #[error("UTF-8 decoding error: {0}")]
    Utf8Error(#[from] std::str::Utf8Error),
}

impl Error {
    /// Build a `PartParse` error for `part` with the given reason.
    pub fn part_parse(part: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Error::PartParse {
            part: part.into(),
            reason: reason.to_string(),
        }
    }
}
