use rapidl_blob::BlobError;

#[derive(Debug, thiserror::Error)]
pub enum ContentError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("payload schema mismatch at {path}: {message}")]
    InvalidPayload { path: String, message: String },

    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),

    #[error("invalid label position (depth {depth}, level {level}): both must be non-negative")]
    InvalidLabelPosition { depth: i64, level: i64 },

    #[error("blob error: {0}")]
    Blob(#[from] BlobError),

    #[error("invalid job id: {0}")]
    InvalidJobId(#[from] rapidl_types::TextError),
}

impl ContentError {
    /// True for failures of the blob itself (decode, decompress, deserialise, malformed).
    ///
    /// These are terminal for the fetched bytes and must never be retried with the same
    /// payload.
    pub fn is_blob_failure(&self) -> bool {
        matches!(self, ContentError::Blob(_))
    }
}

pub type ContentResult<T> = std::result::Result<T, ContentError>;
