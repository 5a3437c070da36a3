use rapidl_core::ContentError;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("invalid backend url {url}: {reason}")]
    InvalidBackendUrl { url: String, reason: String },

    #[error("request to backend failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("backend responded with status {status}")]
    Status { status: u16 },

    #[error(transparent)]
    Content(#[from] ContentError),
}

impl ClientError {
    /// True for transport failures that may succeed on a later attempt.
    ///
    /// Anything wrong with the returned bytes (schema, blob, timestamps) is terminal.
    pub fn is_retryable(&self) -> bool {
        match self {
            ClientError::Http(_) => true,
            ClientError::Status { status } => *status >= 500,
            ClientError::InvalidBackendUrl { .. } | ClientError::Content(_) => false,
        }
    }

    /// True when the backend could not be reached or answered with a server error.
    pub fn is_upstream_failure(&self) -> bool {
        matches!(self, ClientError::Http(_) | ClientError::Status { .. })
    }
}

pub type ClientResult<T> = std::result::Result<T, ClientError>;
