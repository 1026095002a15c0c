use std::time::Duration;

/// Coarse classification of a [`NetError`].
///
/// Callers that only care about *what kind* of failure happened (for instance to
/// decide whether a retry makes sense) should match on this instead of the full error.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The URL string could not be parsed.
    InvalidUrl,
    /// The request body could not be serialized.
    Serialization,
    /// Network or connection failure (including rejected pinning).
    Transport,
    /// The response body is not text in any supported encoding.
    Decode,
    /// No completion within the configured window.
    Timeout,
    /// The caller cancelled the request.
    Cancelled,
}

#[derive(Debug, thiserror::Error)]
pub enum NetError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Certificate pinning failed: {0}")]
    PinningMismatch(String),

    #[error("Decoding error: {0}")]
    Decode(String),

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Request cancelled")]
    Cancelled,
}

impl NetError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            NetError::InvalidUrl(_) => ErrorKind::InvalidUrl,
            NetError::Serialization(_) => ErrorKind::Serialization,
            NetError::Transport(_) | NetError::PinningMismatch(_) => ErrorKind::Transport,
            NetError::Decode(_) => ErrorKind::Decode,
            NetError::Timeout(_) => ErrorKind::Timeout,
            NetError::Cancelled => ErrorKind::Cancelled,
        }
    }

    /// Returns true for failures the adapter reports through the logger.
    pub fn is_diagnosed(&self) -> bool {
        matches!(self.kind(), ErrorKind::Transport | ErrorKind::Timeout)
    }
}

impl From<reqwest::Error> for NetError {
    fn from(e: reqwest::Error) -> Self {
        NetError::Transport(e.to_string())
    }
}

impl From<serde_json::Error> for NetError {
    fn from(e: serde_json::Error) -> Self {
        NetError::Serialization(e.to_string())
    }
}
