use thiserror::Error;

/// Errors reported by a collaborator (accounting API, document exchange,
/// currency-rate source).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ClientError {
    /// The requested record does not exist. A normal signal to create it.
    #[error("not found: {0}")]
    NotFound(String),

    /// The remote side answered with a non-success response.
    #[error("remote error: {0}")]
    Remote(String),

    /// The request never completed (connection, timeout).
    #[error("transport error: {0}")]
    Transport(String),

    /// The response body could not be decoded.
    #[error("decode error: {0}")]
    Decode(String),
}

impl ClientError {
    /// Whether this is the "record does not exist" signal.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// Errors that abort the processing of a single document or run.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SyncError {
    /// A collaborator call failed.
    #[error(transparent)]
    Client(#[from] ClientError),

    /// A trade document could not be read or written.
    #[error("document error: {0}")]
    Document(String),

    /// Settings are missing or malformed.
    #[error("configuration error: {0}")]
    Config(String),

    /// Local file access failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A single settings validation error with field path and message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dot-separated path to the invalid field (e.g. "ledger.access_token").
    pub field: String,
    /// Human-readable error description.
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}
