//! Error types for the HTTP client facade.
//!
//! # Design
//! Every failure is a value the caller receives; the client never retries and
//! never logs on the caller's behalf. `Status` and `Decode` keep the response
//! body so the caller can still inspect what the server sent.

use std::path::PathBuf;

use thiserror::Error;

/// Errors returned by `Client` operations.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The descriptor could not be turned into a request (bad URL, body that
    /// does not serialize).
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Connection, DNS, TLS or mid-transfer I/O failure.
    #[error("network error: {0}")]
    Network(String),

    #[error("request timed out")]
    Timeout,

    /// Status code outside the accepted range. Only produced when validation
    /// is enabled.
    #[error("unacceptable status code {status}")]
    Status { status: u16, body: Vec<u8> },

    /// The response body is larger than the client's `max_body_size`.
    #[error("response body exceeds the {limit} byte limit")]
    BodyTooLarge { limit: u64 },

    /// The body does not parse as the requested shape.
    #[error("decode failed: {message}")]
    Decode { message: String, body: Vec<u8> },

    /// Reading an upload source or writing a download destination failed.
    #[error("filesystem error at {}: {source}", .path.display())]
    FileSystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The worker running the request panicked or was cancelled.
    #[error("request aborted: {0}")]
    Aborted(String),
}

/// Coarse classification of a `ClientError`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidRequest,
    Network,
    Timeout,
    Status,
    BodyTooLarge,
    Decode,
    FileSystem,
    Aborted,
}

impl ClientError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ClientError::InvalidRequest(_) => ErrorKind::InvalidRequest,
            ClientError::Network(_) => ErrorKind::Network,
            ClientError::Timeout => ErrorKind::Timeout,
            ClientError::Status { .. } => ErrorKind::Status,
            ClientError::BodyTooLarge { .. } => ErrorKind::BodyTooLarge,
            ClientError::Decode { .. } => ErrorKind::Decode,
            ClientError::FileSystem { .. } => ErrorKind::FileSystem,
            ClientError::Aborted(_) => ErrorKind::Aborted,
        }
    }

    /// Body bytes the server sent before the failure was classified, if any.
    pub fn partial_body(&self) -> Option<&[u8]> {
        match self {
            ClientError::Status { body, .. } | ClientError::Decode { body, .. } => Some(body),
            _ => None,
        }
    }

    pub(crate) fn fs(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ClientError::FileSystem {
            path: path.into(),
            source,
        }
    }
}
