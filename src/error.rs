//! Error types for httpwire.

use thiserror::Error;

/// Main error type for all request parsing and response writing operations.
#[derive(Debug, Error)]
pub enum HttpError {
    /// I/O error on the underlying stream.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error (response bodies only).
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Stream ended before the header terminator was found.
    #[error("Incomplete request: stream ended before end of headers")]
    IncompleteRequest,

    /// Request line did not contain method, target and protocol.
    #[error("Malformed request line: {0:?}")]
    MalformedRequestLine(String),

    /// Header section grew past the configured limit without terminating.
    #[error("Request header section exceeds {0} bytes")]
    HeaderTooLarge(usize),

    /// Header section did not arrive within the configured timeout.
    #[error("Timed out waiting for request headers")]
    HeaderTimeout,

    /// Stream ended before `content-length` body bytes were read.
    #[error("Incomplete body: expected {expected} bytes, received {received}")]
    IncompleteBody { expected: usize, received: usize },

    /// `json()` was called after the status line and headers went out.
    #[error("Headers sent, cannot proceed to send JSON")]
    HeadersAlreadySent,

    /// Write attempted after the stream was closed for writing.
    #[error("Connection closed")]
    ConnectionClosed,
}

/// Result type alias using HttpError.
pub type Result<T> = std::result::Result<T, HttpError>;
