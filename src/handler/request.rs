//! Request descriptor passed to handlers.
//!
//! Carries the decoded request head plus the read half of the connection,
//! so a handler can pull the body after the headers.
//!
//! # Example
//!
//! ```ignore
//! async fn upload(mut req: Request, mut res: ResponseWriter) -> HandlerResult {
//!     let body = req.read_body().await?;
//!     res.set_header("content-type", "text/plain");
//!     res.end(Some(format!("{} bytes", body.len()).as_bytes())).await
//! }
//! ```

use bytes::{Bytes, BytesMut};
use tokio::io::AsyncRead;

use crate::error::{HttpError, Result};
use crate::protocol::{names, HeaderMap, RequestHead};
use crate::transport::{BoxedReader, Inbound, DEFAULT_READ_BUFFER_SIZE};

/// One parsed request and the stream its body arrives on.
pub struct Request<R = BoxedReader> {
    head: RequestHead,
    stream: Inbound<R>,
}

impl<R> Request<R> {
    /// Method, e.g. `GET`.
    #[inline]
    pub fn method(&self) -> &str {
        self.head.method()
    }

    /// Raw request target, including the query string.
    #[inline]
    pub fn url(&self) -> &str {
        self.head.target()
    }

    /// Target up to the first `?`.
    pub fn path(&self) -> &str {
        let url = self.url();
        url.split_once('?').map_or(url, |(path, _)| path)
    }

    /// Target after the first `?`, if any.
    pub fn query(&self) -> Option<&str> {
        self.url().split_once('?').map(|(_, query)| query)
    }

    /// Protocol version, e.g. `1.1`.
    #[inline]
    pub fn http_version(&self) -> &str {
        self.head.protocol_version()
    }

    /// All request headers, keyed by lower-cased name.
    #[inline]
    pub fn headers(&self) -> &HeaderMap {
        self.head.headers()
    }

    /// Look up a single header (any case).
    #[inline]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.head.headers().get(name)
    }

    /// Parsed `content-length`, if present and numeric.
    pub fn content_length(&self) -> Option<usize> {
        self.header(names::CONTENT_LENGTH)?.parse().ok()
    }

    /// The decoded request head.
    #[inline]
    pub fn head(&self) -> &RequestHead {
        &self.head
    }
}

impl<R: AsyncRead + Unpin> Request<R> {
    /// Create a request from a parsed head and the stream positioned at the body.
    pub fn new(head: RequestHead, stream: Inbound<R>) -> Self {
        Self { head, stream }
    }

    /// Read the next chunk of body bytes; `None` at end of stream.
    ///
    /// Bytes that arrived together with the headers come first.
    pub async fn read_chunk(&mut self) -> Result<Option<Bytes>> {
        self.stream.read_chunk().await
    }

    /// Read exactly `content-length` body bytes (empty if the header is absent).
    ///
    /// Anything past the declared length is left on the stream.
    ///
    /// # Errors
    ///
    /// Returns `IncompleteBody` if the stream ends first.
    pub async fn read_body(&mut self) -> Result<Bytes> {
        let expected = self.content_length().unwrap_or(0);
        // The declared length is client input; grow as bytes actually arrive.
        let mut body = BytesMut::with_capacity(expected.min(DEFAULT_READ_BUFFER_SIZE));

        while body.len() < expected {
            let Some(mut chunk) = self.stream.read_chunk().await? else {
                return Err(HttpError::IncompleteBody {
                    expected,
                    received: body.len(),
                });
            };

            let wanted = expected - body.len();
            if chunk.len() > wanted {
                let rest = chunk.split_off(wanted);
                self.stream.push_back(rest);
            }
            body.extend_from_slice(&chunk);
        }

        Ok(body.freeze())
    }

    /// Split into the head and the body stream.
    pub fn into_parts(self) -> (RequestHead, Inbound<R>) {
        (self.head, self.stream)
    }
}
