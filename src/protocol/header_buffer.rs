//! Header buffer for accumulating partial reads.
//!
//! Uses `bytes::BytesMut` so the bytes read past the end of the header
//! section can be handed off without copying.
//!
//! # Example
//!
//! ```ignore
//! use httpwire::protocol::HeaderBuffer;
//!
//! let mut buffer = HeaderBuffer::new();
//!
//! assert!(buffer.push(b"GET / HTTP/1.1\r\nHost: a\r").unwrap().is_none());
//! let head = buffer.push(b"\n\r\nbody").unwrap().unwrap();
//!
//! assert_eq!(head.text, "GET / HTTP/1.1\r\nHost: a");
//! assert_eq!(&head.leftover[..], b"body");
//! ```

use bytes::{Bytes, BytesMut};

use super::wire_format::{find_header_end, DEFAULT_MAX_HEADER_SIZE, HEADER_TERMINATOR};
use crate::error::{HttpError, Result};

/// A complete header section split off the front of the stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawHead {
    /// Bytes before `\r\n\r\n`, decoded as text.
    pub text: String,
    /// Bytes that arrived after `\r\n\r\n`.
    pub leftover: Bytes,
}

/// Buffer for accumulating incoming bytes until the header section ends.
pub struct HeaderBuffer {
    /// Accumulated bytes, in arrival order.
    buffer: BytesMut,
    /// Maximum allowed size of an unterminated header section.
    max_header_size: usize,
}

impl HeaderBuffer {
    /// Create a new header buffer with default settings.
    ///
    /// Default capacity: 8KB, max header size: 64KB.
    pub fn new() -> Self {
        Self::with_max_header_size(DEFAULT_MAX_HEADER_SIZE)
    }

    /// Create a new header buffer with a custom header size limit.
    pub fn with_max_header_size(max_header_size: usize) -> Self {
        Self {
            buffer: BytesMut::with_capacity(8 * 1024),
            max_header_size,
        }
    }

    /// Push data into the buffer and try to split off the header section.
    ///
    /// The whole accumulated buffer is rescanned after every push: the
    /// terminator may straddle the boundary between two reads.
    ///
    /// # Returns
    ///
    /// `Some(RawHead)` once `\r\n\r\n` has been seen; the buffer is empty
    /// afterwards. `None` if more data is needed.
    ///
    /// # Errors
    ///
    /// Returns `HeaderTooLarge` if the buffer outgrows the limit before the
    /// terminator arrives.
    pub fn push(&mut self, data: &[u8]) -> Result<Option<RawHead>> {
        self.buffer.extend_from_slice(data);

        let Some(marker) = find_header_end(&self.buffer) else {
            if self.buffer.len() > self.max_header_size {
                return Err(HttpError::HeaderTooLarge(self.max_header_size));
            }
            return Ok(None);
        };

        let head = self.buffer.split_to(marker);
        let _ = self.buffer.split_to(HEADER_TERMINATOR.len());
        let leftover = self.buffer.split().freeze();

        Ok(Some(RawHead {
            text: String::from_utf8_lossy(&head).into_owned(),
            leftover,
        }))
    }

    /// Get the number of buffered bytes.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Check if the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}

impl Default for HeaderBuffer {
    fn default() -> Self {
        Self::new()
    }
}
