//! Byte-stream halves used by the request reader and response writer.
//!
//! - [`Inbound`] wraps the read half: `read_chunk` hands out bytes in arrival
//!   order and `push_back` returns bytes to the front of the unread stream.
//! - [`Outbound`] wraps the write half: `write_bytes`, `write_parts` and
//!   `close_for_writing`.
//!
//! Both are generic over tokio's I/O traits, so a TCP socket, a Unix socket
//! or an in-memory `tokio::io::duplex` pipe all work the same way.

use std::io::IoSlice;

use bytes::{Bytes, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::{HttpError, Result};

/// Default size of a single read from the underlying stream (16KB).
pub const DEFAULT_READ_BUFFER_SIZE: usize = 16 * 1024;

/// Type-erased read half handed to handlers.
pub type BoxedReader = Box<dyn AsyncRead + Send + Sync + Unpin>;

/// Type-erased write half handed to handlers.
pub type BoxedWriter = Box<dyn AsyncWrite + Send + Sync + Unpin>;

/// Read half of a connection with push-back support.
pub struct Inbound<R> {
    reader: R,
    /// Bytes returned via `push_back`, served before the reader is polled.
    unread: BytesMut,
    read_size: usize,
}

impl<R: AsyncRead + Unpin> Inbound<R> {
    /// Wrap a reader with the default read size.
    pub fn new(reader: R) -> Self {
        Self::with_read_size(reader, DEFAULT_READ_BUFFER_SIZE)
    }

    /// Wrap a reader with a custom read size.
    pub fn with_read_size(reader: R, read_size: usize) -> Self {
        Self {
            reader,
            unread: BytesMut::new(),
            read_size: read_size.max(1),
        }
    }

    /// Read the next chunk of bytes.
    ///
    /// Pushed-back bytes are returned first, in one chunk. Otherwise waits
    /// for one read from the underlying stream.
    ///
    /// # Returns
    ///
    /// `None` once the peer has closed its side of the stream.
    pub async fn read_chunk(&mut self) -> Result<Option<Bytes>> {
        if !self.unread.is_empty() {
            return Ok(Some(self.unread.split().freeze()));
        }

        let mut buf = BytesMut::with_capacity(self.read_size);
        let n = self.reader.read_buf(&mut buf).await?;
        if n == 0 {
            return Ok(None);
        }

        Ok(Some(buf.freeze()))
    }

    /// Return bytes to the front of the unread stream.
    ///
    /// They are observed by the next `read_chunk`, ahead of anything already
    /// pushed back and anything the reader has not delivered yet.
    pub fn push_back(&mut self, bytes: Bytes) {
        if bytes.is_empty() {
            return;
        }

        if self.unread.is_empty() {
            self.unread.extend_from_slice(&bytes);
            return;
        }

        let mut merged = BytesMut::with_capacity(bytes.len() + self.unread.len());
        merged.extend_from_slice(&bytes);
        merged.extend_from_slice(&self.unread);
        self.unread = merged;
    }

    /// Number of pushed-back bytes not yet read.
    pub fn unread_len(&self) -> usize {
        self.unread.len()
    }

    /// Get a reference to the underlying reader.
    pub fn get_ref(&self) -> &R {
        &self.reader
    }

    /// Unwrap into the underlying reader, dropping any pushed-back bytes.
    pub fn into_inner(self) -> R {
        self.reader
    }
}

impl<R: AsyncRead + Send + Sync + Unpin + 'static> Inbound<R> {
    /// Erase the reader type, keeping pushed-back bytes.
    pub fn boxed(self) -> Inbound<BoxedReader> {
        Inbound {
            reader: Box::new(self.reader),
            unread: self.unread,
            read_size: self.read_size,
        }
    }
}

/// Write half of a connection.
pub struct Outbound<W> {
    writer: W,
    closed: bool,
}

impl<W: AsyncWrite + Unpin> Outbound<W> {
    /// Wrap a writer.
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            closed: false,
        }
    }

    /// Send bytes to the peer, waiting for the stream to accept all of them.
    pub async fn write_bytes(&mut self, data: &[u8]) -> Result<()> {
        if self.closed {
            return Err(HttpError::ConnectionClosed);
        }

        self.writer.write_all(data).await?;
        Ok(())
    }

    /// Send several buffers back to back using vectored writes.
    ///
    /// Continues after partial writes until every byte has been accepted.
    pub async fn write_parts(&mut self, parts: &[&[u8]]) -> Result<()> {
        if self.closed {
            return Err(HttpError::ConnectionClosed);
        }

        let total_size: usize = parts.iter().map(|p| p.len()).sum();
        let mut total_written = 0;

        while total_written < total_size {
            let slices = build_remaining_slices(parts, total_written);
            let written = self.writer.write_vectored(&slices).await?;
            if written == 0 {
                return Err(HttpError::Io(std::io::Error::new(
                    std::io::ErrorKind::WriteZero,
                    "write_vectored returned 0",
                )));
            }
            total_written += written;
        }

        Ok(())
    }

    /// Flush and shut down the write side. Idempotent.
    pub async fn close_for_writing(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }

        self.closed = true;
        self.writer.flush().await?;
        self.writer.shutdown().await?;
        Ok(())
    }
}

impl<W> Outbound<W> {
    /// Check whether `close_for_writing` has been called.
    #[inline]
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Get a reference to the underlying writer.
    pub fn get_ref(&self) -> &W {
        &self.writer
    }

    /// Unwrap into the underlying writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

/// Build IoSlice array for the data left after `skip_bytes` were written.
fn build_remaining_slices<'a>(parts: &[&'a [u8]], skip_bytes: usize) -> Vec<IoSlice<'a>> {
    let mut slices = Vec::with_capacity(parts.len());
    let mut skipped = 0;

    for part in parts {
        let start = skipped;
        let end = skipped + part.len();

        if skip_bytes < end {
            let start_in_part = skip_bytes.saturating_sub(start);
            slices.push(IoSlice::new(&part[start_in_part..]));
        }
        skipped = end;
    }

    slices
}
