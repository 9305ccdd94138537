//! Response writer - status line, headers and body framing.
//!
//! Headers are held back until the first body byte or until the response is
//! finished, which lets the writer pick the framing on its own:
//!
//! ```text
//! end(body)               ─► content-length: len(body), raw body
//! write(a); write(b); end ─► transfer-encoding: chunked, <hex>\r\n a \r\n ... 0\r\n\r\n
//! set content-length; write(a); end ─► raw bytes, caller owns the length
//! ```
//!
//! # States
//!
//! ```text
//! Initial ─► HeadersPending ─► HeadersSent ─► Closed
//! ```
//!
//! Status and headers can only change before `HeadersSent`; later changes are
//! ignored. `json()` is the one operation that fails once headers are out.

use bytes::{BufMut, BytesMut};
use serde::Serialize;
use tokio::io::AsyncWrite;

use crate::error::{HttpError, Result};
use crate::protocol::{
    encode_chunk_size, encode_status_line, http_date_now, names, reason_phrase, HeaderMap, CRLF,
    DEFAULT_SERVER_NAME, JSON_CONTENT_TYPE, LAST_CHUNK,
};
use crate::transport::{BoxedWriter, Outbound};

/// Lifecycle of a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriterState {
    /// Nothing changed yet.
    Initial,
    /// Status or headers changed, nothing written.
    HeadersPending,
    /// Status line and headers are on the wire.
    HeadersSent,
    /// Body finished and the stream closed for writing.
    Closed,
}

/// Writes one HTTP/1.1 response onto the write half of a connection.
pub struct ResponseWriter<W = BoxedWriter> {
    out: Outbound<W>,
    status: u16,
    status_text: String,
    headers: HeaderMap,
    state: WriterState,
    chunked: bool,
}

impl<W: AsyncWrite + Unpin> ResponseWriter<W> {
    /// Create a writer with the default `server` header.
    pub fn new(writer: W) -> Self {
        Self::with_server_name(writer, DEFAULT_SERVER_NAME)
    }

    /// Create a writer announcing `server_name` in the `server` header.
    pub fn with_server_name(writer: W, server_name: &str) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(names::SERVER, server_name);

        Self {
            out: Outbound::new(writer),
            status: 200,
            status_text: "OK".to_string(),
            headers,
            state: WriterState::Initial,
            chunked: false,
        }
    }

    /// Set a response header. Ignored once headers are sent.
    pub fn set_header(&mut self, name: &str, value: impl Into<String>) {
        if self.headers_sent() {
            tracing::trace!("Ignoring header {:?} set after headers were sent", name);
            return;
        }

        self.headers.insert(name, value);
        self.state = WriterState::HeadersPending;
    }

    /// Set status code and reason text. Ignored once headers are sent.
    pub fn set_status(&mut self, status: u16, status_text: impl Into<String>) {
        if self.headers_sent() {
            tracing::trace!("Ignoring status {} set after headers were sent", status);
            return;
        }

        self.status = status;
        self.status_text = status_text.into();
        self.state = WriterState::HeadersPending;
    }

    /// Set status code with its standard reason phrase.
    pub fn set_status_code(&mut self, status: u16) {
        self.set_status(status, reason_phrase(status));
    }

    /// Write a piece of the body.
    ///
    /// The first call sends the headers. Without a `content-length` header the
    /// body switches to chunked transfer encoding; otherwise bytes go out raw
    /// and must add up to the declared length.
    pub async fn write(&mut self, chunk: &[u8]) -> Result<()> {
        if self.state == WriterState::Closed {
            tracing::debug!("Dropping {} body bytes written after end", chunk.len());
            return Ok(());
        }

        if !self.headers_sent() {
            if !self.headers.contains(names::CONTENT_LENGTH) {
                self.chunked = true;
                self.headers.insert(names::TRANSFER_ENCODING, "chunked");
            }
            self.send_headers().await?;
        }

        if self.chunked {
            self.write_chunk_frame(chunk).await
        } else {
            self.out.write_bytes(chunk).await
        }
    }

    /// Finish the response, optionally with a last piece of body, and close
    /// the stream for writing.
    ///
    /// Called before any `write`, this always produces a fixed-length
    /// response whose `content-length` defaults to the length of `chunk`.
    pub async fn end(&mut self, chunk: Option<&[u8]>) -> Result<()> {
        if self.state == WriterState::Closed {
            tracing::debug!("Ignoring end() on a finished response");
            return Ok(());
        }

        if !self.headers_sent() {
            if !self.headers.contains(names::CONTENT_LENGTH) {
                let len = chunk.map_or(0, |c| c.len());
                self.headers.insert(names::CONTENT_LENGTH, len.to_string());
            }
            self.send_headers().await?;
        }

        if self.chunked {
            if let Some(chunk) = chunk {
                self.write_chunk_frame(chunk).await?;
            }
            self.out.write_bytes(LAST_CHUNK).await?;
        } else if let Some(chunk) = chunk.filter(|c| !c.is_empty()) {
            self.out.write_bytes(chunk).await?;
        }

        self.state = WriterState::Closed;
        self.out.close_for_writing().await
    }

    /// Serialize `data` as JSON and send it as the whole response.
    ///
    /// # Errors
    ///
    /// Returns `HeadersAlreadySent` if headers already went out, since the
    /// framing can no longer change.
    pub async fn json<T: Serialize + ?Sized>(&mut self, data: &T) -> Result<()> {
        if self.headers_sent() {
            return Err(HttpError::HeadersAlreadySent);
        }

        let payload = serde_json::to_vec(data)?;
        self.headers.insert(names::CONTENT_TYPE, JSON_CONTENT_TYPE);
        self.headers
            .insert(names::CONTENT_LENGTH, payload.len().to_string());
        self.send_headers().await?;

        self.out.write_bytes(&payload).await?;
        self.state = WriterState::Closed;
        self.out.close_for_writing().await
    }

    /// Send the status line and headers. Only the first call writes anything.
    ///
    /// Adds a `date` header with the current time.
    pub async fn send_headers(&mut self) -> Result<()> {
        if self.headers_sent() {
            return Ok(());
        }

        self.state = WriterState::HeadersSent;
        self.headers.insert(names::DATE, http_date_now());

        let mut buf = BytesMut::with_capacity(256);
        encode_status_line(self.status, &self.status_text, &mut buf);
        self.headers.encode_into(&mut buf);
        buf.put_slice(CRLF);

        self.out.write_bytes(&buf).await
    }

    /// Write `<hex len>\r\n<bytes>\r\n`. Empty chunks are skipped, since a
    /// zero-size frame would end the body.
    async fn write_chunk_frame(&mut self, chunk: &[u8]) -> Result<()> {
        if chunk.is_empty() {
            return Ok(());
        }

        let size_line = encode_chunk_size(chunk.len());
        let parts: [&[u8]; 3] = [size_line.as_bytes(), chunk, CRLF];
        self.out.write_parts(&parts).await
    }
}

impl<W> ResponseWriter<W> {
    /// Current status code.
    #[inline]
    pub fn status(&self) -> u16 {
        self.status
    }

    /// Current reason text.
    #[inline]
    pub fn status_text(&self) -> &str {
        &self.status_text
    }

    /// Look up a pending (or already sent) header.
    #[inline]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }

    /// All response headers in the order they are written.
    #[inline]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Current lifecycle state.
    #[inline]
    pub fn state(&self) -> WriterState {
        self.state
    }

    /// Whether the status line and headers have been written.
    #[inline]
    pub fn headers_sent(&self) -> bool {
        matches!(self.state, WriterState::HeadersSent | WriterState::Closed)
    }

    /// Whether the body uses chunked transfer encoding.
    #[inline]
    pub fn is_chunked(&self) -> bool {
        self.chunked
    }

    /// Unwrap into the underlying writer.
    pub fn into_inner(self) -> W {
        self.out.into_inner()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{duplex, AsyncReadExt};

    /// Remove the `date` header line, which changes every second.
    fn without_date(raw: &[u8]) -> String {
        let text = String::from_utf8(raw.to_vec()).unwrap();
        let start = text.find("\r\ndate: ").expect("date header") + 2;
        let end = start + text[start..].find("\r\n").unwrap() + 2;
        format!("{}{}", &text[..start], &text[end..])
    }

    #[tokio::test]
    async fn test_end_without_write_is_fixed_length() {
        let mut res = ResponseWriter::new(Vec::new());

        res.end(Some(b"hello")).await.unwrap();

        assert!(!res.is_chunked());
        assert_eq!(res.state(), WriterState::Closed);
        assert_eq!(
            without_date(&res.into_inner()),
            "HTTP/1.1 200 OK\r\nserver: httpwire\r\ncontent-length: 5\r\n\r\nhello"
        );
    }

    #[tokio::test]
    async fn test_end_without_body() {
        let mut res = ResponseWriter::new(Vec::new());
        res.set_status(204, "No Content");

        res.end(None).await.unwrap();

        assert_eq!(
            without_date(&res.into_inner()),
            "HTTP/1.1 204 No Content\r\nserver: httpwire\r\ncontent-length: 0\r\n\r\n"
        );
    }

    #[tokio::test]
    async fn test_end_keeps_preset_content_length() {
        let mut res = ResponseWriter::new(Vec::new());
        res.set_header("Content-Length", "3");

        res.end(Some(b"abc")).await.unwrap();

        let out = without_date(&res.into_inner());
        assert_eq!(out.matches("content-length").count(), 1);
        assert!(out.ends_with("content-length: 3\r\n\r\nabc"));
    }

    #[tokio::test]
    async fn test_two_writes_use_chunked_framing() {
        let mut res = ResponseWriter::new(Vec::new());

        res.write(b"hello").await.unwrap();
        res.write(b" world").await.unwrap();
        assert!(res.is_chunked());
        res.end(None).await.unwrap();

        assert_eq!(
            without_date(&res.into_inner()),
            "HTTP/1.1 200 OK\r\nserver: httpwire\r\ntransfer-encoding: chunked\r\n\r\n\
             5\r\nhello\r\n6\r\n world\r\n0\r\n\r\n"
        );
    }

    #[tokio::test]
    async fn test_end_with_final_chunk_in_chunked_mode() {
        let mut res = ResponseWriter::new(Vec::new());

        res.write(b"a").await.unwrap();
        res.end(Some(b"bc")).await.unwrap();

        let out = without_date(&res.into_inner());
        assert!(out.ends_with("\r\n\r\n1\r\na\r\n2\r\nbc\r\n0\r\n\r\n"));
        assert!(!out.contains("content-length"));
    }

    #[tokio::test]
    async fn test_chunk_size_is_hex() {
        let mut res = ResponseWriter::new(Vec::new());
        let body = vec![b'x'; 300];

        res.write(&body).await.unwrap();
        res.end(None).await.unwrap();

        let out = without_date(&res.into_inner());
        assert!(out.contains("\r\n\r\n12c\r\nxxx"));
    }

    #[tokio::test]
    async fn test_empty_write_skipped_in_chunked_mode() {
        let mut res = ResponseWriter::new(Vec::new());

        res.write(b"").await.unwrap();
        res.write(b"data").await.unwrap();
        res.end(Some(b"")).await.unwrap();

        let out = without_date(&res.into_inner());
        assert!(out.ends_with("transfer-encoding: chunked\r\n\r\n4\r\ndata\r\n0\r\n\r\n"));
    }

    #[tokio::test]
    async fn test_write_with_content_length_is_raw() {
        let mut res = ResponseWriter::new(Vec::new());
        res.set_header("content-length", "10");

        res.write(b"01234").await.unwrap();
        res.write(b"56789").await.unwrap();
        res.end(None).await.unwrap();

        assert!(!res.is_chunked());
        let out = without_date(&res.into_inner());
        assert!(out.ends_with("content-length: 10\r\n\r\n0123456789"));
        assert!(!out.contains("transfer-encoding"));
    }

    #[tokio::test]
    async fn test_header_order_is_insertion_order() {
        let mut res = ResponseWriter::new(Vec::new());
        res.set_header("X-B", "2");
        res.set_header("x-a", "1");
        res.set_header("X-b", "3");

        res.end(None).await.unwrap();

        let raw = res.into_inner();
        let text = String::from_utf8(raw).unwrap();
        let names: Vec<_> = text
            .split("\r\n")
            .skip(1)
            .take_while(|l| !l.is_empty())
            .map(|l| l.split(':').next().unwrap())
            .collect();
        assert_eq!(names, vec!["server", "x-b", "x-a", "content-length", "date"]);
        assert!(text.contains("x-b: 3\r\n"));
    }

    #[tokio::test]
    async fn test_custom_server_name() {
        let mut res = ResponseWriter::with_server_name(Vec::new(), "my-custom-server");
        assert_eq!(res.header("server"), Some("my-custom-server"));

        res.end(None).await.unwrap();
        let out = without_date(&res.into_inner());
        assert!(out.contains("server: my-custom-server\r\n"));
    }

    #[tokio::test]
    async fn test_json_response() {
        let mut res = ResponseWriter::new(Vec::new());
        res.set_header("content-type", "text/plain");

        res.json(&serde_json::json!({ "status": 200, "text": "success" }))
            .await
            .unwrap();

        let body = r#"{"status":200,"text":"success"}"#;
        let out = without_date(&res.into_inner());
        assert_eq!(
            out,
            format!(
                "HTTP/1.1 200 OK\r\nserver: httpwire\r\ncontent-type: application/json; charset=utf-8\r\ncontent-length: {}\r\n\r\n{}",
                body.len(),
                body
            )
        );
        assert_eq!(out.matches("content-type").count(), 1);
    }

    #[tokio::test]
    async fn test_json_after_headers_sent_fails() {
        let mut res = ResponseWriter::new(Vec::new());
        res.write(b"partial").await.unwrap();

        let result = res.json(&"late").await;
        assert!(matches!(result, Err(HttpError::HeadersAlreadySent)));
    }

    #[tokio::test]
    async fn test_json_twice_fails_and_output_unchanged() {
        let mut res = ResponseWriter::new(Vec::new());
        res.json(&[1, 2, 3]).await.unwrap();

        res.set_header("x-late", "1");
        res.set_status(500, "Internal Server Error");
        assert!(matches!(
            res.json(&[4]).await,
            Err(HttpError::HeadersAlreadySent)
        ));
        res.write(b"more").await.unwrap();
        res.end(Some(b"more")).await.unwrap();

        assert_eq!(res.status(), 200);
        let out = without_date(&res.into_inner());
        assert!(out.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(!out.contains("x-late"));
        assert!(out.ends_with("\r\n\r\n[1,2,3]"));
    }

    #[tokio::test]
    async fn test_send_headers_is_idempotent() {
        let mut res = ResponseWriter::new(Vec::new());

        res.send_headers().await.unwrap();
        res.send_headers().await.unwrap();
        res.send_headers().await.unwrap();

        let text = String::from_utf8(res.into_inner()).unwrap();
        assert_eq!(text.matches("HTTP/1.1 200 OK").count(), 1);
        assert_eq!(text.matches("date: ").count(), 1);
        assert!(text.ends_with("\r\n\r\n"));
    }

    #[tokio::test]
    async fn test_write_after_explicit_send_headers_is_raw() {
        let mut res = ResponseWriter::new(Vec::new());

        res.send_headers().await.unwrap();
        res.write(b"raw").await.unwrap();
        res.end(None).await.unwrap();

        let out = without_date(&res.into_inner());
        assert_eq!(out, "HTTP/1.1 200 OK\r\nserver: httpwire\r\n\r\nraw");
    }

    #[tokio::test]
    async fn test_status_and_headers_frozen_after_send() {
        let mut res = ResponseWriter::new(Vec::new());
        res.set_status_code(404);
        res.write(b"x").await.unwrap();

        res.set_status(200, "OK");
        res.set_header("x-late", "1");

        assert_eq!(res.status(), 404);
        assert_eq!(res.status_text(), "Not Found");
        assert_eq!(res.header("x-late"), None);
    }

    #[tokio::test]
    async fn test_write_and_end_after_close_are_noops() {
        let mut res = ResponseWriter::new(Vec::new());
        res.end(Some(b"done")).await.unwrap();

        res.write(b"late").await.unwrap();
        res.end(Some(b"late")).await.unwrap();

        let out = without_date(&res.into_inner());
        assert!(out.ends_with("\r\n\r\ndone"));
        assert!(!out.contains("late"));
    }

    #[tokio::test]
    async fn test_state_transitions() {
        let mut res = ResponseWriter::new(Vec::new());
        assert_eq!(res.state(), WriterState::Initial);
        assert!(!res.headers_sent());

        res.set_header("x-one", "1");
        assert_eq!(res.state(), WriterState::HeadersPending);

        res.write(b"a").await.unwrap();
        assert_eq!(res.state(), WriterState::HeadersSent);
        assert!(res.headers_sent());

        res.end(None).await.unwrap();
        assert_eq!(res.state(), WriterState::Closed);
        assert!(res.headers_sent());
    }

    #[tokio::test]
    async fn test_end_closes_stream() {
        let (client, mut server) = duplex(4096);
        let mut res = ResponseWriter::new(client);

        res.write(b"streamed").await.unwrap();
        res.end(None).await.unwrap();

        let mut received = Vec::new();
        server.read_to_end(&mut received).await.unwrap();

        let out = without_date(&received);
        assert!(out.ends_with("8\r\nstreamed\r\n0\r\n\r\n"));
    }
}
