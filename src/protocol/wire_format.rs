//! HTTP/1.1 wire format constants and encoders.
//!
//! ```text
//! GET /path HTTP/1.1\r\n          request line
//! host: example.com\r\n           header lines
//! \r\n                            end of header section
//!
//! HTTP/1.1 200 OK\r\n             status line
//! transfer-encoding: chunked\r\n
//! \r\n
//! 5\r\nhello\r\n                  chunk frame (hex size)
//! 0\r\n\r\n                       last chunk
//! ```

use bytes::{BufMut, BytesMut};
use chrono::{DateTime, Utc};

/// Marks the end of the header section.
pub const HEADER_TERMINATOR: &[u8; 4] = b"\r\n\r\n";

/// Line separator.
pub const CRLF: &[u8; 2] = b"\r\n";

/// Zero-length chunk that terminates a chunked body.
pub const LAST_CHUNK: &[u8; 5] = b"0\r\n\r\n";

/// Protocol version written on every status line.
pub const HTTP_VERSION: &str = "1.1";

/// Default limit for an unterminated header section (64 KB).
pub const DEFAULT_MAX_HEADER_SIZE: usize = 64 * 1024;

/// Default value of the `server` response header.
pub const DEFAULT_SERVER_NAME: &str = "httpwire";

/// Media type set by `ResponseWriter::json`.
pub const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// Lower-cased header names the framing logic cares about.
pub mod names {
    pub const CONTENT_LENGTH: &str = "content-length";
    pub const CONTENT_TYPE: &str = "content-type";
    pub const DATE: &str = "date";
    pub const SERVER: &str = "server";
    pub const TRANSFER_ENCODING: &str = "transfer-encoding";
}

/// Find the offset of `\r\n\r\n` in `buf`.
///
/// Scans the whole slice, so a terminator split across earlier reads is
/// still found once the bytes are contiguous.
#[inline]
pub fn find_header_end(buf: &[u8]) -> Option<usize> {
    buf.windows(HEADER_TERMINATOR.len())
        .position(|w| w == HEADER_TERMINATOR)
}

/// Encode the size line of a chunk frame: lowercase hex length plus CRLF.
#[inline]
pub fn encode_chunk_size(len: usize) -> String {
    format!("{:x}\r\n", len)
}

/// Append `HTTP/1.1 <status> <text>\r\n` to `buf`.
pub fn encode_status_line(status: u16, status_text: &str, buf: &mut BytesMut) {
    buf.put_slice(b"HTTP/");
    buf.put_slice(HTTP_VERSION.as_bytes());
    buf.put_u8(b' ');
    buf.put_slice(status.to_string().as_bytes());
    buf.put_u8(b' ');
    buf.put_slice(status_text.as_bytes());
    buf.put_slice(CRLF);
}

/// Append `<name>: <value>\r\n` to `buf`.
pub fn encode_header_line(name: &str, value: &str, buf: &mut BytesMut) {
    buf.put_slice(name.as_bytes());
    buf.put_slice(b": ");
    buf.put_slice(value.as_bytes());
    buf.put_slice(CRLF);
}

/// Format a timestamp as an IMF-fixdate, e.g. `Sun, 06 Nov 1994 08:49:37 GMT`.
pub fn http_date(at: DateTime<Utc>) -> String {
    at.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

/// Current time as an IMF-fixdate.
pub fn http_date_now() -> String {
    http_date(Utc::now())
}

/// Standard reason phrase for a status code, or `""` when unknown.
pub fn reason_phrase(status: u16) -> &'static str {
    match status {
        100 => "Continue",
        101 => "Switching Protocols",
        200 => "OK",
        201 => "Created",
        202 => "Accepted",
        204 => "No Content",
        206 => "Partial Content",
        301 => "Moved Permanently",
        302 => "Found",
        303 => "See Other",
        304 => "Not Modified",
        307 => "Temporary Redirect",
        308 => "Permanent Redirect",
        400 => "Bad Request",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        405 => "Method Not Allowed",
        408 => "Request Timeout",
        409 => "Conflict",
        411 => "Length Required",
        413 => "Content Too Large",
        415 => "Unsupported Media Type",
        422 => "Unprocessable Content",
        429 => "Too Many Requests",
        431 => "Request Header Fields Too Large",
        500 => "Internal Server Error",
        501 => "Not Implemented",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        504 => "Gateway Timeout",
        505 => "HTTP Version Not Supported",
        _ => "",
    }
}
