//! Protocol module - wire format, header reassembly and request decoding.
//!
//! This module implements the byte-level side of HTTP/1.1:
//! - Constants and encoders for status lines, header lines and chunk frames
//! - Header buffer for accumulating partial reads up to `\r\n\r\n`
//! - Request line and header section parsing

mod header_buffer;
mod headers;
mod request_head;
mod wire_format;

pub use header_buffer::{HeaderBuffer, RawHead};
pub use headers::HeaderMap;
pub use request_head::{parse_request_head, RequestHead};
pub use wire_format::{
    encode_chunk_size, encode_header_line, encode_status_line, find_header_end, http_date,
    http_date_now, names, reason_phrase, CRLF, DEFAULT_MAX_HEADER_SIZE, DEFAULT_SERVER_NAME,
    HEADER_TERMINATOR, HTTP_VERSION, JSON_CONTENT_TYPE, LAST_CHUNK,
};
