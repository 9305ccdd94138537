//! Request reader - turns the front of a byte stream into a [`Request`].
//!
//! ```text
//! Inbound ─► read_chunk ─► HeaderBuffer ─► RawHead ─► parse_request_head ─► Request
//!    ▲                                        │
//!    └──────────── push_back(leftover) ◄──────┘
//! ```

use tokio::io::AsyncRead;

use crate::error::{HttpError, Result};
use crate::handler::Request;
use crate::protocol::{parse_request_head, HeaderBuffer, RawHead};
use crate::transport::Inbound;

/// Read until the end of the header section.
///
/// Bytes that arrived after `\r\n\r\n` are pushed back onto `inbound`, so
/// the next `read_chunk` returns them before anything not yet delivered.
///
/// # Errors
///
/// - `IncompleteRequest` if the stream ends before the terminator
/// - `HeaderTooLarge` if `buffer`'s limit is exceeded
pub async fn pull_header_block<R>(
    inbound: &mut Inbound<R>,
    buffer: &mut HeaderBuffer,
) -> Result<RawHead>
where
    R: AsyncRead + Unpin,
{
    loop {
        let Some(chunk) = inbound.read_chunk().await? else {
            return Err(HttpError::IncompleteRequest);
        };

        if let Some(head) = buffer.push(&chunk)? {
            inbound.push_back(head.leftover.clone());
            return Ok(head);
        }
    }
}

/// Read and parse one request head, handing the stream over to the request.
pub async fn read_request<R>(mut inbound: Inbound<R>, max_header_size: usize) -> Result<Request<R>>
where
    R: AsyncRead + Unpin,
{
    let mut buffer = HeaderBuffer::with_max_header_size(max_header_size);
    let raw = pull_header_block(&mut inbound, &mut buffer).await?;
    let head = parse_request_head(&raw.text)?;

    tracing::debug!(
        "Parsed request line: {} {} HTTP/{}",
        head.method(),
        head.target(),
        head.protocol_version()
    );

    Ok(Request::new(head, inbound))
}
