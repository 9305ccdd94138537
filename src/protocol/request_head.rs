//! Request line and header section decoding.

use super::headers::HeaderMap;
use crate::error::{HttpError, Result};

/// Decoded request line and headers. Immutable once parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestHead {
    method: String,
    target: String,
    protocol_version: String,
    headers: HeaderMap,
}

impl RequestHead {
    /// Request method, e.g. `GET`.
    #[inline]
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Raw request target, including any query string.
    #[inline]
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Version after `HTTP/`, e.g. `1.1`.
    #[inline]
    pub fn protocol_version(&self) -> &str {
        &self.protocol_version
    }

    /// Request headers keyed by lower-cased name.
    #[inline]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }
}

/// Parse the text of a header section (without the trailing `\r\n\r\n`).
///
/// # Errors
///
/// Returns `MalformedRequestLine` if the first line does not carry a
/// non-empty method, target and `HTTP/<version>` token.
pub fn parse_request_head(text: &str) -> Result<RequestHead> {
    let mut lines = text.split("\r\n");
    let request_line = lines.next().unwrap_or_default();

    let mut tokens = request_line.split(' ');
    let (Some(method), Some(target), Some(protocol)) = (tokens.next(), tokens.next(), tokens.next())
    else {
        return Err(HttpError::MalformedRequestLine(request_line.to_string()));
    };

    // A leading or doubled space leaves an empty token
    if method.is_empty() || target.is_empty() || protocol.is_empty() {
        return Err(HttpError::MalformedRequestLine(request_line.to_string()));
    }

    let Some((_, protocol_version)) = protocol.split_once('/') else {
        return Err(HttpError::MalformedRequestLine(request_line.to_string()));
    };

    let mut headers = HeaderMap::new();
    for line in lines {
        let Some((name, value)) = line.split_once(':') else {
            tracing::trace!("Skipping header line without colon: {:?}", line);
            continue;
        };

        let name = name.trim();
        if name.is_empty() {
            tracing::trace!("Skipping header line with empty name: {:?}", line);
            continue;
        }

        headers.insert(name, value.trim());
    }

    Ok(RequestHead {
        method: method.to_string(),
        target: target.to_string(),
        protocol_version: protocol_version.to_string(),
        headers,
    })
}
