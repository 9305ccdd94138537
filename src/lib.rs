//! # httpwire
//!
//! Minimal HTTP/1.1 message framing on top of a raw byte stream.
//!
//! This crate turns the front of a TCP (or any tokio `AsyncRead + AsyncWrite`)
//! stream into a parsed request, and turns handler output back into a framed
//! response.
//!
//! ## Architecture
//!
//! - **Read side**: [`protocol::HeaderBuffer`] finds `\r\n\r\n` across
//!   arbitrary read boundaries, bytes past it are pushed back onto the stream,
//!   and [`protocol::parse_request_head`] decodes the request line and headers
//! - **Write side**: [`ResponseWriter`] holds status and headers back until the
//!   first body byte, then picks `content-length` or chunked framing
//!
//! ## Example
//!
//! ```ignore
//! use httpwire::{Request, ResponseWriter, Server};
//!
//! #[tokio::main]
//! async fn main() {
//!     let server = Server::bind("127.0.0.1:3000").await.unwrap();
//!
//!     server
//!         .serve(|req: Request, mut res: ResponseWriter| async move {
//!             res.set_header("content-type", "text/plain");
//!             res.write(req.url().as_bytes()).await?;
//!             res.end(None).await
//!         })
//!         .await
//!         .unwrap();
//! }
//! ```

pub mod error;
pub mod handler;
pub mod protocol;
pub mod reader;
pub mod server;
pub mod transport;
pub mod writer;

pub use error::{HttpError, Result};
pub use handler::{Handler, HandlerResult, Request};
pub use server::{serve_connection, Server, ServerBuilder, ServerConfig};
pub use writer::{ResponseWriter, WriterState};
