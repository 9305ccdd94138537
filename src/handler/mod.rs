//! Handler module - the application-facing side of an exchange.
//!
//! Provides:
//! - [`Request`] - decoded request head plus the body stream
//! - [`Handler`] - anything that answers a `(Request, ResponseWriter)` pair
//!
//! # Example
//!
//! ```ignore
//! use httpwire::handler::{HandlerResult, Request};
//! use httpwire::ResponseWriter;
//!
//! async fn hello(req: Request, mut res: ResponseWriter) -> HandlerResult {
//!     res.set_header("content-type", "text/plain");
//!     res.end(Some(format!("hello from {}", req.path()).as_bytes())).await
//! }
//! ```

mod request;

use std::future::Future;
use std::pin::Pin;

use crate::error::Result;
use crate::writer::ResponseWriter;

pub use request::Request;

/// Result type for handler functions.
pub type HandlerResult = Result<()>;

/// Boxed future for handler results.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Trait for request handlers.
pub trait Handler: Send + Sync + 'static {
    /// Answer one request. The handler owns both halves of the exchange.
    fn call(&self, req: Request, res: ResponseWriter) -> BoxFuture<'static, HandlerResult>;
}

impl<F, Fut> Handler for F
where
    F: Fn(Request, ResponseWriter) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    fn call(&self, req: Request, res: ResponseWriter) -> BoxFuture<'static, HandlerResult> {
        Box::pin((self)(req, res))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::parse_request_head;
    use crate::transport::{BoxedReader, BoxedWriter, Inbound};
    use tokio::io::{duplex, AsyncReadExt};

    async fn text_handler(req: Request, mut res: ResponseWriter) -> HandlerResult {
        res.set_header("content-type", "text/plain");
        res.end(Some(req.path().as_bytes())).await
    }

    #[tokio::test]
    async fn test_fn_and_closure_are_handlers() {
        fn assert_handler<H: Handler>(_: &H) {}

        assert_handler(&text_handler);
        assert_handler(&|_req: Request, mut res: ResponseWriter| async move {
            res.end(None).await
        });
    }

    #[tokio::test]
    async fn test_call_writes_response() {
        let head = parse_request_head("GET /hello?x=1 HTTP/1.1").unwrap();
        let reader: BoxedReader = Box::new(tokio::io::empty());
        let req = Request::new(head, Inbound::new(reader));

        let (client, mut server) = duplex(4096);
        let writer: BoxedWriter = Box::new(client);
        let res = ResponseWriter::new(writer);

        Handler::call(&text_handler, req, res).await.unwrap();

        let mut received = String::new();
        server.read_to_string(&mut received).await.unwrap();
        assert!(received.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(received.contains("content-type: text/plain\r\n"));
        assert!(received.ends_with("\r\n\r\n/hello"));
    }
}
