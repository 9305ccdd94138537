//! Server builder and accept loop.
//!
//! The [`ServerBuilder`] provides a fluent API for configuration. The
//! [`Server`] runs one task per accepted connection:
//! 1. Read the header section (with an optional timeout)
//! 2. Parse the request line and headers
//! 3. Hand `(Request, ResponseWriter)` to the handler
//!
//! Requests that fail to parse never reach the handler; where possible a
//! short error response is written before the connection closes.
//!
//! # Example
//!
//! ```ignore
//! use httpwire::{Request, ResponseWriter, Server};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let server = Server::builder()
//!         .server_name("my-custom-server")
//!         .bind("0.0.0.0:3000")
//!         .await?;
//!
//!     server
//!         .serve(|_req: Request, mut res: ResponseWriter| async move {
//!             res.json(&serde_json::json!({ "status": 200, "text": "success" })).await
//!         })
//!         .await?;
//!     Ok(())
//! }
//! ```

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::ToSocketAddrs;
use tokio::sync::Semaphore;

use crate::error::{HttpError, Result};
use crate::handler::{Handler, Request};
use crate::protocol::{reason_phrase, DEFAULT_MAX_HEADER_SIZE, DEFAULT_SERVER_NAME};
use crate::reader::read_request;
use crate::transport::{BoxedReader, BoxedWriter, Inbound, Listener, DEFAULT_READ_BUFFER_SIZE};
use crate::writer::ResponseWriter;

/// Default time allowed for the header section to arrive.
pub const DEFAULT_HEADER_TIMEOUT: Duration = Duration::from_secs(30);

/// Default maximum concurrent connections.
pub const DEFAULT_MAX_CONNECTIONS: usize = 1024;

/// Pause after a failed accept before trying again.
const ACCEPT_ERROR_BACKOFF: Duration = Duration::from_millis(100);

/// Configuration shared by every connection of a server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Value of the `server` response header.
    pub server_name: String,
    /// Maximum size of an unterminated header section.
    pub max_header_size: usize,
    /// Size of a single read from the socket.
    pub read_buffer_size: usize,
    /// Time allowed for the header section to arrive; `None` waits forever.
    pub header_timeout: Option<Duration>,
    /// Maximum connections handled at once; further accepts wait.
    pub max_connections: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            server_name: DEFAULT_SERVER_NAME.to_string(),
            max_header_size: DEFAULT_MAX_HEADER_SIZE,
            read_buffer_size: DEFAULT_READ_BUFFER_SIZE,
            header_timeout: Some(DEFAULT_HEADER_TIMEOUT),
            max_connections: DEFAULT_MAX_CONNECTIONS,
        }
    }
}

/// Builder for configuring and binding a [`Server`].
pub struct ServerBuilder {
    config: ServerConfig,
}

impl ServerBuilder {
    /// Create a new server builder.
    pub fn new() -> Self {
        Self {
            config: ServerConfig::default(),
        }
    }

    /// Set the `server` response header.
    ///
    /// Default: `httpwire`
    pub fn server_name(mut self, name: impl Into<String>) -> Self {
        self.config.server_name = name.into();
        self
    }

    /// Set the maximum header section size.
    ///
    /// Default: 64KB
    pub fn max_header_size(mut self, size: usize) -> Self {
        self.config.max_header_size = size;
        self
    }

    /// Set the socket read size.
    ///
    /// Default: 16KB
    pub fn read_buffer_size(mut self, size: usize) -> Self {
        self.config.read_buffer_size = size;
        self
    }

    /// Set the header timeout, or `None` to disable it.
    ///
    /// Default: 30 seconds
    pub fn header_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.config.header_timeout = timeout;
        self
    }

    /// Set the maximum number of concurrent connections.
    ///
    /// Default: 1024
    pub fn max_connections(mut self, limit: usize) -> Self {
        self.config.max_connections = limit;
        self
    }

    /// Get the configuration built so far.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Bind the listener.
    pub async fn bind<A: ToSocketAddrs>(self, addr: A) -> Result<Server> {
        let listener = Listener::bind(addr).await?;
        Ok(Server::from_listener(listener, self.config))
    }
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound HTTP server.
pub struct Server {
    listener: Listener,
    config: Arc<ServerConfig>,
}

impl Server {
    /// Create a new server builder.
    pub fn builder() -> ServerBuilder {
        ServerBuilder::new()
    }

    /// Bind with the default configuration.
    pub async fn bind<A: ToSocketAddrs>(addr: A) -> Result<Self> {
        ServerBuilder::new().bind(addr).await
    }

    /// Create a server from an existing listener.
    pub fn from_listener(listener: Listener, config: ServerConfig) -> Self {
        Self {
            listener,
            config: Arc::new(config),
        }
    }

    /// Get the bound address.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Get the server configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Accept connections forever.
    pub async fn serve<H: Handler>(self, handler: H) -> Result<()> {
        self.serve_with_shutdown(handler, std::future::pending())
            .await
    }

    /// Accept connections until `shutdown` resolves.
    ///
    /// Connections already accepted keep running to completion.
    pub async fn serve_with_shutdown<H, F>(self, handler: H, shutdown: F) -> Result<()>
    where
        H: Handler,
        F: Future<Output = ()>,
    {
        let handler = Arc::new(handler);
        let semaphore = Arc::new(Semaphore::new(self.config.max_connections.max(1)));
        tokio::pin!(shutdown);

        loop {
            let permit = tokio::select! {
                permit = semaphore.clone().acquire_owned() => match permit {
                    Ok(permit) => permit,
                    Err(_) => return Ok(()),
                },
                _ = &mut shutdown => {
                    tracing::debug!("Shutdown requested, no longer accepting connections");
                    return Ok(());
                }
            };

            let (stream, peer) = tokio::select! {
                accepted = self.listener.accept() => match accepted {
                    Ok(accepted) => accepted,
                    Err(e) => {
                        tracing::error!("Accept error: {}", e);
                        // Errors such as EMFILE persist; don't spin on them
                        tokio::time::sleep(ACCEPT_ERROR_BACKOFF).await;
                        continue;
                    }
                },
                _ = &mut shutdown => {
                    tracing::debug!("Shutdown requested, no longer accepting connections");
                    return Ok(());
                }
            };

            tracing::debug!("Accepted connection from {}", peer);

            let handler = handler.clone();
            let config = self.config.clone();

            tokio::spawn(async move {
                // Permit is held until this task completes
                let _permit = permit;
                let _ = serve_connection(stream, &config, handler.as_ref()).await;
            });
        }
    }
}

/// Run one request/response exchange over `stream`.
///
/// Parse failures are answered with a best-effort error response (none for
/// `IncompleteRequest`) and returned without calling the handler. Handler
/// errors are logged and returned.
pub async fn serve_connection<S, H>(stream: S, config: &ServerConfig, handler: &H) -> Result<()>
where
    S: AsyncRead + AsyncWrite + Send + Sync + 'static,
    H: Handler,
{
    let (reader, writer) = tokio::io::split(stream);
    let inbound = Inbound::with_read_size(reader, config.read_buffer_size).boxed();
    let writer: BoxedWriter = Box::new(writer);

    let request = match read_head(inbound, config).await {
        Ok(request) => request,
        Err(e) => {
            reject(writer, config, &e).await;
            return Err(e);
        }
    };

    let method = request.method().to_string();
    let url = request.url().to_string();
    let response = ResponseWriter::with_server_name(writer, &config.server_name);

    if let Err(e) = handler.call(request, response).await {
        tracing::error!("Handler error for {} {}: {}", method, url, e);
        return Err(e);
    }

    Ok(())
}

/// Read the request head, applying the configured timeout.
async fn read_head(inbound: Inbound<BoxedReader>, config: &ServerConfig) -> Result<Request> {
    let read = read_request(inbound, config.max_header_size);

    match config.header_timeout {
        Some(limit) => tokio::time::timeout(limit, read)
            .await
            .map_err(|_| HttpError::HeaderTimeout)?,
        None => read.await,
    }
}

/// Status code sent back for a request that could not be read.
fn rejection_status(error: &HttpError) -> Option<u16> {
    match error {
        HttpError::MalformedRequestLine(_) => Some(400),
        HttpError::HeaderTimeout => Some(408),
        HttpError::HeaderTooLarge(_) => Some(431),
        _ => None,
    }
}

/// Write a short plain-text error response, ignoring write failures.
async fn reject(writer: BoxedWriter, config: &ServerConfig, error: &HttpError) {
    let Some(status) = rejection_status(error) else {
        tracing::debug!("Dropping connection: {}", error);
        return;
    };

    tracing::warn!("Rejecting request with {}: {}", status, error);

    let mut res = ResponseWriter::with_server_name(writer, &config.server_name);
    res.set_status_code(status);
    res.set_header("content-type", "text/plain; charset=utf-8");
    res.set_header("connection", "close");

    if let Err(e) = res.end(Some(reason_phrase(status).as_bytes())).await {
        tracing::debug!("Failed to send {} response: {}", status, e);
    }
}
