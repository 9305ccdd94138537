//! TCP listener for accepting HTTP connections.
//!
//! # Example
//!
//! ```ignore
//! use httpwire::transport::Listener;
//!
//! let listener = Listener::bind("127.0.0.1:3000").await?;
//! let (stream, peer) = listener.accept().await?;
//! ```

use std::net::SocketAddr;

use tokio::net::{TcpListener, TcpStream, ToSocketAddrs};

use crate::error::Result;

/// Listening TCP socket.
pub struct Listener {
    listener: TcpListener,
}

impl Listener {
    /// Bind to an address. Port `0` picks a free port.
    pub async fn bind<A: ToSocketAddrs>(addr: A) -> Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self { listener })
    }

    /// Wrap an already bound tokio listener.
    pub fn from_tcp(listener: TcpListener) -> Self {
        Self { listener }
    }

    /// Accept a single connection.
    ///
    /// Disables Nagle's algorithm on the accepted socket, since the response
    /// writer emits the header block and body frames as separate writes.
    pub async fn accept(&self) -> Result<(TcpStream, SocketAddr)> {
        let (stream, peer) = self.listener.accept().await?;
        stream.set_nodelay(true)?;
        Ok((stream, peer))
    }

    /// Get the bound address.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }
}
