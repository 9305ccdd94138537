//! Transport module - byte stream plumbing.
//!
//! Provides:
//! - [`Inbound`] / [`Outbound`] - read and write halves of a connection
//! - [`Listener`] - TCP listener

mod listener;
mod stream;

pub use listener::Listener;
pub use stream::{BoxedReader, BoxedWriter, Inbound, Outbound, DEFAULT_READ_BUFFER_SIZE};
