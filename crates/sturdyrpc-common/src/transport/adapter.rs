//! Transport capability traits
//!
//! The client core only ever talks to the network through these two traits,
//! which keeps the retry and reconnect logic testable against in-memory
//! doubles.

use std::future::Future;

use hyper::body::Bytes;
use hyper::{Request, Response};

use crate::protocol::Endpoint;
use crate::protocol::error::Result;

/// Opens connections to an endpoint.
pub trait Transport: Send + Sync {
    type Connection: Connection;

    /// Opens a fresh connection. Failures are reported as
    /// [`RpcError::Transport`](crate::protocol::RpcError::Transport).
    fn open(&self, endpoint: &Endpoint) -> impl Future<Output = Result<Self::Connection>> + Send;
}

/// A live, exclusively owned byte stream to the endpoint.
pub trait Connection: Send + Sized {
    /// Writes one request and reads exactly one response, body included.
    ///
    /// Any error means no usable response was observed.
    fn send(&mut self, request: Request<Bytes>) -> impl Future<Output = Result<Response<Bytes>>> + Send;

    /// Closes the stream. Never fails; errors during teardown are logged.
    fn close(self) -> impl Future<Output = ()> + Send;
}
