//! HTTP/1.1 over TCP transport
//!
//! Production implementation of [`Transport`]: a plain TCP connect followed by
//! a `hyper` HTTP/1.1 client handshake. The hyper connection driver runs as a
//! background task for as long as the [`HttpConnection`] lives.

use http_body_util::{BodyExt, Full};
use hyper::body::Bytes;
use hyper::client::conn::http1::{self, SendRequest};
use hyper::{Request, Response};
use hyper_util::rt::TokioIo;
use tokio::net::TcpStream;
use tokio::task::JoinHandle;
use tracing::debug;

use super::adapter::{Connection, Transport};
use crate::protocol::Endpoint;
use crate::protocol::error::{Result, RpcError};

/// HTTP/1.1 transport over plain TCP.
///
/// # Example
///
/// ```no_run
/// use sturdyrpc_common::protocol::Endpoint;
/// use sturdyrpc_common::transport::{HttpTransport, Transport};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let endpoint: Endpoint = "127.0.0.1:8080".parse()?;
/// let connection = HttpTransport::new().open(&endpoint).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct HttpTransport;

impl HttpTransport {
    pub fn new() -> Self {
        Self
    }
}

impl Transport for HttpTransport {
    type Connection = HttpConnection;

    async fn open(&self, endpoint: &Endpoint) -> Result<HttpConnection> {
        let stream = TcpStream::connect((endpoint.host(), endpoint.port()))
            .await
            .map_err(|e| RpcError::Transport(format!("Failed to connect to {}: {}", endpoint, e)))?;
        stream.set_nodelay(true)?;

        let (sender, conn) = http1::handshake(TokioIo::new(stream))
            .await
            .map_err(|e| RpcError::Transport(format!("HTTP handshake with {} failed: {}", endpoint, e)))?;

        let addr = endpoint.to_string();
        let driver = tokio::spawn(async move {
            if let Err(err) = conn.await {
                debug!(%addr, error = %err, "HTTP connection driver exited with error");
            }
        });

        Ok(HttpConnection { sender, driver })
    }
}

/// One keep-alive HTTP/1.1 connection.
pub struct HttpConnection {
    sender: SendRequest<Full<Bytes>>,
    driver: JoinHandle<()>,
}

impl HttpConnection {
    /// Whether hyper has already observed the connection closing.
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

impl Connection for HttpConnection {
    async fn send(&mut self, request: Request<Bytes>) -> Result<Response<Bytes>> {
        self.sender
            .ready()
            .await
            .map_err(|e| RpcError::Transport(format!("connection not ready: {}", e)))?;

        let response = self
            .sender
            .send_request(request.map(Full::new))
            .await
            .map_err(|e| RpcError::Transport(format!("request failed: {}", e)))?;

        let (parts, body) = response.into_parts();
        let body = body
            .collect()
            .await
            .map_err(|e| RpcError::Transport(format!("failed to read response body: {}", e)))?
            .to_bytes();

        Ok(Response::from_parts(parts, body))
    }

    async fn close(self) {
        // Drop aborts the driver, which closes the socket
        debug!("closing HTTP connection");
    }
}

impl Drop for HttpConnection {
    fn drop(&mut self) {
        self.driver.abort();
    }
}
