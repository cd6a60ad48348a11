//! sturdyrpc Client
//!
//! A resilient client for a single XML-RPC endpoint. It keeps one keep-alive
//! HTTP/1.1 connection, retries failed calls under a time budget and
//! reconnects transparently when the connection drops.
//!
//! # Architecture
//!
//! ```text
//! RpcClient::call
//!     └── retry (call budget, every pacing_interval)
//!             └── attempt
//!                   ├── ConnectionManager::ensure_connected
//!                   │       └── reconnect: retry (connect budget, every pacing_interval)
//!                   │               └── Transport::open
//!                   └── exchange: POST / → classify response
//! ```
//!
//! # Components
//!
//! - [`retry`]: bounded-time retry scheduler and the "every interval" pacing policy
//! - [`connection`]: the single connection slot and its reconnect loop
//! - [`exchange`]: one request/response cycle and failure classification
//! - [`config`]: timeouts, pacing and request identity
//! - [`client`]: the [`RpcClient`] façade tying the pieces together
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use sturdyrpc_client::{ClientConfig, RpcClient};
//! use sturdyrpc_common::protocol::{MethodCall, Value};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ClientConfig::new().with_timeout(Duration::from_secs(10));
//! let client = RpcClient::with_config("127.0.0.1:8080".parse()?, config);
//!
//! let call = MethodCall::new("sample.add").with_param(2).with_param(3);
//! assert_eq!(client.call(&call).await?, Value::Int(5));
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod connection;
pub mod exchange;
pub mod retry;

#[cfg(test)]
mod test_support;

pub use client::RpcClient;
pub use config::{
    ClientConfig, DEFAULT_CONNECT_TIMEOUT, DEFAULT_PACING_INTERVAL, DEFAULT_TIMEOUT,
    DEFAULT_USER_AGENT,
};
pub use connection::{ConnectionManager, ReconnectPolicy};
pub use exchange::exchange;
pub use retry::{every, retry};
