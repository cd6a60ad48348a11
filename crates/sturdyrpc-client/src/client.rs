use std::time::Duration;

use sturdyrpc_common::protocol::error::Result;
use sturdyrpc_common::protocol::{Endpoint, MethodCall, MethodResponse, Value};
use sturdyrpc_common::transport::{HttpTransport, Transport};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::connection::ConnectionManager;
use crate::exchange::exchange;
use crate::retry::{every, retry};

/// Resilient RPC client for a single endpoint.
///
/// Keeps one keep-alive connection open and reuses it across calls. Each
/// [`call`](Self::call) is retried, reconnecting as needed, until it succeeds
/// or the configured time budget is spent; the last failure is then returned.
///
/// Every failure kind is retried the same way by default. Decode errors and
/// remote faults are the exception: they end the call at once. Set
/// [`ClientConfig::status_errors_are_final`] to also stop on non-200 statuses.
///
/// The connection slot sits behind an async mutex, so concurrent calls on one
/// client are serialised attempt by attempt and never share the stream.
///
/// # Example
///
/// ```no_run
/// use sturdyrpc_client::RpcClient;
/// use sturdyrpc_common::protocol::MethodCall;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let client = RpcClient::new("http://127.0.0.1:8080")?;
/// let result = client.call(&MethodCall::new("examples.getStateName").with_param(41)).await?;
/// println!("{:?}", result);
/// client.close().await;
/// # Ok(())
/// # }
/// ```
pub struct RpcClient<T: Transport = HttpTransport> {
    endpoint: Endpoint,
    manager: Mutex<ConnectionManager<T>>,
    config: ClientConfig,
}

impl RpcClient<HttpTransport> {
    /// Creates a client with default configuration.
    ///
    /// No connection is opened until the first call.
    pub fn new(endpoint: &str) -> Result<Self> {
        Ok(Self::with_config(endpoint.parse()?, ClientConfig::default()))
    }

    pub fn with_config(endpoint: Endpoint, config: ClientConfig) -> Self {
        Self::with_transport(HttpTransport::new(), endpoint, config)
    }
}

impl<T: Transport> RpcClient<T> {
    /// Creates a client over a custom transport.
    pub fn with_transport(transport: T, endpoint: Endpoint, config: ClientConfig) -> Self {
        let manager = ConnectionManager::new(transport, endpoint.clone(), config.reconnect_policy());
        Self {
            endpoint,
            manager: Mutex::new(manager),
            config,
        }
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub async fn is_connected(&self) -> bool {
        self.manager.lock().await.is_connected()
    }

    /// Performs one logical RPC call within the configured timeout.
    pub async fn call(&self, call: &MethodCall) -> Result<Value> {
        self.call_with_timeout(call, self.config.timeout).await
    }

    /// Performs one logical RPC call within `timeout`.
    ///
    /// One attempt is "ensure connected, then exchange". The budget is only
    /// checked between attempts, and a reconnect inside an attempt runs under
    /// its own budget, so the call may take longer than `timeout`.
    pub async fn call_with_timeout(&self, call: &MethodCall, timeout: Duration) -> Result<Value> {
        let status_errors_are_final = self.config.status_errors_are_final;
        let is_final = |outcome: &Result<MethodResponse>| match outcome {
            Ok(_) => true,
            Err(e) => e.is_final() || (status_errors_are_final && e.is_status_error()),
        };

        let outcome = retry(timeout, every(self.config.pacing_interval), is_final, || {
            self.attempt(call)
        })
        .await;

        if let Err(ref e) = outcome {
            warn!(endpoint = %self.endpoint, method = %call.method_name, error = %e, "RPC call failed");
        }
        outcome?.into_result()
    }

    /// Closes the connection. The client stays usable; the next call reconnects.
    pub async fn close(&self) {
        self.manager.lock().await.disconnect().await;
    }

    async fn attempt(&self, call: &MethodCall) -> Result<MethodResponse> {
        let mut manager = self.manager.lock().await;
        let conn = manager.ensure_connected().await?;

        debug!(endpoint = %self.endpoint, method = %call.method_name, "Sending request");
        let outcome = exchange(conn, &self.endpoint, &self.config.user_agent, call).await;

        if let Err(ref e) = outcome {
            if !e.is_final() {
                warn!(endpoint = %self.endpoint, method = %call.method_name, error = %e, "Attempt failed");
            }
            if e.is_no_response() {
                // The stream is unusable; force a fresh connection next attempt
                manager.disconnect().await;
            }
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{Reply, StubTransport};
    use hyper::body::Bytes;
    use std::sync::Arc;
    use sturdyrpc_common::protocol::{Fault, RpcError};
    use tokio::time::Instant;

    fn client(transport: StubTransport, config: ClientConfig) -> RpcClient<StubTransport> {
        RpcClient::with_transport(transport, Endpoint::new("stub", 1), config)
    }

    fn fast_config() -> ClientConfig {
        ClientConfig::new().with_timeout(Duration::from_secs(3))
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_attempt_success_does_not_sleep() {
        let start = Instant::now();
        let transport = StubTransport::new().echo();
        let client = client(transport.clone(), ClientConfig::default());

        let result = client.call(&MethodCall::new("echo").with_param(7)).await.unwrap();

        assert_eq!(result, Value::Int(7));
        assert_eq!(transport.opens(), 1);
        assert_eq!(transport.sends(), 1);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_status_error_retried_until_timeout() {
        let start = Instant::now();
        let transport = StubTransport::new().respond_with_status(500, "boom");
        let client = client(transport.clone(), fast_config());

        let err = client.call(&MethodCall::new("x")).await.unwrap_err();

        assert_eq!(err, RpcError::HttpStatus { code: 500, body: Bytes::from_static(b"boom") });
        assert_eq!(err.body_text().as_deref(), Some("boom"));
        // attempts at t = 0, 1, 2, 3
        assert_eq!(transport.sends(), 4);
        assert_eq!(start.elapsed(), Duration::from_secs(3));
        // the server answered, so the connection is kept
        assert_eq!(transport.opens(), 1);
        assert!(client.is_connected().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_response_returns_no_response_after_timeout() {
        let start = Instant::now();
        let transport = StubTransport::new().no_response();
        let client = client(transport.clone(), fast_config());

        let err = client.call(&MethodCall::new("x")).await.unwrap_err();

        assert_eq!(err, RpcError::NoResponse);
        assert!(start.elapsed() >= Duration::from_secs(3));
        // every dead stream is replaced before the next attempt
        assert_eq!(transport.sends(), 4);
        assert_eq!(transport.opens(), 4);
        assert_eq!(transport.closes(), 4);
        assert!(!client.is_connected().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_failures_then_success() {
        let start = Instant::now();
        let transport = StubTransport::new()
            .script(vec![Reply::NoResponse, Reply::Status(502, Bytes::from_static(b"bad gateway"))])
            .echo();
        let client = client(transport.clone(), ClientConfig::default());

        let result = client.call(&MethodCall::new("echo").with_param("ok")).await.unwrap();

        assert_eq!(result, Value::from("ok"));
        assert_eq!(transport.sends(), 3);
        assert_eq!(transport.opens(), 2);
        assert_eq!(start.elapsed(), Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_decode_error_is_not_retried() {
        let transport = StubTransport::new().respond_with_status(200, "this is not xml");
        let client = client(transport.clone(), ClientConfig::default());

        let err = client.call(&MethodCall::new("x")).await.unwrap_err();

        assert!(matches!(err, RpcError::Decode(_)));
        assert_eq!(transport.sends(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fault_ends_call_immediately() {
        let transport = StubTransport::new().respond_with_fault(Fault::new(4, "Too many parameters."));
        let client = client(transport.clone(), ClientConfig::default());

        let err = client.call(&MethodCall::new("x")).await.unwrap_err();

        assert_eq!(err, RpcError::Fault { code: 4, message: "Too many parameters.".into() });
        assert_eq!(transport.sends(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_status_errors_final_when_configured() {
        let transport = StubTransport::new().respond_with_status(404, "not here");
        let client = client(transport.clone(), ClientConfig::new().with_status_errors_final(true));

        let err = client.call(&MethodCall::new("x")).await.unwrap_err();

        assert!(err.is_status_error());
        assert_eq!(transport.sends(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_connect_failures_surface_as_transport_error() {
        let start = Instant::now();
        let transport = StubTransport::new().fail_opens(usize::MAX);
        let config = fast_config().with_connect_timeout(Duration::from_secs(2));
        let client = client(transport.clone(), config);

        let err = client.call(&MethodCall::new("x")).await.unwrap_err();

        assert!(matches!(err, RpcError::Transport(_)));
        // two outer attempts, each running its own 2s reconnect loop
        assert_eq!(transport.open_attempts(), 6);
        assert_eq!(transport.sends(), 0);
        assert_eq!(start.elapsed(), Duration::from_secs(4));
    }

    #[tokio::test(start_paused = true)]
    async fn test_call_with_timeout_overrides_config() {
        let transport = StubTransport::new().respond_with_status(503, "busy");
        let client = client(transport.clone(), ClientConfig::default());

        let _ = client.call_with_timeout(&MethodCall::new("x"), Duration::from_secs(1)).await;

        assert_eq!(transport.sends(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_loopback_round_trip_preserves_value() {
        let transport = StubTransport::new().echo();
        let client = client(transport, ClientConfig::default());
        let value = Value::structure([
            ("id", Value::Int64(9_000_000_000)),
            ("name", Value::from("crate & barrel <ltd>")),
            ("ratio", Value::Double(0.25)),
            ("blob", Value::Base64(vec![1, 2, 3])),
            ("when", Value::DateTime("20261019T08:30:00".into())),
            ("tags", Value::Array(vec![Value::from("a"), Value::Boolean(false), Value::Nil])),
        ]);

        let result = client.call(&MethodCall::new("echo").with_param(value.clone())).await.unwrap();

        assert_eq!(result, value);
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_then_call_reconnects() {
        let transport = StubTransport::new().echo();
        let client = client(transport.clone(), ClientConfig::default());

        client.call(&MethodCall::new("echo").with_param(1)).await.unwrap();
        client.close().await;
        assert!(!client.is_connected().await);

        client.call(&MethodCall::new("echo").with_param(2)).await.unwrap();
        assert_eq!(transport.opens(), 2);
        assert_eq!(transport.closes(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_calls_share_one_connection() {
        let transport = StubTransport::new().echo();
        let client = Arc::new(client(transport.clone(), ClientConfig::default()));

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let client = client.clone();
                tokio::spawn(async move { client.call(&MethodCall::new("echo").with_param(i)).await })
            })
            .collect();

        for (i, handle) in handles.into_iter().enumerate() {
            assert_eq!(handle.await.unwrap().unwrap(), Value::Int(i as i32));
        }
        assert_eq!(transport.opens(), 1);
        assert_eq!(transport.sends(), 8);
    }
}
