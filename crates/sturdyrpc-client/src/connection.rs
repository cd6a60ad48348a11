//! Connection lifecycle
//!
//! [`ConnectionManager`] owns at most one open connection to the endpoint.
//! Opening is lazy: [`ensure_connected`](ConnectionManager::ensure_connected)
//! hands out the current connection if there is one and reconnects otherwise.
//! Reconnecting always closes the previous connection first, then retries the
//! open under its own time budget.

use std::time::Duration;

use sturdyrpc_common::protocol::Endpoint;
use sturdyrpc_common::protocol::error::Result;
use sturdyrpc_common::transport::{Connection, Transport};
use tracing::{debug, info, warn};

use crate::config::{DEFAULT_CONNECT_TIMEOUT, DEFAULT_PACING_INTERVAL};
use crate::retry::{every, retry};

/// Time budget and pacing for the reconnect loop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReconnectPolicy {
    pub timeout: Duration,
    pub interval: Duration,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_CONNECT_TIMEOUT,
            interval: DEFAULT_PACING_INTERVAL,
        }
    }
}

/// Owns the single connection slot of one client.
pub struct ConnectionManager<T: Transport> {
    transport: T,
    endpoint: Endpoint,
    connection: Option<T::Connection>,
    policy: ReconnectPolicy,
}

impl<T: Transport> ConnectionManager<T> {
    pub fn new(transport: T, endpoint: Endpoint, policy: ReconnectPolicy) -> Self {
        Self {
            transport,
            endpoint,
            connection: None,
            policy,
        }
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    /// Returns the open connection, reconnecting first if there is none.
    ///
    /// No network activity happens when a connection is already present.
    pub async fn ensure_connected(&mut self) -> Result<&mut T::Connection> {
        match self.connection {
            Some(ref mut conn) => Ok(conn),
            None => self.reconnect().await,
        }
    }

    /// Replaces the current connection with a freshly opened one.
    ///
    /// The old connection is closed and the slot emptied before the first
    /// open attempt, so the slot stays empty if every attempt fails.
    /// Open failures are retried until the policy's budget is spent; the last
    /// failure is then returned.
    pub async fn reconnect(&mut self) -> Result<&mut T::Connection> {
        self.disconnect().await;

        let transport = &self.transport;
        let endpoint = &self.endpoint;
        let outcome = retry(
            self.policy.timeout,
            every(self.policy.interval),
            |outcome: &Result<T::Connection>| outcome.is_ok(),
            || async move {
                let result = transport.open(endpoint).await;
                if let Err(ref e) = result {
                    warn!(%endpoint, error = %e, "Connection attempt failed");
                }
                result
            },
        )
        .await;

        match outcome {
            Ok(conn) => {
                info!(%endpoint, "Connected");
                Ok(self.connection.insert(conn))
            }
            Err(e) => {
                warn!(%endpoint, error = %e, "Giving up on connecting");
                Err(e)
            }
        }
    }

    /// Closes and forgets the current connection, if any.
    pub async fn disconnect(&mut self) {
        if let Some(conn) = self.connection.take() {
            debug!(endpoint = %self.endpoint, "Closing connection");
            conn.close().await;
        }
    }
}
