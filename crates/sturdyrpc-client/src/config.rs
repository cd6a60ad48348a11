//! Client configuration.

use std::time::Duration;

use crate::connection::ReconnectPolicy;

/// Default overall budget for one call (30 seconds).
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default spacing between attempts, for both calls and reconnects.
pub const DEFAULT_PACING_INTERVAL: Duration = Duration::from_secs(1);

/// Default budget for re-establishing a connection (30 seconds).
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// `user-agent` header sent with every request.
pub const DEFAULT_USER_AGENT: &str = concat!("sturdyrpc/", env!("CARGO_PKG_VERSION"));

/// Configuration for an [`RpcClient`](crate::RpcClient).
///
/// # Fields
///
/// - `timeout` - overall wall-clock budget per call (default: 30 seconds)
/// - `pacing_interval` - spacing between retries at the call and connect layers (default: 1 second)
/// - `connect_timeout` - budget of the reconnect loop (default: 30 seconds)
/// - `user_agent` - value of the `user-agent` header
/// - `status_errors_are_final` - stop retrying on non-200 statuses (default: false)
///
/// # Example
///
/// ```
/// use sturdyrpc_client::ClientConfig;
/// use std::time::Duration;
///
/// let config = ClientConfig::new()
///     .with_timeout(Duration::from_secs(5))
///     .with_user_agent("inventory-sync/2.1");
/// assert_eq!(config.timeout, Duration::from_secs(5));
/// assert_eq!(config.pacing_interval, Duration::from_secs(1));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    pub timeout: Duration,
    pub pacing_interval: Duration,
    pub connect_timeout: Duration,
    pub user_agent: String,
    /// When set, an HTTP status error ends the call immediately instead of
    /// being retried like every other failure.
    pub status_errors_are_final: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            pacing_interval: DEFAULT_PACING_INTERVAL,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            status_errors_are_final: false,
        }
    }
}

impl ClientConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_pacing_interval(mut self, interval: Duration) -> Self {
        self.pacing_interval = interval;
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_status_errors_final(mut self, is_final: bool) -> Self {
        self.status_errors_are_final = is_final;
        self
    }

    /// Reconnect policy derived from this configuration.
    pub fn reconnect_policy(&self) -> ReconnectPolicy {
        ReconnectPolicy {
            timeout: self.connect_timeout,
            interval: self.pacing_interval,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = ClientConfig::default();
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.pacing_interval, Duration::from_secs(1));
        assert_eq!(config.connect_timeout, Duration::from_secs(30));
        assert!(config.user_agent.starts_with("sturdyrpc/"));
        assert!(!config.status_errors_are_final);
    }

    #[test]
    fn test_reconnect_policy_follows_config() {
        let config = ClientConfig::new()
            .with_connect_timeout(Duration::from_secs(4))
            .with_pacing_interval(Duration::from_millis(250));
        assert_eq!(
            config.reconnect_policy(),
            ReconnectPolicy {
                timeout: Duration::from_secs(4),
                interval: Duration::from_millis(250),
            }
        );
    }
}
