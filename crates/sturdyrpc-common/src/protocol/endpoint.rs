//! Remote endpoint address

use std::fmt;
use std::str::FromStr;

use super::error::RpcError;

/// The fixed address a client talks to.
///
/// Accepts `host:port` or `http://host:port` (with an optional trailing
/// slash). The scheme is informational only; connections are plain TCP.
///
/// # Example
///
/// ```
/// use sturdyrpc_common::protocol::Endpoint;
///
/// let ep: Endpoint = "http://127.0.0.1:8080/".parse().unwrap();
/// assert_eq!(ep.host(), "127.0.0.1");
/// assert_eq!(ep.port(), 8080);
/// assert_eq!(ep.to_string(), "127.0.0.1:8080");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Endpoint {
    host: String,
    port: u16,
}

impl Endpoint {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Endpoint {
            host: host.into(),
            port,
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// `host:port`, as used for TCP connect and the `host` header.
    pub fn authority(&self) -> String {
        self.to_string()
    }
}

impl FromStr for Endpoint {
    type Err = RpcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let rest = match s.split_once("://") {
            Some(("http", rest)) => rest,
            Some((scheme, _)) => {
                return Err(RpcError::InvalidEndpoint(format!(
                    "unsupported scheme '{}' in '{}'",
                    scheme, s
                )));
            }
            None => s,
        };
        let rest = rest.strip_suffix('/').unwrap_or(rest);

        let (host, port) = rest
            .rsplit_once(':')
            .ok_or_else(|| RpcError::InvalidEndpoint(format!("missing port in '{}'", s)))?;
        // Bracketed IPv6 literals keep their brackets out of the host
        let host = host
            .strip_prefix('[')
            .and_then(|h| h.strip_suffix(']'))
            .unwrap_or(host);
        if host.is_empty() || host.contains('/') {
            return Err(RpcError::InvalidEndpoint(format!("invalid host in '{}'", s)));
        }
        let port = port
            .parse::<u16>()
            .map_err(|e| RpcError::InvalidEndpoint(format!("invalid port in '{}': {}", s, e)))?;

        Ok(Endpoint::new(host, port))
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}
