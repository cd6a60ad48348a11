use bytes::Bytes;
use thiserror::Error;

/// Failure taxonomy for one logical RPC call.
///
/// The variants separate "the server replied but rejected us"
/// ([`HttpStatus`](RpcError::HttpStatus), [`Fault`](RpcError::Fault)) from
/// "nothing usable came back" ([`NoResponse`](RpcError::NoResponse)) and from
/// "we never got a connection" ([`Transport`](RpcError::Transport)).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RpcError {
    /// The stream closed, the write failed or the response could not be parsed.
    #[error("No response received")]
    NoResponse,

    /// The server answered with a status other than 200.
    #[error("HTTP status {code}: {}", String::from_utf8_lossy(.body))]
    HttpStatus { code: u16, body: Bytes },

    /// A connection to the endpoint could not be established.
    #[error("Transport error: {0}")]
    Transport(String),

    /// A 200 response whose body is not a valid payload.
    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Encode error: {0}")]
    Encode(String),

    /// The remote procedure itself reported a fault.
    #[error("Remote fault {code}: {message}")]
    Fault { code: i32, message: String },

    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),
}

impl RpcError {
    /// Returns `true` for [`RpcError::NoResponse`].
    pub fn is_no_response(&self) -> bool {
        matches!(self, RpcError::NoResponse)
    }

    /// Returns `true` for [`RpcError::HttpStatus`].
    pub fn is_status_error(&self) -> bool {
        matches!(self, RpcError::HttpStatus { .. })
    }

    /// Whether this error must leave a retry loop immediately.
    ///
    /// Network-level failures (no response, status errors, connect failures)
    /// are retried; anything that says the payload or the call itself is bad
    /// is not.
    pub fn is_final(&self) -> bool {
        matches!(
            self,
            RpcError::Decode(_)
                | RpcError::Encode(_)
                | RpcError::Fault { .. }
                | RpcError::InvalidEndpoint(_)
        )
    }

    /// Response body of a status error as lossy UTF-8 text.
    pub fn body_text(&self) -> Option<String> {
        match self {
            RpcError::HttpStatus { body, .. } => Some(String::from_utf8_lossy(body).into_owned()),
            _ => None,
        }
    }
}

impl From<std::io::Error> for RpcError {
    fn from(err: std::io::Error) -> Self {
        RpcError::Transport(err.to_string())
    }
}

impl From<quick_xml::Error> for RpcError {
    fn from(err: quick_xml::Error) -> Self {
        RpcError::Decode(err.to_string())
    }
}

impl From<base64::DecodeError> for RpcError {
    fn from(err: base64::DecodeError) -> Self {
        RpcError::Decode(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, RpcError>;
