//! Response payload
//!
//! A 200 response body carries either a single return value or a fault
//! raised by the remote procedure.

use super::Value;
use super::error::RpcError;

/// Fault reported by the remote procedure.
#[derive(Debug, Clone, PartialEq)]
pub struct Fault {
    pub code: i32,
    pub message: String,
}

impl Fault {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Fault {
            code,
            message: message.into(),
        }
    }
}

impl From<Fault> for RpcError {
    fn from(fault: Fault) -> Self {
        RpcError::Fault {
            code: fault.code,
            message: fault.message,
        }
    }
}

/// A decoded method response.
///
/// # Example
///
/// ```
/// use sturdyrpc_common::protocol::{Fault, MethodResponse, RpcError, Value};
///
/// let ok = MethodResponse::Success(Value::from("South Dakota"));
/// assert_eq!(ok.into_result().unwrap(), Value::from("South Dakota"));
///
/// let fault = MethodResponse::Fault(Fault::new(4, "Too many parameters."));
/// assert!(matches!(fault.into_result(), Err(RpcError::Fault { code: 4, .. })));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum MethodResponse {
    Success(Value),
    Fault(Fault),
}

impl MethodResponse {
    /// Converts a fault into [`RpcError::Fault`].
    pub fn into_result(self) -> Result<Value, RpcError> {
        match self {
            MethodResponse::Success(value) => Ok(value),
            MethodResponse::Fault(fault) => Err(fault.into()),
        }
    }

    pub fn is_fault(&self) -> bool {
        matches!(self, MethodResponse::Fault(_))
    }
}
