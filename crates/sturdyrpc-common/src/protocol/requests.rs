//! Request payload
//!
//! This module defines the method call sent to the remote endpoint.

use super::Value;

/// A remote method invocation: a method name plus positional parameters.
///
/// # Example
///
/// ```
/// use sturdyrpc_common::protocol::{MethodCall, Value};
///
/// let call = MethodCall::new("examples.getStateName")
///     .with_param(41)
///     .with_param("verbose");
/// assert_eq!(call.method_name, "examples.getStateName");
/// assert_eq!(call.params, vec![Value::Int(41), Value::from("verbose")]);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct MethodCall {
    pub method_name: String,
    pub params: Vec<Value>,
}

impl MethodCall {
    /// Creates a call with no parameters.
    pub fn new(method_name: impl Into<String>) -> Self {
        MethodCall {
            method_name: method_name.into(),
            params: Vec::new(),
        }
    }

    /// Creates a call with the given parameters.
    pub fn with_params(method_name: impl Into<String>, params: Vec<Value>) -> Self {
        MethodCall {
            method_name: method_name.into(),
            params,
        }
    }

    /// Appends one positional parameter.
    pub fn with_param(mut self, param: impl Into<Value>) -> Self {
        self.params.push(param.into());
        self
    }
}
