//! sturdyrpc common types and transport
//!
//! This crate provides the protocol definitions, the XML payload codec and the
//! transport layer shared by the sturdyrpc client and CLI.
//!
//! # Architecture
//!
//! - **Wire**: HTTP/1.1 `POST /` over a keep-alive TCP connection
//! - **Payload**: XML method calls and method responses
//! - **Success**: exactly status 200; any other status is an error carrying
//!   the numeric code and the raw body
//!
//! # Components
//!
//! - [`protocol`] - `Value`, `MethodCall`, `MethodResponse`, `Endpoint`, `RpcError`
//! - [`transport`] - transport traits, the HTTP transport and the XML codec

pub mod protocol;
pub mod transport;

pub use protocol::*;
