//! Transport layer
//!
//! # Components
//!
//! - **[`Transport`]** / **[`Connection`]**: capability traits the client core is written against
//! - **[`HttpTransport`]**: HTTP/1.1 over TCP, the production transport
//! - **[`XmlCodec`]**: payload encoding for request and response bodies

pub mod adapter;
pub mod codec;
pub mod http;

pub use adapter::{Connection, Transport};
pub use codec::XmlCodec;
pub use http::{HttpConnection, HttpTransport};
