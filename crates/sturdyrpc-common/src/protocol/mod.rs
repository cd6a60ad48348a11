pub mod endpoint;
pub mod error;
pub mod requests;
pub mod responses;
pub mod value;


pub use endpoint::Endpoint;
pub use error::{Result, RpcError};
pub use requests::MethodCall;
pub use responses::{Fault, MethodResponse};
pub use value::Value;
