//! One request/response cycle
//!
//! [`exchange`] encodes a call, writes it as an HTTP `POST /` on an open
//! connection, reads exactly one response and classifies it. It never
//! retries; that is the caller's job.

use hyper::body::Bytes;
use hyper::header::{CONNECTION, CONTENT_LENGTH, CONTENT_TYPE, HOST, USER_AGENT};
use hyper::{Method, Request, StatusCode};
use sturdyrpc_common::protocol::error::{Result, RpcError};
use sturdyrpc_common::protocol::{Endpoint, MethodCall, MethodResponse};
use sturdyrpc_common::transport::{Connection, XmlCodec};
use tracing::debug;

/// Builds the HTTP request carrying `body`.
pub fn build_request(endpoint: &Endpoint, user_agent: &str, body: Vec<u8>) -> Result<Request<Bytes>> {
    Request::builder()
        .method(Method::POST)
        .uri("/")
        .header(HOST, endpoint.authority())
        .header(USER_AGENT, user_agent)
        .header(CONTENT_TYPE, "text/xml")
        .header(CONTENT_LENGTH, body.len())
        .header(CONNECTION, "keep-alive")
        .body(Bytes::from(body))
        .map_err(|e| RpcError::Encode(format!("Failed to build request: {}", e)))
}

/// Performs one write/read cycle and classifies the outcome.
///
/// - no response (closed stream, write failure, malformed reply) → [`RpcError::NoResponse`]
/// - status 200 → the decoded body; a body that does not decode → [`RpcError::Decode`]
/// - any other status → [`RpcError::HttpStatus`] with the raw body
pub async fn exchange<C: Connection>(
    conn: &mut C,
    endpoint: &Endpoint,
    user_agent: &str,
    call: &MethodCall,
) -> Result<MethodResponse> {
    let body = XmlCodec::encode_call(call)?;
    let request = build_request(endpoint, user_agent, body)?;

    let response = match conn.send(request).await {
        Ok(response) => response,
        Err(e) => {
            debug!(%endpoint, method = %call.method_name, error = %e, "No response");
            return Err(RpcError::NoResponse);
        }
    };

    let status = response.status();
    let body = response.into_body();
    debug!(%endpoint, method = %call.method_name, status = status.as_u16(), bytes = body.len(), "Response received");

    if status == StatusCode::OK {
        let response = XmlCodec::decode_response(&body)?;
        if response.is_fault() {
            debug!(%endpoint, method = %call.method_name, "Remote fault");
        }
        Ok(response)
    } else {
        Err(RpcError::HttpStatus {
            code: status.as_u16(),
            body,
        })
    }
}
