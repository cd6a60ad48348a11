//! In-memory transport doubles for unit tests.
//!
//! [`StubTransport`] records every open, close and send in order and answers
//! requests from a scripted [`Reply`]. Clones share state, so a test keeps one
//! handle for assertions and hands another to the code under test.

use std::sync::{Arc, Mutex};

use hyper::body::Bytes;
use hyper::{HeaderMap, Request, Response, StatusCode};
use sturdyrpc_common::protocol::error::{Result, RpcError};
use sturdyrpc_common::protocol::{Endpoint, Fault, MethodResponse, Value};
use sturdyrpc_common::transport::{Connection, Transport, XmlCodec};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    Open(usize),
    OpenFailed,
    Close(usize),
    Send(usize),
}

#[derive(Debug, Clone)]
pub enum Reply {
    /// Decode the call and answer with its first parameter.
    Echo,
    Status(u16, Bytes),
    Fault(Fault),
    NoResponse,
}

#[derive(Debug)]
struct State {
    events: Vec<Event>,
    next_id: usize,
    fail_opens: usize,
    replies: Vec<Reply>,
    default_reply: Reply,
    last_request: Option<(HeaderMap, Bytes)>,
}

#[derive(Debug, Clone)]
pub struct StubTransport {
    state: Arc<Mutex<State>>,
}

impl StubTransport {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(State {
                events: Vec::new(),
                next_id: 0,
                fail_opens: 0,
                replies: Vec::new(),
                default_reply: Reply::Echo,
                last_request: None,
            })),
        }
    }

    /// The next `n` opens fail with a transport error.
    pub fn fail_opens(self, n: usize) -> Self {
        self.set_fail_opens(n);
        self
    }

    pub fn set_fail_opens(&self, n: usize) {
        self.state.lock().unwrap().fail_opens = n;
    }

    pub fn echo(self) -> Self {
        self.set_reply(Reply::Echo);
        self
    }

    pub fn respond_with_status(self, code: u16, body: &'static str) -> Self {
        self.set_reply(Reply::Status(code, Bytes::from_static(body.as_bytes())));
        self
    }

    pub fn respond_with_fault(self, fault: Fault) -> Self {
        self.set_reply(Reply::Fault(fault));
        self
    }

    pub fn no_response(self) -> Self {
        self.set_reply(Reply::NoResponse);
        self
    }

    /// Replaces the reply used once the scripted queue is empty.
    pub fn set_reply(&self, reply: Reply) {
        self.state.lock().unwrap().default_reply = reply;
    }

    /// Queues one-shot replies consumed before the default reply.
    pub fn script(self, replies: Vec<Reply>) -> Self {
        self.state.lock().unwrap().replies = replies;
        self
    }

    pub fn events(&self) -> Vec<Event> {
        self.state.lock().unwrap().events.clone()
    }

    fn count(&self, pred: impl Fn(&Event) -> bool) -> usize {
        self.events().iter().filter(|e| pred(e)).count()
    }

    /// Successful opens.
    pub fn opens(&self) -> usize {
        self.count(|e| matches!(e, Event::Open(_)))
    }

    /// Opens including failed ones.
    pub fn open_attempts(&self) -> usize {
        self.count(|e| matches!(e, Event::Open(_) | Event::OpenFailed))
    }

    pub fn closes(&self) -> usize {
        self.count(|e| matches!(e, Event::Close(_)))
    }

    pub fn sends(&self) -> usize {
        self.count(|e| matches!(e, Event::Send(_)))
    }

    pub fn last_request(&self) -> Option<Request<Bytes>> {
        let (headers, body) = self.state.lock().unwrap().last_request.clone()?;
        let mut request = Request::new(body);
        *request.headers_mut() = headers;
        Some(request)
    }
}

impl Transport for StubTransport {
    type Connection = StubConnection;

    async fn open(&self, endpoint: &Endpoint) -> Result<StubConnection> {
        let mut state = self.state.lock().unwrap();
        if state.fail_opens > 0 {
            state.fail_opens -= 1;
            state.events.push(Event::OpenFailed);
            return Err(RpcError::Transport(format!("connection to {} refused", endpoint)));
        }
        let id = state.next_id;
        state.next_id += 1;
        state.events.push(Event::Open(id));
        Ok(StubConnection {
            id,
            state: self.state.clone(),
        })
    }
}

#[derive(Debug)]
pub struct StubConnection {
    id: usize,
    state: Arc<Mutex<State>>,
}

impl StubConnection {
    pub fn id(&self) -> usize {
        self.id
    }
}

fn respond(status: u16, body: Bytes) -> Result<Response<Bytes>> {
    let status = StatusCode::from_u16(status).map_err(|e| RpcError::Transport(e.to_string()))?;
    let mut response = Response::new(body);
    *response.status_mut() = status;
    Ok(response)
}

impl Connection for StubConnection {
    async fn send(&mut self, request: Request<Bytes>) -> Result<Response<Bytes>> {
        let reply = {
            let mut state = self.state.lock().unwrap();
            state.events.push(Event::Send(self.id));
            state.last_request = Some((request.headers().clone(), request.body().clone()));
            if state.replies.is_empty() {
                state.default_reply.clone()
            } else {
                state.replies.remove(0)
            }
        };

        match reply {
            Reply::Echo => {
                let call = XmlCodec::decode_call(request.body())?;
                let value = call.params.into_iter().next().unwrap_or(Value::Nil);
                let body = XmlCodec::encode_response(&MethodResponse::Success(value))?;
                respond(200, Bytes::from(body))
            }
            Reply::Status(code, body) => respond(code, body),
            Reply::Fault(fault) => {
                let body = XmlCodec::encode_response(&MethodResponse::Fault(fault))?;
                respond(200, Bytes::from(body))
            }
            Reply::NoResponse => Err(RpcError::Transport("connection closed by peer".into())),
        }
    }

    async fn close(self) {
        self.state.lock().unwrap().events.push(Event::Close(self.id));
    }
}
