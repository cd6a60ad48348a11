//! XML payload codec
//!
//! Encodes [`MethodCall`]s and [`MethodResponse`]s to the XML body format and
//! decodes them back. Parsing happens in two steps: the document is read into
//! a small element tree with `quick-xml`, and the tree is then interpreted.
//! Any structural problem is reported as [`RpcError::Decode`].

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use quick_xml::Reader;
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use std::collections::BTreeMap;

use crate::protocol::error::{Result, RpcError};
use crate::protocol::{Fault, MethodCall, MethodResponse, Value};

/// XML codec for method calls and responses.
///
/// # Example
///
/// ```
/// use sturdyrpc_common::protocol::{MethodCall, MethodResponse, Value};
/// use sturdyrpc_common::transport::XmlCodec;
///
/// let call = MethodCall::new("examples.getStateName").with_param(41);
/// let encoded = XmlCodec::encode_call(&call).unwrap();
/// assert_eq!(XmlCodec::decode_call(&encoded).unwrap(), call);
///
/// let body = br#"<?xml version="1.0"?>
/// <methodResponse><params><param><value><string>South Dakota</string></value></param></params></methodResponse>"#;
/// let response = XmlCodec::decode_response(body).unwrap();
/// assert_eq!(response, MethodResponse::Success(Value::from("South Dakota")));
/// ```
pub struct XmlCodec;

impl XmlCodec {
    /// Encode a method call to bytes
    pub fn encode_call(call: &MethodCall) -> Result<Vec<u8>> {
        let mut w = Writer::new(Vec::new());
        write_decl(&mut w)?;
        start(&mut w, "methodCall")?;
        text_element(&mut w, "methodName", &call.method_name)?;
        write_params(&mut w, &call.params)?;
        end(&mut w, "methodCall")?;
        Ok(w.into_inner())
    }

    /// Decode a method call from bytes
    pub fn decode_call(data: &[u8]) -> Result<MethodCall> {
        let root = parse_document(data)?;
        root.expect_name("methodCall")?;

        let method_name = root.child("methodName")?.text.clone();
        let params = match root.find("params") {
            Some(params) => read_params(params)?,
            None => Vec::new(),
        };

        Ok(MethodCall::with_params(method_name, params))
    }

    /// Encode a method response to bytes
    pub fn encode_response(response: &MethodResponse) -> Result<Vec<u8>> {
        let mut w = Writer::new(Vec::new());
        write_decl(&mut w)?;
        start(&mut w, "methodResponse")?;
        match response {
            MethodResponse::Success(value) => {
                write_params(&mut w, std::slice::from_ref(value))?;
            }
            MethodResponse::Fault(fault) => {
                start(&mut w, "fault")?;
                let fault_struct = Value::structure([
                    ("faultCode", Value::Int(fault.code)),
                    ("faultString", Value::String(fault.message.clone())),
                ]);
                write_value(&mut w, &fault_struct)?;
                end(&mut w, "fault")?;
            }
        }
        end(&mut w, "methodResponse")?;
        Ok(w.into_inner())
    }

    /// Decode a method response from bytes
    ///
    /// A `<fault>` decodes to [`MethodResponse::Fault`]; it is not an error
    /// at this layer.
    pub fn decode_response(data: &[u8]) -> Result<MethodResponse> {
        let root = parse_document(data)?;
        root.expect_name("methodResponse")?;

        if let Some(fault) = root.find("fault") {
            let value = read_value(fault.child("value")?)?;
            let code = value
                .get("faultCode")
                .and_then(Value::as_i32)
                .ok_or_else(|| decode_error("fault is missing an integer faultCode"))?;
            let message = value
                .get("faultString")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            return Ok(MethodResponse::Fault(Fault::new(code, message)));
        }

        let mut params = read_params(root.child("params")?)?;
        if params.len() != 1 {
            return Err(decode_error(format!(
                "expected exactly one response param, found {}",
                params.len()
            )));
        }
        Ok(MethodResponse::Success(params.remove(0)))
    }
}

fn decode_error(msg: impl Into<String>) -> RpcError {
    RpcError::Decode(msg.into())
}

fn encode_error(err: impl std::fmt::Display) -> RpcError {
    RpcError::Encode(err.to_string())
}

// ============================================================================
// Writing
// ============================================================================

fn write_decl(w: &mut Writer<Vec<u8>>) -> Result<()> {
    w.write_event(Event::Decl(BytesDecl::new("1.0", None, None)))
        .map_err(encode_error)
}

fn start(w: &mut Writer<Vec<u8>>, name: &str) -> Result<()> {
    w.write_event(Event::Start(BytesStart::new(name)))
        .map_err(encode_error)
}

fn end(w: &mut Writer<Vec<u8>>, name: &str) -> Result<()> {
    w.write_event(Event::End(BytesEnd::new(name)))
        .map_err(encode_error)
}

fn text_element(w: &mut Writer<Vec<u8>>, name: &str, text: &str) -> Result<()> {
    start(w, name)?;
    w.write_event(Event::Text(BytesText::new(text)))
        .map_err(encode_error)?;
    end(w, name)
}

fn write_params(w: &mut Writer<Vec<u8>>, params: &[Value]) -> Result<()> {
    start(w, "params")?;
    for param in params {
        start(w, "param")?;
        write_value(w, param)?;
        end(w, "param")?;
    }
    end(w, "params")
}

fn write_value(w: &mut Writer<Vec<u8>>, value: &Value) -> Result<()> {
    start(w, "value")?;
    match value {
        Value::Int(i) => text_element(w, "int", &i.to_string())?,
        Value::Int64(i) => text_element(w, "i8", &i.to_string())?,
        Value::Boolean(b) => text_element(w, "boolean", if *b { "1" } else { "0" })?,
        Value::String(s) => text_element(w, "string", s)?,
        Value::Double(d) => {
            if !d.is_finite() {
                return Err(RpcError::Encode(format!("cannot encode non-finite double {}", d)));
            }
            text_element(w, "double", &d.to_string())?
        }
        Value::DateTime(s) => text_element(w, "dateTime.iso8601", s)?,
        Value::Base64(bytes) => text_element(w, "base64", &STANDARD.encode(bytes))?,
        Value::Struct(members) => {
            start(w, "struct")?;
            for (name, member) in members {
                start(w, "member")?;
                text_element(w, "name", name)?;
                write_value(w, member)?;
                end(w, "member")?;
            }
            end(w, "struct")?;
        }
        Value::Array(items) => {
            start(w, "array")?;
            start(w, "data")?;
            for item in items {
                write_value(w, item)?;
            }
            end(w, "data")?;
            end(w, "array")?;
        }
        Value::Nil => {
            w.write_event(Event::Empty(BytesStart::new("nil")))
                .map_err(encode_error)?;
        }
    }
    end(w, "value")
}

// ============================================================================
// Reading
// ============================================================================

/// Minimal element tree produced by the first parsing pass.
#[derive(Debug, Default)]
struct Element {
    name: String,
    children: Vec<Element>,
    /// Concatenated character data directly inside this element.
    text: String,
}

impl Element {
    fn expect_name(&self, name: &str) -> Result<()> {
        if self.name == name {
            Ok(())
        } else {
            Err(decode_error(format!("expected <{}>, found <{}>", name, self.name)))
        }
    }

    fn find(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.name == name)
    }

    fn child(&self, name: &str) -> Result<&Element> {
        self.find(name)
            .ok_or_else(|| decode_error(format!("<{}> is missing <{}>", self.name, name)))
    }

    fn only_child(&self) -> Result<Option<&Element>> {
        match self.children.as_slice() {
            [] => Ok(None),
            [only] => Ok(Some(only)),
            _ => Err(decode_error(format!(
                "<{}> has {} children, expected one",
                self.name,
                self.children.len()
            ))),
        }
    }
}

/// Deepest element nesting accepted from a peer.
///
/// Interpreting and dropping the tree both recurse once per level.
pub const MAX_DEPTH: usize = 256;

fn parse_document(data: &[u8]) -> Result<Element> {
    let xml = std::str::from_utf8(data).map_err(|e| decode_error(e.to_string()))?;
    let mut reader = Reader::from_str(xml);

    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                if stack.len() >= MAX_DEPTH {
                    return Err(decode_error(format!("nesting too deep (limit {})", MAX_DEPTH)));
                }
                stack.push(Element {
                    name: String::from_utf8_lossy(e.name().as_ref()).into_owned(),
                    ..Element::default()
                });
            }
            Event::Empty(e) => {
                let element = Element {
                    name: String::from_utf8_lossy(e.name().as_ref()).into_owned(),
                    ..Element::default()
                };
                match stack.last_mut() {
                    Some(parent) => parent.children.push(element),
                    None => root = Some(element),
                }
            }
            Event::Text(e) => {
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(&e.unescape()?);
                }
            }
            Event::CData(e) => {
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(&String::from_utf8_lossy(&e.into_inner()));
                }
            }
            Event::End(_) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| decode_error("unbalanced closing tag"))?;
                match stack.last_mut() {
                    Some(parent) => parent.children.push(element),
                    None => root = Some(element),
                }
            }
            Event::Eof => break,
            // declarations, comments, processing instructions, doctype
            _ => {}
        }
    }

    if !stack.is_empty() {
        return Err(decode_error("unexpected end of document"));
    }
    root.ok_or_else(|| decode_error("empty document"))
}

fn read_params(params: &Element) -> Result<Vec<Value>> {
    params
        .children
        .iter()
        .filter(|c| c.name == "param")
        .map(|param| read_value(param.child("value")?))
        .collect()
}

fn read_value(value: &Element) -> Result<Value> {
    value.expect_name("value")?;

    let Some(typed) = value.only_child()? else {
        // untyped <value>text</value> defaults to string
        return Ok(Value::String(value.text.clone()));
    };

    let text = typed.text.as_str();
    match typed.name.as_str() {
        "int" | "i4" => text
            .trim()
            .parse()
            .map(Value::Int)
            .map_err(|e| decode_error(format!("invalid int '{}': {}", text, e))),
        "i8" => text
            .trim()
            .parse()
            .map(Value::Int64)
            .map_err(|e| decode_error(format!("invalid i8 '{}': {}", text, e))),
        "boolean" => match text.trim() {
            "1" => Ok(Value::Boolean(true)),
            "0" => Ok(Value::Boolean(false)),
            other => Err(decode_error(format!("invalid boolean '{}'", other))),
        },
        "string" => Ok(Value::String(text.to_string())),
        "double" => text
            .trim()
            .parse()
            .map(Value::Double)
            .map_err(|e| decode_error(format!("invalid double '{}': {}", text, e))),
        "dateTime.iso8601" => Ok(Value::DateTime(text.trim().to_string())),
        "base64" => {
            let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
            Ok(Value::Base64(STANDARD.decode(compact)?))
        }
        "struct" => {
            let mut members = BTreeMap::new();
            for member in typed.children.iter().filter(|c| c.name == "member") {
                let name = member.child("name")?.text.clone();
                members.insert(name, read_value(member.child("value")?)?);
            }
            Ok(Value::Struct(members))
        }
        "array" => typed
            .child("data")?
            .children
            .iter()
            .filter(|c| c.name == "value")
            .map(read_value)
            .collect::<Result<Vec<_>>>()
            .map(Value::Array),
        "nil" => Ok(Value::Nil),
        other => Err(decode_error(format!("unknown value type <{}>", other))),
    }
}
