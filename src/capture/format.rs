//! Payload formatters.
//!
//! Four independent serializers turn a [`CapturedRequest`] into bytes:
//!
//! ```text
//! raw.payload       <len> <tag>\n<METHOD> <URI> <PROTO>\r\n<headers>\r\n\r\n<body>\r\n
//! httpjson.payload  {"host":..,"uri":..,"method":..,"tag":..,"headers":{..},"body":..}
//! uri.payload       <headers>\r\n<uri> <tag>\r\n                       (GET only)
//! uripost.payload   <headers>\r\n<content-length> <uri>\r\n<body>\r\n  (POST only)
//! ```
//!
//! Header lines are rendered as `[Name: v1, v2]`. Their order is not part of
//! the format: the synthetic `Host` line comes first, then arrival order.

use std::borrow::Cow;
use std::collections::BTreeMap;

use axum::body::Bytes;
use serde::Serialize;

use crate::capture::model::CapturedRequest;
use crate::error::DispatchError;

/// The payload files produced for a capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PayloadKind {
    Raw,
    HttpJson,
    UriPost,
    Uri,
}

impl PayloadKind {
    pub const ALL: [PayloadKind; 4] = [
        PayloadKind::Raw,
        PayloadKind::HttpJson,
        PayloadKind::UriPost,
        PayloadKind::Uri,
    ];

    pub fn file_name(self) -> &'static str {
        match self {
            PayloadKind::Raw => "raw.payload",
            PayloadKind::HttpJson => "httpjson.payload",
            PayloadKind::UriPost => "uripost.payload",
            PayloadKind::Uri => "uri.payload",
        }
    }

    /// Render the payload, or `None` when this kind does not apply to the method.
    pub fn render(self, request: &CapturedRequest) -> Result<Option<Vec<u8>>, DispatchError> {
        Ok(match self {
            PayloadKind::Raw => Some(format_raw(request)),
            PayloadKind::HttpJson => Some(format_json(request)?),
            PayloadKind::UriPost => format_uri_post(request),
            PayloadKind::Uri => format_uri(request),
        })
    }
}

/// Render headers as newline-separated `[Name: values]` lines.
///
/// Values are written as received, so the block is not necessarily UTF-8.
pub fn header_block(request: &CapturedRequest) -> Vec<u8> {
    let mut lines: Vec<Vec<u8>> = Vec::with_capacity(request.headers.len() + 1);
    if !request.headers.contains("Host") {
        lines.push(format!("[Host: {}]", request.host).into_bytes());
    }
    for (name, values) in request.headers.iter() {
        let mut line = format!("[{}: ", name).into_bytes();
        line.extend(join_values(values, b", "));
        line.push(b']');
        lines.push(line);
    }
    lines.join(&b'\n')
}

fn join_values(values: &[Bytes], separator: &[u8]) -> Vec<u8> {
    values
        .iter()
        .map(|value| value.as_ref())
        .collect::<Vec<&[u8]>>()
        .join(separator)
}

fn request_block(request: &CapturedRequest, headers: &[u8]) -> Vec<u8> {
    let mut block =
        format!("{} {} {}\r\n", request.method, request.uri, request.protocol).into_bytes();
    block.extend_from_slice(headers);
    block.extend_from_slice(b"\r\n\r\n");
    block.extend_from_slice(&request.body);
    block
}

/// Raw HTTP-like record prefixed by a length and tag.
///
/// The length is measured over the bracketed header rendering; the brackets
/// are stripped only afterwards, so the prefix exceeds the embedded block by
/// two bytes per header line.
pub fn format_raw(request: &CapturedRequest) -> Vec<u8> {
    let headers = header_block(request);
    let length = request_block(request, &headers).len();

    let stripped: Vec<u8> = headers
        .iter()
        .copied()
        .filter(|b| !matches!(b, b'[' | b']'))
        .collect();

    let mut out = format!("{} {}\n", length, request.tag()).into_bytes();
    out.extend(request_block(request, &stripped));
    out.extend_from_slice(b"\r\n");
    out
}

#[derive(Serialize)]
struct HttpJson<'a> {
    host: &'a str,
    uri: &'a str,
    method: &'a str,
    tag: String,
    headers: BTreeMap<&'a str, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    body: Option<Cow<'a, str>>,
}

/// JSON object with flattened headers. `body` is omitted when empty.
pub fn format_json(request: &CapturedRequest) -> Result<Vec<u8>, DispatchError> {
    let record = HttpJson {
        host: &request.host,
        uri: &request.uri,
        method: &request.method,
        tag: request.tag(),
        headers: request
            .headers
            .iter()
            .map(|(name, values)| {
                let joined = join_values(values, b", ");
                (name, String::from_utf8_lossy(&joined).into_owned())
            })
            .collect(),
        body: (!request.body.is_empty()).then(|| String::from_utf8_lossy(&request.body)),
    };
    Ok(serde_json::to_vec(&record)?)
}

/// URI listing for GET requests.
pub fn format_uri(request: &CapturedRequest) -> Option<Vec<u8>> {
    if request.method != "GET" {
        return None;
    }
    let mut out = header_block(request);
    out.extend(format!("\r\n{} {}\r\n", request.uri, request.tag()).into_bytes());
    Some(out)
}

/// URI and body listing for POST requests.
pub fn format_uri_post(request: &CapturedRequest) -> Option<Vec<u8>> {
    if request.method != "POST" {
        return None;
    }
    let mut out = header_block(request);
    out.extend(format!("\r\n{} {}\r\n", request.content_length, request.uri).into_bytes());
    out.extend_from_slice(&request.body);
    out.extend_from_slice(b"\r\n");
    Some(out)
}
