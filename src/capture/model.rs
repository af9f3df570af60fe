//! The canonical in-memory capture of one inbound request.
//!
//! # Responsibilities
//! - Resolve the target host (override, then `Host` header, then URI authority)
//! - Copy headers in arrival order, dropping `Referer`
//! - Read the body eagerly when a positive length is declared
//!
//! # Design Decisions
//! - Header names are stored in canonical MIME form since the wire form is lowercased
//! - `Host` is lifted out of the header list into `host`, as the server
//!   transport exposes it separately from the other headers
//! - Eligibility for persistence is decided by `is_complete`, not at parse time

use axum::body::{Body, Bytes};
use axum::http::{header, request::Parts, HeaderMap, Version};

use crate::capture::classify;
use crate::error::DispatchError;

/// Header name removed from every capture.
pub const DROPPED_HEADER: &str = "Referer";

/// Ordered mapping from header name to its values.
///
/// Names compare case-sensitively; callers store canonical names.
/// Values keep their wire bytes, which need not be UTF-8.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderList {
    entries: Vec<(String, Vec<Bytes>)>,
}

impl HeaderList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a value, grouping it with earlier values of the same name.
    pub fn append(&mut self, name: impl Into<String>, value: impl Into<Bytes>) {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some((_, values)) => values.push(value),
            None => self.entries.push((name, vec![value])),
        }
    }

    pub fn get(&self, name: &str) -> Option<&[Bytes]> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, values)| values.as_slice())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Remove a header and return its values.
    pub fn remove(&mut self, name: &str) -> Option<Vec<Bytes>> {
        let index = self.entries.iter().position(|(n, _)| n == name)?;
        Some(self.entries.remove(index).1)
    }

    /// Iterate headers in arrival order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Bytes])> {
        self.entries
            .iter()
            .map(|(name, values)| (name.as_str(), values.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl From<&HeaderMap> for HeaderList {
    fn from(map: &HeaderMap) -> Self {
        let mut list = HeaderList::new();
        for name in map.keys() {
            let canonical = canonical_header_name(name.as_str());
            for value in map.get_all(name) {
                list.append(canonical.clone(), Bytes::copy_from_slice(value.as_bytes()));
            }
        }
        list
    }
}

/// Canonical MIME form of a header name: `x-forwarded-for` becomes `X-Forwarded-For`.
///
/// Names containing characters outside the token set are returned unchanged.
pub fn canonical_header_name(name: &str) -> String {
    let is_token = |c: char| c.is_ascii_alphanumeric() || "!#$%&'*+-.^_`|~".contains(c);
    if name.is_empty() || !name.chars().all(is_token) {
        return name.to_string();
    }

    let mut upper = true;
    name.chars()
        .map(|c| {
            let out = if upper {
                c.to_ascii_uppercase()
            } else {
                c.to_ascii_lowercase()
            };
            upper = c == '-';
            out
        })
        .collect()
}

/// One captured inbound request.
#[derive(Debug, Clone, Default)]
pub struct CapturedRequest {
    /// Resolved target authority.
    pub host: String,
    /// Raw request target, query string included.
    pub uri: String,
    /// Method token, case preserved.
    pub method: String,
    /// HTTP version, e.g. `HTTP/1.1`.
    pub protocol: String,
    /// Declared body length; `-1` when unknown.
    pub content_length: i64,
    pub headers: HeaderList,
    pub body: Bytes,
}

impl CapturedRequest {
    /// Build a capture from the request head. The body stays empty until
    /// [`read_body`](Self::read_body) runs.
    pub fn from_parts(parts: &Parts, host_override: Option<&str>) -> Self {
        let mut headers = HeaderList::from(&parts.headers);
        headers.remove(DROPPED_HEADER);
        let host_header = headers
            .remove("Host")
            .and_then(|values| values.into_iter().next())
            .map(|value| String::from_utf8_lossy(&value).into_owned());

        let host = match host_override.filter(|h| !h.is_empty()) {
            Some(target) => target.to_string(),
            None => host_header
                .or_else(|| parts.uri.authority().map(|a| a.to_string()))
                .unwrap_or_default(),
        };

        Self {
            host,
            uri: parts.uri.to_string(),
            method: parts.method.as_str().to_string(),
            protocol: protocol_name(parts.version),
            content_length: declared_content_length(&parts.headers),
            headers,
            body: Bytes::new(),
        }
    }

    /// Read the whole body when a positive length was declared.
    pub async fn read_body(&mut self, body: Body, limit: usize) -> Result<(), DispatchError> {
        if self.content_length <= 0 {
            return Ok(());
        }
        self.body = axum::body::to_bytes(body, limit)
            .await
            .map_err(DispatchError::Parse)?;
        Ok(())
    }

    /// True when the body read matches the declared length exactly.
    pub fn is_complete(&self) -> bool {
        i64::try_from(self.body.len()).is_ok_and(|len| len == self.content_length)
    }

    pub fn tag(&self) -> String {
        classify::tag(&self.method, &self.uri)
    }
}

fn declared_content_length(headers: &HeaderMap) -> i64 {
    if let Some(value) = headers.get(header::CONTENT_LENGTH) {
        return value
            .to_str()
            .ok()
            .and_then(|v| v.trim().parse::<i64>().ok())
            .unwrap_or(-1);
    }
    if headers.contains_key(header::TRANSFER_ENCODING) {
        return -1;
    }
    0
}

fn protocol_name(version: Version) -> String {
    format!("{:?}", version)
}
