//! Upstream forwarding.
//!
//! # Responsibilities
//! - Build the outbound request from a [`CapturedRequest`]
//! - Issue it against `<scheme>://<host><uri>`
//! - Relay the upstream response to the caller unchanged
//!
//! # Design Decisions
//! - Redirects are not followed; a 3xx is relayed like any other status
//! - System proxy variables are ignored
//! - `Content-Length` and `Transfer-Encoding` are recomputed by the client from the captured body
//! - No retries: one attempt per request

use std::time::Duration;

use axum::body::Body;
use axum::response::Response;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_LENGTH, TRANSFER_ENCODING};
use reqwest::{redirect, Method};
use url::Url;

use crate::capture::model::{CapturedRequest, HeaderList};
use crate::config::UpstreamConfig;
use crate::error::DispatchError;

/// Issues captured requests against the upstream.
#[derive(Debug, Clone)]
pub struct Forwarder {
    client: reqwest::Client,
    scheme: &'static str,
}

impl Forwarder {
    pub fn new(config: &UpstreamConfig) -> Result<Self, DispatchError> {
        let mut builder = reqwest::Client::builder()
            .redirect(redirect::Policy::none())
            .no_proxy();
        if let Some(secs) = config.connect_timeout_secs {
            builder = builder.connect_timeout(Duration::from_secs(secs));
        }
        if let Some(secs) = config.request_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        Ok(Self {
            client: builder.build().map_err(DispatchError::ClientInit)?,
            scheme: config.scheme(),
        })
    }

    pub fn upstream_url(&self, request: &CapturedRequest) -> Result<Url, DispatchError> {
        if request.host.is_empty() {
            return Err(DispatchError::ProxyBuild("no target host".to_string()));
        }
        let raw = format!("{}://{}{}", self.scheme, request.host, request.uri);
        Url::parse(&raw).map_err(|e| DispatchError::ProxyBuild(format!("{}: {}", raw, e)))
    }

    /// Build the outbound request.
    pub fn build(&self, request: &CapturedRequest) -> Result<reqwest::Request, DispatchError> {
        let method = Method::from_bytes(request.method.as_bytes())
            .map_err(|e| DispatchError::ProxyBuild(e.to_string()))?;
        let url = self.upstream_url(request)?;

        let mut builder = self
            .client
            .request(method, url)
            .headers(outbound_headers(&request.headers)?);
        if !request.body.is_empty() {
            builder = builder.body(request.body.clone());
        }
        builder
            .build()
            .map_err(|e| DispatchError::ProxyBuild(e.to_string()))
    }

    pub async fn execute(&self, request: reqwest::Request) -> Result<reqwest::Response, DispatchError> {
        self.client
            .execute(request)
            .await
            .map_err(DispatchError::ProxyCall)
    }
}

fn outbound_headers(headers: &HeaderList) -> Result<HeaderMap, DispatchError> {
    let mut map = HeaderMap::new();
    for (name, values) in headers.iter() {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| DispatchError::ProxyBuild(format!("header {:?}: {}", name, e)))?;
        if name == CONTENT_LENGTH || name == TRANSFER_ENCODING {
            continue;
        }
        for value in values {
            let value = HeaderValue::from_bytes(value)
                .map_err(|e| DispatchError::ProxyBuild(format!("header {}: {}", name, e)))?;
            map.append(name.clone(), value);
        }
    }
    Ok(map)
}

/// Turn the upstream response into the caller's response.
///
/// Upstream headers are appended, never replacing, and the body is streamed through.
pub fn relay(upstream: reqwest::Response) -> Response {
    let status = upstream.status();
    let headers = upstream.headers().clone();

    let mut response = Response::new(Body::from_stream(upstream.bytes_stream()));
    *response.status_mut() = status;
    let out = response.headers_mut();
    for (name, value) in headers.iter() {
        out.append(name.clone(), value.clone());
    }
    response
}
