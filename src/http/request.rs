use std::sync::Arc;

use crate::config::{Host, Sites};
use crate::http::HttpMethod;
use crate::http::headers::Headers;
use crate::http::parser::{RawRequest, RequestHead, parse_head};

/// One parsed request, bound to the virtual host it addresses.
#[derive(Debug, Clone)]
pub struct Request {
    method: Option<HttpMethod>,
    path: String,
    query: String,
    protocol: String,
    headers: Headers,
    body: Vec<u8>,
    host: Arc<Host>,
    peer: String,
}

impl Request {
    /// Builds the request and selects its host from the `Host` header,
    /// falling back to the default host.
    pub fn new(head: RequestHead, body: Vec<u8>, sites: &Sites, peer: &str) -> Self {
        let host = sites.host_for(head.headers.get("Host"));
        Self {
            method: head.method,
            path: head.path,
            query: head.query,
            protocol: head.protocol,
            headers: head.headers,
            body,
            host,
            peer: peer.to_string(),
        }
    }

    pub fn from_raw(raw: RawRequest, sites: &Sites, peer: &str) -> Self {
        Self::new(parse_head(&raw.lines), raw.body, sites, peer)
    }

    /// A request with nothing parsed, used when reading failed.
    pub fn empty(sites: &Sites, peer: &str) -> Self {
        Self::new(RequestHead::default(), Vec::new(), sites, peer)
    }

    pub fn method(&self) -> Option<HttpMethod> {
        self.method
    }

    /// The method as sent, or `""` when no request line was recognised.
    pub fn verb(&self) -> &'static str {
        self.method.map(|m| m.as_str()).unwrap_or("")
    }

    pub fn is_head(&self) -> bool {
        self.method == Some(HttpMethod::Head)
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn protocol(&self) -> &str {
        &self.protocol
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn header(&self, name: &str) -> &str {
        self.headers.get(name)
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn host(&self) -> &Host {
        &self.host
    }

    pub fn peer(&self) -> &str {
        &self.peer
    }
}
