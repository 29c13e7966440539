//! Reading and parsing of a raw HTTP/1.x request.
//!
//! Reading is line oriented: lines are collected until the blank line that
//! ends the headers, then exactly `Content-Length` body bytes are read.
//! Parsing classifies each collected line as the request line or a header
//! line; anything else is logged and skipped, never fatal.

use std::future::Future;
use std::time::Duration;

use async_std::io::{self, BufRead};
use async_std::io::prelude::*;
use log::{debug, trace};
use url::Url;

use crate::error::ReadError;
use crate::http::HttpMethod;
use crate::http::headers::Headers;

/// Bytes received for one request, before interpretation.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RawRequest {
    pub lines: Vec<String>,
    pub body: Vec<u8>,
}

/// The interpreted request line and headers.
#[derive(Debug, Default, Clone)]
pub struct RequestHead {
    pub method: Option<HttpMethod>,
    pub path: String,
    pub query: String,
    pub protocol: String,
    pub headers: Headers,
}

/// Request line and headers together, line terminators included.
pub const MAX_HEADER_SIZE: usize = 8 * 1024;
pub const MAX_BODY_SIZE: usize = 1024 * 1024;

/// Bounds applied while reading one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadLimits {
    /// Applies to every single read; `None` waits forever.
    pub idle: Option<Duration>,
    pub max_header_size: usize,
    pub max_body_size: usize,
}

impl Default for ReadLimits {
    fn default() -> Self {
        Self {
            idle: None,
            max_header_size: MAX_HEADER_SIZE,
            max_body_size: MAX_BODY_SIZE,
        }
    }
}

async fn with_idle_timeout<F, T>(idle: Option<Duration>, op: F) -> io::Result<T>
where
    F: Future<Output = io::Result<T>>,
{
    match idle {
        Some(limit) => io::timeout(limit, op).await,
        None => op.await,
    }
}

/// Reads one request from `reader`.
///
/// Every read is bounded by the idle timeout; hitting it yields
/// [`ReadError::Timeout`]. A peer that closes before sending anything yields
/// [`ReadError::Closed`]. No line is buffered past the header budget, and a
/// declared body over the limit is refused before any of it is read.
pub async fn read_request<R>(reader: &mut R, limits: ReadLimits) -> Result<RawRequest, ReadError>
where
    R: BufRead + Unpin,
{
    let mut raw = RawRequest::default();
    let mut content_length = 0;
    let mut head_size = 0;

    loop {
        let mut buf = Vec::new();
        let budget = (limits.max_header_size - head_size) as u64 + 1;
        let n = with_idle_timeout(
            limits.idle,
            (&mut *reader).take(budget).read_until(b'\n', &mut buf),
        )
        .await?;
        if n == 0 {
            if raw.lines.is_empty() {
                return Err(ReadError::Closed);
            }
            break;
        }

        head_size += n;
        if head_size > limits.max_header_size {
            return Err(ReadError::HeadersTooLarge(limits.max_header_size));
        }

        let line = String::from_utf8_lossy(&buf);
        let line = line.trim_end_matches(['\r', '\n']);
        if line.is_empty() {
            break;
        }
        if let Some(length) = content_length_of(line) {
            content_length = length;
        }
        raw.lines.push(line.to_string());
    }

    if content_length > limits.max_body_size {
        return Err(ReadError::PayloadTooLarge {
            length: content_length,
            limit: limits.max_body_size,
        });
    }
    if content_length > 0 {
        let mut limited = (&mut *reader).take(content_length as u64);
        with_idle_timeout(limits.idle, limited.read_to_end(&mut raw.body)).await?;
    }

    Ok(raw)
}

/// `Content-Length` value of a header line; absent, negative or non-numeric
/// lengths count as 0.
fn content_length_of(line: &str) -> Option<usize> {
    let (name, value) = line.split_once(':')?;
    if !name.trim().eq_ignore_ascii_case("Content-Length") {
        return None;
    }
    Some(value.trim().parse::<usize>().unwrap_or(0))
}

pub fn parse_head(lines: &[String]) -> RequestHead {
    let mut head = RequestHead::default();

    for line in lines {
        if let Some((method, target, protocol)) = parse_request_line(line) {
            let (path, query) = split_target(target);
            head.method = Some(method);
            head.path = path;
            head.query = query;
            head.protocol = protocol.to_string();
            trace!("Request line encountered: {}", line);
        } else if let Some((name, value)) = parse_header_line(line) {
            head.headers.set(name, value);
            trace!("Header encountered: {}", line);
        } else {
            trace!("Unexpected line ignored: {}", line);
        }
    }

    head
}

/// `<METHOD> <target> HTTP/<major>[.<minor>]`
fn parse_request_line(line: &str) -> Option<(HttpMethod, &str, &str)> {
    let mut parts = line.split_whitespace();
    let (method, target, protocol) = (parts.next()?, parts.next()?, parts.next()?);
    if parts.next().is_some() {
        return None;
    }

    let method = method.parse::<HttpMethod>().ok()?;
    is_protocol(protocol).then_some((method, target, protocol))
}

fn is_protocol(protocol: &str) -> bool {
    let digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());

    match protocol.strip_prefix("HTTP/") {
        Some(version) => match version.split_once('.') {
            Some((major, minor)) => digits(major) && digits(minor),
            None => digits(version),
        },
        None => false,
    }
}

/// `<token>: <value>`, split on the first colon only.
fn parse_header_line(line: &str) -> Option<(&str, &str)> {
    let (name, value) = line.split_once(':')?;
    let name = name.trim();
    let is_token = name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if name.is_empty() || !is_token {
        return None;
    }
    Some((name, value.trim()))
}

/// Splits a request target into path and query by parsing it as a URL once
/// trailing slashes are removed. Percent-encoding is left as sent. Targets
/// that do not parse give an empty path and query.
fn split_target(target: &str) -> (String, String) {
    let trimmed = target.trim_end_matches('/');
    if trimmed.is_empty() {
        return (String::new(), String::new());
    }

    let url = if trimmed.starts_with('/') {
        Url::parse(&format!("http://localhost{}", trimmed))
    } else {
        Url::parse(trimmed)
    };

    match url {
        Ok(url) => (
            url.path().to_string(),
            url.query().unwrap_or("").to_string(),
        ),
        Err(err) => {
            debug!("Malformed request target {:?}: {}", target, err);
            (String::new(), String::new())
        }
    }
}
