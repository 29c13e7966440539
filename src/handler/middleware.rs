//! Passes applied to every resolution before it is written out.

use std::time::SystemTime;

use log::warn;

use super::{Context, Resolution};
use crate::config::Config;
use crate::http::headers::Headers;
use crate::http::response::Coding;
use crate::http::status::Status;

/// Parses a `Name:Value` per line blob, splitting on the first colon only.
fn parse_header_blob(blob: &str) -> Headers {
    let mut headers = Headers::new();
    for line in blob.lines() {
        if let Some((name, value)) = line.split_once(':') {
            let name = name.trim();
            if !name.is_empty() {
                headers.set(name, value.trim());
            }
        }
    }
    headers
}

fn forced_status(config: &Config) -> Option<Status> {
    match config.get("status") {
        "" => None,
        code => Status::parse(code)
            .inspect_err(|err| warn!("Ignoring status override: {}", err))
            .ok(),
    }
}

/// Forced status and extra headers from the host, then from the document,
/// the latter winning on collision.
pub(crate) fn apply_overrides(ctx: &Context<'_>, res: &mut Resolution) {
    let host = ctx.request.host();
    let layers = [host.config(), host.document_config(ctx.request.path())];

    for config in layers {
        if let Some(status) = forced_status(config) {
            res.status = status;
        }
    }
    for config in layers {
        res.headers.merge(&parse_header_blob(config.get("headers")));
    }
}

/// `Server`, `Date`, `Connection` and the content coding negotiated from
/// `Accept-Encoding`. A compressed body loses its `Content-Length`.
pub(crate) fn apply_general_headers(ctx: &Context<'_>, res: &mut Resolution) -> Coding {
    let coding = Coding::negotiate(ctx.request.header("Accept-Encoding"));
    if coding != Coding::Identity {
        res.headers.remove("Content-Length");
    }
    res.headers.set("Content-Encoding", coding.as_str());

    res.headers.set("Server", ctx.settings.get("servername"));
    res.headers.set("Date", &httpdate::fmt_http_date(SystemTime::now()));
    res.headers.set("Connection", "close");
    coding
}
