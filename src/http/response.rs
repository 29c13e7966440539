use async_std::io::{self, Write};
use async_std::io::prelude::*;
use flate2::Compression;
use flate2::write::{GzEncoder, ZlibEncoder};

use crate::http::headers::Headers;
use crate::http::status::Status;

/// Transform applied to the body stream. Headers are never encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Coding {
    Identity,
    Gzip,
    Deflate,
}

impl Coding {
    /// Picks gzip, then deflate, from an `Accept-Encoding` value.
    pub fn negotiate(accept_encoding: &str) -> Self {
        if accept_encoding.contains("gzip") {
            Coding::Gzip
        } else if accept_encoding.contains("deflate") {
            Coding::Deflate
        } else {
            Coding::Identity
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Coding::Identity => "identity",
            Coding::Gzip => "gzip",
            Coding::Deflate => "deflate",
        }
    }

    pub fn encode(&self, data: &[u8]) -> io::Result<Vec<u8>> {
        use std::io::Write as _;

        match self {
            Coding::Identity => Ok(data.to_vec()),
            Coding::Gzip => {
                let mut e = GzEncoder::new(Vec::new(), Compression::default());
                e.write_all(data)?;
                e.finish()
            }
            Coding::Deflate => {
                let mut e = ZlibEncoder::new(Vec::new(), Compression::default());
                e.write_all(data)?;
                e.finish()
            }
        }
    }
}

pub struct Response {
    pub protocol: String,
    pub status: Status,
    pub headers: Headers,
    pub body: Vec<u8>,
    pub coding: Coding,
    /// Answers a HEAD request: headers only, no body bytes at all.
    pub head_only: bool,
}

impl Response {
    pub fn build_headers(&self) -> String {
        // <protocol> <status> <reason>\r\n
        // <header_name>: <header_value>\r\n
        // ...
        // \r\n
        format!(
            "{} {}\r\n{}\r\n",
            self.protocol,
            self.status,
            self.headers.stringify()
        )
    }

    /// Writes the head uncompressed, then the body through `coding`.
    pub async fn write_to<W>(&self, out: &mut W) -> io::Result<()>
    where
        W: Write + Unpin,
    {
        out.write_all(self.build_headers().as_bytes()).await?;
        if !self.head_only {
            let body = self.coding.encode(&self.body)?;
            out.write_all(&body).await?;
        }
        out.flush().await
    }
}
