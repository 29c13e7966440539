//! A multi virtual host HTTP/1.x server.
//!
//! Requests are read by [`net`], turned into a [`http::request::Request`]
//! bound to a virtual host from [`config`], resolved by the [`handler`]
//! chain and written back as a [`http::response::Response`].

pub mod config;
pub mod document;
pub mod error;
pub mod handler;
pub mod http;
pub mod net;

#[cfg(test)]
mod testutil;
