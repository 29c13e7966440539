//! Request resolution.
//!
//! The [`Dispatcher`](dispatcher::Dispatcher) validates and routes a request
//! into a chain of [`Handler`]s: resource, directory, file, dynamic document
//! and error. Each handler produces a [`Resolution`] (status, headers and
//! document), delegating to the next one by calling it directly. A handler
//! failure never escapes the chain: it becomes an
//! [`ErrorHandler`](error::ErrorHandler) delegation carrying the diagnostic.

mod directory;
mod dispatcher;
mod dynamic;
mod error;
mod file;
mod middleware;
mod paths;
mod resource;

use log::debug;

use crate::config::Config;
use crate::document::Document;
use crate::error::HandlerError;
use crate::http::headers::Headers;
use crate::http::request::Request;
use crate::http::response::Response;
use crate::http::status::Status;

pub use directory::DirectoryHandler;
pub use dispatcher::Dispatcher;
pub use dynamic::DynamicHandler;
pub use error::ErrorHandler;
pub use file::FileHandler;
pub use resource::ResourceHandler;

/// What a handler sees: the request and the server-wide settings.
/// The virtual host travels with the request.
#[derive(Clone, Copy)]
pub struct Context<'a> {
    pub request: &'a Request,
    pub settings: &'a Config,
}

#[derive(Debug, Clone)]
pub struct Resolution {
    pub status: Status,
    pub headers: Headers,
    pub document: Document,
}

impl Resolution {
    /// Sets `Content-Type` and `Content-Length` from the document.
    pub fn with_document(status: Status, document: Document) -> Self {
        let mut headers = Headers::new();
        headers.set("Content-Type", document.mime());
        headers.set("Content-Length", &document.len().to_string());
        Self {
            status,
            headers,
            document,
        }
    }
}

pub trait Handler {
    fn try_resolve(&self, ctx: &Context<'_>) -> Result<Resolution, HandlerError>;

    /// Like [`Handler::try_resolve`], with failures turned into error pages.
    fn resolve(&self, ctx: &Context<'_>) -> Resolution {
        self.try_resolve(ctx).unwrap_or_else(|err| {
            debug!("{:?} failed with {}: {}", ctx.request.path(), err.status(), err);
            ErrorHandler::from(err).resolve(ctx)
        })
    }
}

pub fn handle_request(request: &Request, settings: &Config) -> Response {
    Dispatcher::new().respond(&Context { request, settings })
}

/// Answers a request that could not be received properly, e.g. on timeout.
pub fn handle_failure(err: HandlerError, request: &Request, settings: &Config) -> Response {
    Dispatcher::failed(err).respond(&Context { request, settings })
}
