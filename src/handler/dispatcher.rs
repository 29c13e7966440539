use log::debug;

use super::middleware;
use super::{Context, ErrorHandler, Handler, ResourceHandler, Resolution};
use crate::document::Document;
use crate::error::HandlerError;
use crate::http::response::Response;
use crate::http::validator::Validator;

/// Top of the handler chain: validates the request, routes it by method,
/// then runs the override and general header passes over the result.
pub struct Dispatcher {
    failure: Option<HandlerError>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self { failure: None }
    }

    /// Skips routing and answers with the error page for `failure`.
    pub fn failed(failure: HandlerError) -> Self {
        Self {
            failure: Some(failure),
        }
    }

    fn route(self, ctx: &Context<'_>) -> Resolution {
        let request = ctx.request;
        if let Some(failure) = self.failure {
            return ErrorHandler::from(failure).resolve(ctx);
        }
        if let Err(err) = Validator::validate_request(request) {
            return ErrorHandler::from(err.into_handler_error()).resolve(ctx);
        }

        match request.method() {
            Some(method) if method.is_served() => ResourceHandler.resolve(ctx),
            Some(method) => ErrorHandler::from(HandlerError::NotImplemented(format!(
                "{} is not supported",
                method.as_str()
            )))
            .resolve(ctx),
            None => ErrorHandler::from(HandlerError::BadRequest("Invalid request method".to_string()))
                .resolve(ctx),
        }
    }

    pub fn respond(self, ctx: &Context<'_>) -> Response {
        let request = ctx.request;
        let mut resolution = self.route(ctx);

        // HEAD keeps the headers computed for the full document
        if request.is_head() {
            resolution.document = Document::empty();
        }

        middleware::apply_overrides(ctx, &mut resolution);
        let coding = middleware::apply_general_headers(ctx, &mut resolution);

        let protocol = match request.protocol() {
            "" => ctx.settings.get("defaultprotocol"),
            protocol => protocol,
        };
        debug!(
            "{} {:?} -> {}",
            request.verb(),
            request.path(),
            resolution.status
        );

        Response {
            protocol: protocol.to_string(),
            status: resolution.status,
            headers: resolution.headers,
            body: resolution.document.into_data(),
            coding,
            head_only: request.is_head(),
        }
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}
