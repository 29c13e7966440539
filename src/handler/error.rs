use std::path::Path;

use log::{debug, warn};

use super::paths;
use super::{Context, DirectoryHandler, FileHandler, Handler, Resolution};
use crate::document::{Document, DocumentKind};
use crate::error::{HandlerError, StatusError};
use crate::http::status::Status;

/// Produces the response for a failed resolution: the host's custom error
/// document when one is configured and readable, else a generated page.
pub struct ErrorHandler {
    status: Status,
    message: String,
    /// `WWW-Authenticate` value sent along with a 401.
    challenge: Option<String>,
}

impl ErrorHandler {
    pub fn new(status: Status, message: &str) -> Self {
        Self {
            status,
            message: message.to_string(),
            challenge: None,
        }
    }

    fn generated(&self, mut messages: Vec<String>) -> Document {
        match Document::error_page(self.status, messages.clone()) {
            Ok(document) => document,
            Err(err) => {
                warn!("{}", err);
                messages.push(format!("Could not create error document: {err}"));
                Document::error_page(Status::INTERNAL_SERVER_ERROR, messages)
                    .unwrap_or_else(|_| Document::empty())
            }
        }
    }
}

impl From<HandlerError> for ErrorHandler {
    fn from(err: HandlerError) -> Self {
        let mut handler = ErrorHandler::new(err.status(), "");
        match err {
            HandlerError::Unauthorized { challenge } => handler.challenge = Some(challenge),
            other => handler.message = other.to_string(),
        }
        handler
    }
}

impl Handler for ErrorHandler {
    /// Serves the custom error document only; any failure is left to
    /// [`ErrorHandler::resolve`].
    fn try_resolve(&self, ctx: &Context<'_>) -> Result<Resolution, HandlerError> {
        let host = ctx.request.host();
        let doc = host.error_document(ctx.request.path(), self.status);
        if doc.is_empty() {
            return Err(HandlerError::NotFound(format!(
                "No error document for {}",
                self.status.code()
            )));
        }
        if !self.status.is_error() {
            return Err(HandlerError::Internal(
                StatusError::NotAnError(self.status.code()).to_string(),
            ));
        }

        let target = paths::locate(Path::new(host.root()), doc)
            .map_err(|err| HandlerError::from_io(err, doc))?;
        let inner = if target.is_dir {
            DirectoryHandler::new(target.path, target.symlink, doc).try_resolve(ctx)?
        } else {
            FileHandler::new(target.path, target.symlink).try_resolve(ctx)?
        };
        debug!("Read error document for {} from {}", self.status.code(), doc);

        Ok(Resolution {
            status: self.status,
            headers: inner.headers,
            document: inner.document,
        })
    }

    fn resolve(&self, ctx: &Context<'_>) -> Resolution {
        let mut resolution = self.try_resolve(ctx).unwrap_or_else(|err| {
            let mut messages = Vec::new();
            if !self.message.trim().is_empty() {
                messages.push(self.message.clone());
            }
            let doc = ctx.request.host().error_document(ctx.request.path(), self.status);
            if !doc.is_empty() {
                debug!("Could not read error document {}: {}", doc, err);
                messages.push(format!("Could not read {doc}: {err}"));
            }

            let document = self.generated(messages);
            let status = match document.kind() {
                DocumentKind::Error { status, .. } => *status,
                _ => Status::INTERNAL_SERVER_ERROR,
            };
            Resolution::with_document(status, document)
        });

        if let Some(challenge) = &self.challenge {
            resolution.headers.set("WWW-Authenticate", challenge);
        }
        resolution
    }
}
