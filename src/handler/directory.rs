use std::fs;
use std::path::PathBuf;

use log::debug;

use super::paths;
use super::{Context, FileHandler, Handler, Resolution};
use crate::document::Document;
use crate::error::HandlerError;
use crate::http::status::Status;

/// Serves a directory through its first existing index page, else a
/// generated listing when the host allows one.
pub struct DirectoryHandler {
    path: PathBuf,
    symlink: bool,
    logical: String,
}

impl DirectoryHandler {
    /// `logical` is the URL path the directory is reached under.
    pub fn new(path: PathBuf, symlink: bool, logical: &str) -> Self {
        Self {
            path,
            symlink,
            logical: logical.to_string(),
        }
    }
}

impl Handler for DirectoryHandler {
    fn try_resolve(&self, ctx: &Context<'_>) -> Result<Resolution, HandlerError> {
        let host = ctx.request.host();
        let logical = if self.logical.is_empty() { "/" } else { self.logical.as_str() };

        let real = fs::canonicalize(&self.path).map_err(|err| HandlerError::from_io(err, logical))?;
        paths::check_access(host, &real, self.symlink)?;

        for page in host.index_pages() {
            let candidate = real.join(page);
            if candidate.exists() {
                let symlink = self.symlink || paths::is_symlink(&candidate);
                debug!("Serving index page {}", candidate.display());
                return FileHandler::new(candidate, symlink).try_resolve(ctx);
            }
        }

        if !host.lists_directories() {
            return Err(HandlerError::AccessDenied("Directory listing forbidden".to_string()));
        }

        let document = Document::listing(&real, logical).map_err(|err| HandlerError::from_io(err, logical))?;
        Ok(Resolution::with_document(Status::OK, document))
    }
}
