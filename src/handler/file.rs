use std::fs::{self, File};
use std::path::PathBuf;

use super::paths;
use super::{Context, DynamicHandler, Handler, Resolution, dynamic};
use crate::document::Document;
use crate::error::HandlerError;
use crate::http::status::Status;

/// Serves a regular file verbatim, or hands interpreter documents over to
/// the [`DynamicHandler`].
pub struct FileHandler {
    path: PathBuf,
    symlink: bool,
}

impl FileHandler {
    pub fn new(path: PathBuf, symlink: bool) -> Self {
        Self { path, symlink }
    }
}

impl Handler for FileHandler {
    fn try_resolve(&self, ctx: &Context<'_>) -> Result<Resolution, HandlerError> {
        let name = paths::display_name(&self.path);

        // existing but unreadable files are refused before anything else
        File::open(&self.path).map_err(|err| HandlerError::from_io(err, &name))?;

        let real = fs::canonicalize(&self.path).map_err(|err| HandlerError::from_io(err, &name))?;
        paths::check_access(ctx.request.host(), &real, self.symlink)?;

        if dynamic::is_dynamic(&real, ctx.settings) {
            return DynamicHandler::new(real).try_resolve(ctx);
        }

        let document = Document::from_file(&real, ctx.settings.get("defaultmime"))
            .map_err(|err| HandlerError::from_io(err, &name))?;
        Ok(Resolution::with_document(Status::OK, document))
    }
}
