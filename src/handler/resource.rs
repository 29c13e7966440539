use std::fs;
use std::path::Path;

use base64ct::{Base64, Encoding};
use log::debug;

use super::paths;
use super::{Context, DirectoryHandler, FileHandler, Handler, Resolution};
use crate::config::Config;
use crate::error::HandlerError;

/// Basic authentication settings of a document (`authType`, `authRealm`,
/// `authFile`).
struct BasicAuth<'a> {
    kind: &'a str,
    realm: &'a str,
    file: &'a str,
}

impl<'a> BasicAuth<'a> {
    fn from_config(config: &'a Config) -> Option<Self> {
        (config.get("authType") == "Basic").then(|| Self {
            kind: config.get("authType"),
            realm: config.get("authRealm"),
            file: config.get("authFile"),
        })
    }

    fn deny(&self) -> HandlerError {
        HandlerError::Unauthorized {
            challenge: format!("{} realm={}", self.kind, self.realm),
        }
    }

    /// Accepts `Basic <base64(user:pass)>` when the decoded pair is a whole
    /// line of the credentials file.
    fn authorize(&self, authorization: &str) -> Result<(), HandlerError> {
        let credentials = match authorization.split_once(' ') {
            Some(("Basic", token)) => Base64::decode_vec(token.trim())
                .ok()
                .and_then(|bytes| String::from_utf8(bytes).ok()),
            _ => None,
        };
        let Some(credentials) = credentials else {
            return Err(self.deny());
        };

        let known = fs::read_to_string(self.file).map_err(|err| {
            HandlerError::Internal(format!("Could not read credentials file: {err}"))
        })?;
        if known.lines().any(|line| line == credentials) {
            Ok(())
        } else {
            Err(self.deny())
        }
    }
}

/// Entry point for served methods: authentication, then the file or
/// directory the path maps onto under the host's root.
pub struct ResourceHandler;

impl Handler for ResourceHandler {
    fn try_resolve(&self, ctx: &Context<'_>) -> Result<Resolution, HandlerError> {
        let request = ctx.request;
        let host = request.host();

        if let Some(auth) = BasicAuth::from_config(host.document_config(request.path())) {
            auth.authorize(request.header("Authorization"))?;
        }

        let target = paths::locate(Path::new(host.root()), request.path())
            .map_err(|err| HandlerError::from_io(err, request.path()))?;

        debug!(
            "{} resolved to {} (symlink: {})",
            request.path(),
            target.path.display(),
            target.symlink
        );

        if target.is_dir {
            DirectoryHandler::new(target.path, target.symlink, request.path()).try_resolve(ctx)
        } else {
            FileHandler::new(target.path, target.symlink).try_resolve(ctx)
        }
    }
}
