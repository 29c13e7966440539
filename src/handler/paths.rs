//! Filesystem resolution shared by the file and directory handlers.

use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use crate::config::Host;
use crate::error::HandlerError;

/// An existing filesystem entry a request maps onto.
#[derive(Debug)]
pub(crate) struct Target {
    /// Canonical path with every component but the last resolved.
    pub path: PathBuf,
    /// A symlink was crossed between the root and the entry, the entry
    /// itself included.
    pub symlink: bool,
    pub is_dir: bool,
}

/// Resolves `logical` (a URL path) under `root` without following its final
/// component. Each component below the root is checked for being a symlink;
/// the root itself never counts as one.
pub(crate) fn locate(root: &Path, logical: &str) -> io::Result<Target> {
    let mut lexical = root.to_path_buf();
    let mut below_root = false;
    let mut symlink = false;

    for component in Path::new(logical).components() {
        match component {
            Component::Normal(name) => {
                lexical.push(name);
                below_root = true;
                symlink |= fs::symlink_metadata(&lexical)?.file_type().is_symlink();
            }
            Component::ParentDir => {
                lexical.pop();
            }
            _ => {}
        }
    }

    let path = match (below_root, lexical.parent(), lexical.file_name()) {
        (true, Some(parent), Some(name)) if !parent.as_os_str().is_empty() => {
            fs::canonicalize(parent)?.join(name)
        }
        _ => fs::canonicalize(&lexical)?,
    };
    let is_dir = fs::metadata(&path)?.is_dir();

    Ok(Target {
        path,
        symlink,
        is_dir,
    })
}

pub(crate) fn is_symlink(path: &Path) -> bool {
    fs::symlink_metadata(path)
        .map(|meta| meta.file_type().is_symlink())
        .unwrap_or(false)
}

/// Symlinked access needs `symlinks=yes`; any other access must stay
/// inside the host's root.
pub(crate) fn check_access(host: &Host, real: &Path, symlink: bool) -> Result<(), HandlerError> {
    if symlink {
        if !host.follows_symlinks() {
            return Err(HandlerError::AccessDenied("Cannot follow symlinks".to_string()));
        }
        return Ok(());
    }

    let root = fs::canonicalize(host.root())
        .map_err(|err| HandlerError::Internal(format!("Could not resolve www root: {err}")))?;
    if !real.starts_with(&root) {
        return Err(HandlerError::AccessDenied(
            "Cannot access other parts of filesystem".to_string(),
        ));
    }
    Ok(())
}

/// Short name of a path for diagnostics, without leaking the root.
pub(crate) fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "/".to_string())
}
