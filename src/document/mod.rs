//! Response bodies.
//!
//! A [`Document`] is built once by the handler that serves a request and is
//! not modified afterwards. Its [`DocumentKind`] records how it came to be:
//! read from disk, generated as a directory listing or error page, or
//! produced by the external interpreter.

mod error_page;
mod interpreter;
mod listing;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::http::headers::Headers;
use crate::http::status::Status;

pub use interpreter::INTERPRETER_TYPES;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentKind {
    Empty,
    File,
    Listing,
    Error { status: Status, messages: Vec<String> },
    Interpreter { headers: Headers },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    path: PathBuf,
    mime: String,
    data: Vec<u8>,
    kind: DocumentKind,
}

impl Document {
    pub fn empty() -> Self {
        Self {
            path: PathBuf::new(),
            mime: "text/html".to_string(),
            data: Vec::new(),
            kind: DocumentKind::Empty,
        }
    }

    /// Reads a whole file. The type is guessed from the file name, else
    /// `default_mime` is used.
    pub fn from_file(path: &Path, default_mime: &str) -> io::Result<Self> {
        let data = fs::read(path)?;
        let mime = mime_guess::from_path(path)
            .first_raw()
            .unwrap_or(default_mime);

        Ok(Self {
            path: path.to_path_buf(),
            mime: mime.to_string(),
            data,
            kind: DocumentKind::File,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn mime(&self) -> &str {
        &self.mime
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn kind(&self) -> &DocumentKind {
        &self.kind
    }
}
