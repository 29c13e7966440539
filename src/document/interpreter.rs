use std::path::Path;

use super::{Document, DocumentKind};
use crate::http::headers::Headers;

/// MIME types handed to the interpreter instead of being served verbatim.
pub const INTERPRETER_TYPES: &[&str] = &[
    "text/php",
    "text/x-php",
    "application/php",
    "application/x-php",
    "application/x-httpd-php",
    "application/x-httpd-php-source",
];

/// Splits interpreter output at its first blank line.
///
/// Output without a blank line has no header section and is all body.
fn split_output(stdout: &[u8]) -> (Headers, &[u8]) {
    let mut headers = Headers::new();
    let mut offset = 0;

    for line in stdout.split_inclusive(|&b| b == b'\n') {
        offset += line.len();
        let text = String::from_utf8_lossy(line);
        let text = text.trim_end_matches(['\r', '\n']);
        if text.is_empty() {
            return (headers, &stdout[offset..]);
        }
        if let Some((name, value)) = text.split_once(':') {
            headers.set(name.trim(), value.trim());
        }
    }

    (Headers::new(), stdout)
}

impl Document {
    /// Body is the interpreter's output after its headers, followed by
    /// anything it wrote to standard error.
    pub fn interpreter_output(script: &Path, stdout: &[u8], stderr: &[u8]) -> Self {
        let (headers, body) = split_output(stdout);
        let mut data = body.to_vec();
        data.extend_from_slice(stderr);

        Self {
            path: script.to_path_buf(),
            mime: "text/html".to_string(),
            data,
            kind: DocumentKind::Interpreter { headers },
        }
    }

    pub fn interpreter_headers(&self) -> Option<&Headers> {
        match &self.kind {
            DocumentKind::Interpreter { headers } => Some(headers),
            _ => None,
        }
    }
}
