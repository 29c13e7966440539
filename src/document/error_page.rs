use std::fmt::Write;
use std::path::PathBuf;

use html_escape::encode_text;

use super::{Document, DocumentKind};
use crate::error::StatusError;
use crate::http::status::Status;

impl Document {
    /// Generated page naming the status and listing any diagnostic messages.
    /// Only error statuses (4xx, 5xx) can have one.
    pub fn error_page(status: Status, messages: Vec<String>) -> Result<Self, StatusError> {
        if !status.is_error() {
            return Err(StatusError::NotAnError(status.code()));
        }

        let code = status.code();
        let mut html = String::new();
        html.push_str("<!DOCTYPE html>\n<html>\n <head>\n  <meta charset=\"UTF-8\" />\n");
        let _ = writeln!(html, "  <title>Error {code}</title>");
        html.push_str(" </head>\n <body>\n");
        let _ = writeln!(html, "  <h1>Error {code}</h1>");
        let _ = writeln!(html, "  <p>{}</p>", status.reason());

        if !messages.is_empty() {
            html.push_str("  <h2>Additional information</h2>\n  <ul>\n");
            for message in &messages {
                let _ = writeln!(html, "   <li>{}</li>", encode_text(message));
            }
            html.push_str("  </ul>\n");
        }
        html.push_str(" </body>\n</html>\n");

        Ok(Self {
            path: PathBuf::new(),
            mime: "text/html".to_string(),
            data: html.into_bytes(),
            kind: DocumentKind::Error { status, messages },
        })
    }
}
