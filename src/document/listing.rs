use std::fmt::Write;
use std::fs;
use std::io;
use std::path::Path;

use html_escape::{encode_double_quoted_attribute, encode_text};

use super::{Document, DocumentKind};

const STYLE: &str = "table {border-collapse: collapse; border: 1px solid black} \
                     th, td {border: 1px solid black; padding: 5px}";

/// Link target of `name` inside the listing at `logical`.
fn child_link(logical: &str, name: &str) -> String {
    if logical.ends_with('/') {
        format!("{logical}{name}")
    } else {
        format!("{logical}/{name}")
    }
}

impl Document {
    /// HTML table of the immediate children of `dir`, sorted by name.
    /// `logical` is the URL path the listing is served under.
    pub fn listing(dir: &Path, logical: &str) -> io::Result<Self> {
        if !fs::metadata(dir)?.is_dir() {
            return Err(io::Error::new(io::ErrorKind::NotFound, "No such directory"));
        }

        let mut entries = fs::read_dir(dir)?.collect::<io::Result<Vec<_>>>()?;
        entries.sort_by_key(|entry| entry.file_name());

        let title = encode_text(logical);
        let mut html = String::new();
        html.push_str("<!DOCTYPE html>\n<html>\n <head>\n  <meta charset=\"UTF-8\" />\n");
        let _ = writeln!(html, "  <style>\n{STYLE}\n  </style>");
        let _ = writeln!(html, "  <title>{title}</title>");
        html.push_str(" </head>\n <body>\n");
        let _ = writeln!(html, "  <h1>Directory listing for {title}</h1>");
        html.push_str("  <table>\n   <thead>\n    <tr>\n     <th>Type</th>\n     <th>Filename</th>\n    </tr>\n   </thead>\n   <tbody>\n");

        for entry in entries {
            let name = entry.file_name().to_string_lossy().into_owned();
            let path = entry.path();
            let kind = if path.is_file() {
                "file"
            } else if path.is_dir() {
                "dir"
            } else {
                ""
            };

            html.push_str("    <tr>\n");
            let _ = writeln!(html, "     <td>{kind}</td>");
            let _ = writeln!(
                html,
                "     <td>\n      <a href=\"{}\">{}</a>\n     </td>",
                encode_double_quoted_attribute(&child_link(logical, &name)),
                encode_text(&name)
            );
            html.push_str("    </tr>\n");
        }

        html.push_str("   </tbody>\n  </table>\n </body>\n</html>\n");

        Ok(Self {
            path: Path::new(logical).to_path_buf(),
            mime: "text/html".to_string(),
            data: html.into_bytes(),
            kind: DocumentKind::Listing,
        })
    }
}
