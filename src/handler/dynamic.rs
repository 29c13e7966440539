use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread;

use log::debug;

use super::{Context, Handler, Resolution};
use crate::config::Config;
use crate::document::{Document, INTERPRETER_TYPES};
use crate::error::HandlerError;
use crate::http::status::Status;

/// Documents rendered by the interpreter: by MIME type, or by the
/// interpreter's reserved extension.
pub(crate) fn is_dynamic(path: &Path, settings: &Config) -> bool {
    let by_type = mime_guess::from_path(path)
        .iter_raw()
        .any(|mime| INTERPRETER_TYPES.contains(&mime));

    let extension = settings.get("interpreterext");
    let by_extension = !extension.is_empty() && path.extension().is_some_and(|ext| ext == extension);

    by_type || by_extension
}

/// Runs the configured interpreter on a script, CGI style, and serves what
/// it prints. The call blocks until the interpreter exits.
pub struct DynamicHandler {
    script: PathBuf,
}

impl DynamicHandler {
    pub fn new(script: PathBuf) -> Self {
        Self { script }
    }

    fn environment(&self, ctx: &Context<'_>) -> Vec<(&'static str, String)> {
        let request = ctx.request;
        vec![
            ("REDIRECT_STATUS", "200".to_string()),
            ("GATEWAY_INTERFACE", "CGI/1.1".to_string()),
            ("REQUEST_METHOD", request.verb().to_string()),
            ("SCRIPT_NAME", request.path().to_string()),
            ("SCRIPT_FILENAME", self.script.to_string_lossy().into_owned()),
            ("QUERY_STRING", request.query().to_string()),
            ("SERVER_SOFTWARE", ctx.settings.get("servername").to_string()),
            ("SERVER_PORT", ctx.settings.get("port").to_string()),
            ("SERVER_PROTOCOL", request.protocol().to_string()),
            ("CONTENT_LENGTH", request.body().len().to_string()),
            ("CONTENT_TYPE", request.header("Content-Type").to_string()),
            ("HOST_NAME", request.header("Host").to_string()),
            ("REMOTE_ADDR", request.peer().to_string()),
        ]
    }
}

impl Handler for DynamicHandler {
    fn try_resolve(&self, ctx: &Context<'_>) -> Result<Resolution, HandlerError> {
        let program = ctx.settings.get("interpreter");
        let mut command = Command::new(program);
        command
            .arg(&self.script)
            .envs(self.environment(ctx))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = self.script.parent() {
            command.current_dir(dir);
        }

        debug!("Running {} {}", program, self.script.display());
        let mut child = command.spawn().map_err(|err| {
            HandlerError::Internal(format!("Could not start interpreter {program}: {err}"))
        })?;

        // fed from a separate thread so a large body cannot deadlock against
        // a full stdout pipe
        let feeder = child.stdin.take().map(|mut stdin| {
            let body = ctx.request.body().to_vec();
            thread::spawn(move || stdin.write_all(&body))
        });

        let output = child.wait_with_output().map_err(|err| {
            HandlerError::Internal(format!("Could not read interpreter output: {err}"))
        })?;
        if let Some(Ok(Err(err))) = feeder.map(|handle| handle.join()) {
            debug!("Interpreter did not take the whole request body: {}", err);
        }

        if !output.status.success() {
            return Err(HandlerError::Internal(format!(
                "Interpreter failed ({}): {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let document = Document::interpreter_output(&self.script, &output.stdout, &output.stderr);
        let mut headers = document.interpreter_headers().cloned().unwrap_or_default();
        if !headers.contains("Content-Type") {
            headers.set("Content-Type", document.mime());
        }
        headers.set("Content-Length", &document.len().to_string());

        Ok(Resolution {
            status: Status::OK,
            headers,
            document,
        })
    }
}
