use std::io;

use thiserror::Error;

use crate::http::status::Status;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StatusError {
    #[error("Invalid status code {0}")]
    UnknownCode(u16),

    #[error("Invalid status code {0:?}")]
    InvalidCode(String),

    #[error("Cannot create error document for non-error code {0}")]
    NotAnError(u16),
}

/// Failures raised while resolving a request.
///
/// Each variant maps onto exactly one response status; the message is shown
/// on the generated error page.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("{0}")]
    BadRequest(String),

    /// Missing or rejected credentials. Carries the `WWW-Authenticate` value.
    #[error("HTTP Basic challenge")]
    Unauthorized { challenge: String },

    #[error("{0}")]
    AccessDenied(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Timeout(String),

    #[error("{0}")]
    PayloadTooLarge(String),

    #[error("{0}")]
    HeadersTooLarge(String),

    #[error("{0}")]
    NotImplemented(String),

    #[error("{0}")]
    Internal(String),
}

impl HandlerError {
    pub fn status(&self) -> Status {
        match self {
            HandlerError::BadRequest(_) => Status::BAD_REQUEST,
            HandlerError::Unauthorized { .. } => Status::UNAUTHORIZED,
            HandlerError::AccessDenied(_) => Status::FORBIDDEN,
            HandlerError::NotFound(_) => Status::NOT_FOUND,
            HandlerError::Timeout(_) => Status::REQUEST_TIMEOUT,
            HandlerError::PayloadTooLarge(_) => Status::PAYLOAD_TOO_LARGE,
            HandlerError::HeadersTooLarge(_) => Status::REQUEST_HEADER_FIELDS_TOO_LARGE,
            HandlerError::NotImplemented(_) => Status::NOT_IMPLEMENTED,
            HandlerError::Internal(_) => Status::INTERNAL_SERVER_ERROR,
        }
    }

    /// Classifies a filesystem error about `subject` by its kind.
    pub fn from_io(err: io::Error, subject: &str) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => HandlerError::NotFound(format!("{subject} does not exist")),
            io::ErrorKind::PermissionDenied => {
                HandlerError::AccessDenied(format!("No read privilege on {subject}"))
            }
            _ => HandlerError::Internal(format!("IO error while reading {subject}: {err}")),
        }
    }
}

/// Failures while receiving the request bytes from a connection.
#[derive(Debug, Error)]
pub enum ReadError {
    #[error("connection closed before a request arrived")]
    Closed,

    #[error("connection timed out")]
    Timeout,

    #[error("request head exceeds {0} bytes")]
    HeadersTooLarge(usize),

    #[error("request body of {length} bytes exceeds {limit} bytes")]
    PayloadTooLarge { length: usize, limit: usize },

    #[error("could not receive request: {0}")]
    Io(io::Error),
}

impl From<io::Error> for ReadError {
    fn from(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::TimedOut => ReadError::Timeout,
            _ => ReadError::Io(err),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file {path}: {source}")]
    Read { path: String, source: io::Error },

    #[error("could not parse config file {path}: {source}")]
    Parse { path: String, source: toml::de::Error },

    #[error("no hosts specified")]
    NoHosts,

    #[error("no default host specified")]
    NoDefaultHost,

    #[error("several default hosts specified: {0} and {1}")]
    SeveralDefaultHosts(String, String),

    #[error("no www root specified for {0}")]
    EmptyRoot(String),

    #[error("invalid status for {context}: {source}")]
    Status { context: String, source: StatusError },

    #[error("could not read www directory {root} for {hostname}")]
    UnreadableRoot { hostname: String, root: String },
}
