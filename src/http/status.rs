//! HTTP status registry.
//!
//! Every [`Status`] is backed by an entry of the static registry below, so a
//! status code always carries its canonical reason phrase. Codes outside the
//! registry cannot be represented.

use std::collections::HashMap;
use std::fmt;

use once_cell::sync::Lazy;

use crate::error::StatusError;

const CODES: &[(u16, &str)] = &[
    (100, "Continue"),
    (101, "Switching Protocol"),
    (102, "Processing"),
    (200, "OK"),
    (201, "Created"),
    (202, "Accepted"),
    (203, "Non-Authoritative Information"),
    (204, "No Content"),
    (205, "Reset Content"),
    (206, "Partial Content"),
    (207, "Multi-Status"),
    (208, "Already Reported"),
    (226, "IM Used"),
    (300, "Multiple Choice"),
    (301, "Moved Permanently"),
    (302, "Found"),
    (303, "See Other"),
    (304, "Not Modified"),
    (305, "Use Proxy"),
    (306, "unused"),
    (307, "Temporary Redirect"),
    (308, "Permanent Redirect"),
    (400, "Bad Request"),
    (401, "Unauthorized"),
    (402, "Payment Required"),
    (403, "Forbidden"),
    (404, "Not Found"),
    (405, "Method Not Allowed"),
    (406, "Not Acceptable"),
    (407, "Proxy Authentication Required"),
    (408, "Request Timeout"),
    (409, "Conflict"),
    (410, "Gone"),
    (411, "Length Required"),
    (412, "Precondition Failed"),
    (413, "Payload Too Large"),
    (414, "URI Too Long"),
    (415, "Unsupported Media Type"),
    (416, "Requested Range Not Satisfiable"),
    (417, "Expectation Failed"),
    (418, "I'm a teapot"),
    (421, "Misdirected Request"),
    (422, "Unprocessable Entity"),
    (423, "Locked"),
    (424, "Failed Dependency"),
    (425, "Too Early"),
    (426, "Upgrade Required"),
    (428, "Precondition Required"),
    (429, "Too Many Requests"),
    (431, "Request Header Fields Too Large"),
    (451, "Unavailable For Legal Reasons"),
    (500, "Internal Server Error"),
    (501, "Not Implemented"),
    (502, "Bad Gateway"),
    (503, "Service Unavailable"),
    (504, "Gateway Timeout"),
    (505, "HTTP Version Not Supported"),
    (506, "Variant Also Negotiates"),
    (507, "Insufficient Storage"),
    (508, "Loop Detected"),
    (510, "Not Extended"),
    (511, "Network Authentication Required"),
];

static REGISTRY: Lazy<HashMap<u16, &'static str>> = Lazy::new(|| CODES.iter().copied().collect());

/// Class of a status code, taken from its first digit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusGroup {
    Information,
    Successful,
    Redirection,
    ClientError,
    ServerError,
}

impl StatusGroup {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatusGroup::Information => "Information",
            StatusGroup::Successful => "Successful",
            StatusGroup::Redirection => "Redirection",
            StatusGroup::ClientError => "Client error",
            StatusGroup::ServerError => "Server error",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Status {
    code: u16,
    reason: &'static str,
}

impl Status {
    pub const OK: Status = Status { code: 200, reason: "OK" };
    pub const BAD_REQUEST: Status = Status { code: 400, reason: "Bad Request" };
    pub const UNAUTHORIZED: Status = Status { code: 401, reason: "Unauthorized" };
    pub const FORBIDDEN: Status = Status { code: 403, reason: "Forbidden" };
    pub const NOT_FOUND: Status = Status { code: 404, reason: "Not Found" };
    pub const REQUEST_TIMEOUT: Status = Status { code: 408, reason: "Request Timeout" };
    pub const PAYLOAD_TOO_LARGE: Status = Status { code: 413, reason: "Payload Too Large" };
    pub const REQUEST_HEADER_FIELDS_TOO_LARGE: Status = Status {
        code: 431,
        reason: "Request Header Fields Too Large",
    };
    pub const INTERNAL_SERVER_ERROR: Status = Status { code: 500, reason: "Internal Server Error" };
    pub const NOT_IMPLEMENTED: Status = Status { code: 501, reason: "Not Implemented" };

    pub fn new(code: u16) -> Result<Self, StatusError> {
        REGISTRY
            .get(&code)
            .map(|reason| Status { code, reason })
            .ok_or(StatusError::UnknownCode(code))
    }

    /// Parses a textual code such as `"404"`, as stored in configuration.
    pub fn parse(code: &str) -> Result<Self, StatusError> {
        let code = code.trim();
        code.parse::<u16>()
            .map_err(|_| StatusError::InvalidCode(code.to_string()))
            .and_then(Status::new)
    }

    pub fn code(&self) -> u16 {
        self.code
    }

    pub fn reason(&self) -> &'static str {
        self.reason
    }

    pub fn group(&self) -> StatusGroup {
        match self.code / 100 {
            1 => StatusGroup::Information,
            2 => StatusGroup::Successful,
            3 => StatusGroup::Redirection,
            4 => StatusGroup::ClientError,
            _ => StatusGroup::ServerError,
        }
    }

    /// Errors are exactly the registered 4xx and 5xx codes.
    pub fn is_error(&self) -> bool {
        matches!(self.group(), StatusGroup::ClientError | StatusGroup::ServerError)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.code, self.reason)
    }
}
