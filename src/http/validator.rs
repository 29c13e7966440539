use crate::error::HandlerError;
use crate::http::request::Request;

#[derive(Debug, PartialEq, Eq)]
pub enum ValidatorError {
    MissingHost,
}

impl ValidatorError {
    pub fn into_handler_error(self) -> HandlerError {
        match self {
            ValidatorError::MissingHost => {
                HandlerError::BadRequest("HTTP/1.1 requests must carry a Host header".to_string())
            }
        }
    }
}

pub struct Validator;

impl Validator {
    /// HTTP/1.1 makes the `Host` header mandatory; other versions require nothing.
    fn validate_host(req: &Request) -> Result<(), ValidatorError> {
        if req.protocol() == "HTTP/1.1" && req.header("Host").is_empty() {
            return Err(ValidatorError::MissingHost);
        }
        Ok(())
    }

    pub fn validate_request(req: &Request) -> Result<(), ValidatorError> {
        Self::validate_host(req)
    }
}
