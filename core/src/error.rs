//! Error types for the booking API client.
//!
//! # Design
//! `NotFound` and `Unauthorized` get dedicated variants because the server
//! uses 404 and 401 for "unknown master/service" and "bad credential". All
//! other non-200 responses land in `HttpError` with the status code and the
//! server's `detail` text (or the raw body when there is none).
//!
//! Every variant renders a non-empty message: view state holders collapse
//! errors into that message and nothing else.

use thiserror::Error;

/// Errors returned by `LumiClient` parse methods, transports and the
/// repository.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The server returned 404.
    #[error("not found: {0}")]
    NotFound(String),

    /// The server rejected the caller credential (401 or 403).
    #[error("unauthorized: {message}")]
    Unauthorized { status: u16, message: String },

    /// The server returned a non-200 status other than 401, 403 and 404.
    #[error("HTTP {status}: {message}")]
    HttpError { status: u16, message: String },

    /// The request never produced a response (connection, DNS, timeout).
    #[error("network error: {0}")]
    Transport(String),

    /// The response body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    DeserializationError(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    SerializationError(String),

    /// The caller passed arguments the API cannot express.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl ApiError {
    /// HTTP status carried by the error, if it came from a response.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::NotFound(_) => Some(404),
            ApiError::Unauthorized { status, .. } | ApiError::HttpError { status, .. } => {
                Some(*status)
            }
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::Transport(err.to_string())
    }
}

/// Errors raised while reading `ClientConfig`.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required setting {0}")]
    Missing(&'static str),

    #[error("invalid value {value:?} for {name}")]
    Invalid { name: &'static str, value: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_variant_renders_a_message() {
        let errors = [
            ApiError::NotFound(String::new()),
            ApiError::Unauthorized {
                status: 401,
                message: String::new(),
            },
            ApiError::HttpError {
                status: 500,
                message: String::new(),
            },
            ApiError::Transport(String::new()),
            ApiError::DeserializationError(String::new()),
            ApiError::SerializationError(String::new()),
            ApiError::InvalidRequest(String::new()),
        ];
        for err in errors {
            assert!(!err.to_string().trim().is_empty(), "{err:?}");
        }
    }

    #[test]
    fn http_error_reports_status() {
        let err = ApiError::HttpError {
            status: 400,
            message: "Time slot is already booked".to_string(),
        };
        assert_eq!(err.status(), Some(400));
        assert_eq!(err.to_string(), "HTTP 400: Time slot is already booked");
    }
}
