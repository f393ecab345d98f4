// Copyright 2017 Dmitry Tantsur <divius.inside@gmail.com>
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Error and Result implementations.

use std::fmt;

use http::header::{InvalidHeaderName, InvalidHeaderValue};
use reqwest::StatusCode;

/// Kind of an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ErrorKind {
    /// Authentication failure
    ///
    /// Maps to HTTP 401.
    AuthenticationFailed,

    /// Access denied.
    ///
    /// Maps to HTTP 403.
    AccessDenied,

    /// Requested resource was not found.
    ///
    /// Roughly maps to HTTP 404 and 410.
    ResourceNotFound,

    /// Request returned more items than expected.
    TooManyItems,

    /// Requested service endpoint was not found.
    EndpointNotFound,

    /// Invalid value passed to one of paremeters.
    ///
    /// May be result of HTTP 400 or a local validation failure.
    InvalidInput,

    /// Unsupported or incompatible API version.
    ///
    /// May be a result of HTTP 406.
    IncompatibleApiVersion,

    /// Conflict in the request, e.g. deleting a non-empty container.
    ///
    /// Maps to HTTP 409.
    Conflict,

    /// A precondition of a conditional request was not met.
    ///
    /// Maps to HTTP 412.
    PreconditionFailed,

    /// The request has timed out.
    OperationTimedOut,

    /// The requested operation has failed.
    OperationFailed,

    /// The server rejected the request as too large or throttled it.
    ///
    /// Maps to HTTP 413 and 429.
    RequestTooLarge,

    /// Generic protocol error.
    ProtocolError,

    /// Response received from the server is malformed.
    InvalidResponse,

    /// Internal server error.
    ///
    /// Maps to HTTP 5xx codes.
    InternalServerError,

    /// Invalid clouds.yaml or credentials file.
    InvalidConfig,
}

/// Error from an OpenStack or Rackspace call.
#[derive(Debug, Clone)]
pub struct Error {
    kind: ErrorKind,
    status: Option<StatusCode>,
    message: Option<String>,
}

impl ErrorKind {
    /// Short description of the error kind.
    pub fn description(&self) -> &'static str {
        match self {
            ErrorKind::AuthenticationFailed => "Failed to authenticate",
            ErrorKind::AccessDenied => "Access to the resource is denied",
            ErrorKind::ResourceNotFound => "Requested resource was not found",
            ErrorKind::TooManyItems => "Request returned too many items",
            ErrorKind::EndpointNotFound => "Requested endpoint was not found",
            ErrorKind::InvalidInput => "Input value(s) are invalid or missing",
            ErrorKind::IncompatibleApiVersion => "Incompatible or unsupported API version",
            ErrorKind::Conflict => "Requested cannot be fulfilled due to a conflict",
            ErrorKind::PreconditionFailed => "Precondition of the request is not satisfied",
            ErrorKind::OperationTimedOut => "Time-out waiting for the operation",
            ErrorKind::OperationFailed => "Requested operation has failed",
            ErrorKind::RequestTooLarge => "Request is too large or was throttled",
            ErrorKind::ProtocolError => "Error when accessing the server",
            ErrorKind::InvalidResponse => "Received invalid response",
            ErrorKind::InternalServerError => "Internal server error or bad gateway",
            ErrorKind::InvalidConfig => "clouds.yaml or credentials file is invalid",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.description())
    }
}

impl Error {
    /// Create a new error of the provided kind.
    #[inline]
    pub fn new<S: Into<String>>(kind: ErrorKind, message: S) -> Error {
        Error {
            kind,
            status: None,
            message: Some(message.into()),
        }
    }

    /// Create an error for a service that is not present in the catalog.
    #[inline]
    pub fn new_endpoint_not_found<D: fmt::Display>(service_type: D) -> Error {
        Error::new(
            ErrorKind::EndpointNotFound,
            format!("Endpoint for service {} was not found", service_type),
        )
    }

    /// Add an HTTP status code to the error.
    #[inline]
    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = Some(status);
        self
    }

    /// Error kind.
    #[inline]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// HTTP status code (if any).
    #[inline]
    pub fn status(&self) -> Option<StatusCode> {
        self.status
    }

    /// Error message (if any).
    #[inline]
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.kind)?;

        if let Some(status) = self.status {
            write!(f, " (HTTP {})", status.as_u16())?;
        }

        if let Some(ref msg) = self.message {
            write!(f, ": {}", msg)?;
        }

        Ok(())
    }
}

impl ::std::error::Error for Error {}

impl From<StatusCode> for ErrorKind {
    fn from(value: StatusCode) -> ErrorKind {
        match value {
            StatusCode::UNAUTHORIZED => ErrorKind::AuthenticationFailed,
            StatusCode::FORBIDDEN => ErrorKind::AccessDenied,
            StatusCode::NOT_FOUND | StatusCode::GONE => ErrorKind::ResourceNotFound,
            StatusCode::NOT_ACCEPTABLE => ErrorKind::IncompatibleApiVersion,
            StatusCode::CONFLICT => ErrorKind::Conflict,
            StatusCode::PRECONDITION_FAILED => ErrorKind::PreconditionFailed,
            StatusCode::PAYLOAD_TOO_LARGE | StatusCode::TOO_MANY_REQUESTS => {
                ErrorKind::RequestTooLarge
            }
            StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => {
                ErrorKind::OperationTimedOut
            }
            c if c.is_client_error() && c != StatusCode::BAD_REQUEST => ErrorKind::ProtocolError,
            c if c.is_server_error() => ErrorKind::InternalServerError,
            _ => ErrorKind::InvalidInput,
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(value: reqwest::Error) -> Error {
        let msg = value.to_string();
        let kind = if value.is_builder() {
            ErrorKind::InvalidInput
        } else if value.is_timeout() {
            ErrorKind::OperationTimedOut
        } else if value.is_decode() {
            ErrorKind::InvalidResponse
        } else {
            value
                .status()
                .map(From::from)
                .unwrap_or(ErrorKind::ProtocolError)
        };

        let error = Error::new(kind, msg);
        if let Some(status) = value.status() {
            error.with_status(status)
        } else {
            error
        }
    }
}

impl From<url::ParseError> for Error {
    fn from(value: url::ParseError) -> Error {
        Error::new(ErrorKind::InvalidInput, value.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(value: serde_json::Error) -> Error {
        Error::new(ErrorKind::InvalidResponse, value.to_string())
    }
}

impl From<InvalidHeaderName> for Error {
    fn from(value: InvalidHeaderName) -> Error {
        Error::new(ErrorKind::InvalidInput, value.to_string())
    }
}

impl From<InvalidHeaderValue> for Error {
    fn from(value: InvalidHeaderValue) -> Error {
        Error::new(ErrorKind::InvalidInput, value.to_string())
    }
}

#[cfg(test)]
pub mod test {
    use reqwest::StatusCode;

    use super::{Error, ErrorKind};

    #[test]
    fn test_error_display() {
        let error = Error::new(ErrorKind::InvalidInput, "boom");
        assert_eq!(error.to_string(), "Input value(s) are invalid or missing: boom");
        let error = error.with_status(StatusCode::BAD_REQUEST);
        assert_eq!(
            error.to_string(),
            "Input value(s) are invalid or missing (HTTP 400): boom"
        );
        assert_eq!(error.message(), Some("boom"));
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ErrorKind::from(StatusCode::BAD_REQUEST),
            ErrorKind::InvalidInput
        );
        assert_eq!(
            ErrorKind::from(StatusCode::UNAUTHORIZED),
            ErrorKind::AuthenticationFailed
        );
        assert_eq!(
            ErrorKind::from(StatusCode::NOT_FOUND),
            ErrorKind::ResourceNotFound
        );
        assert_eq!(ErrorKind::from(StatusCode::CONFLICT), ErrorKind::Conflict);
        assert_eq!(
            ErrorKind::from(StatusCode::PRECONDITION_FAILED),
            ErrorKind::PreconditionFailed
        );
        assert_eq!(
            ErrorKind::from(StatusCode::TOO_MANY_REQUESTS),
            ErrorKind::RequestTooLarge
        );
        assert_eq!(
            ErrorKind::from(StatusCode::METHOD_NOT_ALLOWED),
            ErrorKind::ProtocolError
        );
        assert_eq!(
            ErrorKind::from(StatusCode::SERVICE_UNAVAILABLE),
            ErrorKind::InternalServerError
        );
    }
}
