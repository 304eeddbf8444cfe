// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Error types for the HTTP client
//!
//! Every failure is request-scoped. Construction problems surface before any
//! connection exists, transport and interceptor failures surface as a
//! rejected envelope, and a handler that raises surfaces as
//! [`Error::Interceptor`] so callers can tell the two apart.

use thiserror::Error;

use crate::network::Envelope;

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the HTTP client
#[derive(Error, Debug)]
pub enum Error {
    /// Request configuration is missing a method or url, or is otherwise malformed
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// A descriptor or envelope failed its structural check
    #[error("Validation failed: {0}")]
    Validation(String),

    /// An API was called in a way it does not support
    #[error("Usage error: {0}")]
    Usage(String),

    /// Connection lifecycle misuse (double open, send before open)
    #[error("Connection error: {0}")]
    Connection(String),

    /// Underlying HTTP client failed to build
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// URL parsing failed
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// JSON conversion failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The pipeline ended on the reject branch
    #[error("Request rejected: {}", rejection_reason(.0))]
    Rejected(Box<Envelope>),

    /// An interceptor handler raised instead of returning an envelope
    #[error("Interceptor '{name}' failed: {source}")]
    Interceptor {
        name: String,
        #[source]
        source: Box<Error>,
    },

    /// Mock backend misuse
    #[error("Mock backend error: {0}")]
    Mock(#[from] MockError),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

/// Usage failures of the mock connection backend
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MockError {
    #[error("There are no responses to fulfill")]
    NoResponses,

    #[error("There are no connections to resolve")]
    NoConnections,

    /// A sent request has no registered response
    #[error("No response registered for {method} {path}")]
    UnmatchedRequest { method: String, path: String },

    /// A registered response was never requested
    #[error("Response registered for {method} {path} was never requested")]
    UnusedResponse { method: String, path: String },

    #[error("{0} request(s) still waiting to be flushed")]
    OutstandingRequests(usize),
}

fn rejection_reason(envelope: &Envelope) -> String {
    match &envelope.err {
        Some(failure) => failure.to_string(),
        None => "no failure attached".to_string(),
    }
}

impl Error {
    /// Create an invalid request error
    pub fn invalid_request<S: Into<String>>(msg: S) -> Self {
        Error::InvalidRequest(msg.into())
    }

    /// Create a validation error
    pub fn validation<S: Into<String>>(msg: S) -> Self {
        Error::Validation(msg.into())
    }

    /// Create a connection error
    pub fn connection<S: Into<String>>(msg: S) -> Self {
        Error::Connection(msg.into())
    }

    /// Create a usage error
    pub fn usage<S: Into<String>>(msg: S) -> Self {
        Error::Usage(msg.into())
    }

    /// Wrap an error raised by the named interceptor
    pub fn interceptor(name: impl Into<String>, source: Error) -> Self {
        Error::Interceptor {
            name: name.into(),
            source: Box::new(source),
        }
    }

    /// Create a generic error
    pub fn other<S: Into<String>>(msg: S) -> Self {
        Error::Other(msg.into())
    }

    /// Check if the pipeline finished on the reject branch
    pub fn is_rejection(&self) -> bool {
        matches!(self, Error::Rejected(_))
    }

    /// Check if this failed before any connection was created
    pub fn is_construction(&self) -> bool {
        matches!(self, Error::InvalidRequest(_) | Error::Validation(_))
    }

    /// Final envelope of a rejected request
    pub fn envelope(&self) -> Option<&Envelope> {
        match self {
            Error::Rejected(envelope) => Some(&**envelope),
            _ => None,
        }
    }

    /// Consume the error, returning the rejected envelope if there is one
    pub fn into_envelope(self) -> Option<Envelope> {
        match self {
            Error::Rejected(envelope) => Some(*envelope),
            _ => None,
        }
    }

    /// Get HTTP status code if available
    pub fn status_code(&self) -> Option<u16> {
        let envelope = self.envelope()?;
        envelope
            .err
            .as_ref()
            .and_then(|failure| failure.status)
            .or_else(|| envelope.res.as_ref().map(|res| res.status))
    }
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Other(s)
    }
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::Other(s.to_string())
    }
}

/// Helper trait for adding context to errors
pub trait ErrorContext<T> {
    /// Add operation context to error
    fn context(self, msg: &str) -> Result<T>;
}

impl<T, E: Into<Error>> ErrorContext<T> for std::result::Result<T, E> {
    fn context(self, msg: &str) -> Result<T> {
        self.map_err(|e| {
            let err = e.into();
            Error::Other(format!("{}: {}", msg, err))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::Request;
    use crate::network::{Envelope, Failure};

    #[test]
    fn test_rejection_carries_envelope() {
        let req = Request::new("GET", "/users").unwrap();
        let envelope = Envelope::response(req, None, Some(Failure::with_status("not found", 404)));
        let err = Error::Rejected(Box::new(envelope));

        assert!(err.is_rejection());
        assert!(!err.is_construction());
        assert_eq!(err.status_code(), Some(404));
        assert_eq!(err.to_string(), "Request rejected: not found");
        assert_eq!(err.into_envelope().unwrap().req.url, "/users");
    }

    #[test]
    fn test_interceptor_error_is_not_rejection() {
        let err = Error::interceptor("auth", Error::other("boom"));

        assert!(!err.is_rejection());
        assert!(err.envelope().is_none());
        assert_eq!(err.to_string(), "Interceptor 'auth' failed: boom");
    }

    #[test]
    fn test_mock_error_messages() {
        let err: Error = MockError::NoResponses.into();
        assert_eq!(
            err.to_string(),
            "Mock backend error: There are no responses to fulfill"
        );
    }

    #[test]
    fn test_context() {
        let res: std::result::Result<(), &str> = Err("bad");
        let err = res.context("opening connection").unwrap_err();
        assert_eq!(err.to_string(), "opening connection: bad");
    }
}
