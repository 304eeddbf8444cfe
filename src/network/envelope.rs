// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Values threaded through the interceptor fold

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::error::{Error, Result};
use crate::http::{Request, Response};

/// Pipeline phase an envelope belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InterceptType {
    /// Before the connection is opened
    Request,
    /// After the connection settled
    Response,
}

/// Alias used when registering interceptors
pub type Phase = InterceptType;

impl InterceptType {
    pub fn as_str(&self) -> &'static str {
        match self {
            InterceptType::Request => "request",
            InterceptType::Response => "response",
        }
    }
}

impl fmt::Display for InterceptType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InterceptType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "request" => Ok(InterceptType::Request),
            "response" => Ok(InterceptType::Response),
            other => Err(Error::validation(format!(
                "interceptType must be \"request\" or \"response\", got: {}",
                other
            ))),
        }
    }
}

/// Failure payload carried in an envelope's `err`
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[error("{reason}")]
pub struct Failure {
    /// Human-readable reason; for mock and XHR rejections, the raw body
    pub reason: String,
    /// Status code when the failure came from a response
    pub status: Option<u16>,
    /// Arbitrary structured detail attached by an interceptor
    pub detail: Option<Value>,
}

impl Failure {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
            status: None,
            detail: None,
        }
    }

    pub fn with_status(reason: impl Into<String>, status: u16) -> Self {
        Self {
            reason: reason.into(),
            status: Some(status),
            detail: None,
        }
    }

    /// Attach structured detail
    pub fn detail(mut self, detail: impl Into<Value>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

impl From<&Error> for Failure {
    fn from(err: &Error) -> Self {
        Failure::new(err.to_string())
    }
}

/// Intercept resolution: request, optional response, optional failure
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    pub err: Option<Failure>,
    pub req: Request,
    pub res: Option<Response>,
    pub intercept_type: InterceptType,
}

impl Envelope {
    /// Seed envelope of the request phase
    pub fn request(req: Request) -> Self {
        Self {
            err: None,
            req,
            res: None,
            intercept_type: InterceptType::Request,
        }
    }

    /// Envelope of the response phase
    pub fn response(req: Request, res: Option<Response>, err: Option<Failure>) -> Self {
        Self {
            err,
            req,
            res,
            intercept_type: InterceptType::Response,
        }
    }

    /// Structural check at pipeline entry.
    ///
    /// `req` must always be valid. A response-phase envelope without `err`
    /// must carry `res`, and a present `res` is checked in either phase.
    pub fn validate(&self) -> Result<()> {
        self.req
            .validate()
            .map_err(|e| Error::validation(format!("req is not a valid request: {}", e)))?;

        if self.intercept_type == InterceptType::Response && self.err.is_none() && self.res.is_none()
        {
            return Err(Error::validation(
                "res is required for a response envelope without err",
            ));
        }

        if let Some(ref res) = self.res {
            res.validate()
                .map_err(|e| Error::validation(format!("res is not a valid response: {}", e)))?;
        }

        Ok(())
    }

    /// Set the failure
    pub fn with_err(mut self, err: Failure) -> Self {
        self.err = Some(err);
        self
    }

    /// Drop the failure
    pub fn without_err(mut self) -> Self {
        self.err = None;
        self
    }

    /// Set the response
    pub fn with_res(mut self, res: Response) -> Self {
        self.res = Some(res);
        self
    }

    pub fn is_err(&self) -> bool {
        self.err.is_some()
    }

    /// Branch this envelope would seed: rejected when `err` is set
    pub fn into_resolution(self) -> Resolution {
        if self.err.is_some() {
            Resolution::Rejected(self)
        } else {
            Resolution::Resolved(self)
        }
    }
}

/// Branch-tagged envelope.
///
/// The tag decides the next handler, except that a `Resolved` envelope
/// carrying `err` counts as `Rejected`. A `Rejected` envelope without `err`
/// stays rejected.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Resolved(Envelope),
    Rejected(Envelope),
}

impl Resolution {
    pub fn is_resolved(&self) -> bool {
        matches!(self, Resolution::Resolved(_))
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self, Resolution::Rejected(_))
    }

    pub fn envelope(&self) -> &Envelope {
        match self {
            Resolution::Resolved(e) | Resolution::Rejected(e) => e,
        }
    }

    pub fn envelope_mut(&mut self) -> &mut Envelope {
        match self {
            Resolution::Resolved(e) | Resolution::Rejected(e) => e,
        }
    }

    pub fn into_envelope(self) -> Envelope {
        match self {
            Resolution::Resolved(e) | Resolution::Rejected(e) => e,
        }
    }

    /// Branch name, for logging
    pub fn branch(&self) -> &'static str {
        match self {
            Resolution::Resolved(_) => "resolved",
            Resolution::Rejected(_) => "rejected",
        }
    }

    /// Move a resolved envelope that carries `err` onto the reject branch
    pub fn normalize(self) -> Self {
        match self {
            Resolution::Resolved(e) if e.err.is_some() => Resolution::Rejected(e),
            other => other,
        }
    }

    /// Final outcome of a phase: resolved is `Ok`, rejected is [`Error::Rejected`]
    pub fn into_result(self) -> Result<Envelope> {
        match self.normalize() {
            Resolution::Resolved(e) => Ok(e),
            Resolution::Rejected(e) => Err(Error::Rejected(Box::new(e))),
        }
    }
}
