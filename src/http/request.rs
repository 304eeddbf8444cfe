// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Request descriptor and caller-facing request configuration

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::headers::{Headers, Params};
use crate::connection::ConnectionFactory;
use crate::error::{Error, Result};

/// Expected shape of a response body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseType {
    #[default]
    Text,
    Json,
    Document,
    Blob,
    ArrayBuffer,
}

impl ResponseType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseType::Text => "text",
            ResponseType::Json => "json",
            ResponseType::Document => "document",
            ResponseType::Blob => "blob",
            ResponseType::ArrayBuffer => "arraybuffer",
        }
    }
}

impl fmt::Display for ResponseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResponseType {
    type Err = Error;

    /// Case-insensitive; the empty string means text, as it does for XHR
    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "" | "text" => Ok(ResponseType::Text),
            "json" => Ok(ResponseType::Json),
            "document" => Ok(ResponseType::Document),
            "blob" => Ok(ResponseType::Blob),
            "arraybuffer" => Ok(ResponseType::ArrayBuffer),
            other => Err(Error::validation(format!("unknown responseType: {}", other))),
        }
    }
}

/// Request descriptor threaded through the interceptor pipeline
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    /// Request method, e.g. `GET`
    pub method: String,
    /// Request URL without the encoded params
    pub url: String,
    /// Headers pushed to the connection in insertion order
    pub headers: Headers,
    /// Query params appended to `url` when the connection is opened
    pub params: Params,
    /// Serialized payload, empty when there is none
    pub data: String,
    /// Expected response body shape
    pub response_type: ResponseType,
}

impl Request {
    /// Create a validated request with no headers, params or payload
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Result<Self> {
        let request = Self {
            method: method.into(),
            url: url.into(),
            headers: Headers::new(),
            params: Params::new(),
            data: String::new(),
            response_type: ResponseType::default(),
        };
        request.validate()?;
        Ok(request)
    }

    /// Set a header
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.set(name, value);
        self
    }

    /// Set a query param
    pub fn param(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.set(name, value);
        self
    }

    /// Set the serialized payload
    pub fn data(mut self, data: impl Into<String>) -> Self {
        self.data = data.into();
        self
    }

    /// Set the expected response type
    pub fn response_type(mut self, response_type: ResponseType) -> Self {
        self.response_type = response_type;
        self
    }

    /// Structural check run before a connection may be opened
    pub fn validate(&self) -> Result<()> {
        if self.method.trim().is_empty() {
            return Err(Error::invalid_request("method must be a non-empty string"));
        }
        if self.url.trim().is_empty() {
            return Err(Error::invalid_request("url must be a non-empty string"));
        }
        Ok(())
    }
}

/// Caller configuration for [`Http::request`](super::Http::request).
///
/// Method and url are optional here so that a missing value is reported as a
/// request failure instead of a construction panic.
#[derive(Clone, Default)]
pub struct RequestConfig {
    pub method: Option<String>,
    pub url: Option<String>,
    /// Payload, serialized before it reaches the connection
    pub data: Option<Value>,
    pub params: Params,
    pub headers: Headers,
    /// Falls back to the façade default when unset
    pub response_type: Option<ResponseType>,
    /// Connection variant; falls back to the façade default (XHR) when unset
    pub connection: Option<Arc<dyn ConnectionFactory>>,
}

impl fmt::Debug for RequestConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestConfig")
            .field("method", &self.method)
            .field("url", &self.url)
            .field("data", &self.data)
            .field("params", &self.params)
            .field("headers", &self.headers)
            .field("response_type", &self.response_type)
            .field("connection", &self.connection.as_ref().map(|c| c.name().to_string()))
            .finish()
    }
}

impl RequestConfig {
    /// Create a config with method and url set
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            method: Some(method.into()),
            url: Some(url.into()),
            ..Self::default()
        }
    }

    pub fn method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }

    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Set the payload
    pub fn data(mut self, data: impl Into<Value>) -> Self {
        self.data = Some(data.into());
        self
    }

    /// Set a query param
    pub fn param(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.set(name, value);
        self
    }

    /// Set a header
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.set(name, value);
        self
    }

    pub fn response_type(mut self, response_type: ResponseType) -> Self {
        self.response_type = Some(response_type);
        self
    }

    /// Use a specific connection variant for this request
    pub fn connection(mut self, factory: Arc<dyn ConnectionFactory>) -> Self {
        self.connection = Some(factory);
        self
    }

    /// Take the method and url, failing if either is missing or empty
    pub(crate) fn target(&self) -> Result<(String, String)> {
        let method = self
            .method
            .as_deref()
            .filter(|m| !m.trim().is_empty())
            .ok_or_else(|| Error::invalid_request("method must be a non-empty string"))?;
        let url = self
            .url
            .as_deref()
            .filter(|u| !u.trim().is_empty())
            .ok_or_else(|| Error::invalid_request("url must be a non-empty string"))?;
        Ok((method.to_string(), url.to_string()))
    }
}
