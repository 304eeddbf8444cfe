// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! HTTP response types

use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::headers::Headers;
use super::request::ResponseType;
use crate::error::{Error, Result};

/// What a connection hands back when it completes
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawResponse {
    /// Status code, 0 when the transport has none
    pub status: u16,
    /// Response headers
    pub headers: Headers,
    /// Raw response text
    pub text: String,
    /// Raw body bytes; empty when the transport only produced text
    pub bytes: Bytes,
}

impl RawResponse {
    /// Create a text-only raw response
    pub fn text(status: u16, text: impl Into<String>) -> Self {
        Self {
            status,
            headers: Headers::new(),
            text: text.into(),
            bytes: Bytes::new(),
        }
    }

    /// Attach headers
    pub fn with_headers(mut self, headers: Headers) -> Self {
        self.headers = headers;
        self
    }

    /// Body bytes, falling back to the text
    fn body_bytes(&self) -> Bytes {
        if self.bytes.is_empty() {
            Bytes::from(self.text.clone().into_bytes())
        } else {
            self.bytes.clone()
        }
    }
}

/// Response body, typed by the request's response type
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    Text(String),
    Json(Value),
    /// Markup of a document response
    Document(String),
    Blob(Bytes),
    ArrayBuffer(Bytes),
}

impl ResponseBody {
    /// Response type this body variant satisfies
    pub fn response_type(&self) -> ResponseType {
        match self {
            ResponseBody::Text(_) => ResponseType::Text,
            ResponseBody::Json(_) => ResponseType::Json,
            ResponseBody::Document(_) => ResponseType::Document,
            ResponseBody::Blob(_) => ResponseType::Blob,
            ResponseBody::ArrayBuffer(_) => ResponseType::ArrayBuffer,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            ResponseBody::Text(s) | ResponseBody::Document(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_json(&self) -> Option<&Value> {
        match self {
            ResponseBody::Json(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&Bytes> {
        match self {
            ResponseBody::Blob(b) | ResponseBody::ArrayBuffer(b) => Some(b),
            _ => None,
        }
    }
}

/// Response descriptor threaded through the response phase
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    /// Response headers
    pub headers: Headers,
    /// Typed body
    pub body: ResponseBody,
    /// Response type the body must match
    pub response_type: ResponseType,
    /// Raw string form of the body
    pub response_text: String,
    /// Response status code
    pub status: u16,
}

impl Response {
    /// Create a text response
    pub fn text(status: u16, text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            headers: Headers::new(),
            body: ResponseBody::Text(text.clone()),
            response_type: ResponseType::Text,
            response_text: text,
            status,
        }
    }

    /// Build a descriptor from a connection's raw result
    pub fn from_raw(raw: RawResponse, response_type: ResponseType) -> Result<Self> {
        let body = match response_type {
            ResponseType::Text => ResponseBody::Text(raw.text.clone()),
            ResponseType::Json => {
                if raw.text.trim().is_empty() {
                    ResponseBody::Json(Value::Null)
                } else {
                    ResponseBody::Json(serde_json::from_str(&raw.text)?)
                }
            }
            ResponseType::Document => ResponseBody::Document(raw.text.clone()),
            ResponseType::Blob => ResponseBody::Blob(raw.body_bytes()),
            ResponseType::ArrayBuffer => ResponseBody::ArrayBuffer(raw.body_bytes()),
        };

        Ok(Self {
            headers: raw.headers,
            body,
            response_type,
            response_text: raw.text,
            status: raw.status,
        })
    }

    /// Cross-check the body variant against the response type
    pub fn validate(&self) -> Result<()> {
        let actual = self.body.response_type();
        if actual != self.response_type {
            return Err(Error::validation(format!(
                "response body is {} but responseType is {}",
                actual, self.response_type
            )));
        }
        Ok(())
    }

    /// Check if status is success (2xx)
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Check if status is client error (4xx)
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status)
    }

    /// Check if status is server error (5xx)
    pub fn is_server_error(&self) -> bool {
        (500..600).contains(&self.status)
    }

    /// Get a header value
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get_ignore_case(name)
    }

    /// Get content type
    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }

    /// Parse the raw text as JSON
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_str(&self.response_text).map_err(Error::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_response_status() {
        let resp = Response::text(200, "ok");
        assert!(resp.is_success());
        assert!(!resp.is_client_error());
        assert!(Response::text(404, "").is_client_error());
        assert!(Response::text(503, "").is_server_error());
    }

    #[test]
    fn test_from_raw_text() {
        let raw = RawResponse::text(200, "User!")
            .with_headers(Headers::new().with("Content-Type", "text/plain"));
        let resp = Response::from_raw(raw, ResponseType::Text).unwrap();

        assert_eq!(resp.body, ResponseBody::Text("User!".to_string()));
        assert_eq!(resp.response_text, "User!");
        assert_eq!(resp.content_type(), Some("text/plain"));
        resp.validate().unwrap();
    }

    #[test]
    fn test_from_raw_json() {
        let raw = RawResponse::text(200, r#"{"name":"Jeff"}"#);
        let resp = Response::from_raw(raw, ResponseType::Json).unwrap();
        assert_eq!(resp.body.as_json(), Some(&json!({"name": "Jeff"})));

        let empty = Response::from_raw(RawResponse::text(204, ""), ResponseType::Json).unwrap();
        assert_eq!(empty.body, ResponseBody::Json(Value::Null));
    }

    #[test]
    fn test_from_raw_bad_json() {
        let raw = RawResponse::text(200, "not json");
        assert!(matches!(
            Response::from_raw(raw, ResponseType::Json),
            Err(Error::Serialization(_))
        ));
    }

    #[test]
    fn test_from_raw_binary_falls_back_to_text() {
        let resp = Response::from_raw(RawResponse::text(200, "abc"), ResponseType::ArrayBuffer)
            .unwrap();
        assert_eq!(resp.body.as_bytes().map(|b| &b[..]), Some(&b"abc"[..]));
    }

    #[test]
    fn test_validate_mismatch() {
        let mut resp = Response::text(200, "foo");
        resp.response_type = ResponseType::Json;
        assert!(matches!(resp.validate(), Err(Error::Validation(_))));

        resp.body = ResponseBody::Json(json!({}));
        resp.validate().unwrap();
    }
}
