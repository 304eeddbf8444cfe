// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Connections: one-shot transports behind the HTTP façade
//!
//! A connection is created per request, opened exactly once, sent, and then
//! settles exactly once with either a [`RawResponse`] or a [`Failure`].
//!
//! - [`XhrConnection`] performs a real HTTP exchange with `reqwest`
//! - [`JsonpConnection`] loads a script and waits for its callback
//! - [`MockConnection`] parks the request in a [`MockBackend`] until flushed

mod deferred;
mod jsonp;
mod mock;
mod xhr;

use async_trait::async_trait;
use bytes::Bytes;
use url::Url;

use crate::error::{Error, Result};
use crate::http::RawResponse;
use crate::network::Failure;

pub use deferred::{Deferred, Outcome, Resolver};
pub use jsonp::{
    CallbackRegistry, HttpScriptLoader, JsonpConnection, JsonpFactory, ScriptLoader,
    CALLBACK_PLACEHOLDER, CALLBACK_PREFIX,
};
pub use mock::{
    MockBackend, MockConnection, MockConnectionFactory, PendingConnection, ResponseHandle,
    ResponseMap,
};
pub use xhr::{XhrConfig, XhrConnection, XhrFactory};

/// Data a connection can send
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Text(String),
    Binary(Bytes),
    Blob { mime: String, bytes: Bytes },
    /// Serialized markup of a document
    Document(String),
    /// Fields sent url-encoded
    Form(Vec<(String, String)>),
}

impl Payload {
    /// Default content type when the caller set none
    pub fn content_type(&self) -> Option<&str> {
        match self {
            Payload::Text(_) => Some("text/plain;charset=UTF-8"),
            Payload::Binary(_) => None,
            Payload::Blob { mime, .. } if !mime.is_empty() => Some(mime.as_str()),
            Payload::Blob { .. } => None,
            Payload::Document(markup) => {
                let markup = markup.trim_start().as_bytes();
                let starts_with = |prefix: &str| {
                    markup
                        .get(..prefix.len())
                        .map_or(false, |head| head.eq_ignore_ascii_case(prefix.as_bytes()))
                };
                if starts_with("<!doctype html") || starts_with("<html") {
                    Some("text/html;charset=UTF-8")
                } else {
                    Some("application/xml;charset=UTF-8")
                }
            }
            Payload::Form(_) => Some("application/x-www-form-urlencoded"),
        }
    }

    /// Body bytes as they go on the wire
    pub fn into_bytes(self) -> Bytes {
        match self {
            Payload::Text(s) | Payload::Document(s) => Bytes::from(s.into_bytes()),
            Payload::Binary(b) | Payload::Blob { bytes: b, .. } => b,
            Payload::Form(fields) => {
                let encoded = url::form_urlencoded::Serializer::new(String::new())
                    .extend_pairs(fields.iter())
                    .finish();
                Bytes::from(encoded.into_bytes())
            }
        }
    }
}

impl From<String> for Payload {
    fn from(s: String) -> Self {
        Payload::Text(s)
    }
}

impl From<&str> for Payload {
    fn from(s: &str) -> Self {
        Payload::Text(s.to_string())
    }
}

impl From<Bytes> for Payload {
    fn from(b: Bytes) -> Self {
        Payload::Binary(b)
    }
}

/// Capability set every transport exposes
#[async_trait]
pub trait Connection: Send {
    /// Record the target; fails on a second call or an empty method/url
    fn open(&mut self, method: &str, url: &str) -> Result<()>;

    /// Set a request header; allowed before `open`
    fn set_request_header(&mut self, name: &str, value: &str) -> Result<()>;

    /// Start the exchange; fails before `open` or on a second call
    fn send(&mut self, data: Option<Payload>) -> Result<()>;

    /// Settle successfully (first settlement wins)
    fn success(&self, response: RawResponse);

    /// Settle with a failure (first settlement wins)
    fn error(&self, failure: Failure);

    /// Wait for the settled outcome
    async fn wait(&mut self) -> std::result::Result<RawResponse, Failure>;

    /// Method given to `open`
    fn method(&self) -> Option<&str>;

    /// Url given to `open` (after any rewriting)
    fn url(&self) -> Option<&str>;
}

/// Creates a fresh connection per request
pub trait ConnectionFactory: Send + Sync {
    fn create(&self) -> Box<dyn Connection>;

    /// Variant name, for logs
    fn name(&self) -> &str;
}

/// Open-once bookkeeping shared by the connection variants
#[derive(Debug, Default)]
pub(crate) struct OpenGuard {
    target: Option<(String, String)>,
    sent: bool,
}

impl OpenGuard {
    pub(crate) fn open(&mut self, method: &str, url: &str) -> Result<()> {
        if self.target.is_some() {
            return Err(Error::connection("open called more than once"));
        }
        if method.trim().is_empty() {
            return Err(Error::invalid_request("method must be a non-empty string"));
        }
        if url.trim().is_empty() {
            return Err(Error::invalid_request("url must be a non-empty string"));
        }
        self.target = Some((method.to_string(), url.to_string()));
        Ok(())
    }

    /// Mark as sent, returning the target
    pub(crate) fn begin_send(&mut self) -> Result<(String, String)> {
        let target = self
            .target
            .clone()
            .ok_or_else(|| Error::connection("send called before open"))?;
        if self.sent {
            return Err(Error::connection("send called more than once"));
        }
        self.sent = true;
        Ok(target)
    }

    pub(crate) fn method(&self) -> Option<&str> {
        self.target.as_ref().map(|(m, _)| m.as_str())
    }

    pub(crate) fn url(&self) -> Option<&str> {
        self.target.as_ref().map(|(_, u)| u.as_str())
    }
}

/// Join a relative url onto `base`; absolute urls pass through
pub(crate) fn resolve_url(base: Option<&Url>, url: &str) -> Result<Url> {
    match Url::parse(url) {
        Ok(url) => Ok(url),
        Err(url::ParseError::RelativeUrlWithoutBase) => match base {
            Some(base) => Ok(base.join(url)?),
            None => Err(Error::invalid_request(format!(
                "relative url {} needs a base url",
                url
            ))),
        },
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guard_open_once() {
        let mut guard = OpenGuard::default();
        guard.open("GET", "/items").unwrap();
        assert_eq!(guard.method(), Some("GET"));
        assert_eq!(guard.url(), Some("/items"));
        assert!(matches!(guard.open("GET", "/items"), Err(Error::Connection(_))));
    }

    #[test]
    fn test_guard_rejects_empty_target() {
        let mut guard = OpenGuard::default();
        assert!(matches!(guard.open("", "/users"), Err(Error::InvalidRequest(_))));
        assert!(matches!(guard.open("GET", ""), Err(Error::InvalidRequest(_))));
        guard.open("GET", "/users").unwrap();
    }

    #[test]
    fn test_guard_send_rules() {
        let mut guard = OpenGuard::default();
        assert!(guard.begin_send().is_err());
        guard.open("POST", "/assets").unwrap();
        assert_eq!(
            guard.begin_send().unwrap(),
            ("POST".to_string(), "/assets".to_string())
        );
        assert!(guard.begin_send().is_err());
    }

    #[test]
    fn test_payload_content_types() {
        assert_eq!(
            Payload::from("POST ME!").content_type(),
            Some("text/plain;charset=UTF-8")
        );
        assert_eq!(Payload::Binary(Bytes::new()).content_type(), None);
        assert_eq!(
            Payload::Blob { mime: "image/png".into(), bytes: Bytes::new() }.content_type(),
            Some("image/png")
        );
        assert_eq!(
            Payload::Document("<!DOCTYPE html><html></html>".into()).content_type(),
            Some("text/html;charset=UTF-8")
        );
        assert_eq!(
            Payload::Document("  <HTML></HTML>".into()).content_type(),
            Some("text/html;charset=UTF-8")
        );
        assert_eq!(
            Payload::Document("<html>é</html>".into()).content_type(),
            Some("text/html;charset=UTF-8")
        );
        assert_eq!(
            Payload::Document("<doc>ééééééé</doc>".into()).content_type(),
            Some("application/xml;charset=UTF-8")
        );
        assert_eq!(
            Payload::Document("<doc/>".into()).content_type(),
            Some("application/xml;charset=UTF-8")
        );
    }

    #[test]
    fn test_form_payload_bytes() {
        let form = Payload::Form(vec![
            ("user".to_string(), "Jeff".to_string()),
            ("q".to_string(), "a b&c".to_string()),
        ]);
        assert_eq!(&form.into_bytes()[..], b"user=Jeff&q=a+b%26c");
    }
}
