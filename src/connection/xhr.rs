// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! XHR-style connection backed by `reqwest`

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::redirect::Policy;
use reqwest::{Client, Method};
use url::Url;

use super::deferred::{Deferred, Resolver};
use super::{resolve_url, Connection, ConnectionFactory, OpenGuard, Payload};
use crate::error::{Error, Result};
use crate::http::headers::names;
use crate::http::{Headers, RawResponse, DEFAULT_USER_AGENT};
use crate::network::Failure;

/// XHR connection configuration
#[derive(Debug, Clone)]
pub struct XhrConfig {
    /// User agent string
    pub user_agent: String,
    /// Base for relative request urls
    pub base_url: Option<Url>,
    /// Headers sent with every request unless the request sets them
    pub default_headers: Headers,
    /// Per-exchange timeout; none by default
    pub timeout: Option<Duration>,
    /// Maximum redirects to follow
    pub max_redirects: usize,
}

impl Default for XhrConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            base_url: None,
            default_headers: Headers::new(),
            timeout: None,
            max_redirects: 10,
        }
    }
}

impl XhrConfig {
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Set the base url; fails if it does not parse
    pub fn base_url(mut self, base_url: &str) -> Result<Self> {
        self.base_url = Some(Url::parse(base_url)?);
        Ok(self)
    }

    pub fn default_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.set(name, value);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn max_redirects(mut self, max_redirects: usize) -> Self {
        self.max_redirects = max_redirects;
        self
    }
}

/// Creates [`XhrConnection`]s sharing one `reqwest` client
#[derive(Debug, Clone)]
pub struct XhrFactory {
    client: Client,
    config: Arc<XhrConfig>,
}

impl XhrFactory {
    /// Create a factory with default configuration
    pub fn new() -> Result<Self> {
        Self::with_config(XhrConfig::default())
    }

    /// Create a factory with custom configuration
    pub fn with_config(config: XhrConfig) -> Result<Self> {
        let mut builder = Client::builder()
            .user_agent(&config.user_agent)
            .redirect(Policy::limited(config.max_redirects));

        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }

        let client = builder.build()?;

        Ok(Self {
            client,
            config: Arc::new(config),
        })
    }

    /// Underlying HTTP client
    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn config(&self) -> &XhrConfig {
        &self.config
    }

    /// Create a connection with its concrete type
    pub fn connect(&self) -> XhrConnection {
        XhrConnection {
            client: self.client.clone(),
            config: self.config.clone(),
            guard: OpenGuard::default(),
            headers: Headers::new(),
            deferred: Deferred::new(),
        }
    }
}

impl ConnectionFactory for XhrFactory {
    fn create(&self) -> Box<dyn Connection> {
        Box::new(self.connect())
    }

    fn name(&self) -> &str {
        "xhr"
    }
}

/// One HTTP exchange.
///
/// `send` spawns the exchange on the tokio runtime and returns at once; the
/// load settles `success` for any status, a transport failure settles
/// `error`.
#[derive(Debug)]
pub struct XhrConnection {
    client: Client,
    config: Arc<XhrConfig>,
    guard: OpenGuard,
    headers: Headers,
    deferred: Deferred,
}

impl XhrConnection {
    /// Request headers set so far
    pub fn request_headers(&self) -> &Headers {
        &self.headers
    }

    fn resolve_url(&self, url: &str) -> Result<Url> {
        resolve_url(self.config.base_url.as_ref(), url)
    }
}

#[async_trait]
impl Connection for XhrConnection {
    fn open(&mut self, method: &str, url: &str) -> Result<()> {
        self.guard.open(method, url)?;
        tracing::debug!(method, url, "XHR opened");
        Ok(())
    }

    fn set_request_header(&mut self, name: &str, value: &str) -> Result<()> {
        self.headers.set(name, value.to_string());
        Ok(())
    }

    fn send(&mut self, data: Option<Payload>) -> Result<()> {
        let (method, url) = self.guard.begin_send()?;
        let target = self.resolve_url(&url)?;
        let method = Method::from_bytes(method.to_ascii_uppercase().as_bytes())
            .map_err(|_| Error::invalid_request(format!("invalid method: {}", method)))?;
        let resolver = self
            .deferred
            .resolver()
            .ok_or_else(|| Error::connection("connection is already being awaited"))?;

        let mut builder = self.client.request(method.clone(), target.clone());

        for (name, value) in self.config.default_headers.iter() {
            if self.headers.get_ignore_case(name).is_none() {
                builder = builder.header(name, value.as_str());
            }
        }
        for (name, value) in self.headers.iter() {
            builder = builder.header(name, value.as_str());
        }

        if let Some(payload) = data {
            if self.headers.get_ignore_case(names::CONTENT_TYPE).is_none() {
                if let Some(content_type) = payload.content_type() {
                    builder = builder.header(names::CONTENT_TYPE, content_type);
                }
            }
            builder = builder.body(payload.into_bytes());
        }

        tracing::debug!(method = %method, url = %target, "XHR sent");
        tokio::spawn(exchange(builder, resolver));
        Ok(())
    }

    fn success(&self, response: RawResponse) {
        self.deferred.resolve(response);
    }

    fn error(&self, failure: Failure) {
        self.deferred.reject(failure);
    }

    async fn wait(&mut self) -> std::result::Result<RawResponse, Failure> {
        self.deferred.wait().await
    }

    fn method(&self) -> Option<&str> {
        self.guard.method()
    }

    fn url(&self) -> Option<&str> {
        self.guard.url()
    }
}

async fn exchange(builder: reqwest::RequestBuilder, resolver: Resolver) {
    let response = match builder.send().await {
        Ok(response) => response,
        Err(e) => {
            tracing::debug!(error = %e, "XHR transport error");
            resolver.reject(Failure::new(e.to_string()));
            return;
        }
    };

    let status = response.status().as_u16();
    let headers = collect_headers(response.headers());

    match response.bytes().await {
        Ok(bytes) => {
            tracing::debug!(status, len = bytes.len(), "XHR loaded");
            let text = String::from_utf8_lossy(&bytes).into_owned();
            resolver.resolve(RawResponse {
                status,
                headers,
                text,
                bytes,
            });
        }
        Err(e) => {
            resolver.reject(Failure::with_status(e.to_string(), status));
        }
    }
}

/// Repeated headers are joined with `, ` the way XHR reports them
fn collect_headers(map: &reqwest::header::HeaderMap) -> Headers {
    let mut headers = Headers::new();
    for (name, value) in map.iter() {
        let value = String::from_utf8_lossy(value.as_bytes()).into_owned();
        match headers.get_mut(name.as_str()) {
            Some(existing) => {
                existing.push_str(", ");
                existing.push_str(&value);
            }
            None => {
                headers.set(name.as_str(), value);
            }
        }
    }
    headers
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_factory_creation() {
        let factory = XhrFactory::new().unwrap();
        assert_eq!(factory.config().user_agent, DEFAULT_USER_AGENT);
        assert!(factory.config().timeout.is_none());
        assert_eq!(factory.name(), "xhr");
    }

    #[test]
    fn test_headers_buffered_before_open() {
        let factory = XhrFactory::new().unwrap();
        let mut conn = factory.connect();
        conn.set_request_header("X-Early", "1").unwrap();
        conn.open("GET", "http://localhost/users").unwrap();
        assert_eq!(
            conn.request_headers().get("X-Early").map(String::as_str),
            Some("1")
        );
    }

    #[test]
    fn test_relative_url_needs_base() {
        let factory = XhrFactory::new().unwrap();
        let conn = factory.connect();
        assert!(matches!(conn.resolve_url("/users"), Err(Error::InvalidRequest(_))));

        let config = XhrConfig::default().base_url("http://api.local/v1/").unwrap();
        let factory = XhrFactory::with_config(config).unwrap();
        let conn = factory.connect();
        assert_eq!(
            conn.resolve_url("users?id=1").unwrap().as_str(),
            "http://api.local/v1/users?id=1"
        );
    }

    #[tokio::test]
    async fn test_send_before_open_fails() {
        let factory = XhrFactory::new().unwrap();
        let mut conn = factory.connect();
        assert!(matches!(conn.send(None), Err(Error::Connection(_))));
    }

    #[tokio::test]
    async fn test_manual_settlement() {
        let factory = XhrFactory::new().unwrap();
        let mut conn = factory.connect();
        conn.open("GET", "http://localhost/users").unwrap();
        conn.success(RawResponse::text(200, "User!"));
        conn.error(Failure::new("late"));

        let raw = conn.wait().await.unwrap();
        assert_eq!(raw.text, "User!");
    }

    #[test]
    fn test_collect_headers_joins_repeats() {
        let mut map = reqwest::header::HeaderMap::new();
        map.append("set-cookie", "a=1".parse().unwrap());
        map.append("set-cookie", "b=2".parse().unwrap());
        map.insert("content-type", "text/plain".parse().unwrap());

        let headers = collect_headers(&map);
        assert_eq!(headers.get("set-cookie").map(String::as_str), Some("a=1, b=2"));
        assert_eq!(headers.get_ignore_case("Content-Type"), Some("text/plain"));
    }
}
