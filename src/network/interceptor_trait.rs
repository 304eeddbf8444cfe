// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Interceptor trait and the stock interceptors
//!
//! An interceptor is a resolve/reject handler pair. The fold calls `resolve`
//! while the envelope is on the success branch and `reject` while it is on
//! the failure branch; whatever [`Resolution`] a handler returns decides the
//! branch for the next interceptor.

use std::future::Future;
use std::ops::Range;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::{self, BoxFuture, FutureExt};

use super::envelope::{Envelope, Failure, InterceptType, Resolution};
use crate::error::Result;

/// Request/response interceptor
///
/// Both handlers default to passing the envelope through on its current
/// branch, so an interceptor only implements the side it cares about.
///
/// # Example
///
/// ```rust,no_run
/// use ng_http::network::{Envelope, Interceptor, Resolution};
/// use ng_http::Result;
/// use async_trait::async_trait;
///
/// struct ClientHeader;
///
/// #[async_trait]
/// impl Interceptor for ClientHeader {
///     async fn resolve(&self, mut envelope: Envelope) -> Result<Resolution> {
///         envelope.req.headers.set("Client", "Browser");
///         Ok(Resolution::Resolved(envelope))
///     }
/// }
/// ```
#[async_trait]
pub trait Interceptor: Send + Sync {
    /// Called while the envelope is on the success branch
    async fn resolve(&self, envelope: Envelope) -> Result<Resolution> {
        Ok(Resolution::Resolved(envelope))
    }

    /// Called while the envelope is on the failure branch.
    ///
    /// Returning `Resolution::Resolved` recovers the request.
    async fn reject(&self, envelope: Envelope) -> Result<Resolution> {
        Ok(Resolution::Rejected(envelope))
    }

    /// Name used in logs and in [`Error::Interceptor`](crate::Error::Interceptor)
    fn name(&self) -> &str {
        "interceptor"
    }
}

/// Boxed async handler
pub type Handler = Arc<dyn Fn(Envelope) -> BoxFuture<'static, Result<Resolution>> + Send + Sync>;

/// Interceptor assembled from closures; a missing handler passes through
#[derive(Clone)]
pub struct FnInterceptor {
    name: String,
    on_resolve: Option<Handler>,
    on_reject: Option<Handler>,
}

impl FnInterceptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            on_resolve: None,
            on_reject: None,
        }
    }

    /// Set a synchronous resolve handler
    pub fn on_resolve<F>(mut self, handler: F) -> Self
    where
        F: Fn(Envelope) -> Result<Resolution> + Send + Sync + 'static,
    {
        self.on_resolve = Some(Arc::new(move |env| future::ready(handler(env)).boxed()));
        self
    }

    /// Set a synchronous reject handler
    pub fn on_reject<F>(mut self, handler: F) -> Self
    where
        F: Fn(Envelope) -> Result<Resolution> + Send + Sync + 'static,
    {
        self.on_reject = Some(Arc::new(move |env| future::ready(handler(env)).boxed()));
        self
    }

    /// Set an async resolve handler
    pub fn on_resolve_async<F, Fut>(mut self, handler: F) -> Self
    where
        F: Fn(Envelope) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Resolution>> + Send + 'static,
    {
        self.on_resolve = Some(Arc::new(move |env| handler(env).boxed()));
        self
    }

    /// Set an async reject handler
    pub fn on_reject_async<F, Fut>(mut self, handler: F) -> Self
    where
        F: Fn(Envelope) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Resolution>> + Send + 'static,
    {
        self.on_reject = Some(Arc::new(move |env| handler(env).boxed()));
        self
    }
}

#[async_trait]
impl Interceptor for FnInterceptor {
    async fn resolve(&self, envelope: Envelope) -> Result<Resolution> {
        match self.on_resolve {
            Some(ref handler) => handler(envelope).await,
            None => Ok(Resolution::Resolved(envelope)),
        }
    }

    async fn reject(&self, envelope: Envelope) -> Result<Resolution> {
        match self.on_reject {
            Some(ref handler) => handler(envelope).await,
            None => Ok(Resolution::Rejected(envelope)),
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Header entry for request modification
#[derive(Debug, Clone)]
pub struct HeaderEntry {
    pub name: String,
    pub value: String,
}

impl HeaderEntry {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Adds headers to every outgoing request
pub struct HeaderInjector {
    /// Headers to inject into every request
    headers: Vec<HeaderEntry>,
    /// Hosts to inject into (empty = all, including relative urls)
    domains: Vec<String>,
}

impl HeaderInjector {
    pub fn new() -> Self {
        Self {
            headers: Vec::new(),
            domains: Vec::new(),
        }
    }

    /// Add a bearer token
    pub fn bearer_token(mut self, token: impl Into<String>) -> Self {
        self.headers.push(HeaderEntry::new(
            "authorization",
            format!("Bearer {}", token.into()),
        ));
        self
    }

    /// Add basic auth
    pub fn basic_auth(mut self, username: &str, password: &str) -> Self {
        let encoded = base64::Engine::encode(
            &base64::engine::general_purpose::STANDARD,
            format!("{}:{}", username, password),
        );
        self.headers
            .push(HeaderEntry::new("authorization", format!("Basic {}", encoded)));
        self
    }

    /// Add custom header
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push(HeaderEntry::new(name, value));
        self
    }

    /// Restrict to specific hosts
    pub fn for_domains(mut self, domains: Vec<String>) -> Self {
        self.domains = domains;
        self
    }

    fn applies_to(&self, url: &str) -> bool {
        if self.domains.is_empty() {
            return true;
        }

        url::Url::parse(url)
            .ok()
            .and_then(|u| u.host_str().map(|host| self.domains.iter().any(|d| host.contains(d.as_str()))))
            .unwrap_or(false)
    }
}

impl Default for HeaderInjector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Interceptor for HeaderInjector {
    async fn resolve(&self, mut envelope: Envelope) -> Result<Resolution> {
        if envelope.intercept_type == InterceptType::Request && self.applies_to(&envelope.req.url) {
            for header in &self.headers {
                envelope.req.headers.set(header.name.clone(), header.value.clone());
            }
        }
        Ok(Resolution::Resolved(envelope))
    }

    fn name(&self) -> &str {
        "header-injector"
    }
}

/// Logs every envelope it sees, on either branch
#[derive(Debug, Clone, Default)]
pub struct RequestLogger {
    /// Log request payloads
    pub log_bodies: bool,
    /// Log response text
    pub log_responses: bool,
    /// Only log urls containing this string
    pub url_filter: Option<String>,
}

impl RequestLogger {
    fn matches(&self, envelope: &Envelope) -> bool {
        match self.url_filter {
            Some(ref filter) => envelope.req.url.contains(filter.as_str()),
            None => true,
        }
    }

    fn log(&self, envelope: &Envelope) {
        if !self.matches(envelope) {
            return;
        }

        let req = &envelope.req;
        match envelope.intercept_type {
            InterceptType::Request => {
                tracing::info!(method = %req.method, url = %req.url, "Request");
                if self.log_bodies && !req.data.is_empty() {
                    tracing::debug!(body = %req.data, "Request body");
                }
            }
            InterceptType::Response => {
                let status = envelope.res.as_ref().map(|r| r.status);
                match envelope.err {
                    Some(ref err) => {
                        tracing::info!(url = %req.url, status = ?status, error = %err, "Response failed")
                    }
                    None => tracing::info!(url = %req.url, status = ?status, "Response"),
                }
                if self.log_responses {
                    if let Some(ref res) = envelope.res {
                        tracing::debug!(body = %res.response_text, "Response body");
                    }
                }
            }
        }
    }
}

#[async_trait]
impl Interceptor for RequestLogger {
    async fn resolve(&self, envelope: Envelope) -> Result<Resolution> {
        self.log(&envelope);
        Ok(Resolution::Resolved(envelope))
    }

    async fn reject(&self, envelope: Envelope) -> Result<Resolution> {
        self.log(&envelope);
        Ok(Resolution::Rejected(envelope))
    }

    fn name(&self) -> &str {
        "request-logger"
    }
}

/// Moves responses with an unaccepted status onto the failure branch
#[derive(Debug, Clone)]
pub struct StatusCheck {
    accepted: Range<u16>,
}

impl StatusCheck {
    /// Accept only statuses in `accepted`
    pub fn new(accepted: Range<u16>) -> Self {
        Self { accepted }
    }
}

impl Default for StatusCheck {
    fn default() -> Self {
        Self::new(200..300)
    }
}

#[async_trait]
impl Interceptor for StatusCheck {
    async fn resolve(&self, envelope: Envelope) -> Result<Resolution> {
        let status = match envelope.res {
            Some(ref res) if !self.accepted.contains(&res.status) => res.status,
            _ => return Ok(Resolution::Resolved(envelope)),
        };

        let reason = envelope
            .res
            .as_ref()
            .map(|res| res.response_text.clone())
            .filter(|text| !text.is_empty())
            .unwrap_or_else(|| format!("unexpected status {}", status));

        Ok(Resolution::Rejected(
            envelope.with_err(Failure::with_status(reason, status)),
        ))
    }

    fn name(&self) -> &str {
        "status-check"
    }
}
