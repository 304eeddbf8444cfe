// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! HTTP façade: request building, both intercept phases and the transport

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use super::headers::Headers;
use super::query::full_url;
use super::request::{Request, RequestConfig, ResponseType};
use super::response::Response;
use super::serialize::serialize;
use crate::connection::{
    ConnectionFactory, HttpScriptLoader, JsonpFactory, Payload, XhrConfig, XhrFactory,
};
use crate::error::Result;
use crate::network::{Envelope, Failure, Interceptors};

/// Façade configuration
#[derive(Debug, Clone, Default)]
pub struct HttpConfig {
    /// Configuration of the default XHR connection
    pub xhr: XhrConfig,
    /// Response type of requests that do not set one
    pub default_response_type: ResponseType,
    /// Headers added to every request before its own headers
    pub default_headers: Headers,
}

impl HttpConfig {
    pub fn xhr(mut self, xhr: XhrConfig) -> Self {
        self.xhr = xhr;
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.xhr.user_agent = user_agent.into();
        self
    }

    pub fn default_response_type(mut self, response_type: ResponseType) -> Self {
        self.default_response_type = response_type;
        self
    }

    pub fn default_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.set(name, value);
        self
    }
}

/// Interceptor-driven HTTP client.
///
/// Every request runs the request phase, one connection exchange and the
/// response phase. A request phase that ends rejected never creates a
/// connection.
pub struct Http {
    config: HttpConfig,
    interceptors: Interceptors,
    default_connection: Arc<dyn ConnectionFactory>,
    jsonp: Arc<JsonpFactory>,
}

impl Http {
    /// Create a client with default configuration
    pub fn new() -> Result<Self> {
        Self::with_config(HttpConfig::default())
    }

    /// Create a client with custom configuration
    pub fn with_config(config: HttpConfig) -> Result<Self> {
        let xhr = XhrFactory::with_config(config.xhr.clone())?;
        let loader = HttpScriptLoader::with_client(xhr.client().clone(), config.xhr.base_url.clone());
        let jsonp = JsonpFactory::with_loader(Arc::new(loader))?;

        Ok(Self {
            config,
            interceptors: Interceptors::new(),
            default_connection: Arc::new(xhr),
            jsonp: Arc::new(jsonp),
        })
    }

    /// Replace the connection used by requests that do not pick one
    pub fn with_connection_factory(mut self, factory: Arc<dyn ConnectionFactory>) -> Self {
        self.default_connection = factory;
        self
    }

    /// Global interceptor registry
    pub fn interceptors(&self) -> &Interceptors {
        &self.interceptors
    }

    pub fn config(&self) -> &HttpConfig {
        &self.config
    }

    /// Factory behind [`Http::jsonp`]
    pub fn jsonp_factory(&self) -> &Arc<JsonpFactory> {
        &self.jsonp
    }

    /// Run an envelope through the phase named by its `intercept_type`.
    ///
    /// The envelope is validated first; it starts on the reject branch when
    /// it carries `err`. Ends in `Ok` when the last interceptor resolved and
    /// in [`Error::Rejected`](crate::Error::Rejected) when it rejected.
    pub async fn intercept(&self, envelope: Envelope) -> Result<Envelope> {
        envelope.validate()?;
        let phase = envelope.intercept_type;
        let outcome = self
            .interceptors
            .run(phase, envelope.into_resolution())
            .await?;
        outcome.into_result()
    }

    /// Perform a request
    pub async fn request(&self, config: RequestConfig) -> Result<Envelope> {
        let (req, factory) = self.build_request(config)?;
        tracing::debug!(
            method = %req.method,
            url = %req.url,
            connection = factory.name(),
            "Request started"
        );

        let envelope = self.intercept(Envelope::request(req)).await?;
        let req = envelope.req;
        req.validate()?;

        let seed = self.transport(req, factory.as_ref()).await?;
        self.intercept(seed).await
    }

    /// GET `url`
    pub async fn get(&self, url: &str) -> Result<Envelope> {
        self.request(RequestConfig::new("GET", url)).await
    }

    /// DELETE `url`
    pub async fn delete(&self, url: &str) -> Result<Envelope> {
        self.request(RequestConfig::new("DELETE", url)).await
    }

    /// POST `data` to `url`
    pub async fn post(&self, url: &str, data: impl Into<Value>) -> Result<Envelope> {
        self.request(RequestConfig::new("POST", url).data(data)).await
    }

    /// PUT `data` to `url`
    pub async fn put(&self, url: &str, data: impl Into<Value>) -> Result<Envelope> {
        self.request(RequestConfig::new("PUT", url).data(data)).await
    }

    /// Load `url` as JSONP; `JSON_CALLBACK` in the url names the callback
    pub async fn jsonp(&self, url: &str) -> Result<Envelope> {
        let config = RequestConfig::new("GET", url)
            .response_type(ResponseType::Json)
            .connection(self.jsonp.clone());
        self.request(config).await
    }

    fn build_request(
        &self,
        config: RequestConfig,
    ) -> Result<(Request, Arc<dyn ConnectionFactory>)> {
        let (method, url) = config.target()?;
        let mut req = Request::new(method, url)?;

        for (name, value) in self.config.default_headers.iter() {
            req.headers.set(name, value.clone());
        }
        for (name, value) in config.headers.iter() {
            req.headers.set(name, value.clone());
        }

        req.data = serialize(config.data.as_ref());
        req.params = config.params;
        req.response_type = config
            .response_type
            .unwrap_or(self.config.default_response_type);

        let factory = config
            .connection
            .unwrap_or_else(|| self.default_connection.clone());
        Ok((req, factory))
    }

    /// One connection exchange, producing the response phase seed
    async fn transport(&self, req: Request, factory: &dyn ConnectionFactory) -> Result<Envelope> {
        let mut connection = factory.create();
        let url = full_url(&req.url, &req.params)?;

        connection.open(&req.method, &url)?;
        for (name, value) in req.headers.iter() {
            connection.set_request_header(name, value)?;
        }

        let payload = if req.data.is_empty() {
            None
        } else {
            Some(Payload::Text(req.data.clone()))
        };
        connection.send(payload)?;

        let envelope = match connection.wait().await {
            Ok(raw) => {
                let status = raw.status;
                match Response::from_raw(raw, req.response_type) {
                    Ok(res) => {
                        tracing::debug!(status, url = %url, "Connection resolved");
                        Envelope::response(req, Some(res), None)
                    }
                    Err(e) => {
                        tracing::debug!(status, error = %e, "Response body conversion failed");
                        let failure = Failure::with_status(e.to_string(), status);
                        Envelope::response(req, None, Some(failure))
                    }
                }
            }
            Err(failure) => {
                tracing::debug!(reason = %failure.reason, url = %url, "Connection rejected");
                Envelope::response(req, None, Some(failure))
            }
        };

        Ok(envelope)
    }
}

impl fmt::Debug for Http {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Http")
            .field("config", &self.config)
            .field("interceptors", &self.interceptors)
            .field("default_connection", &self.default_connection.name())
            .finish()
    }
}
