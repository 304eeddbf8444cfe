// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! # ng-http - Interceptor-driven HTTP client
//!
//! Every request passes through three stages: a request intercept phase, a
//! single connection exchange, and a response intercept phase. Interceptors
//! are resolve/reject handler pairs; each one may move the request between
//! the success and failure branches in either direction.
//!
//! ## Features
//!
//! - Request and response interceptor phases with branch switching
//! - XHR connection backed by `reqwest`
//! - JSONP connection with a pluggable script loader
//! - Mock connection backend with explicit `flush` for tests
//! - Query string encoding with array expansion
//! - Stock interceptors: header injection, request logging, status checks
//!
//! ## Example
//!
//! ```rust,no_run
//! use ng_http::{Http, HeaderInjector, RequestConfig, StatusCheck};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let http = Http::new()?;
//!     http.interceptors()
//!         .push_request(HeaderInjector::new().bearer_token("secret"));
//!     http.interceptors().push_response(StatusCheck::default());
//!
//!     let config = RequestConfig::new("GET", "https://example.com/users")
//!         .param("page", 2);
//!     match http.request(config).await {
//!         Ok(envelope) => println!("{:?}", envelope.res),
//!         Err(err) if err.is_rejection() => println!("rejected: {}", err),
//!         Err(err) => return Err(err.into()),
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod connection;
pub mod error;
pub mod http;
pub mod network;

// Re-exports for convenience

// Errors
pub use error::{Error, ErrorContext, MockError, Result};

// HTTP
pub use http::{
    Headers, Http, HttpConfig, Params, RawResponse, Request, RequestConfig, Response,
    ResponseBody, ResponseType,
};

// Connections
pub use connection::{
    Connection, ConnectionFactory, JsonpFactory, MockBackend, MockConnectionFactory, Payload,
    XhrConfig, XhrFactory,
};

// Interceptor pipeline
pub use network::{
    Envelope, Failure, FnInterceptor, HeaderInjector, InterceptType, Interceptor, Interceptors,
    Phase, RequestLogger, Resolution, StatusCheck,
};

/// ng-http version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
