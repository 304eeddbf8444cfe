// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! HTTP layer
//!
//! Request and response descriptors, the query encoder, payload
//! serialization and the [`Http`] façade that drives a request through the
//! interceptor pipeline and a connection.

mod client;
pub mod headers;
pub mod query;
mod request;
mod response;
pub mod serialize;

pub use client::{Http, HttpConfig};
pub use headers::{Headers, OrderedMap, Params};
pub use query::{encode_component, encode_value, full_url, to_query_string};
pub use request::{Request, RequestConfig, ResponseType};
pub use response::{RawResponse, Response, ResponseBody};
pub use serialize::serialize;

/// Default user agent string
pub const DEFAULT_USER_AGENT: &str = concat!("ng-http/", env!("CARGO_PKG_VERSION"));
