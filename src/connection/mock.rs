// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! In-memory connection backend for tests
//!
//! Connections park in a [`MockBackend`] when sent and settle only when the
//! test calls [`MockBackend::flush`]. Each backend is an independent handle;
//! there is no process-wide mock state.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use url::Url;

use super::deferred::{Deferred, Resolver};
use super::{Connection, ConnectionFactory, OpenGuard, Payload};
use crate::error::{Error, MockError, Result};
use crate::http::{OrderedMap, RawResponse};
use crate::network::Failure;

/// Canned response for one method and path; unset until `respond`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseMap {
    pub code: Option<u16>,
    pub body: Option<String>,
}

impl ResponseMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&mut self, code: u16, body: impl Into<String>) {
        self.code = Some(code);
        self.body = Some(body.into());
    }
}

/// A sent mock connection waiting for `flush`
#[derive(Debug)]
pub struct PendingConnection {
    pub method: String,
    pub url: String,
    pub data: Option<Payload>,
    resolver: Resolver,
}

impl PendingConnection {
    pub fn new(
        method: impl Into<String>,
        url: impl Into<String>,
        data: Option<Payload>,
        resolver: Resolver,
    ) -> Self {
        Self {
            method: method.into(),
            url: url.into(),
            data,
            resolver,
        }
    }

    fn settle(self, code: u16, body: String) {
        if code > 399 {
            self.resolver.reject(Failure::with_status(body, code));
        } else {
            self.resolver.resolve(RawResponse::text(code, body));
        }
    }
}

#[derive(Debug, Default)]
struct BackendState {
    /// method (upper-cased) -> path -> response
    responses: OrderedMap<OrderedMap<ResponseMap>>,
    pending: Vec<PendingConnection>,
    headers: Vec<(String, String)>,
}

/// Shared handle to one mock backend
#[derive(Debug, Clone, Default)]
pub struct MockBackend {
    state: Arc<Mutex<BackendState>>,
}

/// Returned by [`MockBackend::when_request`]
#[derive(Debug, Clone)]
pub struct ResponseHandle {
    backend: MockBackend,
    method: String,
    path: String,
}

impl ResponseHandle {
    /// Set the status and body served for this method and path
    pub fn respond(&self, code: u16, body: impl Into<String>) {
        let mut state = self.backend.state.lock();
        if let Some(map) = state
            .responses
            .get_mut(&self.method)
            .and_then(|paths| paths.get_mut(&self.path))
        {
            map.respond(code, body);
        }
    }
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a request signature. The response stays unset until
    /// `respond` is called on the returned handle.
    pub fn when_request(&self, method: &str, path: &str) -> ResponseHandle {
        let method = method.to_ascii_uppercase();
        let mut state = self.state.lock();
        if !state.responses.contains_key(&method) {
            state.responses.set(method.clone(), OrderedMap::<ResponseMap>::new());
        }
        if let Some(paths) = state.responses.get_mut(&method) {
            if !paths.contains_key(path) {
                paths.set(path, ResponseMap::new());
            }
        }

        ResponseHandle {
            backend: self.clone(),
            method,
            path: path.to_string(),
        }
    }

    /// Registered response for a method and path
    pub fn response_for(&self, method: &str, path: &str) -> Option<ResponseMap> {
        self.state
            .lock()
            .responses
            .get(&method.to_ascii_uppercase())
            .and_then(|paths| paths.get(path))
            .cloned()
    }

    /// Append a sent connection to the FIFO pending list
    pub fn add_connection(&self, connection: PendingConnection) {
        tracing::debug!(method = %connection.method, url = %connection.url, "Mock connection pending");
        self.state.lock().pending.push(connection);
    }

    /// Record a header set by a mock connection
    pub fn set_request_header(&self, name: &str, value: &str) {
        self.state
            .lock()
            .headers
            .push((name.to_string(), value.to_string()));
    }

    /// Headers recorded so far, in the order they were set
    pub fn recorded_headers(&self) -> Vec<(String, String)> {
        self.state.lock().headers.clone()
    }

    /// Number of sent connections waiting for `flush`
    pub fn pending_count(&self) -> usize {
        self.state.lock().pending.len()
    }

    /// Methods and urls of the pending connections, in send order
    pub fn pending_requests(&self) -> Vec<(String, String)> {
        self.state
            .lock()
            .pending
            .iter()
            .map(|c| (c.method.clone(), c.url.clone()))
            .collect()
    }

    /// Data sent by the pending connections, in send order
    pub fn pending_data(&self) -> Vec<Option<Payload>> {
        self.state
            .lock()
            .pending
            .iter()
            .map(|c| c.data.clone())
            .collect()
    }

    /// Drop registrations, pending connections and recorded headers.
    /// Pending connections fail with "connection closed before completion".
    pub fn reset(&self) {
        let mut state = self.state.lock();
        *state = BackendState::default();
    }

    /// Settle every pending connection with its registered response.
    ///
    /// All checks run before anything settles, so a failed flush leaves the
    /// pending list untouched. Returns the number of settled connections.
    pub fn flush(&self) -> Result<usize> {
        let settled = {
            let mut state = self.state.lock();

            if state.responses.is_empty() {
                return Err(MockError::NoResponses.into());
            }
            if state.pending.is_empty() {
                return Err(MockError::NoConnections.into());
            }

            let mut used = HashSet::new();
            let mut plan = Vec::with_capacity(state.pending.len());
            for connection in &state.pending {
                let method = connection.method.to_ascii_uppercase();
                let path = request_path(&connection.url);
                let response = state
                    .responses
                    .get(&method)
                    .and_then(|paths| paths.get(&path));

                match response {
                    Some(ResponseMap {
                        code: Some(code),
                        body,
                    }) => {
                        plan.push((*code, body.clone().unwrap_or_default()));
                        used.insert((method, path));
                    }
                    _ => {
                        return Err(MockError::UnmatchedRequest { method, path }.into());
                    }
                }
            }

            for (method, paths) in state.responses.iter() {
                for (path, _) in paths.iter() {
                    if !used.contains(&(method.to_string(), path.to_string())) {
                        return Err(MockError::UnusedResponse {
                            method: method.to_string(),
                            path: path.to_string(),
                        }
                        .into());
                    }
                }
            }

            let pending = std::mem::take(&mut state.pending);
            pending.into_iter().zip(plan).collect::<Vec<_>>()
        };

        let count = settled.len();
        for (connection, (code, body)) in settled {
            tracing::debug!(method = %connection.method, url = %connection.url, code, "Mock connection flushed");
            connection.settle(code, body);
        }
        Ok(count)
    }

    /// Fail if sent connections are still waiting
    pub fn verify_no_outstanding_requests(&self) -> Result<()> {
        match self.pending_count() {
            0 => Ok(()),
            n => Err(MockError::OutstandingRequests(n).into()),
        }
    }

    /// Factory producing connections bound to this backend
    pub fn factory(&self) -> MockConnectionFactory {
        MockConnectionFactory::new(self.clone())
    }
}

/// Path part of a request url; query and fragment are ignored for matching
fn request_path(url: &str) -> String {
    match Url::parse(url) {
        Ok(parsed) => parsed.path().to_string(),
        Err(_) => url
            .split(|c: char| c == '?' || c == '#')
            .next()
            .unwrap_or_default()
            .to_string(),
    }
}

/// Creates [`MockConnection`]s bound to one backend
#[derive(Debug, Clone)]
pub struct MockConnectionFactory {
    backend: MockBackend,
}

impl MockConnectionFactory {
    pub fn new(backend: MockBackend) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &MockBackend {
        &self.backend
    }

    /// Create a connection with its concrete type
    pub fn connect(&self) -> MockConnection {
        MockConnection::new(self.backend.clone())
    }
}

impl ConnectionFactory for MockConnectionFactory {
    fn create(&self) -> Box<dyn Connection> {
        Box::new(self.connect())
    }

    fn name(&self) -> &str {
        "mock"
    }
}

/// Connection that settles when its backend is flushed
#[derive(Debug)]
pub struct MockConnection {
    backend: MockBackend,
    guard: OpenGuard,
    data: Option<Payload>,
    deferred: Deferred,
}

impl MockConnection {
    pub fn new(backend: MockBackend) -> Self {
        Self {
            backend,
            guard: OpenGuard::default(),
            data: None,
            deferred: Deferred::new(),
        }
    }

    /// Data passed to `send`
    pub fn data(&self) -> Option<&Payload> {
        self.data.as_ref()
    }
}

#[async_trait]
impl Connection for MockConnection {
    fn open(&mut self, method: &str, url: &str) -> Result<()> {
        self.guard.open(method, url)
    }

    fn set_request_header(&mut self, name: &str, value: &str) -> Result<()> {
        self.backend.set_request_header(name, value);
        Ok(())
    }

    fn send(&mut self, data: Option<Payload>) -> Result<()> {
        let (method, url) = self.guard.begin_send()?;
        let resolver = self
            .deferred
            .resolver()
            .ok_or_else(|| Error::connection("connection is already being awaited"))?;

        self.data = data.clone();
        self.backend
            .add_connection(PendingConnection::new(method, url, data, resolver));
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
