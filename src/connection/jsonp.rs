// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! JSONP connection
//!
//! The url's `JSON_CALLBACK` placeholder is replaced with a generated
//! callback name, the script is loaded, and the connection resolves only if
//! the script called that callback.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use regex::Regex;
use reqwest::Client;
use serde_json::Value;
use url::Url;

use super::deferred::{Deferred, Resolver};
use super::{resolve_url, Connection, ConnectionFactory, OpenGuard, Payload};
use crate::error::{Error, Result};
use crate::http::RawResponse;
use crate::network::Failure;

/// Placeholder replaced with the generated callback name
pub const CALLBACK_PLACEHOLDER: &str = "JSON_CALLBACK";

/// Prefix of generated callback names; the id follows it
pub const CALLBACK_PREFIX: &str = "__ngHttp__.jsonp.";

/// `callback(payload);` with an optional `/**/` guard in front
const SCRIPT_PATTERN: &str = r"(?s)^\s*(?:/\*\*/\s*)?([A-Za-z_$][\w$]*(?:\.[\w$]+)*)\s*\((.*)\)\s*;?\s*$";

/// Pending JSONP callbacks, keyed by id.
///
/// A slot exists from `allocate` until the connection settles and holds the
/// payload once the callback was invoked.
#[derive(Debug, Default)]
pub struct CallbackRegistry {
    next_id: AtomicU64,
    pending: DashMap<u64, Option<String>>,
}

impl CallbackRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve a fresh callback id
    pub fn allocate(&self) -> u64 {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.pending.insert(id, None);
        id
    }

    /// Global name of callback `id`
    pub fn callback_name(id: u64) -> String {
        format!("{}{}", CALLBACK_PREFIX, id)
    }

    /// Record the payload for `id`. False if no such callback is pending.
    /// Only the first invocation is kept.
    pub fn invoke(&self, id: u64, payload: String) -> bool {
        match self.pending.get_mut(&id) {
            Some(mut slot) => {
                if slot.is_none() {
                    *slot = Some(payload);
                }
                true
            }
            None => false,
        }
    }

    /// Invoke by callback name
    pub fn invoke_named(&self, name: &str, payload: String) -> bool {
        name.strip_prefix(CALLBACK_PREFIX)
            .and_then(|id| id.parse::<u64>().ok())
            .map(|id| self.invoke(id, payload))
            .unwrap_or(false)
    }

    /// Remove the slot, returning the payload if the callback was invoked
    pub fn take(&self, id: u64) -> Option<String> {
        self.pending.remove(&id).and_then(|(_, payload)| payload)
    }

    pub fn remove(&self, id: u64) {
        self.pending.remove(&id);
    }

    pub fn is_pending(&self, id: u64) -> bool {
        self.pending.contains_key(&id)
    }

    /// Number of pending callbacks
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

/// Fetches script source for a JSONP url
#[async_trait]
pub trait ScriptLoader: Send + Sync {
    async fn load(&self, url: &str) -> Result<String>;
}

/// Loads scripts with a plain GET
#[derive(Debug, Clone)]
pub struct HttpScriptLoader {
    client: Client,
    base_url: Option<Url>,
}

impl HttpScriptLoader {
    pub fn new() -> Result<Self> {
        Ok(Self::with_client(Client::builder().build()?, None))
    }

    pub fn with_client(client: Client, base_url: Option<Url>) -> Self {
        Self { client, base_url }
    }
}

#[async_trait]
impl ScriptLoader for HttpScriptLoader {
    async fn load(&self, url: &str) -> Result<String> {
        let target = resolve_url(self.base_url.as_ref(), url)?;
        let response = self.client.get(target).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::connection(format!(
                "script load failed with status {}",
                status.as_u16()
            )));
        }

        Ok(response.text().await?)
    }
}

/// Run a loaded script: a single call to a registered callback with a JSON
/// argument. Returns false if nothing was invoked.
fn execute_script(pattern: &Regex, registry: &CallbackRegistry, script: &str) -> bool {
    let Some(caps) = pattern.captures(script) else {
        tracing::debug!("JSONP script is not a callback invocation");
        return false;
    };

    let name = &caps[1];
    let payload = caps[2].trim();
    if serde_json::from_str::<Value>(payload).is_err() {
        tracing::debug!(callback = name, "JSONP payload is not valid JSON");
        return false;
    }

    registry.invoke_named(name, payload.to_string())
}

/// Settle after the script loaded
fn settle_load(registry: &CallbackRegistry, id: Option<u64>, resolver: &Resolver) {
    match id.and_then(|id| registry.take(id)) {
        Some(payload) => {
            resolver.resolve(RawResponse::text(200, payload));
        }
        None => {
            resolver.reject(Failure::new("JSONP callback was not invoked"));
        }
    }
}

/// Settle after the script failed to load
fn settle_error(registry: &CallbackRegistry, id: Option<u64>, resolver: &Resolver, reason: &str) {
    if let Some(id) = id {
        registry.remove(id);
    }
    resolver.reject(Failure::new(reason));
}

/// Creates [`JsonpConnection`]s sharing a callback registry and loader
#[derive(Clone)]
pub struct JsonpFactory {
    registry: Arc<CallbackRegistry>,
    loader: Arc<dyn ScriptLoader>,
    pattern: Arc<Regex>,
}

impl JsonpFactory {
    /// Factory with the default HTTP script loader
    pub fn new() -> Result<Self> {
        Self::with_loader(Arc::new(HttpScriptLoader::new()?))
    }

    /// Factory with a custom script loader
    pub fn with_loader(loader: Arc<dyn ScriptLoader>) -> Result<Self> {
        let pattern = Regex::new(SCRIPT_PATTERN)
            .map_err(|e| Error::other(format!("invalid JSONP script pattern: {}", e)))?;

        Ok(Self {
            registry: Arc::new(CallbackRegistry::new()),
            loader,
            pattern: Arc::new(pattern),
        })
    }

    /// Share an existing callback registry
    pub fn with_registry(mut self, registry: Arc<CallbackRegistry>) -> Self {
        self.registry = registry;
        self
    }

    pub fn registry(&self) -> &Arc<CallbackRegistry> {
        &self.registry
    }

    /// Create a connection with its concrete type
    pub fn connect(&self) -> JsonpConnection {
        JsonpConnection {
            registry: self.registry.clone(),
            loader: self.loader.clone(),
            pattern: self.pattern.clone(),
            guard: OpenGuard::default(),
            callback_id: None,
            deferred: Deferred::new(),
        }
    }
}

impl fmt::Debug for JsonpFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsonpFactory")
            .field("registry", &self.registry)
            .finish()
    }
}

impl ConnectionFactory for JsonpFactory {
    fn create(&self) -> Box<dyn Connection> {
        Box::new(self.connect())
    }

    fn name(&self) -> &str {
        "jsonp"
    }
}

/// One JSONP exchange
pub struct JsonpConnection {
    registry: Arc<CallbackRegistry>,
    loader: Arc<dyn ScriptLoader>,
    pattern: Arc<Regex>,
    guard: OpenGuard,
    callback_id: Option<u64>,
    deferred: Deferred,
}

impl JsonpConnection {
    /// Callback id allocated by `open`
    pub fn callback_id(&self) -> Option<u64> {
        self.callback_id
    }

    /// Callback name substituted into the url
    pub fn callback_name(&self) -> Option<String> {
        self.callback_id.map(CallbackRegistry::callback_name)
    }

    /// Call this connection's callback as the loaded script would
    pub fn invoke_callback(&self, value: &Value) -> bool {
        match self.callback_id {
            Some(id) => self.registry.invoke(id, value.to_string()),
            None => false,
        }
    }

    /// Script load event
    pub fn on_load(&self) {
        if let Some(resolver) = self.deferred.resolver() {
            settle_load(&self.registry, self.callback_id, &resolver);
        }
    }

    /// Script error event
    pub fn on_error(&self, reason: &str) {
        if let Some(resolver) = self.deferred.resolver() {
            settle_error(&self.registry, self.callback_id, &resolver, reason);
        }
    }
}

impl fmt::Debug for JsonpConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsonpConnection")
            .field("guard", &self.guard)
            .field("callback_id", &self.callback_id)
            .finish()
    }
}

impl Drop for JsonpConnection {
    fn drop(&mut self) {
        // settled connections already released their slot
        if let Some(id) = self.callback_id {
            self.registry.remove(id);
        }
    }
}

#[async_trait]
impl Connection for JsonpConnection {
    fn open(&mut self, method: &str, url: &str) -> Result<()> {
        if self.guard.method().is_some() {
            return Err(Error::connection("open called more than once"));
        }
        if !method.eq_ignore_ascii_case("GET") {
            tracing::warn!(method, "JSONP only supports GET; method overridden");
        }

        let id = self.registry.allocate();
        let url = url.replace(CALLBACK_PLACEHOLDER, &CallbackRegistry::callback_name(id));
        if let Err(e) = self.guard.open("GET", &url) {
            self.registry.remove(id);
            return Err(e);
        }

        tracing::debug!(url = %url, callback = id, "JSONP opened");
        self.callback_id = Some(id);
        Ok(())
    }

    fn set_request_header(&mut self, name: &str, _value: &str) -> Result<()> {
        tracing::debug!(header = name, "JSONP cannot send request headers; ignored");
        Ok(())
    }

    fn send(&mut self, data: Option<Payload>) -> Result<()> {
        let (_, url) = self.guard.begin_send()?;
        if data.is_some() {
            tracing::debug!("JSONP cannot send a body; ignored");
        }
        let resolver = self
            .deferred
            .resolver()
            .ok_or_else(|| Error::connection("connection is already being awaited"))?;

        let registry = self.registry.clone();
        let loader = self.loader.clone();
        let pattern = self.pattern.clone();
        let id = self.callback_id;

        tokio::spawn(async move {
            match loader.load(&url).await {
                Ok(script) => {
                    execute_script(&pattern, &registry, &script);
                    settle_load(&registry, id, &resolver);
                }
                Err(e) => {
                    tracing::debug!(url = %url, error = %e, "JSONP script failed to load");
                    settle_error(&registry, id, &resolver, &e.to_string());
                }
            }
        });
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
