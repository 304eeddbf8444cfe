// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! One-shot completion shared between a connection and whatever settles it

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::oneshot;

use crate::http::RawResponse;
use crate::network::Failure;

/// Settled value of a connection
pub type Outcome = std::result::Result<RawResponse, Failure>;

/// Settling side of a [`Deferred`]. Cloneable; the first settle wins.
#[derive(Debug, Clone)]
pub struct Resolver {
    sender: Arc<Mutex<Option<oneshot::Sender<Outcome>>>>,
}

impl Resolver {
    /// Settle successfully. Returns false if already settled.
    pub fn resolve(&self, response: RawResponse) -> bool {
        self.settle(Ok(response))
    }

    /// Settle with a failure. Returns false if already settled.
    pub fn reject(&self, failure: Failure) -> bool {
        self.settle(Err(failure))
    }

    pub fn is_settled(&self) -> bool {
        self.sender.lock().is_none()
    }

    fn settle(&self, outcome: Outcome) -> bool {
        let sender = self.sender.lock().take();
        match sender {
            Some(sender) => {
                // receiver gone means nobody is waiting; nothing to report
                let _ = sender.send(outcome);
                true
            }
            None => {
                tracing::warn!(ok = outcome.is_ok(), "Ignoring second settlement of a connection");
                false
            }
        }
    }
}

/// Awaitable completion of a single connection
#[derive(Debug)]
pub struct Deferred {
    resolver: Option<Resolver>,
    receiver: Option<oneshot::Receiver<Outcome>>,
}

impl Default for Deferred {
    fn default() -> Self {
        Self::new()
    }
}

impl Deferred {
    pub fn new() -> Self {
        let (sender, receiver) = oneshot::channel();
        Self {
            resolver: Some(Resolver {
                sender: Arc::new(Mutex::new(Some(sender))),
            }),
            receiver: Some(receiver),
        }
    }

    /// A settling handle, or `None` once waiting has started
    pub fn resolver(&self) -> Option<Resolver> {
        self.resolver.clone()
    }

    pub fn resolve(&self, response: RawResponse) {
        match self.resolver {
            Some(ref resolver) => {
                resolver.resolve(response);
            }
            None => tracing::debug!("Connection is already being awaited; success ignored"),
        }
    }

    pub fn reject(&self, failure: Failure) {
        match self.resolver {
            Some(ref resolver) => {
                resolver.reject(failure);
            }
            None => tracing::debug!("Connection is already being awaited; error ignored"),
        }
    }

    /// Wait for the outcome.
    ///
    /// Drops this side's resolver first, so the wait fails instead of
    /// hanging once every other resolver is gone unsettled.
    pub async fn wait(&mut self) -> Outcome {
        self.resolver = None;
        let receiver = match self.receiver.take() {
            Some(receiver) => receiver,
            None => return Err(Failure::new("connection was already awaited")),
        };

        match receiver.await {
            Ok(outcome) => outcome,
            Err(_) => Err(Failure::new("connection closed before completion")),
        }
    }
}
