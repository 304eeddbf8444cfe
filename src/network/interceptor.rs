// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Interceptor registry and the per-phase fold

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

use super::envelope::{Phase, Resolution};
use super::interceptor_trait::Interceptor;
use crate::error::{Error, Result};

/// Run one phase: a left-to-right fold of `interceptors` over `seed`.
///
/// `Resolved` envelopes go to `resolve`, `Rejected` ones to `reject`, and the
/// tag each handler returns picks the branch for the next interceptor. A
/// `Resolved` envelope that carries `err` is moved to the reject branch
/// before it reaches the next handler. A handler that returns `Err` stops
/// the fold; the error is wrapped in
/// [`Error::Interceptor`] so it stays distinguishable from a rejected
/// envelope.
pub async fn run_phase(
    interceptors: &[Arc<dyn Interceptor>],
    seed: Resolution,
) -> Result<Resolution> {
    let mut state = seed.normalize();

    for (idx, interceptor) in interceptors.iter().enumerate() {
        let branch_in = state.branch();
        let outcome = match state {
            Resolution::Resolved(envelope) => interceptor.resolve(envelope).await,
            Resolution::Rejected(envelope) => interceptor.reject(envelope).await,
        };

        state = outcome.map_err(|source| {
            tracing::debug!(
                interceptor = interceptor.name(),
                index = idx,
                error = %source,
                "Interceptor raised"
            );
            Error::interceptor(interceptor.name(), source)
        })?
        .normalize();

        tracing::debug!(
            interceptor = interceptor.name(),
            index = idx,
            from = branch_in,
            to = state.branch(),
            "Interceptor step"
        );
    }

    Ok(state)
}

/// Global interceptor registry: one append-only list per phase.
///
/// The lists cannot be replaced; [`Interceptors::register`] is the only way
/// to change them. Each phase runs over a snapshot taken when it starts, so
/// a registration made mid-request applies from the next phase on.
#[derive(Default)]
pub struct Interceptors {
    request: RwLock<Vec<Arc<dyn Interceptor>>>,
    response: RwLock<Vec<Arc<dyn Interceptor>>>,
}

impl Interceptors {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an interceptor to a phase
    pub fn register(&self, phase: Phase, interceptor: Arc<dyn Interceptor>) {
        tracing::debug!(phase = %phase, interceptor = interceptor.name(), "Registering interceptor");
        self.list(phase).write().push(interceptor);
    }

    /// Append a request-phase interceptor
    pub fn push_request<I: Interceptor + 'static>(&self, interceptor: I) {
        self.register(Phase::Request, Arc::new(interceptor));
    }

    /// Append a response-phase interceptor
    pub fn push_response<I: Interceptor + 'static>(&self, interceptor: I) {
        self.register(Phase::Response, Arc::new(interceptor));
    }

    /// Current interceptors of a phase, in registration order
    pub fn snapshot(&self, phase: Phase) -> Vec<Arc<dyn Interceptor>> {
        self.list(phase).read().clone()
    }

    /// Number of interceptors registered for a phase
    pub fn len(&self, phase: Phase) -> usize {
        self.list(phase).read().len()
    }

    /// Check if no interceptors are registered at all
    pub fn is_empty(&self) -> bool {
        self.request.read().is_empty() && self.response.read().is_empty()
    }

    /// Names of a phase's interceptors, in order
    pub fn names(&self, phase: Phase) -> Vec<String> {
        self.list(phase)
            .read()
            .iter()
            .map(|i| i.name().to_string())
            .collect()
    }

    /// Fold `seed` through the given phase
    pub async fn run(&self, phase: Phase, seed: Resolution) -> Result<Resolution> {
        let interceptors = self.snapshot(phase);
        tracing::debug!(
            phase = %phase,
            interceptors = interceptors.len(),
            branch = seed.branch(),
            "Running intercept phase"
        );
        run_phase(&interceptors, seed).await
    }

    fn list(&self, phase: Phase) -> &RwLock<Vec<Arc<dyn Interceptor>>> {
        match phase {
            Phase::Request => &self.request,
            Phase::Response => &self.response,
        }
    }
}

impl fmt::Debug for Interceptors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Interceptors")
            .field("request", &self.names(Phase::Request))
            .field("response", &self.names(Phase::Response))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::{Request, Response};
    use crate::network::{Envelope, Failure, FnInterceptor};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn response_seed() -> Resolution {
        Envelope::response(
            Request::new("GET", "/users").unwrap(),
            Some(Response::text(200, "foo")),
            None,
        )
        .into_resolution()
    }

    #[test]
    fn test_registry_starts_empty() {
        let registry = Interceptors::new();
        assert!(registry.is_empty());
        assert_eq!(registry.len(Phase::Request), 0);
        assert_eq!(registry.len(Phase::Response), 0);
    }

    #[test]
    fn test_register_appends_in_order() {
        let registry = Interceptors::new();
        registry.push_request(FnInterceptor::new("first"));
        registry.push_request(FnInterceptor::new("second"));
        registry.push_response(FnInterceptor::new("third"));

        assert_eq!(registry.names(Phase::Request), vec!["first", "second"]);
        assert_eq!(registry.names(Phase::Response), vec!["third"]);
    }

    #[tokio::test]
    async fn test_empty_phase_keeps_seed() {
        let out = run_phase(&[], response_seed()).await.unwrap();
        assert_eq!(out, response_seed());
    }

    #[tokio::test]
    async fn test_rejected_envelope_skips_resolve_handlers() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let interceptors: Vec<Arc<dyn Interceptor>> = vec![Arc::new(
            FnInterceptor::new("resolve-only").on_resolve(move |env| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(Resolution::Resolved(env))
            }),
        )];

        let seed = Envelope::request(Request::new("GET", "/users").unwrap())
            .with_err(Failure::new("down"))
            .into_resolution();
        let out = run_phase(&interceptors, seed).await.unwrap();

        assert!(out.is_rejected());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_branch_switching_both_ways() {
        let interceptors: Vec<Arc<dyn Interceptor>> = vec![
            Arc::new(FnInterceptor::new("fail").on_resolve(|env| {
                Ok(Resolution::Rejected(env.with_err(Failure::new("injected"))))
            })),
            Arc::new(FnInterceptor::new("recover").on_reject(|env| {
                Ok(Resolution::Resolved(env.without_err()))
            })),
            Arc::new(FnInterceptor::new("mark").on_resolve(|mut env| {
                if let Some(ref mut res) = env.res {
                    res.status = 299;
                }
                Ok(Resolution::Resolved(env))
            })),
        ];

        let out = run_phase(&interceptors, response_seed()).await.unwrap();
        assert!(out.is_resolved());
        assert_eq!(out.envelope().res.as_ref().unwrap().status, 299);
    }

    #[tokio::test]
    async fn test_resolve_setting_err_switches_branch() {
        let recovered = Arc::new(AtomicUsize::new(0));
        let counter = recovered.clone();
        let interceptors: Vec<Arc<dyn Interceptor>> = vec![
            Arc::new(FnInterceptor::new("sets-err").on_resolve(|env| {
                Ok(Resolution::Resolved(env.with_err(Failure::new("injected"))))
            })),
            Arc::new(
                FnInterceptor::new("skipped").on_resolve(|_| Err(Error::other("unreachable"))),
            ),
            Arc::new(FnInterceptor::new("sees-reject").on_reject(move |env| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(Resolution::Rejected(env))
            })),
        ];

        let out = run_phase(&interceptors, response_seed()).await.unwrap();
        assert!(out.is_rejected());
        assert_eq!(out.envelope().err.as_ref().unwrap().reason, "injected");
        assert_eq!(recovered.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_raised_error_stops_fold() {
        let later = Arc::new(AtomicUsize::new(0));
        let counter = later.clone();
        let interceptors: Vec<Arc<dyn Interceptor>> = vec![
            Arc::new(
                FnInterceptor::new("explodes").on_resolve(|_| Err(Error::other("kaboom"))),
            ),
            Arc::new(FnInterceptor::new("never").on_resolve(move |env| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(Resolution::Resolved(env))
            })),
        ];

        let err = run_phase(&interceptors, response_seed()).await.unwrap_err();
        assert!(matches!(err, Error::Interceptor { ref name, .. } if name == "explodes"));
        assert_eq!(later.load(Ordering::SeqCst), 0);
    }
}
