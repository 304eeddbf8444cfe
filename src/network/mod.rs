// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Interceptor pipeline
//!
//! Envelopes travel through an ordered list of interceptors per phase. The
//! branch (resolved or rejected) is carried by [`Resolution`] and may flip
//! at every step.

mod envelope;
mod interceptor;
mod interceptor_trait;

pub use envelope::{Envelope, Failure, InterceptType, Phase, Resolution};
pub use interceptor::{run_phase, Interceptors};
pub use interceptor_trait::{
    FnInterceptor, Handler, HeaderEntry, HeaderInjector, Interceptor, RequestLogger, StatusCheck,
};
