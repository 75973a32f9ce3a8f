//! Testing utilities for graft.
//!
//! This module provides utilities to make testing interceptors and handlers
//! easier.
//!
//! # Features
//!
//! - [`RecordingInterceptor`]: An interceptor that records every hook invocation
//! - [`FailingInterceptor`]: An interceptor whose pre- or post-hook always errors
//! - [`CountingHandler`]: A handler that writes a fixed body and counts calls

use graft_core::{
    BoxError, Completion, Handler, HookResult, Interceptor, Request, Response,
};
use parking_lot::Mutex;
use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

// ============================================================================
// Recording Interceptor
// ============================================================================

/// Which hook of an interceptor ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// `pre_handle`
    Pre,
    /// `after_completion`
    Post,
}

/// A shared, ordered log of `(interceptor name, phase)` pairs.
pub type HookLog = Arc<Mutex<Vec<(String, Phase)>>>;

/// An interceptor that appends to a shared [`HookLog`].
///
/// # Example
///
/// ```rust,ignore
/// let log = RecordingInterceptor::shared_log();
/// chain.append(InterceptorEntry::new("a", RecordingInterceptor::new("a", log.clone())))?;
///
/// // ... dispatch ...
///
/// assert_eq!(log.lock()[0], ("a".to_string(), Phase::Pre));
/// ```
pub struct RecordingInterceptor {
    name: String,
    log: HookLog,
    result: HookResult,
}

impl RecordingInterceptor {
    /// A fresh empty log.
    pub fn shared_log() -> HookLog {
        Arc::new(Mutex::new(Vec::new()))
    }

    /// Create a recording interceptor whose pre-hook returns `Next`.
    pub fn new(name: impl Into<String>, log: HookLog) -> Self {
        Self {
            name: name.into(),
            log,
            result: HookResult::Next,
        }
    }

    /// Make the pre-hook return `result`.
    pub fn with_result(mut self, result: HookResult) -> Self {
        self.result = result;
        self
    }
}

impl Interceptor for RecordingInterceptor {
    async fn pre_handle(
        &self,
        _request: &Request,
        _response: &mut Response,
    ) -> Result<HookResult, BoxError> {
        self.log.lock().push((self.name.clone(), Phase::Pre));
        Ok(self.result)
    }

    async fn after_completion(
        &self,
        _request: &Request,
        _response: &mut Response,
        _completion: Completion<'_>,
    ) -> Result<(), BoxError> {
        self.log.lock().push((self.name.clone(), Phase::Post));
        Ok(())
    }
}

// ============================================================================
// Failing Interceptor
// ============================================================================

/// An interceptor that fails in one of its hooks.
pub struct FailingInterceptor {
    fail_pre: bool,
}

impl FailingInterceptor {
    /// Fails in `pre_handle`.
    pub fn on_pre() -> Self {
        Self { fail_pre: true }
    }

    /// Passes `pre_handle`, fails in `after_completion`.
    pub fn on_post() -> Self {
        Self { fail_pre: false }
    }
}

impl Interceptor for FailingInterceptor {
    async fn pre_handle(
        &self,
        _request: &Request,
        _response: &mut Response,
    ) -> Result<HookResult, BoxError> {
        if self.fail_pre {
            return Err("intentional pre-hook failure".into());
        }
        Ok(HookResult::Next)
    }

    async fn after_completion(
        &self,
        _request: &Request,
        _response: &mut Response,
        _completion: Completion<'_>,
    ) -> Result<(), BoxError> {
        Err("intentional post-hook failure".into())
    }
}

// ============================================================================
// Counting Handler
// ============================================================================

/// A handler that writes a fixed body and counts its invocations.
#[derive(Clone)]
pub struct CountingHandler {
    body: &'static str,
    calls: Arc<AtomicUsize>,
}

impl CountingHandler {
    /// Create a handler answering `body`.
    pub fn new(body: &'static str) -> Self {
        Self {
            body,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Number of times the handler ran.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Handler for CountingHandler {
    async fn call(&self, _request: &Request, response: &mut Response) -> Result<(), BoxError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        response.write(self.body);
        Ok(())
    }
}
