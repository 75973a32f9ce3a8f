//! The live interceptor chain.
//!
//! Publication works like the dispatch registry: writers serialize on a
//! mutex and swap in a new immutable entry list; each request takes one
//! [`ChainSnapshot`] and runs both its pre-hooks and post-hooks against it, so
//! an `append` racing with a request is either wholly seen or wholly missed.

use crate::routing::PathScope;
use arc_swap::ArcSwap;
use graft_core::{
    Completion, DynInterceptor, HookResult, Interceptor, RegistrationError, Request, Response,
    StatusCode,
};
use parking_lot::Mutex;
use std::{
    borrow::Cow,
    fmt,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

/// An interceptor with its name and path scope.
#[derive(Clone)]
pub struct InterceptorEntry {
    name: Cow<'static, str>,
    scope: PathScope,
    interceptor: Arc<dyn DynInterceptor>,
}

impl InterceptorEntry {
    /// Create an entry covering every path.
    pub fn new<I: Interceptor>(name: impl Into<Cow<'static, str>>, interceptor: I) -> Self {
        Self::from_arc(name, Arc::new(interceptor))
    }

    /// Create an entry from an already shared interceptor.
    pub fn from_arc(
        name: impl Into<Cow<'static, str>>,
        interceptor: Arc<dyn DynInterceptor>,
    ) -> Self {
        Self {
            name: name.into(),
            scope: PathScope::all(),
            interceptor,
        }
    }

    /// Restrict the entry to `scope`.
    pub fn with_scope(mut self, scope: PathScope) -> Self {
        self.scope = scope;
        self
    }

    /// The entry name, used in logs.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The path scope.
    pub fn scope(&self) -> &PathScope {
        &self.scope
    }
}

impl fmt::Debug for InterceptorEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InterceptorEntry")
            .field("name", &self.name)
            .field("scope", &self.scope)
            .finish_non_exhaustive()
    }
}

/// The outcome of running pre-hooks for one request.
#[derive(Debug, Clone, Default)]
pub struct PreHandle {
    stopped: bool,
    passed: Vec<usize>,
}

impl PreHandle {
    /// Whether a pre-hook stopped the request.
    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    /// Whether the handler should run.
    pub fn proceed(&self) -> bool {
        !self.stopped
    }

    /// Number of interceptors whose pre-hook returned `Next`.
    pub fn passed(&self) -> usize {
        self.passed.len()
    }
}

/// A coherent view of the chain, held for the lifetime of one request.
#[derive(Debug, Clone)]
pub struct ChainSnapshot {
    entries: Arc<Vec<InterceptorEntry>>,
}

impl ChainSnapshot {
    /// Entries in registration order.
    pub fn entries(&self) -> &[InterceptorEntry] {
        &self.entries
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the snapshot holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Run pre-hooks in registration order for every in-scope interceptor.
    ///
    /// Stops at the first `Stop`. A pre-hook error is logged, replaces the
    /// response with a 500 diagnostic and also stops the request.
    pub async fn invoke_pre(&self, request: &Request, response: &mut Response) -> PreHandle {
        let mut passed = Vec::new();
        for (index, entry) in self.entries.iter().enumerate() {
            if !entry.scope.matches(request.path()) {
                continue;
            }
            match entry.interceptor.pre_handle_dyn(request, response).await {
                Ok(HookResult::Next) => passed.push(index),
                Ok(HookResult::Stop) => {
                    tracing::debug!(interceptor = %entry.name, path = %request.path(), "Request stopped by interceptor");
                    return PreHandle {
                        stopped: true,
                        passed,
                    };
                }
                Err(err) => {
                    tracing::error!(interceptor = %entry.name, error = %err, "Interceptor pre-hook failed");
                    response.fail(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error");
                    return PreHandle {
                        stopped: true,
                        passed,
                    };
                }
            }
        }
        PreHandle {
            stopped: false,
            passed,
        }
    }

    /// Run post-hooks in reverse registration order for the interceptors that
    /// passed `pre`. A failing post-hook is logged and the rest still run.
    pub async fn invoke_post(
        &self,
        request: &Request,
        response: &mut Response,
        completion: Completion<'_>,
        pre: &PreHandle,
    ) {
        for entry in pre.passed.iter().rev().filter_map(|&i| self.entries.get(i)) {
            if let Err(err) = entry
                .interceptor
                .after_completion_dyn(request, response, completion)
                .await
            {
                tracing::warn!(interceptor = %entry.name, error = %err, "Interceptor post-hook failed");
            }
        }
    }
}

/// The live, ordered interceptor chain. Entries are never removed.
pub struct InterceptorChain {
    entries: ArcSwap<Vec<InterceptorEntry>>,
    writer: Mutex<()>,
    sealed: AtomicBool,
}

impl Default for InterceptorChain {
    fn default() -> Self {
        Self::new()
    }
}

impl InterceptorChain {
    /// Create an empty chain.
    pub fn new() -> Self {
        Self {
            entries: ArcSwap::from_pointee(Vec::new()),
            writer: Mutex::new(()),
            sealed: AtomicBool::new(false),
        }
    }

    /// Append an interceptor at the end of the chain.
    pub fn append(&self, entry: InterceptorEntry) -> Result<(), RegistrationError> {
        let _guard = self.writer.lock();
        if self.sealed.load(Ordering::Acquire) {
            return Err(RegistrationError::Denied(format!(
                "interceptor chain is sealed, cannot append `{}`",
                entry.name
            )));
        }
        let mut entries = Vec::clone(&self.entries.load());
        tracing::debug!(interceptor = %entry.name, position = entries.len(), "Interceptor appended");
        entries.push(entry);
        self.entries.store(Arc::new(entries));
        Ok(())
    }

    /// Take a snapshot for one request.
    pub fn snapshot(&self) -> ChainSnapshot {
        ChainSnapshot {
            entries: self.entries.load_full(),
        }
    }

    /// Number of entries currently published.
    pub fn len(&self) -> usize {
        self.entries.load().len()
    }

    /// Whether no entries are published.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Refuse all further mutation.
    pub fn seal(&self) {
        let _guard = self.writer.lock();
        self.sealed.store(true, Ordering::Release);
    }
}

impl fmt::Debug for InterceptorChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InterceptorChain")
            .field("entries", &self.len())
            .field("sealed", &self.sealed.load(Ordering::Acquire))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FailingInterceptor, Phase, RecordingInterceptor};

    fn chain_of(entries: Vec<InterceptorEntry>) -> InterceptorChain {
        let chain = InterceptorChain::new();
        for entry in entries {
            chain.append(entry).unwrap();
        }
        chain
    }

    #[tokio::test]
    async fn test_pre_in_order_post_in_reverse() {
        let log = RecordingInterceptor::shared_log();
        let chain = chain_of(vec![
            InterceptorEntry::new("a", RecordingInterceptor::new("a", log.clone())),
            InterceptorEntry::new("b", RecordingInterceptor::new("b", log.clone())),
            InterceptorEntry::new("c", RecordingInterceptor::new("c", log.clone())),
        ]);

        let request = Request::get("/x");
        let mut response = Response::new();
        let snapshot = chain.snapshot();
        let pre = snapshot.invoke_pre(&request, &mut response).await;
        assert!(pre.proceed());
        snapshot
            .invoke_post(&request, &mut response, Completion::Handled, &pre)
            .await;

        assert_eq!(
            *log.lock(),
            vec![
                ("a".to_string(), Phase::Pre),
                ("b".to_string(), Phase::Pre),
                ("c".to_string(), Phase::Pre),
                ("c".to_string(), Phase::Post),
                ("b".to_string(), Phase::Post),
                ("a".to_string(), Phase::Post),
            ]
        );
    }

    #[tokio::test]
    async fn test_stop_short_circuits() {
        let log = RecordingInterceptor::shared_log();
        let chain = chain_of(vec![
            InterceptorEntry::new("a", RecordingInterceptor::new("a", log.clone())),
            InterceptorEntry::new(
                "stop",
                RecordingInterceptor::new("stop", log.clone()).with_result(HookResult::Stop),
            ),
            InterceptorEntry::new("c", RecordingInterceptor::new("c", log.clone())),
        ]);

        let request = Request::get("/x");
        let mut response = Response::new();
        let snapshot = chain.snapshot();
        let pre = snapshot.invoke_pre(&request, &mut response).await;
        assert!(pre.is_stopped());
        assert_eq!(pre.passed(), 1);
        snapshot
            .invoke_post(&request, &mut response, Completion::Stopped, &pre)
            .await;

        assert_eq!(
            *log.lock(),
            vec![
                ("a".to_string(), Phase::Pre),
                ("stop".to_string(), Phase::Pre),
                ("a".to_string(), Phase::Post),
            ]
        );
    }

    #[tokio::test]
    async fn test_scope_filters_interceptors() {
        let log = RecordingInterceptor::shared_log();
        let chain = chain_of(vec![
            InterceptorEntry::new("scoped", RecordingInterceptor::new("scoped", log.clone()))
                .with_scope(PathScope::new(["/intercept/**"], [] as [&str; 0]).unwrap()),
        ]);

        let snapshot = chain.snapshot();
        let mut response = Response::new();
        let pre = snapshot.invoke_pre(&Request::get("/other"), &mut response).await;
        assert_eq!(pre.passed(), 0);
        let pre = snapshot
            .invoke_pre(&Request::get("/intercept/ping"), &mut response)
            .await;
        assert_eq!(pre.passed(), 1);
    }

    #[tokio::test]
    async fn test_failing_post_hook_is_isolated() {
        let log = RecordingInterceptor::shared_log();
        let chain = chain_of(vec![
            InterceptorEntry::new("a", RecordingInterceptor::new("a", log.clone())),
            InterceptorEntry::new("broken", FailingInterceptor::on_post()),
        ]);

        let request = Request::get("/");
        let mut response = Response::new();
        let snapshot = chain.snapshot();
        let pre = snapshot.invoke_pre(&request, &mut response).await;
        snapshot
            .invoke_post(&request, &mut response, Completion::Handled, &pre)
            .await;

        assert!(log.lock().contains(&("a".to_string(), Phase::Post)));
    }

    #[tokio::test]
    async fn test_failing_pre_hook_stops_with_500() {
        let chain = chain_of(vec![InterceptorEntry::new("broken", FailingInterceptor::on_pre())]);
        let mut response = Response::new();
        let pre = chain
            .snapshot()
            .invoke_pre(&Request::get("/"), &mut response)
            .await;
        assert!(pre.is_stopped());
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_snapshot_ignores_later_appends() {
        let log = RecordingInterceptor::shared_log();
        let chain = InterceptorChain::new();
        let snapshot = chain.snapshot();
        chain
            .append(InterceptorEntry::new("late", RecordingInterceptor::new("late", log.clone())))
            .unwrap();

        let mut response = Response::new();
        let pre = snapshot.invoke_pre(&Request::get("/"), &mut response).await;
        assert_eq!(pre.passed(), 0);
        assert!(log.lock().is_empty());
        assert_eq!(chain.snapshot().len(), 1);
    }

    #[test]
    fn test_sealed_chain_denies() {
        let chain = InterceptorChain::new();
        chain.seal();
        let result = chain.append(InterceptorEntry::new("x", FailingInterceptor::on_pre()));
        assert!(matches!(result, Err(RegistrationError::Denied(_))));
    }
}
