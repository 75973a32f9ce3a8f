//! # Interceptor Layer
//!
//! The lowest-level extension point in graft's request pipeline.
//!
//! An interceptor wraps every dispatched request whose path falls within its
//! scope. It sees the request twice:
//!
//! - **`pre_handle`** before the route handler runs. Returning
//!   [`HookResult::Stop`] marks the request as handled: no later interceptor
//!   and no handler runs.
//! - **`after_completion`** once the request is finished, whatever the outcome
//!   (handled, not found, short-circuited, or failed).
//!
//! # Ordering
//!
//! Pre-hooks run in registration order. Post-hooks run in reverse registration
//! order, and only for interceptors whose pre-hook returned `Next`.

use crate::{error::BoxError, request::Request, response::Response};
use futures::future::BoxFuture;
use std::future::Future;

/// Result of a pre-hook indicating whether to continue or stop processing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookResult {
    /// Continue with the next interceptor, then the handler.
    Next,
    /// The request was fully handled; stop processing it.
    Stop,
}

/// How a request finished, as reported to post-hooks.
#[derive(Debug, Clone, Copy)]
pub enum Completion<'a> {
    /// A route handler ran and returned `Ok`.
    Handled,
    /// No route matched.
    NotFound,
    /// A pre-hook stopped the request.
    Stopped,
    /// The route handler returned an error.
    Failed(&'a (dyn std::error::Error + Send + Sync + 'static)),
}

impl Completion<'_> {
    /// Whether the handler failed.
    pub fn is_failed(&self) -> bool {
        matches!(self, Completion::Failed(_))
    }
}

/// A request interceptor.
///
/// This trait uses native `async fn` for static dispatch. For storage in the
/// live chain, use [`DynInterceptor`], which every `Interceptor` implements.
#[diagnostic::on_unimplemented(
    message = "`{Self}` does not implement `Interceptor`",
    label = "missing `Interceptor` implementation",
    note = "Interceptors must implement at least `pre_handle`."
)]
pub trait Interceptor: Send + Sync + 'static {
    /// Called before the route handler.
    fn pre_handle(
        &self,
        request: &Request,
        response: &mut Response,
    ) -> impl Future<Output = Result<HookResult, BoxError>> + Send;

    /// Called after the request finished. The default does nothing.
    fn after_completion(
        &self,
        request: &Request,
        response: &mut Response,
        completion: Completion<'_>,
    ) -> impl Future<Output = Result<(), BoxError>> + Send {
        let _ = (request, response, completion);
        async { Ok(()) }
    }
}

/// Object-safe version of [`Interceptor`].
pub trait DynInterceptor: Send + Sync + 'static {
    /// Dynamic dispatch version of [`Interceptor::pre_handle`].
    fn pre_handle_dyn<'a>(
        &'a self,
        request: &'a Request,
        response: &'a mut Response,
    ) -> BoxFuture<'a, Result<HookResult, BoxError>>;

    /// Dynamic dispatch version of [`Interceptor::after_completion`].
    fn after_completion_dyn<'a>(
        &'a self,
        request: &'a Request,
        response: &'a mut Response,
        completion: Completion<'a>,
    ) -> BoxFuture<'a, Result<(), BoxError>>;
}

// Blanket implementation: Any type implementing Interceptor implements DynInterceptor.
impl<T: Interceptor> DynInterceptor for T {
    fn pre_handle_dyn<'a>(
        &'a self,
        request: &'a Request,
        response: &'a mut Response,
    ) -> BoxFuture<'a, Result<HookResult, BoxError>> {
        Box::pin(self.pre_handle(request, response))
    }

    fn after_completion_dyn<'a>(
        &'a self,
        request: &'a Request,
        response: &'a mut Response,
        completion: Completion<'a>,
    ) -> BoxFuture<'a, Result<(), BoxError>> {
        Box::pin(self.after_completion(request, response, completion))
    }
}
