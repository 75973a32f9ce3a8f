//! # Handler Layer
//!
//! The terminal point of the request pipeline. A handler is what a route
//! pattern resolves to in the dispatch registry.
//!
//! # Usage Patterns
//!
//! 1. **Struct implementation**: `impl Handler for MyHandler`
//! 2. **Plain function**: [`from_fn`] wraps a synchronous `Fn(&Request) -> impl IntoResponse`

use crate::{
    error::BoxError,
    request::Request,
    response::{IntoResponse, Response},
};
use futures::future::BoxFuture;
use std::future::Future;

/// A route handler.
#[diagnostic::on_unimplemented(
    message = "`{Self}` is not a route `Handler`",
    label = "missing `Handler` implementation",
    note = "Handlers must implement the `call` method."
)]
pub trait Handler: Send + Sync + 'static {
    /// Handle the request by writing into `response`.
    fn call(
        &self,
        request: &Request,
        response: &mut Response,
    ) -> impl Future<Output = Result<(), BoxError>> + Send;
}

/// Object-safe version of [`Handler`].
pub trait DynHandler: Send + Sync + 'static {
    /// Dynamic dispatch version of [`Handler::call`].
    fn call_dyn<'a>(
        &'a self,
        request: &'a Request,
        response: &'a mut Response,
    ) -> BoxFuture<'a, Result<(), BoxError>>;
}

impl<T: Handler> DynHandler for T {
    fn call_dyn<'a>(
        &'a self,
        request: &'a Request,
        response: &'a mut Response,
    ) -> BoxFuture<'a, Result<(), BoxError>> {
        Box::pin(self.call(request, response))
    }
}

/// A handler built from a synchronous function. See [`from_fn`].
#[derive(Clone)]
pub struct FnHandler<F> {
    f: F,
}

/// Wrap a synchronous function as a [`Handler`].
///
/// ```rust
/// use graft_core::{Request, handler::from_fn};
///
/// let ping = from_fn(|_request: &Request| "pong");
/// ```
pub fn from_fn<F, R>(f: F) -> FnHandler<F>
where
    F: Fn(&Request) -> R + Send + Sync + 'static,
    R: IntoResponse,
{
    FnHandler { f }
}

impl<F, R> Handler for FnHandler<F>
where
    F: Fn(&Request) -> R + Send + Sync + 'static,
    R: IntoResponse,
{
    async fn call(&self, request: &Request, response: &mut Response) -> Result<(), BoxError> {
        (self.f)(request).into_response(response);
        Ok(())
    }
}
