//! # Routing Layer
//!
//! A [`Router`] resolves an inbound request to the handler that should serve
//! it. Unlike an interceptor, a router never touches the response; it only
//! selects.

use crate::{handler::DynHandler, request::Request};
use std::sync::Arc;

/// The read side of a dispatch table.
#[diagnostic::on_unimplemented(
    message = "`{Self}` cannot route requests",
    label = "missing `Router` implementation",
    note = "Implement `Router::lookup` to resolve requests to handlers."
)]
pub trait Router: Send + Sync {
    /// Resolve the handler for `request`, or `None` when nothing matches.
    ///
    /// Implementations must tolerate concurrent mutation of the underlying
    /// table and never return a partially constructed handler.
    fn lookup(&self, request: &Request) -> Option<Arc<dyn DynHandler>>;
}
