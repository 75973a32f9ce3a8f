//! # graft-core
//!
//! Core traits for the graft request pipeline.
//!
//! This crate has minimal dependencies and is designed to be imported by code
//! that plugs into a live server without depending on `graft-std`.
//!
//! # Three-Layer Architecture
//!
//! ## Layer 1: Interception ([`Interceptor`])
//!
//! Wraps every dispatched request. Receives the request before the handler
//! (`pre_handle`, returns `Next` or `Stop`) and after completion
//! (`after_completion`).
//!
//! ## Layer 2: Routing ([`Router`])
//!
//! Resolves a request to a handler. The live implementation is the dispatch
//! registry in `graft-std`, which can be extended while traffic flows.
//!
//! ## Layer 3: Handling ([`Handler`])
//!
//! The terminal point of the pipeline, where the response body is produced.
//!
//! # Error Types
//!
//! - [`RegistrationError`] - Live tables could not be located or mutated
//! - [`GatewayError`] - Command execution errors
//! - [`PatternError`] - Malformed URL patterns

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

mod error;
pub mod handler;
mod interceptor;
mod request;
mod response;
mod router;

// Re-exports
pub use error::{BoxError, GatewayError, PatternError, RegistrationError};
pub use handler::{DynHandler, FnHandler, Handler};
pub use interceptor::{Completion, DynInterceptor, HookResult, Interceptor};
pub use request::Request;
pub use response::{IntoResponse, Response};
pub use router::Router;

/// Re-exported HTTP vocabulary types.
pub use http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode};
