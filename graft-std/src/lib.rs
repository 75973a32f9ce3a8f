//! # graft-std
//!
//! Standard implementations for the graft request pipeline.
//!
//! This crate provides:
//! - **Live tables**: [`DispatchRegistry`], [`InterceptorChain`]
//! - **Routing primitives**: [`PathPattern`], [`PathScope`], [`MethodFilter`]
//! - **Standard interceptors**: request logging, timing header
//! - **Testing utilities**: recording and failing interceptors, counting handler
//!
//! [`DispatchRegistry`]: dynamic::DispatchRegistry
//! [`InterceptorChain`]: dynamic::InterceptorChain
//! [`PathPattern`]: routing::PathPattern
//! [`PathScope`]: routing::PathScope
//! [`MethodFilter`]: routing::MethodFilter

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

// Re-export core traits
pub use graft_core;

pub mod dynamic;
pub mod hooks;
pub mod routing;
pub mod testing;
