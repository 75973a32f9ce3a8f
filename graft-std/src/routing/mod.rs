//! # Routing Primitives
//!
//! Pattern and method matching used by the dispatch registry and by interceptor
//! scopes.

mod method;
mod pattern;

pub use method::MethodFilter;
pub use pattern::{PathPattern, PathScope};
