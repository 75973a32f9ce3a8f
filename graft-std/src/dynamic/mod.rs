//! Live, runtime-mutable dispatch tables.
//!
//! Both tables are created empty with the server, read on every request and
//! mutated at runtime by privileged callers. Nothing is ever removed.

pub mod chain;
pub mod registry;

pub use chain::{ChainSnapshot, InterceptorChain, InterceptorEntry, PreHandle};
pub use registry::{DispatchRegistry, RouteEntry, RouteTable};
