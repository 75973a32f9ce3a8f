//! Administrative write access to the live tables.

use crate::context::{ComponentContext, DISPATCH_REGISTRY, INTERCEPTOR_CHAIN};
use graft_core::RegistrationError;
use graft_std::dynamic::{DispatchRegistry, InterceptorChain, InterceptorEntry, RouteEntry};
use std::sync::Arc;

/// Write handle onto a server's dispatch registry and interceptor chain.
///
/// This is the only path through which running code mutates routing: boot
/// wiring and implants alike call [`register_route`](Self::register_route)
/// and [`append_interceptor`](Self::append_interceptor).
#[derive(Clone, Debug)]
pub struct AdminHandle {
    registry: Arc<DispatchRegistry>,
    chain: Arc<InterceptorChain>,
}

impl AdminHandle {
    /// Create a handle from the live components.
    pub fn new(registry: Arc<DispatchRegistry>, chain: Arc<InterceptorChain>) -> Self {
        Self { registry, chain }
    }

    /// Resolve both components from `context` by their well-known names.
    pub fn from_context(context: &ComponentContext) -> Result<Self, RegistrationError> {
        Ok(Self {
            registry: context.lookup::<DispatchRegistry>(DISPATCH_REGISTRY)?,
            chain: context.lookup::<InterceptorChain>(INTERCEPTOR_CHAIN)?,
        })
    }

    /// Map a route into the live registry.
    pub fn register_route(&self, entry: RouteEntry) -> Result<(), RegistrationError> {
        let pattern = entry.pattern().to_string();
        self.registry.register(entry)?;
        tracing::info!(%pattern, "Route registered");
        Ok(())
    }

    /// Append an interceptor to the live chain.
    pub fn append_interceptor(&self, entry: InterceptorEntry) -> Result<(), RegistrationError> {
        let name = entry.name().to_owned();
        self.chain.append(entry)?;
        tracing::info!(interceptor = %name, "Interceptor appended");
        Ok(())
    }

    /// The live registry.
    pub fn registry(&self) -> &Arc<DispatchRegistry> {
        &self.registry
    }

    /// The live chain.
    pub fn chain(&self) -> &Arc<InterceptorChain> {
        &self.chain
    }
}
