//! Component lookup by well-known name.
//!
//! The server attaches its [`ComponentContext`] to every request before
//! dispatch. Code running inside a request resolves the live tables through it
//! with [`ComponentContext::current`] and [`ComponentContext::lookup`], without
//! holding a reference to the server itself.

use graft_core::{RegistrationError, Request};
use std::{
    any::{Any, type_name},
    collections::HashMap,
    fmt,
    sync::Arc,
};

/// Well-known name of the live [`DispatchRegistry`](graft_std::dynamic::DispatchRegistry).
pub const DISPATCH_REGISTRY: &str = "dispatchRegistry";

/// Well-known name of the live [`InterceptorChain`](graft_std::dynamic::InterceptorChain).
pub const INTERCEPTOR_CHAIN: &str = "interceptorChain";

type Component = Arc<dyn Any + Send + Sync>;

/// An immutable name → component map, cheap to clone.
#[derive(Clone, Default)]
pub struct ComponentContext {
    components: Arc<HashMap<&'static str, Component>>,
}

impl ComponentContext {
    /// Start building a context.
    pub fn builder() -> ComponentContextBuilder {
        ComponentContextBuilder::default()
    }

    /// The context attached to `request` by the server.
    pub fn current(request: &Request) -> Result<&ComponentContext, RegistrationError> {
        request
            .extensions()
            .get::<ComponentContext>()
            .ok_or(RegistrationError::ContextUnavailable)
    }

    /// Resolve the component registered as `name`, checking its type.
    pub fn lookup<T: Any + Send + Sync>(
        &self,
        name: &'static str,
    ) -> Result<Arc<T>, RegistrationError> {
        let component = self
            .components
            .get(name)
            .ok_or(RegistrationError::ComponentMissing(name))?;
        Arc::clone(component)
            .downcast::<T>()
            .map_err(|_| RegistrationError::ComponentType {
                name,
                expected: type_name::<T>(),
            })
    }

    /// Whether a component is registered as `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.components.contains_key(name)
    }
}

impl fmt::Debug for ComponentContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.components.keys().collect();
        names.sort();
        f.debug_struct("ComponentContext")
            .field("components", &names)
            .finish()
    }
}

/// Builder for [`ComponentContext`].
#[derive(Default)]
pub struct ComponentContextBuilder {
    components: HashMap<&'static str, Component>,
}

impl ComponentContextBuilder {
    /// Register `component` under `name`, replacing any previous one.
    pub fn component<T: Any + Send + Sync>(mut self, name: &'static str, component: Arc<T>) -> Self {
        self.components.insert(name, component);
        self
    }

    /// Freeze the context.
    pub fn build(self) -> ComponentContext {
        ComponentContext {
            components: Arc::new(self.components),
        }
    }
}
