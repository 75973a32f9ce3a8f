//! The server instance owning the live tables and the request loop.

use crate::{
    admin::AdminHandle,
    context::{ComponentContext, DISPATCH_REGISTRY, INTERCEPTOR_CHAIN},
};
use graft_core::{BoxError, Completion, RegistrationError, Request, Response, Router, StatusCode};
use graft_std::dynamic::{DispatchRegistry, InterceptorChain, InterceptorEntry, RouteEntry};
use std::sync::Arc;

/// One server instance: a dispatch registry, an interceptor chain and the
/// component context exposing both to request code.
///
/// Construct it explicitly and share it with `Arc`. The tables live as long as
/// the server does; entries added at runtime are never removed.
#[derive(Debug)]
pub struct Server {
    registry: Arc<DispatchRegistry>,
    chain: Arc<InterceptorChain>,
    context: ComponentContext,
}

impl Default for Server {
    fn default() -> Self {
        Self::new()
    }
}

impl Server {
    /// A server with empty tables.
    pub fn new() -> Self {
        Self::with_components(
            Arc::new(DispatchRegistry::new()),
            Arc::new(InterceptorChain::new()),
        )
    }

    /// A server over existing tables.
    pub fn with_components(registry: Arc<DispatchRegistry>, chain: Arc<InterceptorChain>) -> Self {
        let context = ComponentContext::builder()
            .component(DISPATCH_REGISTRY, Arc::clone(&registry))
            .component(INTERCEPTOR_CHAIN, Arc::clone(&chain))
            .build();
        Self::with_context(registry, chain, context)
    }

    /// A server whose requests see `context` instead of the default one.
    ///
    /// Used to model hosts where the lookup facility does not expose the live
    /// tables.
    pub fn with_context(
        registry: Arc<DispatchRegistry>,
        chain: Arc<InterceptorChain>,
        context: ComponentContext,
    ) -> Self {
        Self {
            registry,
            chain,
            context,
        }
    }

    /// The live registry.
    pub fn registry(&self) -> &Arc<DispatchRegistry> {
        &self.registry
    }

    /// The live chain.
    pub fn chain(&self) -> &Arc<InterceptorChain> {
        &self.chain
    }

    /// The context attached to every request.
    pub fn context(&self) -> &ComponentContext {
        &self.context
    }

    /// A write handle onto this server's tables.
    pub fn admin(&self) -> AdminHandle {
        AdminHandle::new(Arc::clone(&self.registry), Arc::clone(&self.chain))
    }

    /// Map a route.
    pub fn route(&self, entry: RouteEntry) -> Result<(), RegistrationError> {
        self.admin().register_route(entry)
    }

    /// Append an interceptor.
    pub fn intercept(&self, entry: InterceptorEntry) -> Result<(), RegistrationError> {
        self.admin().append_interceptor(entry)
    }

    /// Run one request through the interceptor chain and the registry.
    ///
    /// 1. Attach the component context.
    /// 2. Take a chain snapshot and run pre-hooks; a `Stop` skips to step 4.
    /// 3. Look up the handler; answer 404 when none matches, 500 when it fails.
    /// 4. Run post-hooks of the interceptors that passed, in reverse order.
    pub async fn dispatch(&self, mut request: Request) -> Response {
        request.extensions_mut().insert(self.context.clone());
        let mut response = Response::new();

        let chain = self.chain.snapshot();
        let pre = chain.invoke_pre(&request, &mut response).await;
        if pre.is_stopped() {
            chain
                .invoke_post(&request, &mut response, Completion::Stopped, &pre)
                .await;
            return response;
        }

        let result: Result<Completion<'static>, BoxError> = match self.registry.lookup(&request) {
            Some(handler) => handler
                .call_dyn(&request, &mut response)
                .await
                .map(|()| Completion::Handled),
            None => {
                response.fail(StatusCode::NOT_FOUND, "Not Found");
                Ok(Completion::NotFound)
            }
        };

        let completion = match &result {
            Ok(completion) => *completion,
            Err(err) => {
                tracing::error!(method = %request.method(), path = %request.path(), error = %err, "Handler failed");
                response.fail(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error");
                Completion::Failed(&**err)
            }
        };

        chain
            .invoke_post(&request, &mut response, completion, &pre)
            .await;
        response
    }
}
