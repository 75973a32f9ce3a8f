//! Assembly of the lab server from a [`LabConfig`].
//!
//! Boot wiring:
//!
//! | Kind        | Path / scope                       | Component                   |
//! |-------------|------------------------------------|-----------------------------|
//! | interceptor | `/**` minus static resources       | [`RequestLogInterceptor`]   |
//! | interceptor | `/intercept/**`                    | [`TimingInterceptor`]       |
//! | route       | `GET /`                            | index                       |
//! | route       | `GET /intercept/ping`              | `pong`                      |
//! | route       | `/inject`                          | route implant trigger       |
//! | route       | `/inject/interceptor`              | interceptor implant trigger |

use crate::{
    config::LabConfig,
    gateway::CommandGateway,
    implant::{InterceptorImplant, RouteImplant, TriggerEndpoint},
    server::Server,
    trigger::InjectionTrigger,
};
use graft_core::{RegistrationError, Request, handler::from_fn};
use graft_std::{
    dynamic::{InterceptorEntry, RouteEntry},
    hooks::{RequestLogInterceptor, TimingInterceptor},
    routing::{MethodFilter, PathScope},
};
use std::sync::Arc;

/// Path of the route implant trigger.
pub const INJECT_PATH: &str = "/inject";

/// Path of the interceptor implant trigger.
pub const INJECT_INTERCEPTOR_PATH: &str = "/inject/interceptor";

const TRIGGER_METHODS: MethodFilter = MethodFilter::GET.union(MethodFilter::POST);

/// Build a server with the boot interceptors, the default routes and both
/// trigger endpoints. Nothing is injected yet.
pub fn build(config: &LabConfig) -> Result<Arc<Server>, RegistrationError> {
    let server = Server::new();

    let log_scope = PathScope::new(["/**"], &config.static_excludes)?;
    server.intercept(
        InterceptorEntry::new("request-log", RequestLogInterceptor).with_scope(log_scope),
    )?;
    server.intercept(
        InterceptorEntry::new("timing", TimingInterceptor)
            .with_scope(PathScope::including("/intercept/**")?),
    )?;

    let route_gateway = Arc::new(
        CommandGateway::new(config.implant.route_param.clone())
            .with_timeout(config.gateway.timeout()),
    );
    let interceptor_gateway = Arc::new(
        CommandGateway::new(config.implant.interceptor_param.clone())
            .with_timeout(config.gateway.timeout()),
    );
    let interceptor_scope = PathScope::including(&config.implant.interceptor_scope)?;

    let route_trigger = Arc::new(InjectionTrigger::new(RouteImplant::new(
        &config.implant.route_path,
        route_gateway,
    )?));
    let interceptor_trigger = Arc::new(InjectionTrigger::new(InterceptorImplant::new(
        interceptor_scope,
        interceptor_gateway,
    )));

    let index = index_text(config);
    server.route(RouteEntry::new(
        "/",
        MethodFilter::GET,
        from_fn(move |_: &Request| index.clone()),
    )?)?;
    server.route(RouteEntry::new(
        "/intercept/ping",
        MethodFilter::GET,
        from_fn(|_: &Request| "pong"),
    )?)?;
    server.route(RouteEntry::new(
        INJECT_PATH,
        TRIGGER_METHODS,
        TriggerEndpoint::new(route_trigger),
    )?)?;
    server.route(RouteEntry::new(
        INJECT_INTERCEPTOR_PATH,
        TRIGGER_METHODS,
        TriggerEndpoint::new(interceptor_trigger),
    )?)?;

    tracing::info!(
        routes = server.registry().snapshot().len(),
        interceptors = server.chain().len(),
        "Lab assembled"
    );
    Ok(Arc::new(server))
}

fn index_text(config: &LabConfig) -> String {
    let implant = &config.implant;
    format!(
        "graft lab\n\
         GET  /intercept/ping\n\
         GET  {INJECT_PATH}  -> maps {}?{}=<command>\n\
         GET  {INJECT_INTERCEPTOR_PATH}  -> intercepts {}?{}=<command>\n",
        implant.route_path, implant.route_param, implant.interceptor_scope, implant.interceptor_param,
    )
}
