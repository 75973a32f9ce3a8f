use graft::{
    Server,
    context::{ComponentContext, DISPATCH_REGISTRY},
    implant::{COMMAND_INTERCEPTOR, INTERCEPTOR_HEADER},
};
use graft_core::{Request, StatusCode};
use graft_std::{
    dynamic::{DispatchRegistry, InterceptorChain, RouteEntry},
    routing::MethodFilter,
    testing::CountingHandler,
};
use std::sync::Arc;

mod common;
use common::{body_text, evil_entries, get, lab_server};

#[tokio::test]
async fn test_evilcontroller_unmapped_before_trigger() {
    let server = lab_server();

    let response = get(&server, "/evilcontroller?cmd=echo+hi").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(evil_entries(&server), 0);
}

#[tokio::test]
async fn test_trigger_twice_injects_once() {
    let server = lab_server();

    let first = get(&server, "/inject").await;
    assert_eq!(first.status(), StatusCode::OK);
    assert!(body_text(&first).starts_with("Inject done\n"));

    let second = get(&server, "/inject").await;
    assert_eq!(second.status(), StatusCode::OK);
    assert_eq!(body_text(&second), "Already injected\n");

    assert_eq!(evil_entries(&server), 1);
}

#[cfg(unix)]
#[tokio::test]
async fn test_injected_route_runs_command() {
    let server = lab_server();
    get(&server, "/inject").await;

    let response = get(&server, "/evilcontroller?cmd=echo+hi").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.body(), b"hi\n");

    let posted = server
        .dispatch(Request::new(graft_core::Method::POST, "/evilcontroller").with_form("cmd=echo+posted"))
        .await;
    assert_eq!(posted.body(), b"posted\n");
}

#[tokio::test]
async fn test_injected_route_without_param_is_404() {
    let server = lab_server();
    get(&server, "/inject").await;

    let response = get(&server, "/evilcontroller").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_text(&response), "Not Found");
}

#[cfg(unix)]
#[tokio::test]
async fn test_injection_shadows_existing_mapping() {
    let server = lab_server();
    let decoy = CountingHandler::new("decoy");
    server
        .route(RouteEntry::new("/evilcontroller", MethodFilter::ANY, decoy.clone()).unwrap())
        .unwrap();

    assert_eq!(body_text(&get(&server, "/evilcontroller").await), "decoy");
    assert_eq!(decoy.calls(), 1);

    get(&server, "/inject").await;
    let response = get(&server, "/evilcontroller?cmd=echo+hi").await;
    assert_eq!(response.body(), b"hi\n");
    assert_eq!(decoy.calls(), 1);
    assert_eq!(evil_entries(&server), 1);
}

#[tokio::test]
async fn test_camd_ignored_before_interceptor_trigger() {
    let server = lab_server();

    let response = get(&server, "/intercept/ping?camd=echo+owned").await;
    assert_eq!(response.body(), b"pong");
    assert!(response.headers().get(&INTERCEPTOR_HEADER).is_none());
}

#[cfg(unix)]
#[tokio::test]
async fn test_interceptor_implant_answers_any_path() {
    let server = lab_server();

    let response = get(&server, "/inject/interceptor").await;
    let text = body_text(&response);
    assert!(text.starts_with("Inject done\n"));
    assert!(text.contains("camd=<command>"));

    let chain = server.chain().snapshot();
    assert_eq!(chain.entries().last().map(|e| e.name()), Some(COMMAND_INTERCEPTOR));

    for path in ["/intercept/ping", "/", "/no/such/route"] {
        let response = get(&server, &format!("{path}?camd=echo+owned")).await;
        assert_eq!(response.status(), StatusCode::OK, "{path}");
        assert_eq!(response.body(), b"owned\n", "{path}");
        assert_eq!(response.headers()[&INTERCEPTOR_HEADER], "exec");
    }

    let untouched = get(&server, "/intercept/ping").await;
    assert_eq!(untouched.body(), b"pong");

    assert_eq!(body_text(&get(&server, "/inject/interceptor").await), "Already injected\n");
    assert_eq!(server.chain().len(), chain.len());
}

#[tokio::test]
async fn test_failure_reported_and_retryable() {
    let registry = Arc::new(DispatchRegistry::new());
    let chain = Arc::new(InterceptorChain::new());
    // Only the registry is exposed through the lookup facility.
    let context = ComponentContext::builder()
        .component(DISPATCH_REGISTRY, Arc::clone(&registry))
        .build();
    let hidden = Server::with_context(Arc::clone(&registry), Arc::clone(&chain), context);

    let lab = lab_server();
    for entry in lab.registry().snapshot().entries() {
        hidden.route(entry.clone()).unwrap();
    }

    let response = get(&hidden, "/inject").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(&response).starts_with("Inject failed: "));
    assert_eq!(evil_entries(&hidden), 0);

    let again = get(&hidden, "/inject").await;
    assert!(body_text(&again).starts_with("Inject failed: "));
}

#[tokio::test]
async fn test_default_server_exposes_tables() {
    let server = Server::new();
    assert!(server.context().contains(DISPATCH_REGISTRY));
}
