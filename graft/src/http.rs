//! axum transport adapter.
//!
//! Every HTTP request falls through to a single axum fallback which converts
//! it into a [`graft_core::Request`], runs it through [`Server::dispatch`], and
//! converts the result back. Routing and interception stay entirely inside the
//! graft tables, so entries added at runtime are served without touching the
//! axum router.

use crate::server::Server;
use axum::{
    body::{Body, to_bytes},
    extract::State,
    http::{HeaderName, HeaderValue, header},
};
use std::{future::Future, io, sync::Arc};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

/// Header carrying the principal resolved by an upstream auth layer.
pub const PRINCIPAL_HEADER: HeaderName = HeaderName::from_static("x-principal");

/// Largest request body buffered for form parsing.
pub const BODY_LIMIT: usize = 1024 * 1024;

const DEFAULT_CONTENT_TYPE: HeaderValue = HeaderValue::from_static("text/plain; charset=utf-8");

/// Build the axum router serving `server`.
pub fn router(server: Arc<Server>) -> axum::Router {
    axum::Router::new()
        .fallback(dispatch)
        .with_state(server)
        .layer(TraceLayer::new_for_http())
}

/// Serve `server` on `listener` until `shutdown` resolves.
pub async fn serve<F>(server: Arc<Server>, listener: TcpListener, shutdown: F) -> io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, router(server))
        .with_graceful_shutdown(shutdown)
        .await
}

async fn dispatch(
    State(server): State<Arc<Server>>,
    request: axum::extract::Request,
) -> axum::response::Response {
    let request = match into_graft(request).await {
        Ok(request) => request,
        Err(err) => {
            tracing::warn!(error = %err, "Rejected request body");
            let mut response = graft_core::Response::new();
            response.fail(graft_core::StatusCode::BAD_REQUEST, "Bad Request");
            return into_axum(response);
        }
    };
    into_axum(server.dispatch(request).await)
}

async fn into_graft(request: axum::extract::Request) -> Result<graft_core::Request, axum::Error> {
    let (parts, body) = request.into_parts();
    let body = to_bytes(body, BODY_LIMIT).await?;
    let principal = parts
        .headers
        .get(&PRINCIPAL_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned);

    let request = graft_core::Request::from_parts(parts.method, &parts.uri, parts.headers, body);
    Ok(match principal {
        Some(principal) => request.with_principal(principal),
        None => request,
    })
}

fn into_axum(response: graft_core::Response) -> axum::response::Response {
    let (status, mut headers, body) = response.into_parts();
    headers
        .entry(header::CONTENT_TYPE)
        .or_insert(DEFAULT_CONTENT_TYPE);

    let mut response = axum::response::Response::new(Body::from(body));
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    response
}
