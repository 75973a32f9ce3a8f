//! Request logging interceptor.

use graft_core::{BoxError, Completion, HookResult, Interceptor, Request, Response};
use std::time::Instant;

/// Logged in place of a principal when no auth layer identified the caller.
pub const ANONYMOUS: &str = "anonymous";

#[derive(Debug, Clone, Copy)]
struct RequestStart(Instant);

/// An interceptor that logs every request it sees.
///
/// The pre-hook logs the method, path and principal and records the start
/// time; the post-hook logs the final status and elapsed milliseconds. It never
/// stops a request.
///
/// # Example
///
/// ```rust,ignore
/// use graft_std::{dynamic::InterceptorEntry, hooks::RequestLogInterceptor, routing::PathScope};
///
/// let scope = PathScope::new(["/**"], ["/css/**", "/js/**", "/images/**"])?;
/// chain.append(InterceptorEntry::new("request-log", RequestLogInterceptor).with_scope(scope))?;
/// ```
#[derive(Debug, Default, Clone, Copy)]
pub struct RequestLogInterceptor;

fn user(request: &Request) -> &str {
    request.principal().unwrap_or(ANONYMOUS)
}

impl Interceptor for RequestLogInterceptor {
    async fn pre_handle(
        &self,
        request: &Request,
        _response: &mut Response,
    ) -> Result<HookResult, BoxError> {
        request.set_attribute(RequestStart(Instant::now()));
        tracing::info!(
            method = %request.method(),
            path = %request.path(),
            user = %user(request),
            "Incoming"
        );
        Ok(HookResult::Next)
    }

    async fn after_completion(
        &self,
        request: &Request,
        response: &mut Response,
        completion: Completion<'_>,
    ) -> Result<(), BoxError> {
        let Some(RequestStart(start)) = request.attribute::<RequestStart>() else {
            return Ok(());
        };
        let cost_ms = start.elapsed().as_millis() as u64;
        match completion {
            Completion::Failed(err) => tracing::warn!(
                method = %request.method(),
                path = %request.path(),
                user = %user(request),
                status = response.status().as_u16(),
                cost_ms,
                error = %err,
                "Completed with error"
            ),
            _ => tracing::info!(
                method = %request.method(),
                path = %request.path(),
                user = %user(request),
                status = response.status().as_u16(),
                cost_ms,
                "Completed"
            ),
        }
        Ok(())
    }
}
