//! Timing header interceptor.

use graft_core::{
    BoxError, Completion, HeaderName, HeaderValue, HookResult, Interceptor, Request, Response,
};
use std::time::Instant;

/// Response header written by [`TimingInterceptor`].
pub const TIMING_HEADER: HeaderName = HeaderName::from_static("x-test-interceptor");

#[derive(Debug, Clone, Copy)]
struct TimingStart(Instant);

/// Marks in-scope responses with a visible header.
///
/// The pre-hook sets `X-Test-Interceptor: hit` so a client can tell the
/// interceptor ran; the post-hook overwrites it with `cost=<n>ms`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TimingInterceptor;

impl Interceptor for TimingInterceptor {
    async fn pre_handle(
        &self,
        request: &Request,
        response: &mut Response,
    ) -> Result<HookResult, BoxError> {
        request.set_attribute(TimingStart(Instant::now()));
        response.add_header(TIMING_HEADER, HeaderValue::from_static("hit"));
        tracing::debug!(method = %request.method(), path = %request.path(), "Timing pre-hook");
        Ok(HookResult::Next)
    }

    async fn after_completion(
        &self,
        request: &Request,
        response: &mut Response,
        _completion: Completion<'_>,
    ) -> Result<(), BoxError> {
        if let Some(TimingStart(start)) = request.attribute::<TimingStart>() {
            let cost = start.elapsed().as_millis();
            response.set_header(TIMING_HEADER, HeaderValue::try_from(format!("cost={cost}ms"))?);
            tracing::debug!(path = %request.path(), cost_ms = cost as u64, "Timing post-hook");
        }
        Ok(())
    }
}
