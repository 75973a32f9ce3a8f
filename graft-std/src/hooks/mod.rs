//! Standard interceptors.

mod logging;
mod timing;

pub use logging::{ANONYMOUS, RequestLogInterceptor};
pub use timing::{TIMING_HEADER, TimingInterceptor};
