//! HTTP method sets for route entries.

use bitflags::bitflags;
use graft_core::Method;

bitflags! {
    /// The set of HTTP verbs a route accepts.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct MethodFilter: u16 {
        /// `GET`
        const GET = 1 << 0;
        /// `POST`
        const POST = 1 << 1;
        /// `PUT`
        const PUT = 1 << 2;
        /// `DELETE`
        const DELETE = 1 << 3;
        /// `PATCH`
        const PATCH = 1 << 4;
        /// `HEAD`
        const HEAD = 1 << 5;
        /// `OPTIONS`
        const OPTIONS = 1 << 6;
        /// `TRACE`
        const TRACE = 1 << 7;
        /// `CONNECT`
        const CONNECT = 1 << 8;
    }
}

impl MethodFilter {
    /// Every verb, including extension methods.
    pub const ANY: Self = Self::all();

    /// The flag for a standard method, `None` for extension methods.
    pub fn from_method(method: &Method) -> Option<Self> {
        Some(match *method {
            Method::GET => Self::GET,
            Method::POST => Self::POST,
            Method::PUT => Self::PUT,
            Method::DELETE => Self::DELETE,
            Method::PATCH => Self::PATCH,
            Method::HEAD => Self::HEAD,
            Method::OPTIONS => Self::OPTIONS,
            Method::TRACE => Self::TRACE,
            Method::CONNECT => Self::CONNECT,
            _ => return None,
        })
    }

    /// Whether a request with `method` is accepted.
    pub fn accepts(&self, method: &Method) -> bool {
        if self.is_all() {
            return true;
        }
        Self::from_method(method).is_some_and(|flag| self.contains(flag))
    }
}

impl Default for MethodFilter {
    fn default() -> Self {
        Self::ANY
    }
}
