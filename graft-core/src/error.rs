//! Error types for graft.
//!
//! This module provides a structured error hierarchy using `thiserror`:
//!
//! - [`RegistrationError`] - The live tables could not be located or mutated
//! - [`GatewayError`] - A gated command could not be spawned or read
//! - [`PatternError`] - Malformed URL patterns

use std::time::Duration;
use thiserror::Error;

/// A boxed error type for dynamic error handling.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors raised while locating or mutating the live dispatch tables.
#[derive(Error, Debug)]
pub enum RegistrationError {
    /// No component context is attached to the current request.
    #[error("component context is not available on this call path")]
    ContextUnavailable,

    /// The context holds no component under the well-known name.
    #[error("no component named `{0}`")]
    ComponentMissing(&'static str),

    /// The component exists but has an unexpected type.
    #[error("component `{name}` is not a `{expected}`")]
    ComponentType {
        /// Well-known component name.
        name: &'static str,
        /// Type the caller asked for.
        expected: &'static str,
    },

    /// The table refuses mutation.
    #[error("mutation denied: {0}")]
    Denied(String),

    /// The entry carries a malformed pattern.
    #[error(transparent)]
    InvalidPattern(#[from] PatternError),
}

/// Errors raised by the command gateway.
#[derive(Error, Debug)]
pub enum GatewayError {
    /// The child process could not be created.
    #[error("failed to spawn `{program}`: {source}")]
    ProcessSpawn {
        /// Shell program that was launched.
        program: String,
        /// Underlying OS error.
        #[source]
        source: std::io::Error,
    },

    /// Reading the child's output failed mid-stream.
    #[error("failed to read command output: {0}")]
    StreamRead(#[source] std::io::Error),

    /// The child did not finish within the configured limit.
    #[error("command timed out after {0:?}")]
    Timeout(Duration),
}

/// Errors produced when parsing a URL pattern.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PatternError {
    /// Patterns are absolute paths.
    #[error("pattern `{0}` must start with '/'")]
    MissingLeadingSlash(String),

    /// `**` must occupy a whole segment.
    #[error("pattern `{0}` uses `**` inside a segment")]
    EmbeddedDoubleWildcard(String),
}
