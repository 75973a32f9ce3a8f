//! # graft - Runtime Route and Interceptor Injection Lab
//!
//! `graft` assembles a small HTTP server whose dispatch tables can be extended
//! while traffic flows, and demonstrates how a single unauthenticated request
//! can graft a command-execution backdoor into them.
//!
//! ## Pieces
//!
//! - [`Server`]: owns the live [`DispatchRegistry`] and [`InterceptorChain`]
//!   and runs each request through both.
//! - [`ComponentContext`]: name-based lookup of the live tables, attached to
//!   every request.
//! - [`AdminHandle`]: the write path onto the tables.
//! - [`InjectionTrigger`]: applies an [`Implant`] at most once.
//! - [`CommandGateway`]: runs a request parameter through the host shell.
//! - [`lab::build`] and [`http::serve`]: boot wiring and the axum transport.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use graft::{LabConfig, http, lab};
//!
//! let server = lab::build(&LabConfig::default())?;
//! let listener = tokio::net::TcpListener::bind("127.0.0.1:8080").await?;
//! http::serve(server, listener, std::future::pending()).await?;
//! ```
//!
//! Then `GET /inject` followed by `GET /evilcontroller?cmd=id`.
//!
//! [`DispatchRegistry`]: graft_std::dynamic::DispatchRegistry
//! [`InterceptorChain`]: graft_std::dynamic::InterceptorChain

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

pub mod admin;
pub mod config;
pub mod context;
pub mod gateway;
pub mod http;
pub mod implant;
pub mod lab;
pub mod server;
pub mod trigger;

pub use admin::AdminHandle;
pub use config::{ConfigError, LabConfig};
pub use context::ComponentContext;
pub use gateway::{CommandGateway, GatewayOutcome, Shell};
pub use implant::{
    CommandInterceptor, CommandRoute, InterceptorImplant, RouteImplant, TriggerEndpoint,
};
pub use server::Server;
pub use trigger::{Activation, Implant, InjectionTrigger, TriggerState};

pub use graft_core;
pub use graft_std;
