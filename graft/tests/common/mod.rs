#![allow(dead_code)]

use graft::{LabConfig, Server, lab};
use graft_core::{Request, Response};
use std::sync::Arc;

// ============================================================================
// Server Fixtures
// ============================================================================

pub fn lab_server() -> Arc<Server> {
    lab::build(&LabConfig::default()).expect("default lab config is valid")
}

pub async fn get(server: &Server, target: &str) -> Response {
    server.dispatch(Request::get(target)).await
}

pub fn body_text(response: &Response) -> String {
    String::from_utf8_lossy(response.body()).into_owned()
}

pub fn evil_entries(server: &Server) -> usize {
    server
        .registry()
        .snapshot()
        .with_pattern("/evilcontroller")
        .count()
}
