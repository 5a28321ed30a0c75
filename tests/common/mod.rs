#![allow(dead_code)]

use brrtbind::router::Router;
use brrtbind::server::RawRequest;
use brrtbind::spec::load_router;
use http::{HeaderMap, HeaderValue, Method};
use std::io::Write;
use std::path::PathBuf;
use tempfile::NamedTempFile;

/// Path of the tutorial route table shipped with the crate.
pub fn tutorial_routes_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("demos/tutorial_routes.yaml")
}

/// Router built from the tutorial route table.
pub fn tutorial_router() -> Router {
    load_router(tutorial_routes_path()).expect("tutorial routes should load")
}

pub mod temp_files {
    use super::*;

    /// Write `content` to a temporary route file with the given extension.
    ///
    /// The file is removed when the returned handle is dropped.
    pub fn route_file(content: &str, ext: &str) -> NamedTempFile {
        let mut file = tempfile::Builder::new()
            .prefix("brrtbind_routes_")
            .suffix(&format!(".{ext}"))
            .tempfile()
            .expect("failed to create temp file");
        file.write_all(content.as_bytes())
            .expect("failed to write temp file");
        file.flush().expect("failed to flush temp file");
        file
    }

    pub fn yaml(content: &str) -> NamedTempFile {
        route_file(content, "yaml")
    }

    pub fn json(content: &str) -> NamedTempFile {
        route_file(content, "json")
    }
}

/// A request with a JSON body.
pub fn json_request(method: Method, target: &str, body: &serde_json::Value) -> RawRequest {
    let mut headers = HeaderMap::new();
    headers.insert("content-type", HeaderValue::from_static("application/json"));
    RawRequest::new(method, target)
        .with_headers(headers)
        .with_body(body.to_string())
}
