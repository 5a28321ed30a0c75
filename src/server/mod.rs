//! # Server Module
//!
//! The input boundary: [`RawRequest`] is the already-parsed HTTP request a host server
//! hands to the binder (method, path, ordered query pairs, headers, cookies, body bytes).

mod request;

pub use request::{parse_cookies, parse_query_params, RawRequest};
