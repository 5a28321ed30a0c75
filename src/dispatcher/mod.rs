//! # Dispatcher Module
//!
//! Ties routing, binding and handler invocation together for one request.
//!
//! ## Request Flow
//!
//! 1. The [`Router`](crate::router::Router) matches method and path, or the dispatcher
//!    answers 404 (unknown path) / 405 (known path, other method)
//! 2. The handler registered under the route's handler name is looked up (501 if absent)
//! 3. The [`Binder`](crate::binder::Binder) binds the request; a [`BindError`](crate::binder::BindError)
//!    becomes the configured error status (default 422) with the error payload
//! 4. The handler runs with the [`BoundRequest`](crate::binder::BoundRequest); a panic is
//!    caught and answered with 500
//!
//! ## Handler Registration
//!
//! ```rust
//! use brrtbind::dispatcher::{Dispatcher, HandlerResponse};
//! use brrtbind::router::Router;
//! use brrtbind::server::RawRequest;
//! use brrtbind::spec::{FieldSpec, ParameterSpec, RouteSpec};
//! use http::Method;
//!
//! let mut router = Router::new();
//! router
//!     .register(
//!         RouteSpec::builder(Method::GET, "/items/")
//!             .handler("read_items")
//!             .param(ParameterSpec::query(FieldSpec::integer("skip").default(0)))
//!             .build(),
//!     )
//!     .unwrap();
//!
//! let mut dispatcher = Dispatcher::new(router);
//! dispatcher.register_handler("read_items", |req| {
//!     HandlerResponse::json(200, serde_json::json!({ "skip": req.get_i64("skip") }))
//! });
//!
//! let response = dispatcher.dispatch(&RawRequest::new(Method::GET, "/items/"));
//! assert_eq!(response.status, 200);
//! ```
//!
//! Rejected values are logged through [`Redactor`](crate::logging::Redactor), so
//! tokens and cookies never reach the logs in the clear.

mod core;

pub use core::{Dispatcher, HandlerFn, HandlerResponse, HeaderVec, MAX_INLINE_HEADERS};
