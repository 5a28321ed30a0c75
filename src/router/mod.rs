//! # Router Module
//!
//! Route registration and path matching.
//!
//! ## Overview
//!
//! The router is responsible for:
//! - Validating route declarations at registration time
//! - Rejecting duplicate `(method, path template)` registrations
//! - Matching incoming requests to registered routes
//! - Extracting raw path parameters from matched routes
//! - Reporting the methods registered for a path (for 405 responses)
//!
//! ## Example
//!
//! ```rust
//! use brrtbind::router::Router;
//! use brrtbind::spec::{FieldSpec, ParameterSpec, RouteSpec};
//! use http::Method;
//!
//! let mut router = Router::new();
//! router
//!     .register(
//!         RouteSpec::builder(Method::GET, "/users/{user_id}/items/{item_id}")
//!             .handler("read_user_item")
//!             .param(ParameterSpec::path(FieldSpec::integer("user_id")))
//!             .param(ParameterSpec::path(FieldSpec::string("item_id")))
//!             .build(),
//!     )
//!     .unwrap();
//!
//! let matched = router.route(&Method::GET, "/users/3/items/foo").unwrap();
//! assert_eq!(matched.handler_name.as_ref(), "read_user_item");
//! assert_eq!(matched.get_path_param("item_id"), Some("foo"));
//! ```
//!
//! ## Performance
//!
//! Matching walks a radix tree, so lookup cost depends on path depth rather than the
//! number of registered routes. Path parameters live in a `SmallVec` and do not
//! allocate for routes with up to eight placeholders.

mod core;
mod radix;

pub use core::{ParamVec, RouteMatch, Router, MAX_INLINE_PARAMS};
pub use radix::RadixRouter;
