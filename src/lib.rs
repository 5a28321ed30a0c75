//! # brrtbind
//!
//! **brrtbind** turns an already-parsed HTTP request into a validated, strongly-typed
//! parameter set for a handler, or into a structured list of every field that failed.
//!
//! ## Overview
//!
//! Each route declares an explicit, ordered list of [`ParameterSpec`]s: where the input lives
//! (path, query, header, cookie or body), what type it has, whether it is required, its
//! default and its constraints. At request time the [`Binder`](binder::Binder) walks that list
//! once, collecting every error instead of stopping at the first, and either produces a
//! [`BoundRequest`](binder::BoundRequest) or a [`BindError`](binder::BindError).
//!
//! ## Architecture
//!
//! - **[`spec`]** - Route and parameter declarations, builders and the route-file loader
//! - **[`validator`]** - Registration-time checks of route declarations
//! - **[`router`]** - Radix-tree path template matching (`/items/{item_id}`)
//! - **[`server`]** - The raw request input boundary
//! - **[`binder`]** - Extraction, coercion, constraints and recursive body validation
//! - **[`dispatcher`]** - Route, bind and invoke a handler, mapping failures to responses
//! - **[`typed`]** - Handlers that receive their parameters as a `serde` type
//! - **[`runtime_config`]** - Environment-driven binder configuration
//! - **[`logging`]** - `tracing` subscriber setup and value redaction
//! - **[`cli`]** - The `brrtbind` command-line tool
//!
//! ### Request Binding Flow
//!
//! ```mermaid
//! sequenceDiagram
//!     participant Server as Host server
//!     participant Dispatcher
//!     participant Router
//!     participant Binder
//!     participant Handler
//!
//!     Server->>Dispatcher: RawRequest
//!     Dispatcher->>Router: route(method, path)
//!     alt No route
//!         Router-->>Server: 404 / 405
//!     end
//!     Router-->>Dispatcher: RouteMatch (spec, path params)
//!     Dispatcher->>Binder: bind(spec, request, path params)
//!     Binder->>Binder: extract → coerce → constrain (every parameter)
//!     alt Any field error
//!         Binder-->>Server: 422 { "errors": [...] }
//!     end
//!     Binder-->>Dispatcher: BoundRequest
//!     Dispatcher->>Handler: handler(BoundRequest)
//!     Handler-->>Server: HandlerResponse
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use brrtbind::binder::Binder;
//! use brrtbind::router::Router;
//! use brrtbind::server::RawRequest;
//! use brrtbind::spec::{FieldSpec, ParameterSpec, RouteSpec};
//! use http::Method;
//!
//! let route = RouteSpec::builder(Method::GET, "/items/{item_id}")
//!     .handler("read_item")
//!     .param(ParameterSpec::path(FieldSpec::integer("item_id").gt(10.0).le(100.0)))
//!     .param(ParameterSpec::query(FieldSpec::number("size").gt(0.0).lt(7.75)))
//!     .build();
//!
//! let mut router = Router::new();
//! router.register(route).unwrap();
//!
//! let request = RawRequest::new(Method::GET, "/items/42?size=3.5");
//! let matched = router.route(&request.method, &request.path).unwrap();
//! let bound = Binder::default().bind_match(&matched, &request).unwrap();
//! assert_eq!(bound.get_i64("item_id"), Some(42));
//! ```
//!
//! ## Error Payload
//!
//! A failed bind serialises to the payload the surrounding framework returns as a 4xx body:
//!
//! ```json
//! { "errors": [
//!     { "field": "size", "kind": "constraint", "message": "ensure this value is less than 7.75", "value": "7.75" },
//!     { "field": "item.price", "kind": "missing", "message": "field required" }
//! ] }
//! ```

pub mod binder;
pub mod cli;
pub mod dispatcher;
pub mod logging;
pub mod router;
pub mod runtime_config;
pub mod server;
pub mod spec;
pub mod typed;
pub mod validator;

pub use binder::{BindError, Binder, BoundRequest, BoundValue, ErrorKind, FieldError};
pub use spec::{
    load_routes, FieldSpec, ObjectSchema, ParameterLocation, ParameterSpec, ParameterStyle,
    RouteParameterSpec, RouteSpec, ValueType,
};
