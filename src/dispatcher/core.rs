use crate::binder::{BindError, Binder, BoundRequest};
use crate::logging::Redactor;
use crate::router::Router;
use crate::runtime_config::BindConfig;
use crate::server::RawRequest;
use serde::Serialize;
use serde_json::{json, Value};
use smallvec::SmallVec;
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Maximum inline response headers before heap allocation
pub const MAX_INLINE_HEADERS: usize = 16;

/// Stack-allocated response header storage
pub type HeaderVec = SmallVec<[(Arc<str>, String); MAX_INLINE_HEADERS]>;

/// Response produced by a handler or by the dispatcher itself.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HandlerResponse {
    /// HTTP status code (200, 404, 422, etc.)
    pub status: u16,
    #[serde(skip_serializing)]
    pub headers: HeaderVec,
    /// Response body as JSON
    pub body: Value,
}

impl HandlerResponse {
    #[must_use]
    pub fn new(status: u16, headers: HeaderVec, body: Value) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// Create a JSON response with a `content-type` header
    #[must_use]
    pub fn json(status: u16, body: Value) -> Self {
        let mut headers = HeaderVec::new();
        headers.push((Arc::from("content-type"), "application/json".to_string()));
        Self {
            status,
            headers,
            body,
        }
    }

    /// Create a JSON response from any serializable value
    #[must_use]
    pub fn ok<T: Serialize>(body: &T) -> Self {
        match serde_json::to_value(body) {
            Ok(body) => Self::json(200, body),
            Err(e) => Self::json(
                500,
                json!({ "error": "Failed to serialize response", "message": e.to_string() }),
            ),
        }
    }

    /// Create an error response
    #[must_use]
    pub fn error(status: u16, message: &str) -> Self {
        Self::json(status, json!({ "error": message }))
    }

    #[inline]
    #[must_use]
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Add or replace a header (case-insensitive)
    pub fn set_header(&mut self, name: &str, value: String) {
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        self.headers.push((Arc::from(name), value));
    }
}

/// A registered handler: receives the bound parameters of one request.
pub type HandlerFn = Arc<dyn Fn(BoundRequest) -> HandlerResponse + Send + Sync>;

/// Routes a raw request, binds it and invokes the handler registered for the route.
///
/// Every failure becomes a response: unknown path (404), wrong method (405),
/// unregistered handler (501), bind failure (configured 4xx, default 422) and
/// handler panic (500).
#[derive(Clone)]
pub struct Dispatcher {
    router: Arc<Router>,
    binder: Binder,
    handlers: HashMap<String, HandlerFn>,
    redactor: Redactor,
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.handlers.keys().collect();
        names.sort();
        f.debug_struct("Dispatcher")
            .field("routes", &self.router.len())
            .field("binder", &self.binder)
            .field("handlers", &names)
            .field("redactor", &self.redactor)
            .finish()
    }
}

impl Dispatcher {
    /// Dispatcher with the default binder configuration.
    #[must_use]
    pub fn new(router: Router) -> Self {
        Self::with_config(router, BindConfig::default())
    }

    #[must_use]
    pub fn with_config(router: Router, config: BindConfig) -> Self {
        Dispatcher {
            router: Arc::new(router),
            binder: Binder::new(config),
            handlers: HashMap::new(),
            redactor: Redactor::default(),
        }
    }

    /// Replace the redactor used when logging rejected values.
    #[must_use]
    pub fn with_redactor(mut self, redactor: Redactor) -> Self {
        self.redactor = redactor;
        self
    }

    #[must_use]
    pub fn router(&self) -> &Router {
        &self.router
    }

    #[must_use]
    pub fn binder(&self) -> &Binder {
        &self.binder
    }

    #[must_use]
    pub fn has_handler(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    /// Register `handler_fn` under `name`.
    ///
    /// A handler already registered under the same name is replaced.
    pub fn register_handler<F>(&mut self, name: &str, handler_fn: F)
    where
        F: Fn(BoundRequest) -> HandlerResponse + Send + Sync + 'static,
    {
        let handler_name = name.to_string();
        if self.handlers.remove(&handler_name).is_some() {
            warn!(
                handler_name = %handler_name,
                total_handlers = self.handlers.len(),
                "Replaced existing handler"
            );
        }

        info!(
            handler_name = %handler_name,
            total_handlers = self.handlers.len() + 1,
            "Handler registered successfully"
        );

        self.handlers.insert(handler_name, Arc::new(handler_fn));
    }

    /// Route, bind and handle one request.
    #[must_use]
    pub fn dispatch(&self, request: &RawRequest) -> HandlerResponse {
        let Some(matched) = self.router.route(&request.method, &request.path) else {
            return self.no_route(request);
        };

        debug!(
            handler_name = %matched.handler_name,
            available_handlers = self.handlers.len(),
            "Handler lookup"
        );

        let Some(handler) = self.handlers.get(matched.handler_name.as_ref()) else {
            error!(
                handler_name = %matched.handler_name,
                route = %matched.route,
                "Handler not registered"
            );
            return HandlerResponse::json(
                501,
                json!({
                    "error": "Handler not registered",
                    "handler": matched.handler_name.as_ref(),
                }),
            );
        };

        let start = Instant::now();
        let bound = match self.binder.bind_match(&matched, request) {
            Ok(bound) => bound,
            Err(err) => return self.bind_failed(&matched.handler_name, request, &err),
        };

        info!(
            handler_name = %matched.handler_name,
            method = %request.method,
            path = %request.path,
            bound_params = bound.len(),
            "Request bound, dispatching to handler"
        );

        match catch_unwind(AssertUnwindSafe(|| handler(bound))) {
            Ok(response) => {
                info!(
                    handler_name = %matched.handler_name,
                    status = response.status,
                    execution_time_ms = start.elapsed().as_millis() as u64,
                    "Handler execution complete"
                );
                response
            }
            Err(panic) => {
                error!(
                    handler_name = %matched.handler_name,
                    panic_message = %panic_message(panic.as_ref()),
                    "Handler panicked"
                );
                HandlerResponse::json(
                    500,
                    json!({
                        "error": "Handler panicked",
                        "handler": matched.handler_name.as_ref(),
                    }),
                )
            }
        }
    }

    fn no_route(&self, request: &RawRequest) -> HandlerResponse {
        let allowed = self.router.allowed_methods(&request.path);
        if allowed.is_empty() {
            debug!(method = %request.method, path = %request.path, "No route matched");
            return HandlerResponse::json(
                404,
                json!({
                    "error": "Not Found",
                    "method": request.method.as_str(),
                    "path": request.path,
                }),
            );
        }

        let allowed: Vec<&str> = allowed.iter().map(http::Method::as_str).collect();
        debug!(
            method = %request.method,
            path = %request.path,
            allowed = ?allowed,
            "Method not allowed"
        );
        let mut response = HandlerResponse::json(
            405,
            json!({
                "error": "Method Not Allowed",
                "method": request.method.as_str(),
                "path": request.path,
                "allowed": allowed,
            }),
        );
        response.set_header("allow", allowed.join(", "));
        response
    }

    fn bind_failed(
        &self,
        handler_name: &str,
        request: &RawRequest,
        err: &BindError,
    ) -> HandlerResponse {
        let fields: Vec<String> = err
            .errors
            .iter()
            .map(|e| match &e.value {
                Some(value) => format!(
                    "{} [{}] {:?}",
                    e.field,
                    e.kind,
                    self.redactor.display(&e.field, value)
                ),
                None => format!("{} [{}]", e.field, e.kind),
            })
            .collect();
        warn!(
            handler_name = %handler_name,
            method = %request.method,
            path = %request.path,
            error_count = err.len(),
            errors = ?fields,
            "Request binding failed"
        );
        HandlerResponse::json(self.binder.config().error_status, err.to_json())
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        format!("{panic:?}")
    }
}
