//! Router core: route registration and the request hot path.

#![deny(clippy::inefficient_to_string)]
#![deny(clippy::format_push_string)]
#![deny(clippy::unnecessary_to_owned)]

use crate::spec::RouteSpec;
use crate::validator::{check_route, RegistrationError, ValidationIssue};
use http::Method;
use smallvec::SmallVec;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info};

use super::radix::{split_segments, RadixRouter};

/// Maximum number of path parameters before heap allocation.
/// Most REST APIs have ≤4 path params (e.g., /users/{user_id}/items/{item_id}).
pub const MAX_INLINE_PARAMS: usize = 8;

/// Stack-allocated parameter storage for the hot path.
///
/// Param names are `Arc<str>` shared with the route tree; values are per-request
/// segments, still percent-encoded.
pub type ParamVec = SmallVec<[(Arc<str>, String); MAX_INLINE_PARAMS]>;

/// Result of successfully matching a request path to a route.
#[derive(Debug, Clone)]
pub struct RouteMatch {
    /// The matched route declaration
    pub route: Arc<RouteSpec>,
    /// Placeholder values extracted from the URL (e.g., `{item_id}` → `"foo"`)
    pub path_params: ParamVec,
    /// Name of the handler that should process this request
    pub handler_name: Arc<str>,
}

impl RouteMatch {
    /// Get a raw path parameter by name.
    ///
    /// Uses "last write wins" semantics if a name repeats at different depths.
    #[inline]
    #[must_use]
    pub fn get_path_param(&self, name: &str) -> Option<&str> {
        self.path_params
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Route table mapping `(method, path)` to registered [`RouteSpec`]s.
///
/// Registration validates each declaration and rejects duplicates; after that the
/// router is read-only and can be shared across threads behind an `Arc`.
#[derive(Debug, Clone, Default)]
pub struct Router {
    radix_router: RadixRouter,
    routes: Vec<Arc<RouteSpec>>,
    /// `(method, path with placeholders erased)` of every registered route
    signatures: HashSet<(Method, String)>,
}

impl Router {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a router from a list of routes, registering them in order.
    ///
    /// # Errors
    ///
    /// Returns every issue found across all routes; nothing is registered on failure.
    pub fn from_routes(
        routes: impl IntoIterator<Item = RouteSpec>,
    ) -> Result<Self, RegistrationError> {
        let mut router = Self::new();
        let mut issues = Vec::new();
        for route in routes {
            if let Err(err) = router.register(route) {
                issues.extend(err.issues);
            }
        }
        if issues.is_empty() {
            Ok(router)
        } else {
            Err(RegistrationError::new(issues))
        }
    }

    /// Validate and register a route.
    ///
    /// # Errors
    ///
    /// Returns a [`RegistrationError`] listing every problem with the declaration, or a
    /// duplicate-route issue when the same method and path template (ignoring placeholder
    /// names) is already registered.
    pub fn register(&mut self, route: RouteSpec) -> Result<Arc<RouteSpec>, RegistrationError> {
        check_route(&route)?;

        let signature = (route.method.clone(), path_signature(&route.path_pattern));
        if self.signatures.contains(&signature) {
            return Err(RegistrationError::new(vec![ValidationIssue::new(
                route.to_string(),
                "DuplicateRoute",
                format!(
                    "Route {} {} is already registered",
                    route.method, route.path_pattern
                ),
            )]));
        }

        let route = Arc::new(route);
        if let Some(existing) = self.radix_router.insert(Arc::clone(&route)) {
            return Err(RegistrationError::new(vec![ValidationIssue::new(
                route.to_string(),
                "DuplicateRoute",
                format!("Route conflicts with {existing}"),
            )]));
        }
        self.signatures.insert(signature);
        self.routes.push(Arc::clone(&route));

        info!(
            method = %route.method,
            path = %route.path_pattern,
            handler_name = %route.handler_name,
            parameter_count = route.parameters.len(),
            "Route registered"
        );
        Ok(route)
    }

    /// Match an HTTP request to a route.
    ///
    /// Returns `None` when no route matches the method and path; use
    /// [`allowed_methods`](Self::allowed_methods) to tell 404 from 405.
    #[must_use]
    pub fn route(&self, method: &Method, path: &str) -> Option<RouteMatch> {
        let Some((route, params)) = self.radix_router.route(method, path) else {
            debug!(method = %method, path = %path, "No route matched");
            return None;
        };

        debug!(
            method = %method,
            path = %path,
            handler_name = %route.handler_name,
            route_pattern = %route.path_pattern,
            path_params = ?params,
            "Route matched"
        );

        let handler_name = Arc::clone(&route.handler_name);
        Some(RouteMatch {
            route,
            path_params: params,
            handler_name,
        })
    }

    /// Methods registered for a path, sorted by name. Empty when the path is unknown.
    #[must_use]
    pub fn allowed_methods(&self, path: &str) -> Vec<Method> {
        self.radix_router.allowed_methods(path)
    }

    /// Registered routes in registration order.
    #[must_use]
    pub fn routes(&self) -> &[Arc<RouteSpec>] {
        &self.routes
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

/// `/users/{user_id}/items/{item_id}` → `/users/{}/items/{}`
fn path_signature(pattern: &str) -> String {
    let mut signature = String::with_capacity(pattern.len());
    for segment in split_segments(pattern) {
        signature.push('/');
        if segment.starts_with('{') && segment.ends_with('}') {
            signature.push_str("{}");
        } else {
            signature.push_str(segment);
        }
    }
    if signature.is_empty() {
        signature.push('/');
    }
    signature
}
