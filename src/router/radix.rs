//! Radix tree for HTTP route matching.
//!
//! Each node represents one path segment:
//! - Static segments (e.g., `items`) match exactly
//! - Placeholder segments (e.g., `{item_id}`) match any single segment
//! - Routes are stored at terminal nodes, keyed by HTTP method
//!
//! Lookup is O(k) in the number of path segments. Static children are tried before
//! placeholders, so `/users/me` wins over `/users/{user_id}`; the search backtracks into
//! placeholder branches when a static branch dead-ends.

use http::Method;
use std::collections::HashMap;
use std::sync::Arc;

use super::core::ParamVec;
use crate::spec::RouteSpec;

#[derive(Debug, Clone)]
struct RadixNode {
    /// The path segment this node represents (without leading /)
    segment: Arc<str>,
    /// Routes terminating at this node, per HTTP method
    routes: HashMap<Method, Arc<RouteSpec>>,
    /// Placeholder name if this node matches any segment
    param_name: Option<Arc<str>>,
    children: Vec<RadixNode>,
    /// Placeholder children; several names may share a position
    /// (e.g. `/users/{id}/posts` and `/users/{user_id}/comments`)
    param_children: Vec<RadixNode>,
}

impl RadixNode {
    fn new(segment: &str) -> Self {
        Self {
            segment: Arc::from(segment),
            routes: HashMap::new(),
            param_name: None,
            children: Vec::new(),
            param_children: Vec::new(),
        }
    }

    fn new_param(param_name: &str) -> Self {
        Self {
            param_name: Some(Arc::from(param_name)),
            ..Self::new("")
        }
    }

    /// Insert a route; returns the route already stored for this method and path, if any.
    fn insert(
        &mut self,
        segments: &[&str],
        method: Method,
        route: Arc<RouteSpec>,
    ) -> Option<Arc<RouteSpec>> {
        let Some((&segment, remaining)) = segments.split_first() else {
            if let Some(existing) = self.routes.get(&method) {
                return Some(Arc::clone(existing));
            }
            self.routes.insert(method, route);
            return None;
        };

        if let Some(param_name) = placeholder(segment) {
            if let Some(child) = self
                .param_children
                .iter_mut()
                .find(|c| c.param_name.as_deref() == Some(param_name))
            {
                return child.insert(remaining, method, route);
            }
            let mut child = RadixNode::new_param(param_name);
            let existing = child.insert(remaining, method, route);
            self.param_children.push(child);
            return existing;
        }

        if let Some(child) = self
            .children
            .iter_mut()
            .find(|c| c.segment.as_ref() == segment)
        {
            return child.insert(remaining, method, route);
        }
        let mut child = RadixNode::new(segment);
        let existing = child.insert(remaining, method, route);
        self.children.push(child);
        existing
    }

    fn search(
        &self,
        segments: &[&str],
        method: &Method,
        params: &mut ParamVec,
    ) -> Option<Arc<RouteSpec>> {
        let Some((&segment, remaining)) = segments.split_first() else {
            return self.routes.get(method).cloned();
        };

        for child in &self.children {
            if child.segment.as_ref() == segment {
                if let Some(route) = child.search(remaining, method, params) {
                    return Some(route);
                }
            }
        }

        for param_child in &self.param_children {
            if let Some(param_name) = &param_child.param_name {
                params.push((Arc::clone(param_name), segment.to_string()));
                if let Some(route) = param_child.search(remaining, method, params) {
                    return Some(route);
                }
                // Backtrack
                params.pop();
            }
        }

        None
    }

    /// Collect every method registered for a path, across all matching branches.
    fn collect_methods(&self, segments: &[&str], methods: &mut Vec<Method>) {
        let Some((&segment, remaining)) = segments.split_first() else {
            for method in self.routes.keys() {
                if !methods.contains(method) {
                    methods.push(method.clone());
                }
            }
            return;
        };
        for child in &self.children {
            if child.segment.as_ref() == segment {
                child.collect_methods(remaining, methods);
            }
        }
        for param_child in &self.param_children {
            param_child.collect_methods(remaining, methods);
        }
    }
}

fn placeholder(segment: &str) -> Option<&str> {
    segment.strip_prefix('{')?.strip_suffix('}')
}

pub(crate) fn split_segments(path: &str) -> Vec<&str> {
    path.trim_start_matches('/')
        .split('/')
        .filter(|s| !s.is_empty())
        .collect()
}

/// Radix tree-based route table.
#[derive(Debug, Clone)]
pub struct RadixRouter {
    root: RadixNode,
}

impl Default for RadixRouter {
    fn default() -> Self {
        Self::new()
    }
}

impl RadixRouter {
    #[must_use]
    pub fn new() -> Self {
        Self {
            root: RadixNode::new(""),
        }
    }

    /// Insert a route. On conflict the tree is unchanged and the existing route returned.
    pub fn insert(&mut self, route: Arc<RouteSpec>) -> Option<Arc<RouteSpec>> {
        let pattern = route.path_pattern.clone();
        let segments = split_segments(&pattern);
        let method = route.method.clone();
        self.root.insert(&segments, method, route)
    }

    /// Match a request path, returning the route and its raw (still encoded) placeholders.
    #[must_use]
    pub fn route(&self, method: &Method, path: &str) -> Option<(Arc<RouteSpec>, ParamVec)> {
        let segments = split_segments(path);
        let mut params = ParamVec::new();
        let route = self.root.search(&segments, method, &mut params)?;
        Some((route, params))
    }

    /// Methods registered for any route matching `path`.
    #[must_use]
    pub fn allowed_methods(&self, path: &str) -> Vec<Method> {
        let segments = split_segments(path);
        let mut methods = Vec::new();
        self.root.collect_methods(&segments, &mut methods);
        methods.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        methods
    }
}
