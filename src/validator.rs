//! Registration-time checks for route declarations.
//!
//! Every problem in a declaration is collected into a [`ValidationIssue`]; a route with
//! any issue is refused by [`Router::register`](crate::router::Router::register).

use crate::binder::{check_constraints, BoundValue};
use crate::spec::{FieldSpec, ParameterLocation, RouteSpec, ValueType};
use http::HeaderName;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

static PLACEHOLDER_RE: Lazy<Result<Regex, regex::Error>> =
    Lazy::new(|| Regex::new(r"^\{([A-Za-z_][A-Za-z0-9_]*)\}$"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    pub location: String,
    pub kind: String,
    pub message: String,
}

impl ValidationIssue {
    pub fn new(
        location: impl Into<String>,
        kind: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        ValidationIssue {
            location: location.into(),
            kind: kind.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.kind, self.location, self.message)
    }
}

/// A route declaration was refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationError {
    pub issues: Vec<ValidationIssue>,
}

impl RegistrationError {
    #[must_use]
    pub fn new(issues: Vec<ValidationIssue>) -> Self {
        Self { issues }
    }
}

impl fmt::Display for RegistrationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "route registration failed with {} issue(s)", self.issues.len())?;
        for issue in &self.issues {
            write!(f, "\n  {issue}")?;
        }
        Ok(())
    }
}

impl std::error::Error for RegistrationError {}

/// Check a route declaration.
///
/// # Errors
///
/// Returns every issue found in the declaration.
pub fn check_route(route: &RouteSpec) -> Result<(), RegistrationError> {
    let issues = route_issues(route);
    if issues.is_empty() {
        Ok(())
    } else {
        Err(RegistrationError::new(issues))
    }
}

/// Collect every issue in a route declaration.
#[must_use]
pub fn route_issues(route: &RouteSpec) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    let route_loc = route.to_string();

    if route.handler_name.trim().is_empty() {
        issues.push(ValidationIssue::new(
            &route_loc,
            "MissingHandler",
            "Route has no handler name",
        ));
    }

    let placeholders = check_path_template(route, &route_loc, &mut issues);
    check_path_parameters(route, &route_loc, &placeholders, &mut issues);

    let mut names = HashSet::new();
    let mut wire_names = HashSet::new();
    let mut checked_schemas = HashSet::new();
    for param in &route.parameters {
        let loc = format!("{route_loc} > {}", param.name());

        if !names.insert(param.name()) {
            issues.push(ValidationIssue::new(
                &loc,
                "DuplicateParameter",
                format!("Parameter '{}' is declared more than once", param.name()),
            ));
        } else if !wire_names.insert((param.location, param.wire_name().into_owned())) {
            issues.push(ValidationIssue::new(
                &loc,
                "DuplicateParameter",
                format!(
                    "{} parameter '{}' reads the same input as another parameter",
                    param.location,
                    param.wire_name()
                ),
            ));
        }

        check_location_rules(param.location, &param.field.value_type, &loc, &mut issues);

        if param.style.is_some() || param.explode.is_some() {
            if !matches!(param.location, ParameterLocation::Path | ParameterLocation::Query) {
                issues.push(ValidationIssue::new(
                    &loc,
                    "InvalidStyle",
                    format!("style/explode only apply to path and query parameters, not {}", param.location),
                ));
            }
        }
        if param.embed && param.location != ParameterLocation::Body {
            issues.push(ValidationIssue::new(
                &loc,
                "InvalidEmbed",
                "embed only applies to body parameters",
            ));
        }
        if param.location == ParameterLocation::Header
            && HeaderName::from_bytes(param.wire_name().as_bytes()).is_err()
        {
            issues.push(ValidationIssue::new(
                &loc,
                "InvalidHeaderName",
                format!("'{}' is not a valid header name", param.wire_name()),
            ));
        }

        check_field(&param.field, &loc, &mut checked_schemas, &mut issues);
    }

    issues
}

/// Returns the placeholder names of a well-formed template, in order.
fn check_path_template(
    route: &RouteSpec,
    route_loc: &str,
    issues: &mut Vec<ValidationIssue>,
) -> Vec<String> {
    let pattern = &route.path_pattern;
    let mut placeholders: Vec<String> = Vec::new();

    if !pattern.starts_with('/') {
        issues.push(ValidationIssue::new(
            route_loc,
            "InvalidPathTemplate",
            "Path template must start with '/'",
        ));
    }

    let placeholder_re = match PLACEHOLDER_RE.as_ref() {
        Ok(re) => re,
        Err(e) => {
            issues.push(ValidationIssue::new(route_loc, "InvalidPathTemplate", e.to_string()));
            return placeholders;
        }
    };

    for segment in pattern.split('/').filter(|s| !s.is_empty()) {
        if !segment.contains(['{', '}']) {
            continue;
        }
        match placeholder_re.captures(segment).and_then(|c| c.get(1)) {
            Some(name) => {
                let name = name.as_str().to_string();
                if placeholders.contains(&name) {
                    issues.push(ValidationIssue::new(
                        route_loc,
                        "InvalidPathTemplate",
                        format!("Placeholder '{{{name}}}' appears more than once"),
                    ));
                } else {
                    placeholders.push(name);
                }
            }
            None => issues.push(ValidationIssue::new(
                route_loc,
                "InvalidPathTemplate",
                format!("Segment '{segment}' must be a single '{{name}}' placeholder or static text"),
            )),
        }
    }
    placeholders
}

fn check_path_parameters(
    route: &RouteSpec,
    route_loc: &str,
    placeholders: &[String],
    issues: &mut Vec<ValidationIssue>,
) {
    let path_params: Vec<_> = route
        .parameters
        .iter()
        .filter(|p| p.location == ParameterLocation::Path)
        .collect();

    for param in &path_params {
        let loc = format!("{route_loc} > {}", param.name());
        let wire = param.wire_name();
        if !placeholders.iter().any(|p| *p == wire) {
            issues.push(ValidationIssue::new(
                &loc,
                "UnknownPathParameter",
                format!("Path parameter '{wire}' has no '{{{wire}}}' placeholder in the path"),
            ));
        }
        if !param.field.required || param.field.default.is_some() {
            issues.push(ValidationIssue::new(
                &loc,
                "OptionalPathParameter",
                "Path parameters are always required and cannot have defaults",
            ));
        }
    }

    for placeholder in placeholders {
        if !path_params.iter().any(|p| p.wire_name() == placeholder.as_str()) {
            issues.push(ValidationIssue::new(
                route_loc,
                "UndeclaredPathParameter",
                format!("Placeholder '{{{placeholder}}}' has no path parameter"),
            ));
        }
    }
}

fn check_location_rules(
    location: ParameterLocation,
    value_type: &ValueType,
    loc: &str,
    issues: &mut Vec<ValidationIssue>,
) {
    if location == ParameterLocation::Body {
        return;
    }
    let supported = match value_type {
        ValueType::Object(_) => false,
        ValueType::Array(_) if location == ParameterLocation::Cookie => false,
        ValueType::Array(item) => item.is_scalar(),
        _ => true,
    };
    if !supported {
        issues.push(ValidationIssue::new(
            loc,
            "UnsupportedType",
            format!("{location} parameters cannot be of type {value_type}"),
        ));
    }
}

fn check_field(
    field: &FieldSpec,
    loc: &str,
    checked_schemas: &mut HashSet<*const crate::spec::ObjectSchema>,
    issues: &mut Vec<ValidationIssue>,
) {
    check_type(&field.value_type, loc, checked_schemas, issues);
    check_constraint_fit(field, loc, issues);

    if let Some(default) = &field.default {
        if !value_matches_type(default, &field.value_type) {
            issues.push(ValidationIssue::new(
                loc,
                "InvalidDefault",
                format!("Default {default} is not a valid {}", field.value_type),
            ));
        } else {
            let mut errors = Vec::new();
            check_constraints(&field.constraints, &field.name, default, &default.to_string(), &mut errors);
            for error in errors {
                issues.push(ValidationIssue::new(
                    loc,
                    "InvalidDefault",
                    format!("Default {default} violates a constraint: {}", error.message),
                ));
            }
        }
    }
}

fn check_type(
    value_type: &ValueType,
    loc: &str,
    checked_schemas: &mut HashSet<*const crate::spec::ObjectSchema>,
    issues: &mut Vec<ValidationIssue>,
) {
    match value_type {
        ValueType::Enum(members) if members.is_empty() => {
            issues.push(ValidationIssue::new(
                loc,
                "EmptyEnum",
                "Enumeration types need at least one member",
            ));
        }
        ValueType::Array(item) => check_type(item, loc, checked_schemas, issues),
        ValueType::Object(schema) => {
            if !checked_schemas.insert(Arc::as_ptr(schema)) {
                return;
            }
            let mut seen = HashSet::new();
            for field in &schema.fields {
                let field_loc = format!("{loc} > {}.{}", schema.name, field.name);
                if !seen.insert(field.wire_name()) {
                    issues.push(ValidationIssue::new(
                        &field_loc,
                        "DuplicateField",
                        format!("Field '{}' is declared more than once in {}", field.wire_name(), schema.name),
                    ));
                }
                check_field(field, &field_loc, checked_schemas, issues);
            }
        }
        _ => {}
    }
}

fn check_constraint_fit(field: &FieldSpec, loc: &str, issues: &mut Vec<ValidationIssue>) {
    let c = &field.constraints;
    let ty = &field.value_type;

    if c.has_bounds() {
        if !ty.is_numeric() {
            issues.push(ValidationIssue::new(
                loc,
                "InvalidConstraint",
                format!("Numeric bounds do not apply to type {ty}"),
            ));
        }
        let bounds = [c.gt, c.ge, c.lt, c.le];
        if bounds.iter().flatten().any(|b| !b.is_finite()) {
            issues.push(ValidationIssue::new(
                loc,
                "InvalidConstraint",
                "Numeric bounds must be finite",
            ));
        }
        let lower = [c.gt.map(|v| (v, true)), c.ge.map(|v| (v, false))]
            .into_iter()
            .flatten()
            .max_by(|a, b| a.0.total_cmp(&b.0));
        let upper = [c.lt.map(|v| (v, true)), c.le.map(|v| (v, false))]
            .into_iter()
            .flatten()
            .min_by(|a, b| a.0.total_cmp(&b.0));
        if let (Some((low, low_exclusive)), Some((high, high_exclusive))) = (lower, upper) {
            let empty = if low_exclusive || high_exclusive {
                low >= high
            } else {
                low > high
            };
            if empty {
                issues.push(ValidationIssue::new(
                    loc,
                    "EmptyRange",
                    format!("Bounds leave no valid value between {low} and {high}"),
                ));
            }
        }
    }

    if c.has_length() {
        if !matches!(ty, ValueType::String | ValueType::Url | ValueType::Array(_)) {
            issues.push(ValidationIssue::new(
                loc,
                "InvalidConstraint",
                format!("Length bounds do not apply to type {ty}"),
            ));
        }
        if let (Some(min), Some(max)) = (c.min_length, c.max_length) {
            if min > max {
                issues.push(ValidationIssue::new(
                    loc,
                    "EmptyRange",
                    format!("min_length {min} is greater than max_length {max}"),
                ));
            }
        }
    }

    if c.pattern.is_some() && !matches!(ty, ValueType::String) {
        issues.push(ValidationIssue::new(
            loc,
            "InvalidConstraint",
            format!("pattern does not apply to type {ty}"),
        ));
    }

    if let Some(allowed) = &c.one_of {
        if !ty.is_scalar() {
            issues.push(ValidationIssue::new(
                loc,
                "InvalidConstraint",
                format!("one_of does not apply to type {ty}"),
            ));
        } else if allowed.is_empty() {
            issues.push(ValidationIssue::new(
                loc,
                "EmptyRange",
                "one_of lists no values",
            ));
        } else {
            for value in allowed.iter().filter(|v| !value_matches_type(v, ty)) {
                issues.push(ValidationIssue::new(
                    loc,
                    "InvalidConstraint",
                    format!("one_of value {value} is not a valid {ty}"),
                ));
            }
        }
    }
}

/// Whether an already-typed value (a default or `one_of` entry) fits a declared type.
#[must_use]
pub fn value_matches_type(value: &BoundValue, value_type: &ValueType) -> bool {
    match (value_type, value) {
        (ValueType::String, BoundValue::Str(_))
        | (ValueType::Integer, BoundValue::Int(_))
        | (ValueType::Number, BoundValue::Int(_) | BoundValue::Float(_))
        | (ValueType::Boolean, BoundValue::Bool(_))
        | (ValueType::Date, BoundValue::Date(_))
        | (ValueType::DateTime, BoundValue::DateTime(_))
        | (ValueType::Time, BoundValue::Time(_))
        | (ValueType::Duration, BoundValue::Duration(_))
        | (ValueType::Uuid, BoundValue::Uuid(_))
        | (ValueType::Url, BoundValue::Url(_)) => true,
        (ValueType::Enum(members), BoundValue::Str(s)) => members.iter().any(|m| m == s),
        (ValueType::Array(item), BoundValue::List(items)) => {
            items.iter().all(|v| value_matches_type(v, item))
        }
        (ValueType::Object(schema), BoundValue::Object(fields)) => {
            fields.iter().all(|(key, v)| {
                schema
                    .field_named(key)
                    .is_some_and(|f| value_matches_type(v, &f.value_type))
            })
        }
        _ => false,
    }
}
