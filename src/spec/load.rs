//! Route files: YAML or JSON declarations of schemas and routes.
//!
//! ```yaml
//! schemas:
//!   Item:
//!     fields:
//!       - { name: name, type: string }
//!       - { name: price, type: number, gt: 0 }
//!       - { name: tax, type: number, required: false }
//! routes:
//!   - method: PUT
//!     path: /items/{item_id}
//!     handler: update_item
//!     parameters:
//!       - { name: item_id, in: path, type: integer }
//!       - { name: item, in: body, $ref: Item, embed: true }
//! ```
//!
//! A field is required unless it declares `required: false` or a `default`.

use super::types::{
    Constraints, FieldSpec, ObjectSchema, ParameterLocation, ParameterSpec, ParameterStyle,
    RouteSpec, ValueType,
};
use crate::binder::{coerce_json_scalar, BoundValue};
use crate::router::Router;
use crate::validator::ValidationIssue;
use http::Method;
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Failure to turn a route file into route declarations.
#[derive(Debug)]
pub enum LoadError {
    Io { path: PathBuf, source: std::io::Error },
    Parse { path: PathBuf, message: String },
    /// The file parsed but its declarations are inconsistent
    Invalid(Vec<ValidationIssue>),
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadError::Io { path, source } => {
                write!(f, "failed to read route file {}: {source}", path.display())
            }
            LoadError::Parse { path, message } => {
                write!(f, "failed to parse route file {}: {message}", path.display())
            }
            LoadError::Invalid(issues) => {
                write!(f, "route file has {} issue(s)", issues.len())?;
                for issue in issues {
                    write!(f, "\n  {issue}")?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for LoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LoadError::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RouteFile {
    #[serde(default)]
    schemas: BTreeMap<String, SchemaDecl>,
    #[serde(default)]
    routes: Vec<RouteDecl>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SchemaDecl {
    #[serde(default)]
    fields: Vec<FieldDecl>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RouteDecl {
    method: String,
    path: String,
    handler: String,
    summary: Option<String>,
    #[serde(default)]
    parameters: Vec<FieldDecl>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct TypeDecl {
    #[serde(rename = "type")]
    type_name: Option<String>,
    #[serde(rename = "$ref")]
    reference: Option<String>,
    items: Option<Box<TypeDecl>>,
    #[serde(rename = "enum")]
    members: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct FieldDecl {
    name: String,
    #[serde(rename = "type")]
    type_name: Option<String>,
    #[serde(rename = "$ref")]
    reference: Option<String>,
    items: Option<Box<TypeDecl>>,
    #[serde(rename = "enum")]
    members: Option<Vec<String>>,
    required: Option<bool>,
    default: Option<Value>,
    alias: Option<String>,
    description: Option<String>,
    gt: Option<f64>,
    ge: Option<f64>,
    lt: Option<f64>,
    le: Option<f64>,
    min_length: Option<usize>,
    max_length: Option<usize>,
    pattern: Option<String>,
    one_of: Option<Vec<Value>>,
    #[serde(rename = "in")]
    location: Option<ParameterLocation>,
    style: Option<ParameterStyle>,
    explode: Option<bool>,
    #[serde(default)]
    embed: bool,
}

impl FieldDecl {
    fn type_decl(&self) -> TypeDeclRef<'_> {
        TypeDeclRef {
            type_name: self.type_name.as_deref(),
            reference: self.reference.as_deref(),
            items: self.items.as_deref(),
            members: self.members.as_deref(),
        }
    }

    fn has_parameter_options(&self) -> bool {
        self.location.is_some() || self.style.is_some() || self.explode.is_some() || self.embed
    }
}

#[derive(Clone, Copy)]
struct TypeDeclRef<'a> {
    type_name: Option<&'a str>,
    reference: Option<&'a str>,
    items: Option<&'a TypeDecl>,
    members: Option<&'a [String]>,
}

impl<'a> From<&'a TypeDecl> for TypeDeclRef<'a> {
    fn from(decl: &'a TypeDecl) -> Self {
        TypeDeclRef {
            type_name: decl.type_name.as_deref(),
            reference: decl.reference.as_deref(),
            items: decl.items.as_deref(),
            members: decl.members.as_deref(),
        }
    }
}

/// Resolves `$ref`s against the file's schemas, memoizing each schema once.
struct Resolver<'a> {
    decls: &'a BTreeMap<String, SchemaDecl>,
    resolved: HashMap<String, Arc<ObjectSchema>>,
    /// Schemas currently being resolved, for cycle detection
    stack: Vec<String>,
    issues: Vec<ValidationIssue>,
}

impl<'a> Resolver<'a> {
    fn new(decls: &'a BTreeMap<String, SchemaDecl>) -> Self {
        Self {
            decls,
            resolved: HashMap::new(),
            stack: Vec::new(),
            issues: Vec::new(),
        }
    }

    fn issue(&mut self, location: &str, kind: &str, message: impl Into<String>) {
        self.issues.push(ValidationIssue::new(location, kind, message));
    }

    fn schema(&mut self, name: &str, loc: &str) -> Option<Arc<ObjectSchema>> {
        if let Some(schema) = self.resolved.get(name) {
            return Some(Arc::clone(schema));
        }
        if self.stack.iter().any(|s| s == name) {
            let chain = format!("{} -> {name}", self.stack.join(" -> "));
            self.issue(loc, "RecursiveSchema", format!("Schema cycle: {chain}"));
            return None;
        }
        let decls = self.decls;
        let Some(decl) = decls.get(name) else {
            self.issue(loc, "UnknownSchema", format!("No schema named '{name}'"));
            return None;
        };

        self.stack.push(name.to_string());
        let mut schema = ObjectSchema::new(name);
        for field in &decl.fields {
            let field_loc = format!("schemas.{name}.{}", field.name);
            if field.has_parameter_options() {
                self.issue(
                    &field_loc,
                    "InvalidFieldOption",
                    "in/style/explode/embed only apply to route parameters",
                );
            }
            if let Some(spec) = self.field(field, &field_loc) {
                schema.fields.push(spec);
            }
        }
        self.stack.pop();

        let schema = Arc::new(schema);
        self.resolved.insert(name.to_string(), Arc::clone(&schema));
        debug!(schema = %name, field_count = schema.fields.len(), "Schema resolved");
        Some(schema)
    }

    fn value_type(&mut self, decl: TypeDeclRef<'_>, loc: &str) -> Option<ValueType> {
        if let Some(reference) = decl.reference {
            if decl.type_name.is_some_and(|t| t != "object") {
                self.issue(loc, "ConflictingType", "$ref cannot be combined with a type");
            }
            return self.schema(reference, loc).map(ValueType::Object);
        }

        let type_name = match (decl.type_name, decl.members) {
            (Some(name), _) => name,
            (None, Some(_)) => "enum",
            (None, None) => {
                self.issue(loc, "MissingType", "Field declares neither type, enum nor $ref");
                return None;
            }
        };

        if decl.members.is_some() && type_name != "enum" {
            self.issue(loc, "ConflictingType", format!("enum cannot be combined with type {type_name}"));
        }

        let value_type = match type_name {
            "string" | "str" => ValueType::String,
            "integer" | "int" => ValueType::Integer,
            "number" | "float" => ValueType::Number,
            "boolean" | "bool" => ValueType::Boolean,
            "date" => ValueType::Date,
            "datetime" | "date-time" => ValueType::DateTime,
            "time" => ValueType::Time,
            "duration" | "timedelta" => ValueType::Duration,
            "uuid" => ValueType::Uuid,
            "url" => ValueType::Url,
            "enum" => ValueType::enumeration(decl.members.unwrap_or_default().iter().cloned()),
            "array" => {
                let Some(items) = decl.items else {
                    self.issue(loc, "MissingType", "array fields need 'items'");
                    return None;
                };
                ValueType::array(self.value_type(items.into(), &format!("{loc}[]"))?)
            }
            "object" => {
                self.issue(loc, "MissingType", "object fields need a $ref to a named schema");
                return None;
            }
            other => {
                self.issue(loc, "UnknownType", format!("Unknown type '{other}'"));
                return None;
            }
        };
        if decl.items.is_some() && !matches!(value_type, ValueType::Array(_)) {
            self.issue(loc, "ConflictingType", "'items' only applies to arrays");
        }
        Some(value_type)
    }

    fn field(&mut self, decl: &FieldDecl, loc: &str) -> Option<FieldSpec> {
        let value_type = self.value_type(decl.type_decl(), loc)?;

        let pattern = match decl.pattern.as_deref().map(Regex::new) {
            Some(Ok(re)) => Some(re),
            Some(Err(e)) => {
                self.issue(loc, "InvalidConstraint", format!("Invalid pattern: {e}"));
                None
            }
            None => None,
        };

        let default = match &decl.default {
            Some(Value::Null) | None => None,
            Some(value) => match json_to_bound(&value_type, value) {
                Some(bound) => Some(bound),
                None => {
                    self.issue(
                        loc,
                        "InvalidDefault",
                        format!("Default {value} is not a valid {value_type}"),
                    );
                    None
                }
            },
        };

        let one_of = match &decl.one_of {
            None => None,
            Some(values) => {
                let mut bound = Vec::with_capacity(values.len());
                for value in values {
                    match json_to_bound(&value_type, value) {
                        Some(v) => bound.push(v),
                        None => self.issue(
                            loc,
                            "InvalidConstraint",
                            format!("one_of value {value} is not a valid {value_type}"),
                        ),
                    }
                }
                Some(bound)
            }
        };

        let required = decl
            .required
            .unwrap_or(decl.default.as_ref().map_or(true, Value::is_null));
        if required && default.is_some() {
            self.issue(loc, "InvalidDefault", "A required field cannot have a default");
        }

        Some(FieldSpec {
            name: Arc::from(decl.name.as_str()),
            alias: decl.alias.clone(),
            value_type,
            required,
            default,
            constraints: Constraints {
                gt: decl.gt,
                ge: decl.ge,
                lt: decl.lt,
                le: decl.le,
                min_length: decl.min_length,
                max_length: decl.max_length,
                pattern,
                one_of,
            },
            description: decl.description.clone(),
        })
    }

    fn route(&mut self, decl: &RouteDecl) -> Option<RouteSpec> {
        let route_loc = format!("{} {}", decl.method, decl.path);
        let method = match Method::from_bytes(decl.method.to_ascii_uppercase().as_bytes()) {
            Ok(method) => method,
            Err(_) => {
                self.issue(&route_loc, "InvalidMethod", format!("'{}' is not an HTTP method", decl.method));
                return None;
            }
        };

        let mut builder = RouteSpec::builder(method, decl.path.as_str()).handler(decl.handler.as_str());
        if let Some(summary) = &decl.summary {
            builder = builder.summary(summary.as_str());
        }

        let mut complete = true;
        for param in &decl.parameters {
            let loc = format!("{route_loc} > {}", param.name);
            let Some(location) = param.location else {
                self.issue(&loc, "MissingLocation", "Route parameters need 'in'");
                complete = false;
                continue;
            };
            let Some(field) = self.field(param, &loc) else {
                complete = false;
                continue;
            };
            builder = builder.param(ParameterSpec {
                field,
                location,
                style: param.style,
                explode: param.explode,
                embed: param.embed,
            });
        }
        complete.then(|| builder.build())
    }
}

/// Convert a JSON literal from a route file (a default or `one_of` entry) to a typed value.
fn json_to_bound(value_type: &ValueType, value: &Value) -> Option<BoundValue> {
    match (value_type, value) {
        (ValueType::Array(item), Value::Array(items)) => items
            .iter()
            .map(|v| json_to_bound(item, v))
            .collect::<Option<Vec<_>>>()
            .map(BoundValue::List),
        (ValueType::Array(_) | ValueType::Object(_), _) => None,
        (_, scalar) => coerce_json_scalar(value_type, scalar),
    }
}

/// Parse route declarations from YAML (or JSON, which YAML accepts) text.
///
/// # Errors
///
/// Returns [`LoadError::Parse`] for malformed text and [`LoadError::Invalid`] for
/// unresolvable types, schemas, defaults, or methods.
pub fn parse_routes(content: &str, yaml: bool) -> Result<Vec<RouteSpec>, LoadError> {
    let file: RouteFile = if yaml {
        serde_yaml::from_str(content).map_err(|e| LoadError::Parse {
            path: PathBuf::new(),
            message: e.to_string(),
        })?
    } else {
        serde_json::from_str(content).map_err(|e| LoadError::Parse {
            path: PathBuf::new(),
            message: e.to_string(),
        })?
    };

    let mut resolver = Resolver::new(&file.schemas);
    for name in file.schemas.keys() {
        let loc = format!("schemas.{name}");
        let _resolved = resolver.schema(name, &loc);
    }
    let routes: Vec<RouteSpec> = file
        .routes
        .iter()
        .filter_map(|route| resolver.route(route))
        .collect();

    if resolver.issues.is_empty() {
        Ok(routes)
    } else {
        Err(LoadError::Invalid(resolver.issues))
    }
}

/// Load route declarations from a `.yaml`/`.yml` or `.json` file.
///
/// # Errors
///
/// Returns [`LoadError`] if the file cannot be read, parsed, or resolved.
pub fn load_routes(path: impl AsRef<Path>) -> Result<Vec<RouteSpec>, LoadError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let yaml = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("yaml") || e.eq_ignore_ascii_case("yml"));

    let routes = parse_routes(&content, yaml).map_err(|err| match err {
        LoadError::Parse { message, .. } => LoadError::Parse {
            path: path.to_path_buf(),
            message,
        },
        other => other,
    })?;

    info!(
        path = %path.display(),
        routes_count = routes.len(),
        "Route file loaded"
    );
    Ok(routes)
}

/// Load a route file and register every route.
///
/// # Errors
///
/// Returns [`LoadError`] if loading fails or any route is refused at registration.
pub fn load_router(path: impl AsRef<Path>) -> Result<Router, LoadError> {
    let routes = load_routes(path)?;
    Router::from_routes(routes).map_err(|err| LoadError::Invalid(err.issues))
}

#[cfg(test)]
mod tests {
    use super::*;

    const ITEMS: &str = r#"
schemas:
  Image:
    fields:
      - { name: url, type: url }
      - { name: name, type: string }
  Item:
    fields:
      - { name: name, type: string }
      - { name: price, type: number, gt: 0 }
      - { name: tags, type: array, items: { type: string }, default: [] }
      - { name: images, type: array, items: { $ref: Image }, required: false }
routes:
  - method: get
    path: /items/
    handler: read_items
    parameters:
      - { name: skip, in: query, type: integer, default: 0 }
      - { name: limit, in: query, type: integer, default: 10 }
  - method: PUT
    path: /items/{item_id}
    handler: update_item
    summary: Update an item
    parameters:
      - { name: item_id, in: path, type: integer }
      - { name: item, in: body, $ref: Item, embed: true }
"#;

    #[test]
    fn test_parse_routes_resolves_schemas_and_defaults() {
        let routes = parse_routes(ITEMS, true).unwrap();
        assert_eq!(routes.len(), 2);
        assert_eq!(routes[0].method, Method::GET);

        let skip = routes[0].parameter("skip").unwrap();
        assert!(!skip.field.required);
        assert_eq!(skip.field.default, Some(BoundValue::Int(0)));

        let item = routes[1].parameter("item").unwrap();
        assert!(item.embed);
        let ValueType::Object(schema) = &item.field.value_type else {
            panic!("item should be an object");
        };
        assert_eq!(schema.name, "Item");
        let tags = schema.field_named("tags").unwrap();
        assert_eq!(tags.default, Some(BoundValue::List(Vec::new())));
        assert!(!tags.required);
        assert!(!schema.field_named("images").unwrap().required);
        assert_eq!(routes[1].summary.as_deref(), Some("Update an item"));
    }

    #[test]
    fn test_shared_schema_is_resolved_once() {
        let content = r#"
schemas:
  Image:
    fields: [{ name: url, type: url }]
  Item:
    fields: [{ name: image, $ref: Image }]
  Offer:
    fields: [{ name: image, $ref: Image }]
"#;
        let file: RouteFile = serde_yaml::from_str(content).unwrap();
        let mut resolver = Resolver::new(&file.schemas);
        let item = resolver.schema("Item", "test").unwrap();
        let offer = resolver.schema("Offer", "test").unwrap();
        let (ValueType::Object(a), ValueType::Object(b)) = (
            &item.fields[0].value_type,
            &offer.fields[0].value_type,
        ) else {
            panic!("expected objects");
        };
        assert!(Arc::ptr_eq(a, b));
    }

    #[test]
    fn test_recursive_and_unknown_schemas() {
        let content = r#"
schemas:
  Node:
    fields: [{ name: next, $ref: Node, required: false }]
routes:
  - method: POST
    path: /things
    handler: create_thing
    parameters:
      - { name: thing, in: body, $ref: Thing }
"#;
        let Err(LoadError::Invalid(issues)) = parse_routes(content, true) else {
            panic!("expected issues");
        };
        let kinds: Vec<_> = issues.iter().map(|i| i.kind.as_str()).collect();
        assert!(kinds.contains(&"RecursiveSchema"));
        assert!(kinds.contains(&"UnknownSchema"));
    }

    #[test]
    fn test_declaration_issues_are_collected() {
        let content = r#"
routes:
  - method: FETCH ME
    path: /a
    handler: a
  - method: GET
    path: /b
    handler: b
    parameters:
      - { name: q, type: integer }
      - { name: r, in: query, type: decimal }
      - { name: s, in: query, type: integer, default: ten }
      - { name: t, in: query, type: string, pattern: "(" }
"#;
        let Err(LoadError::Invalid(issues)) = parse_routes(content, true) else {
            panic!("expected issues");
        };
        let kinds: Vec<_> = issues.iter().map(|i| i.kind.as_str()).collect();
        assert_eq!(
            kinds,
            vec![
                "InvalidMethod",
                "MissingLocation",
                "UnknownType",
                "InvalidDefault",
                "InvalidConstraint"
            ]
        );
    }

    #[test]
    fn test_unknown_keys_are_parse_errors() {
        let content = r#"{"routes": [{"method": "GET", "path": "/", "handler": "h", "colour": 1}]}"#;
        assert!(matches!(parse_routes(content, false), Err(LoadError::Parse { .. })));
    }

    #[test]
    fn test_enum_and_datetime_types() {
        let content = r#"
routes:
  - method: GET
    path: /foods/{food_name}
    handler: get_food
    parameters:
      - { name: food_name, in: path, enum: [fruits, vegetables, dairy] }
      - { name: since, in: query, type: date-time, required: false }
"#;
        let routes = parse_routes(content, true).unwrap();
        let food = routes[0].parameter("food_name").unwrap();
        assert!(matches!(&food.field.value_type, ValueType::Enum(m) if m.len() == 3));
        let since = routes[0].parameter("since").unwrap();
        assert!(matches!(since.field.value_type, ValueType::DateTime));
    }
}
