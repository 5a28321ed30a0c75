//! Builder API for route declarations.
//!
//! Routes are declared explicitly, in the order their parameters should be bound:
//!
//! ```rust
//! use brrtbind::spec::{FieldSpec, ObjectSchema, ParameterSpec, RouteSpec};
//! use http::Method;
//! use std::sync::Arc;
//!
//! let item = Arc::new(
//!     ObjectSchema::new("Item")
//!         .field(FieldSpec::string("name"))
//!         .field(FieldSpec::string("description").optional().max_length(300))
//!         .field(FieldSpec::number("price").gt(0.0))
//!         .field(FieldSpec::number("tax").optional()),
//! );
//!
//! let route = RouteSpec::builder(Method::PUT, "/items/{item_id}")
//!     .handler("update_item")
//!     .param(ParameterSpec::path(FieldSpec::integer("item_id").ge(0.0).le(150.0)))
//!     .param(ParameterSpec::query(FieldSpec::string("q").optional()))
//!     .param(ParameterSpec::body(FieldSpec::object("item", item)).embed())
//!     .build();
//!
//! assert_eq!(route.parameters.len(), 3);
//! ```
//!
//! Builders never fail; declarations are checked when the route is registered with a
//! [`Router`](crate::router::Router).

use super::types::{
    Constraints, FieldSpec, ObjectSchema, ParameterLocation, ParameterSpec, ParameterStyle,
    RouteSpec, ValueType,
};
use crate::binder::BoundValue;
use http::Method;
use regex::Regex;
use std::sync::Arc;

impl FieldSpec {
    /// A required field of the given type with no constraints.
    pub fn new(name: impl Into<Arc<str>>, value_type: ValueType) -> Self {
        Self {
            name: name.into(),
            alias: None,
            value_type,
            required: true,
            default: None,
            constraints: Constraints::default(),
            description: None,
        }
    }

    pub fn string(name: impl Into<Arc<str>>) -> Self {
        Self::new(name, ValueType::String)
    }

    pub fn integer(name: impl Into<Arc<str>>) -> Self {
        Self::new(name, ValueType::Integer)
    }

    pub fn number(name: impl Into<Arc<str>>) -> Self {
        Self::new(name, ValueType::Number)
    }

    pub fn boolean(name: impl Into<Arc<str>>) -> Self {
        Self::new(name, ValueType::Boolean)
    }

    pub fn date(name: impl Into<Arc<str>>) -> Self {
        Self::new(name, ValueType::Date)
    }

    pub fn datetime(name: impl Into<Arc<str>>) -> Self {
        Self::new(name, ValueType::DateTime)
    }

    pub fn time(name: impl Into<Arc<str>>) -> Self {
        Self::new(name, ValueType::Time)
    }

    pub fn duration(name: impl Into<Arc<str>>) -> Self {
        Self::new(name, ValueType::Duration)
    }

    pub fn uuid(name: impl Into<Arc<str>>) -> Self {
        Self::new(name, ValueType::Uuid)
    }

    pub fn url(name: impl Into<Arc<str>>) -> Self {
        Self::new(name, ValueType::Url)
    }

    pub fn enumeration<I, S>(name: impl Into<Arc<str>>, members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(name, ValueType::enumeration(members))
    }

    pub fn array(name: impl Into<Arc<str>>, item: ValueType) -> Self {
        Self::new(name, ValueType::array(item))
    }

    pub fn object(name: impl Into<Arc<str>>, schema: Arc<ObjectSchema>) -> Self {
        Self::new(name, ValueType::Object(schema))
    }

    /// Absent values bind as `null` (or the default, if one is set).
    #[must_use]
    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Set the default and make the field optional.
    #[must_use]
    pub fn default(mut self, value: impl Into<BoundValue>) -> Self {
        self.default = Some(value.into());
        self.required = false;
        self
    }

    #[must_use]
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn gt(mut self, bound: f64) -> Self {
        self.constraints.gt = Some(bound);
        self
    }

    #[must_use]
    pub fn ge(mut self, bound: f64) -> Self {
        self.constraints.ge = Some(bound);
        self
    }

    #[must_use]
    pub fn lt(mut self, bound: f64) -> Self {
        self.constraints.lt = Some(bound);
        self
    }

    #[must_use]
    pub fn le(mut self, bound: f64) -> Self {
        self.constraints.le = Some(bound);
        self
    }

    #[must_use]
    pub fn min_length(mut self, len: usize) -> Self {
        self.constraints.min_length = Some(len);
        self
    }

    #[must_use]
    pub fn max_length(mut self, len: usize) -> Self {
        self.constraints.max_length = Some(len);
        self
    }

    #[must_use]
    pub fn pattern(mut self, regex: Regex) -> Self {
        self.constraints.pattern = Some(regex);
        self
    }

    #[must_use]
    pub fn one_of<I, V>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<BoundValue>,
    {
        self.constraints.one_of = Some(values.into_iter().map(Into::into).collect());
        self
    }
}

impl ObjectSchema {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    #[must_use]
    pub fn field(mut self, field: FieldSpec) -> Self {
        self.fields.push(field);
        self
    }
}

impl ParameterSpec {
    #[must_use]
    pub fn new(location: ParameterLocation, field: FieldSpec) -> Self {
        Self {
            field,
            location,
            style: None,
            explode: None,
            embed: false,
        }
    }

    #[must_use]
    pub fn path(field: FieldSpec) -> Self {
        Self::new(ParameterLocation::Path, field)
    }

    #[must_use]
    pub fn query(field: FieldSpec) -> Self {
        Self::new(ParameterLocation::Query, field)
    }

    #[must_use]
    pub fn header(field: FieldSpec) -> Self {
        Self::new(ParameterLocation::Header, field)
    }

    #[must_use]
    pub fn cookie(field: FieldSpec) -> Self {
        Self::new(ParameterLocation::Cookie, field)
    }

    #[must_use]
    pub fn body(field: FieldSpec) -> Self {
        Self::new(ParameterLocation::Body, field)
    }

    #[must_use]
    pub fn style(mut self, style: ParameterStyle) -> Self {
        self.style = Some(style);
        self
    }

    #[must_use]
    pub fn explode(mut self, explode: bool) -> Self {
        self.explode = Some(explode);
        self
    }

    /// Read this body parameter from `{"<name>": ...}` instead of the whole body.
    #[must_use]
    pub fn embed(mut self) -> Self {
        self.embed = true;
        self
    }
}

/// Builder returned by [`RouteSpec::builder`].
#[derive(Debug, Clone)]
pub struct RouteBuilder {
    method: Method,
    path_pattern: String,
    handler_name: Option<Arc<str>>,
    parameters: Vec<ParameterSpec>,
    summary: Option<String>,
}

impl RouteSpec {
    pub fn builder(method: Method, path_pattern: impl Into<String>) -> RouteBuilder {
        RouteBuilder {
            method,
            path_pattern: path_pattern.into(),
            handler_name: None,
            parameters: Vec::new(),
            summary: None,
        }
    }
}

impl RouteBuilder {
    #[must_use]
    pub fn handler(mut self, name: impl Into<Arc<str>>) -> Self {
        self.handler_name = Some(name.into());
        self
    }

    #[must_use]
    pub fn summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    /// Append a parameter; parameters are bound in declaration order.
    #[must_use]
    pub fn param(mut self, param: ParameterSpec) -> Self {
        self.parameters.push(param);
        self
    }

    #[must_use]
    pub fn params(mut self, params: impl IntoIterator<Item = ParameterSpec>) -> Self {
        self.parameters.extend(params);
        self
    }

    /// Finish the declaration. A missing handler name is reported at registration.
    #[must_use]
    pub fn build(self) -> RouteSpec {
        RouteSpec {
            method: self.method,
            path_pattern: self.path_pattern,
            handler_name: self.handler_name.unwrap_or_else(|| Arc::from("")),
            parameters: self.parameters,
            summary: self.summary,
        }
    }
}
