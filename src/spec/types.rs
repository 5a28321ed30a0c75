use crate::binder::BoundValue;
use http::Method;
use regex::Regex;
use serde::Deserialize;
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

/// Where a parameter is read from in the incoming request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterLocation {
    Path,
    Query,
    Header,
    Cookie,
    Body,
}

impl ParameterLocation {
    /// Lowercase name as used in route files and error messages.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ParameterLocation::Path => "path",
            ParameterLocation::Query => "query",
            ParameterLocation::Header => "header",
            ParameterLocation::Cookie => "cookie",
            ParameterLocation::Body => "body",
        }
    }
}

impl fmt::Display for ParameterLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParameterLocation::Path => write!(f, "Path"),
            ParameterLocation::Query => write!(f, "Query"),
            ParameterLocation::Header => write!(f, "Header"),
            ParameterLocation::Cookie => write!(f, "Cookie"),
            ParameterLocation::Body => write!(f, "Body"),
        }
    }
}

/// Serialization style of array-valued path and query parameters.
///
/// `Form` with `explode` (the default for query arrays) repeats the key for every item
/// (`?tag=a&tag=b`). The delimited styles pack items into one value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ParameterStyle {
    Form,
    Simple,
    SpaceDelimited,
    PipeDelimited,
}

impl ParameterStyle {
    /// Delimiter that separates items inside a single raw value, if any.
    #[must_use]
    pub fn delimiter(self, explode: Option<bool>) -> Option<char> {
        match self {
            ParameterStyle::Form if explode == Some(false) => Some(','),
            ParameterStyle::Form => None,
            ParameterStyle::Simple => Some(','),
            ParameterStyle::SpaceDelimited => Some(' '),
            ParameterStyle::PipeDelimited => Some('|'),
        }
    }
}

impl fmt::Display for ParameterStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ParameterStyle::Form => "Form",
            ParameterStyle::Simple => "Simple",
            ParameterStyle::SpaceDelimited => "SpaceDelimited",
            ParameterStyle::PipeDelimited => "PipeDelimited",
        };
        write!(f, "{}", s)
    }
}

/// The declared type of a field, primitive or structured.
#[derive(Debug, Clone)]
pub enum ValueType {
    String,
    Integer,
    Number,
    Boolean,
    Date,
    DateTime,
    Time,
    Duration,
    Uuid,
    /// Absolute `http`/`https` URL with a host.
    Url,
    /// String restricted to the declared members, compared case-sensitively.
    Enum(Arc<[String]>),
    Array(Box<ValueType>),
    Object(Arc<ObjectSchema>),
}

impl ValueType {
    /// Build an enum type from its members.
    pub fn enumeration<I, S>(members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ValueType::Enum(members.into_iter().map(Into::into).collect())
    }

    /// Build an array type from its item type.
    #[must_use]
    pub fn array(item: ValueType) -> Self {
        ValueType::Array(Box::new(item))
    }

    #[must_use]
    pub fn is_scalar(&self) -> bool {
        !matches!(self, ValueType::Array(_) | ValueType::Object(_))
    }

    #[must_use]
    pub fn is_numeric(&self) -> bool {
        matches!(self, ValueType::Integer | ValueType::Number)
    }

    /// Human readable type name used in type error messages.
    #[must_use]
    pub fn describe(&self) -> Cow<'static, str> {
        match self {
            ValueType::String => Cow::Borrowed("string"),
            ValueType::Integer => Cow::Borrowed("integer"),
            ValueType::Number => Cow::Borrowed("number"),
            ValueType::Boolean => Cow::Borrowed("boolean"),
            ValueType::Date => Cow::Borrowed("date"),
            ValueType::DateTime => Cow::Borrowed("datetime"),
            ValueType::Time => Cow::Borrowed("time"),
            ValueType::Duration => Cow::Borrowed("duration"),
            ValueType::Uuid => Cow::Borrowed("uuid"),
            ValueType::Url => Cow::Borrowed("http(s) url"),
            ValueType::Enum(members) => {
                let quoted: Vec<String> = members.iter().map(|m| format!("'{m}'")).collect();
                Cow::Owned(format!("enumeration member; permitted: {}", quoted.join(", ")))
            }
            ValueType::Array(item) => Cow::Owned(format!("array of {}", item.describe())),
            ValueType::Object(schema) => Cow::Owned(format!("object ({})", schema.name)),
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe())
    }
}

/// Post-coercion validation rules.
///
/// Numeric bounds apply to integers and numbers. Length bounds count characters of
/// strings and URLs and items of arrays. `pattern` is a regex search over strings.
/// `one_of` restricts any scalar to the listed values.
#[derive(Debug, Clone, Default)]
pub struct Constraints {
    pub gt: Option<f64>,
    pub ge: Option<f64>,
    pub lt: Option<f64>,
    pub le: Option<f64>,
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    pub pattern: Option<Regex>,
    pub one_of: Option<Vec<BoundValue>>,
}

impl Constraints {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        !self.has_bounds()
            && !self.has_length()
            && self.pattern.is_none()
            && self.one_of.is_none()
    }

    #[must_use]
    pub fn has_bounds(&self) -> bool {
        self.gt.is_some() || self.ge.is_some() || self.lt.is_some() || self.le.is_some()
    }

    #[must_use]
    pub fn has_length(&self) -> bool {
        self.min_length.is_some() || self.max_length.is_some()
    }
}

/// One declared input: a top-level parameter's payload or a field of an [`ObjectSchema`].
#[derive(Debug, Clone)]
pub struct FieldSpec {
    /// Key under which the bound value is stored
    pub name: Arc<str>,
    /// Name on the wire when it differs from `name` (e.g. `item-query`)
    pub alias: Option<String>,
    pub value_type: ValueType,
    pub required: bool,
    /// Substituted when an optional field is absent; `None` binds `null`
    pub default: Option<BoundValue>,
    pub constraints: Constraints,
    pub description: Option<String>,
}

impl FieldSpec {
    /// The name looked up in the request (alias or name).
    #[must_use]
    pub fn wire_name(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }
}

/// A named structured type: an ordered list of fields.
///
/// Schemas are shared through `Arc` so the same model (e.g. `Image`) can appear under
/// several parents.
#[derive(Debug, Clone)]
pub struct ObjectSchema {
    pub name: String,
    pub fields: Vec<FieldSpec>,
}

impl ObjectSchema {
    #[must_use]
    pub fn field_named(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name.as_ref() == name)
    }
}

/// Declarative description of one expected request input.
#[derive(Debug, Clone)]
pub struct ParameterSpec {
    pub field: FieldSpec,
    pub location: ParameterLocation,
    /// Array serialization style (path and query only)
    pub style: Option<ParameterStyle>,
    pub explode: Option<bool>,
    /// Body parameters only: read the value from a key of the top-level JSON object
    /// instead of taking the whole body
    pub embed: bool,
}

/// Name used throughout the documentation for [`ParameterSpec`].
pub type RouteParameterSpec = ParameterSpec;

impl ParameterSpec {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.field.name
    }

    /// Name looked up in the request.
    ///
    /// Header names default to the parameter name with `_` turned into `-`
    /// (`user_agent` → `user-agent`) and are always lowercase.
    #[must_use]
    pub fn wire_name(&self) -> Cow<'_, str> {
        match (self.location, &self.field.alias) {
            (ParameterLocation::Header, Some(alias)) => Cow::Owned(alias.to_ascii_lowercase()),
            (ParameterLocation::Header, None) => {
                Cow::Owned(self.field.name.replace('_', "-").to_ascii_lowercase())
            }
            (_, Some(alias)) => Cow::Borrowed(alias.as_str()),
            (_, None) => Cow::Borrowed(&*self.field.name),
        }
    }

    /// Delimiter splitting one raw value into array items for this parameter.
    #[must_use]
    pub fn item_delimiter(&self) -> Option<char> {
        match (self.location, self.style) {
            (_, Some(style)) => style.delimiter(self.explode),
            (ParameterLocation::Path, None) => Some(','),
            _ => None,
        }
    }
}

/// A registered route: method, path template, handler and its ordered parameters.
#[derive(Debug, Clone)]
pub struct RouteSpec {
    pub method: Method,
    /// Path template with `{name}` placeholders, e.g. `/users/{user_id}/items/{item_id}`
    pub path_pattern: String,
    pub handler_name: Arc<str>,
    pub parameters: Vec<ParameterSpec>,
    pub summary: Option<String>,
}

impl RouteSpec {
    pub fn body_parameters(&self) -> impl Iterator<Item = &ParameterSpec> {
        self.parameters
            .iter()
            .filter(|p| p.location == ParameterLocation::Body)
    }

    /// Whether `param` reads a key of the body object rather than the whole body.
    ///
    /// A route with several body parameters embeds all of them.
    #[must_use]
    pub fn is_embedded(&self, param: &ParameterSpec) -> bool {
        param.location == ParameterLocation::Body
            && (param.embed || self.body_parameters().count() > 1)
    }

    #[must_use]
    pub fn parameter(&self, name: &str) -> Option<&ParameterSpec> {
        self.parameters.iter().find(|p| p.name() == name)
    }
}

impl fmt::Display for RouteSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.path_pattern)
    }
}
