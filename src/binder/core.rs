//! The bind pipeline: extract, substitute defaults, coerce, constrain.
//!
//! Every declared parameter is processed in declaration order, and every failure is
//! recorded. Binding succeeds only when no error was recorded, so a handler never sees a
//! partially bound request.

use super::body::DecodedBody;
use super::coerce::{coerce_json_scalar, coerce_text};
use super::constraints::check_constraints;
use super::error::{BindError, FieldError};
use super::value::{BoundObject, BoundRequest, BoundValue, BoundVec};
use crate::router::{ParamVec, RouteMatch};
use crate::runtime_config::BindConfig;
use crate::server::RawRequest;
use crate::spec::{FieldSpec, ObjectSchema, ParameterLocation, ParameterSpec, RouteSpec, ValueType};
use serde_json::{Map, Value};
use std::borrow::Cow;
use std::sync::Arc;
use tracing::debug;

/// Field path used for errors that concern the request body as a whole.
pub const BODY_FIELD: &str = "body";

/// Raw input located for one parameter.
#[derive(Debug)]
enum RawInput<'a> {
    Absent,
    Text(Cow<'a, str>),
    TextList(Vec<Cow<'a, str>>),
    Json(&'a Value),
}

/// Binds raw requests against route declarations.
///
/// A `Binder` holds only configuration, so one instance can be shared by every
/// request and thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct Binder {
    config: BindConfig,
}

impl Binder {
    #[must_use]
    pub fn new(config: BindConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn config(&self) -> &BindConfig {
        &self.config
    }

    /// Bind a request against the route it was matched to.
    ///
    /// # Errors
    ///
    /// Returns a [`BindError`] listing every missing, mistyped, or out-of-bounds field.
    pub fn bind_match(
        &self,
        matched: &RouteMatch,
        request: &RawRequest,
    ) -> Result<BoundRequest, BindError> {
        self.bind(&matched.route, request, &matched.path_params)
    }

    /// Bind a request against `route`, with raw path parameters from the router.
    ///
    /// # Errors
    ///
    /// Returns a [`BindError`] listing every missing, mistyped, or out-of-bounds field.
    pub fn bind(
        &self,
        route: &RouteSpec,
        request: &RawRequest,
        path_params: &ParamVec,
    ) -> Result<BoundRequest, BindError> {
        let mut errors = Vec::new();
        let mut values = BoundVec::new();

        let body = if route.body_parameters().next().is_some() {
            let decoded = DecodedBody::decode(request, self.config.max_body_bytes);
            record_body_error(&decoded, self.config.max_body_bytes, &mut errors);
            decoded
        } else {
            DecodedBody::Absent
        };
        let mut reported_non_object_body = false;

        for param in &route.parameters {
            let wire = param.wire_name();
            let raw = match param.location {
                ParameterLocation::Body => {
                    match body_input(route, param, &wire, &body) {
                        Ok(raw) => raw,
                        Err(BodySkip::AlreadyReported) => continue,
                        Err(BodySkip::NotAnObject(value)) => {
                            if !reported_non_object_body {
                                errors.push(FieldError::malformed(
                                    BODY_FIELD,
                                    "value is not a valid object",
                                    Some(json_text(value).into_owned()),
                                ));
                                reported_non_object_body = true;
                            }
                            continue;
                        }
                    }
                }
                _ => extract_text(param, &wire, request, path_params),
            };

            debug!(
                parameter = %param.name(),
                location = %param.location,
                wire_name = %wire,
                present = !matches!(raw, RawInput::Absent),
                "Parameter extracted"
            );

            let lenient_lists = body.is_form();
            if let Some(value) = bind_field(&param.field, &wire, raw, lenient_lists, &mut errors) {
                values.push((Arc::clone(&param.field.name), value));
            }
        }

        if errors.is_empty() {
            debug!(
                handler_name = %route.handler_name,
                bound_count = values.len(),
                "Request bound"
            );
            Ok(BoundRequest::new(Arc::clone(&route.handler_name), values))
        } else {
            debug!(
                handler_name = %route.handler_name,
                error_count = errors.len(),
                "Request binding failed"
            );
            Err(BindError::new(errors))
        }
    }
}

enum BodySkip<'a> {
    /// Undecodable or oversized body; one error already recorded
    AlreadyReported,
    /// Embedded parameter but the body is not a JSON object
    NotAnObject(&'a Value),
}

fn record_body_error(decoded: &DecodedBody, limit: usize, errors: &mut Vec<FieldError>) {
    match decoded {
        DecodedBody::Invalid(message) => errors.push(FieldError::malformed(
            BODY_FIELD,
            format!("body could not be decoded: {message}"),
            None,
        )),
        DecodedBody::TooLarge(size) => errors.push(FieldError::constraint(
            BODY_FIELD,
            "max_body_bytes",
            format!("ensure the request body is at most {limit} bytes"),
            format!("{size} bytes"),
        )),
        _ => {}
    }
}

fn body_input<'a>(
    route: &RouteSpec,
    param: &ParameterSpec,
    wire: &str,
    body: &'a DecodedBody,
) -> Result<RawInput<'a>, BodySkip<'a>> {
    let value = match body {
        DecodedBody::Absent => return Ok(RawInput::Absent),
        DecodedBody::Invalid(_) | DecodedBody::TooLarge(_) => {
            return Err(BodySkip::AlreadyReported)
        }
        DecodedBody::Json(value) | DecodedBody::Form(value) => value,
    };
    if !route.is_embedded(param) {
        return Ok(RawInput::Json(value));
    }
    match value {
        Value::Object(map) => Ok(map.get(wire).map_or(RawInput::Absent, RawInput::Json)),
        other => Err(BodySkip::NotAnObject(other)),
    }
}

fn extract_text<'a>(
    param: &ParameterSpec,
    wire: &str,
    request: &'a RawRequest,
    path_params: &'a ParamVec,
) -> RawInput<'a> {
    let is_list = matches!(param.field.value_type, ValueType::Array(_));
    let delimiter = param.item_delimiter();

    match param.location {
        ParameterLocation::Path => {
            let Some((_, raw)) = path_params.iter().rfind(|(k, _)| k.as_ref() == wire) else {
                return RawInput::Absent;
            };
            let decoded = urlencoding::decode(raw).unwrap_or(Cow::Borrowed(raw.as_str()));
            if is_list {
                RawInput::TextList(split_items(decoded, delimiter.or(Some(','))))
            } else {
                RawInput::Text(decoded)
            }
        }
        ParameterLocation::Query => {
            if is_list {
                let items: Vec<Cow<'a, str>> = request
                    .query
                    .iter()
                    .filter(|(k, _)| k == wire)
                    .flat_map(|(_, v)| split_items(Cow::Borrowed(v.as_str()), delimiter))
                    .collect();
                if items.is_empty() {
                    RawInput::Absent
                } else {
                    RawInput::TextList(items)
                }
            } else {
                request
                    .query
                    .iter()
                    .rfind(|(k, _)| k == wire)
                    .map_or(RawInput::Absent, |(_, v)| RawInput::Text(Cow::Borrowed(v)))
            }
        }
        ParameterLocation::Header => {
            let mut values = request
                .headers
                .get_all(wire)
                .iter()
                .map(|v| match v.to_str() {
                    Ok(s) => Cow::Borrowed(s),
                    Err(_) => Cow::Owned(String::from_utf8_lossy(v.as_bytes()).into_owned()),
                })
                .peekable();
            if values.peek().is_none() {
                RawInput::Absent
            } else if is_list {
                RawInput::TextList(values.collect())
            } else {
                values.next().map_or(RawInput::Absent, RawInput::Text)
            }
        }
        ParameterLocation::Cookie => request
            .cookie(wire)
            .map_or(RawInput::Absent, |v| RawInput::Text(Cow::Borrowed(v))),
        ParameterLocation::Body => RawInput::Absent,
    }
}

fn split_items(raw: Cow<'_, str>, delimiter: Option<char>) -> Vec<Cow<'_, str>> {
    match (raw, delimiter) {
        (raw, None) => vec![raw],
        (Cow::Borrowed(s), Some(d)) => s
            .split(d)
            .filter(|item| !item.is_empty())
            .map(Cow::Borrowed)
            .collect(),
        (Cow::Owned(s), Some(d)) => s
            .split(d)
            .filter(|item| !item.is_empty())
            .map(|item| Cow::Owned(item.to_string()))
            .collect(),
    }
}

/// Run one field through presence, coercion, and constraint checks.
fn bind_field(
    field: &FieldSpec,
    path: &str,
    raw: RawInput<'_>,
    lenient_lists: bool,
    errors: &mut Vec<FieldError>,
) -> Option<BoundValue> {
    let before = errors.len();
    let (value, raw_text) = match raw {
        RawInput::Absent | RawInput::Json(Value::Null) => return absent(field, path, errors),
        RawInput::Text(text) => match coerce_text(&field.value_type, &text) {
            Some(value) => (value, text),
            None => {
                errors.push(FieldError::type_mismatch(
                    path,
                    &field.value_type,
                    Some(text.into_owned()),
                ));
                return None;
            }
        },
        RawInput::TextList(items) => {
            let ValueType::Array(item_type) = &field.value_type else {
                return None;
            };
            let mut bound = Vec::with_capacity(items.len());
            for (idx, item) in items.iter().enumerate() {
                match coerce_text(item_type, item) {
                    Some(value) => bound.push(value),
                    None => errors.push(FieldError::type_mismatch(
                        format!("{path}.{idx}"),
                        item_type,
                        Some(item.to_string()),
                    )),
                }
            }
            let joined = items.join(",");
            (BoundValue::List(bound), Cow::Owned(joined))
        }
        RawInput::Json(value) => {
            let bound = bind_json(&field.value_type, path, value, lenient_lists, errors);
            match bound {
                Some(bound) => (bound, json_text(value)),
                None => return None,
            }
        }
    };

    if errors.len() > before {
        return None;
    }
    check_constraints(&field.constraints, path, &value, &raw_text, errors);
    (errors.len() == before).then_some(value)
}

fn absent(field: &FieldSpec, path: &str, errors: &mut Vec<FieldError>) -> Option<BoundValue> {
    if field.required {
        errors.push(FieldError::missing(path));
        None
    } else {
        Some(field.default.clone().unwrap_or(BoundValue::Null))
    }
}

/// Convert a non-null JSON value to `value_type`, recursing into arrays and objects.
fn bind_json(
    value_type: &ValueType,
    path: &str,
    value: &Value,
    lenient_lists: bool,
    errors: &mut Vec<FieldError>,
) -> Option<BoundValue> {
    match (value_type, value) {
        (ValueType::Array(item_type), Value::Array(items)) => {
            let before = errors.len();
            let mut bound = Vec::with_capacity(items.len());
            for (idx, item) in items.iter().enumerate() {
                let item_path = format!("{path}.{idx}");
                if item.is_null() {
                    errors.push(FieldError::type_mismatch(item_path, item_type, None));
                    continue;
                }
                if let Some(v) = bind_json(item_type, &item_path, item, lenient_lists, errors) {
                    bound.push(v);
                }
            }
            (errors.len() == before).then_some(BoundValue::List(bound))
        }
        // A single form value for a list field
        (ValueType::Array(item_type), Value::String(_)) if lenient_lists => {
            let item_path = format!("{path}.0");
            bind_json(item_type, &item_path, value, lenient_lists, errors)
                .map(|v| BoundValue::List(vec![v]))
        }
        (ValueType::Object(schema), Value::Object(map)) => {
            bind_object(schema, path, map, lenient_lists, errors)
        }
        (ValueType::Array(_) | ValueType::Object(_), other) => {
            errors.push(FieldError::type_mismatch(
                path,
                value_type,
                Some(json_text(other).into_owned()),
            ));
            None
        }
        (_, scalar) => match coerce_json_scalar(value_type, scalar) {
            Some(v) => Some(v),
            None => {
                errors.push(FieldError::type_mismatch(
                    path,
                    value_type,
                    Some(json_text(scalar).into_owned()),
                ));
                None
            }
        },
    }
}

/// Bind each declared field of `schema`; unknown keys are ignored.
fn bind_object(
    schema: &ObjectSchema,
    path: &str,
    map: &Map<String, Value>,
    lenient_lists: bool,
    errors: &mut Vec<FieldError>,
) -> Option<BoundValue> {
    let before = errors.len();
    let mut fields = BoundObject::with_capacity(schema.fields.len());
    for field in &schema.fields {
        let wire = field.wire_name();
        let field_path = format!("{path}.{wire}");
        let raw = map.get(wire).map_or(RawInput::Absent, RawInput::Json);
        if let Some(value) = bind_field(field, &field_path, raw, lenient_lists, errors) {
            fields.push((Arc::clone(&field.name), value));
        }
    }
    (errors.len() == before).then_some(BoundValue::Object(fields))
}

/// Raw text of a JSON value for error payloads: strings as-is, anything else compact.
fn json_text(value: &Value) -> Cow<'_, str> {
    match value {
        Value::String(s) => Cow::Borrowed(s),
        other => Cow::Owned(other.to_string()),
    }
}
