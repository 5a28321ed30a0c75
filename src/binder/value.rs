use crate::router::MAX_INLINE_PARAMS;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, TimeDelta};
use serde::de::DeserializeOwned;
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};
use smallvec::SmallVec;
use std::fmt;
use std::sync::Arc;
use url::Url;
use uuid::Uuid;

/// Fields of a bound object, in declaration order.
pub type BoundObject = Vec<(Arc<str>, BoundValue)>;

/// Bound parameters keyed by name, stack-allocated for ≤8 parameters.
pub type BoundVec = SmallVec<[(Arc<str>, BoundValue); MAX_INLINE_PARAMS]>;

/// A validated, typed value.
#[derive(Debug, Clone, PartialEq)]
pub enum BoundValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    /// Strings and enumeration members (original casing preserved)
    Str(String),
    Uuid(Uuid),
    Date(NaiveDate),
    /// Naive inputs are interpreted as UTC
    DateTime(DateTime<FixedOffset>),
    Time(NaiveTime),
    Duration(TimeDelta),
    Url(Url),
    List(Vec<BoundValue>),
    Object(BoundObject),
}

impl BoundValue {
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, BoundValue::Null)
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            BoundValue::Str(s) => Some(s.as_str()),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            BoundValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Numeric view of integers and numbers.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            BoundValue::Int(v) => Some(*v as f64),
            BoundValue::Float(v) => Some(*v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            BoundValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_list(&self) -> Option<&[BoundValue]> {
        match self {
            BoundValue::List(items) => Some(items.as_slice()),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_object(&self) -> Option<&BoundObject> {
        match self {
            BoundValue::Object(fields) => Some(fields),
            _ => None,
        }
    }

    /// Field of an object value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&BoundValue> {
        self.as_object()?
            .iter()
            .find(|(k, _)| k.as_ref() == key)
            .map(|(_, v)| v)
    }

    /// Convert into a plain JSON value.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

fn duration_seconds(delta: &TimeDelta) -> f64 {
    match delta.num_microseconds() {
        Some(micros) => micros as f64 / 1_000_000.0,
        None => delta.num_seconds() as f64,
    }
}

impl Serialize for BoundValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            BoundValue::Null => serializer.serialize_unit(),
            BoundValue::Bool(v) => serializer.serialize_bool(*v),
            BoundValue::Int(v) => serializer.serialize_i64(*v),
            BoundValue::Float(v) => serializer.serialize_f64(*v),
            BoundValue::Str(s) => serializer.serialize_str(s),
            BoundValue::Uuid(id) => serializer.collect_str(&id.hyphenated()),
            BoundValue::Date(d) => serializer.collect_str(d),
            BoundValue::DateTime(dt) => serializer.serialize_str(&dt.to_rfc3339()),
            BoundValue::Time(t) => serializer.collect_str(t),
            BoundValue::Duration(delta) => serializer.serialize_f64(duration_seconds(delta)),
            BoundValue::Url(url) => serializer.serialize_str(url.as_str()),
            BoundValue::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            BoundValue::Object(fields) => serialize_pairs(fields, serializer),
        }
    }
}

fn serialize_pairs<S: Serializer>(
    pairs: &[(Arc<str>, BoundValue)],
    serializer: S,
) -> Result<S::Ok, S::Error> {
    let mut map = serializer.serialize_map(Some(pairs.len()))?;
    for (key, value) in pairs {
        map.serialize_entry(key.as_ref(), value)?;
    }
    map.end()
}

impl fmt::Display for BoundValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoundValue::Null => write!(f, "null"),
            BoundValue::Bool(v) => write!(f, "{v}"),
            BoundValue::Int(v) => write!(f, "{v}"),
            BoundValue::Float(v) => write!(f, "{v}"),
            BoundValue::Str(s) => write!(f, "{s}"),
            BoundValue::Uuid(id) => write!(f, "{id}"),
            BoundValue::Date(d) => write!(f, "{d}"),
            BoundValue::DateTime(dt) => write!(f, "{}", dt.to_rfc3339()),
            BoundValue::Time(t) => write!(f, "{t}"),
            BoundValue::Duration(delta) => write!(f, "{}s", duration_seconds(delta)),
            BoundValue::Url(url) => write!(f, "{url}"),
            BoundValue::List(_) | BoundValue::Object(_) => write!(f, "{}", self.to_json()),
        }
    }
}

impl From<bool> for BoundValue {
    fn from(v: bool) -> Self {
        BoundValue::Bool(v)
    }
}

impl From<i64> for BoundValue {
    fn from(v: i64) -> Self {
        BoundValue::Int(v)
    }
}

impl From<i32> for BoundValue {
    fn from(v: i32) -> Self {
        BoundValue::Int(i64::from(v))
    }
}

impl From<f64> for BoundValue {
    fn from(v: f64) -> Self {
        BoundValue::Float(v)
    }
}

impl From<&str> for BoundValue {
    fn from(v: &str) -> Self {
        BoundValue::Str(v.to_owned())
    }
}

impl From<String> for BoundValue {
    fn from(v: String) -> Self {
        BoundValue::Str(v)
    }
}

impl From<Uuid> for BoundValue {
    fn from(v: Uuid) -> Self {
        BoundValue::Uuid(v)
    }
}

impl From<NaiveDate> for BoundValue {
    fn from(v: NaiveDate) -> Self {
        BoundValue::Date(v)
    }
}

impl From<TimeDelta> for BoundValue {
    fn from(v: TimeDelta) -> Self {
        BoundValue::Duration(v)
    }
}

impl From<Url> for BoundValue {
    fn from(v: Url) -> Self {
        BoundValue::Url(v)
    }
}

impl From<Vec<BoundValue>> for BoundValue {
    fn from(v: Vec<BoundValue>) -> Self {
        BoundValue::List(v)
    }
}

/// The validated, typed result of binding a request against its route.
///
/// Created fresh per request and handed to the handler; it holds no reference to the
/// request it was bound from.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundRequest {
    /// Handler the route was registered with
    pub handler_name: Arc<str>,
    /// Bound parameters in declaration order
    pub values: BoundVec,
}

impl BoundRequest {
    #[must_use]
    pub fn new(handler_name: Arc<str>, values: BoundVec) -> Self {
        Self {
            handler_name,
            values,
        }
    }

    #[inline]
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&BoundValue> {
        self.values
            .iter()
            .find(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v)
    }

    #[inline]
    #[must_use]
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(BoundValue::as_str)
    }

    #[inline]
    #[must_use]
    pub fn get_i64(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(BoundValue::as_i64)
    }

    #[inline]
    #[must_use]
    pub fn get_f64(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(BoundValue::as_f64)
    }

    #[inline]
    #[must_use]
    pub fn get_bool(&self, name: &str) -> Option<bool> {
        self.get(name).and_then(BoundValue::as_bool)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &BoundValue)> {
        self.values.iter().map(|(k, v)| (k.as_ref(), v))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// All bound parameters as one JSON object.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }

    /// Deserialize the bound parameters into a handler's own type.
    ///
    /// # Errors
    ///
    /// Returns an error if `T` does not match the shape of the bound parameters.
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_value(self.to_json())
    }
}

impl Serialize for BoundRequest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serialize_pairs(&self.values, serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_bound_value_serializes_typed_values() {
        let id = Uuid::parse_str("6f1c1a52-2f6b-4f55-9f0e-1d8f7ac6a0a1").unwrap();
        let value = BoundValue::Object(vec![
            (Arc::from("id"), BoundValue::Uuid(id)),
            (
                Arc::from("date"),
                BoundValue::Date(NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()),
            ),
            (Arc::from("after"), BoundValue::Duration(TimeDelta::seconds(90))),
            (
                Arc::from("tags"),
                BoundValue::List(vec!["a".into(), "b".into()]),
            ),
        ]);
        assert_eq!(
            value.to_json(),
            json!({
                "id": "6f1c1a52-2f6b-4f55-9f0e-1d8f7ac6a0a1",
                "date": "2024-02-29",
                "after": 90.0,
                "tags": ["a", "b"]
            })
        );
    }

    #[test]
    fn test_bound_request_lookup_and_deserialize() {
        #[derive(serde::Deserialize)]
        struct Params {
            skip: i64,
            q: Option<String>,
        }

        let mut values = BoundVec::new();
        values.push((Arc::from("skip"), BoundValue::Int(5)));
        values.push((Arc::from("q"), BoundValue::Null));
        let bound = BoundRequest::new(Arc::from("list_items"), values);

        assert_eq!(bound.get_i64("skip"), Some(5));
        assert!(bound.get("q").unwrap().is_null());
        assert!(bound.get("missing").is_none());

        let params: Params = bound.deserialize().unwrap();
        assert_eq!(params.skip, 5);
        assert!(params.q.is_none());
    }

    #[test]
    fn test_object_field_lookup() {
        let value = BoundValue::Object(vec![(Arc::from("tax"), BoundValue::Float(1.5))]);
        assert_eq!(value.get("tax").and_then(BoundValue::as_f64), Some(1.5));
        assert!(value.get("price").is_none());
    }
}
