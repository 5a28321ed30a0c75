use crate::server::RawRequest;
use serde_json::{Map, Value};

/// The request body, decoded once per bind.
#[derive(Debug, Clone, PartialEq)]
pub enum DecodedBody {
    /// Empty body or JSON `null`
    Absent,
    Json(Value),
    /// `application/x-www-form-urlencoded`: an object of strings and string arrays
    Form(Value),
    /// The body could not be decoded; carries the decoder's message
    Invalid(String),
    /// Body exceeds the configured limit; carries the actual size
    TooLarge(usize),
}

impl DecodedBody {
    /// Decode `request.body` according to its content type.
    ///
    /// `application/x-www-form-urlencoded` bodies become an object of strings, with
    /// repeated keys collected into arrays. Anything else is parsed as JSON.
    #[must_use]
    pub fn decode(request: &RawRequest, max_body_bytes: usize) -> Self {
        let bytes = request.body.as_ref();
        if bytes.len() > max_body_bytes {
            return DecodedBody::TooLarge(bytes.len());
        }
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return DecodedBody::Absent;
        }

        let is_form = request
            .content_type()
            .is_some_and(|ct| ct.starts_with("application/x-www-form-urlencoded"));
        if is_form {
            return DecodedBody::Form(decode_form(bytes));
        }

        match serde_json::from_slice::<Value>(bytes) {
            Ok(Value::Null) => DecodedBody::Absent,
            Ok(value) => DecodedBody::Json(value),
            Err(e) => DecodedBody::Invalid(e.to_string()),
        }
    }

    #[must_use]
    pub fn is_form(&self) -> bool {
        matches!(self, DecodedBody::Form(_))
    }

    #[must_use]
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            DecodedBody::Json(value) | DecodedBody::Form(value) => Some(value),
            _ => None,
        }
    }
}

fn decode_form(bytes: &[u8]) -> Value {
    let mut object = Map::new();
    for (key, value) in url::form_urlencoded::parse(bytes) {
        let value = Value::String(value.into_owned());
        match object.get_mut(key.as_ref()) {
            Some(Value::Array(items)) => items.push(value),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, value]);
            }
            None => {
                object.insert(key.into_owned(), value);
            }
        }
    }
    Value::Object(object)
}
