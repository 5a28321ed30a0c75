use crate::spec::ValueType;
use serde::Serialize;
use std::fmt;

/// Why a single field failed to bind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ErrorKind {
    /// A required input is absent
    #[serde(rename = "missing")]
    MissingRequired,
    /// The raw value could not be converted to the declared type
    #[serde(rename = "type")]
    TypeCoercionFailed,
    /// The converted value breaks a declared constraint
    #[serde(rename = "constraint")]
    ConstraintViolated,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::MissingRequired => write!(f, "missing"),
            ErrorKind::TypeCoercionFailed => write!(f, "type"),
            ErrorKind::ConstraintViolated => write!(f, "constraint"),
        }
    }
}

/// One entry of the error payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldError {
    /// Dotted path of the field, e.g. `item.tax` or `offer.items.0.name`
    pub field: String,
    pub kind: ErrorKind,
    pub message: String,
    /// Original raw value, omitted for missing fields
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    /// Constraint key (`gt`, `max_length`, …) for constraint errors
    #[serde(skip)]
    pub constraint: Option<&'static str>,
}

impl FieldError {
    pub fn missing(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            kind: ErrorKind::MissingRequired,
            message: "field required".to_string(),
            value: None,
            constraint: None,
        }
    }

    pub fn type_mismatch(
        field: impl Into<String>,
        expected: &ValueType,
        value: Option<String>,
    ) -> Self {
        Self {
            field: field.into(),
            kind: ErrorKind::TypeCoercionFailed,
            message: format!("value is not a valid {}", expected.describe()),
            value,
            constraint: None,
        }
    }

    /// Type error with a message that is not about the declared type (e.g. undecodable body).
    pub fn malformed(
        field: impl Into<String>,
        message: impl Into<String>,
        value: Option<String>,
    ) -> Self {
        Self {
            field: field.into(),
            kind: ErrorKind::TypeCoercionFailed,
            message: message.into(),
            value,
            constraint: None,
        }
    }

    pub fn constraint(
        field: impl Into<String>,
        constraint: &'static str,
        message: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            field: field.into(),
            kind: ErrorKind::ConstraintViolated,
            message: message.into(),
            value: Some(value.into()),
            constraint: Some(constraint),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]: {}", self.field, self.kind, self.message)?;
        if let Some(value) = &self.value {
            write!(f, " (got {value:?})")?;
        }
        Ok(())
    }
}

/// Binding failed: every field error found in the request, in declaration order.
///
/// Serializes to `{"errors": [{"field", "kind", "message", "value"?}, ...]}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BindError {
    pub errors: Vec<FieldError>,
}

impl BindError {
    #[must_use]
    pub fn new(errors: Vec<FieldError>) -> Self {
        Self { errors }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// First error recorded for `field`.
    #[must_use]
    pub fn for_field(&self, field: &str) -> Option<&FieldError> {
        self.errors.iter().find(|e| e.field == field)
    }

    #[must_use]
    pub fn has(&self, field: &str, kind: ErrorKind) -> bool {
        self.errors.iter().any(|e| e.field == field && e.kind == kind)
    }

    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_else(|_| serde_json::json!({ "errors": [] }))
    }
}

impl fmt::Display for BindError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "request binding failed with {} error(s)", self.errors.len())?;
        for error in &self.errors {
            write!(f, "; {error}")?;
        }
        Ok(())
    }
}

impl std::error::Error for BindError {}
