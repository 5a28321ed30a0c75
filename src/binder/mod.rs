//! # Binder Module
//!
//! Turns a raw request into a validated, typed [`BoundRequest`] according to the
//! route's ordered parameter declarations, or into a [`BindError`] listing every
//! problem found.
//!
//! ## Pipeline
//!
//! For each declared parameter, in order:
//!
//! 1. Extract the raw value from its source (path, query, header, cookie, body)
//! 2. Absent: record a missing-field error if required, else bind the default
//! 3. Present: coerce to the declared type, recording a type error on failure
//! 4. Coerced: check constraints, recording a constraint error per violation
//! 5. Objects recurse field by field with dotted error paths (`offer.items.0.name`)
//!
//! Binding never short-circuits and never partially succeeds.

mod body;
mod coerce;
mod constraints;
mod core;
mod error;
mod value;

pub use body::DecodedBody;
pub use coerce::{coerce_json_scalar, coerce_text};
pub use constraints::check_constraints;
pub use core::{Binder, BODY_FIELD};
pub use error::{BindError, ErrorKind, FieldError};
pub use value::{BoundObject, BoundRequest, BoundValue, BoundVec};
