use super::error::FieldError;
use super::value::BoundValue;
use crate::spec::Constraints;
use std::cmp::Ordering;

/// Check a coerced value against its constraints, appending one error per violation.
///
/// `raw` is the original wire text reported back in the error payload.
pub fn check_constraints(
    constraints: &Constraints,
    path: &str,
    value: &BoundValue,
    raw: &str,
    errors: &mut Vec<FieldError>,
) {
    if constraints.is_empty() {
        return;
    }

    if matches!(value, BoundValue::Int(_) | BoundValue::Float(_)) {
        check_bounds(constraints, path, value, raw, errors);
    }

    if let Some(len) = measured_length(value) {
        if let Some(min) = constraints.min_length {
            if len < min {
                errors.push(FieldError::constraint(
                    path,
                    "min_length",
                    format!("ensure this value has at least {min} {}", unit(value, min)),
                    raw,
                ));
            }
        }
        if let Some(max) = constraints.max_length {
            if len > max {
                errors.push(FieldError::constraint(
                    path,
                    "max_length",
                    format!("ensure this value has at most {max} {}", unit(value, max)),
                    raw,
                ));
            }
        }
    }

    if let (Some(pattern), Some(text)) = (&constraints.pattern, value.as_str()) {
        if !pattern.is_match(text) {
            errors.push(FieldError::constraint(
                path,
                "pattern",
                format!("string does not match regex \"{}\"", pattern.as_str()),
                raw,
            ));
        }
    }

    if let Some(allowed) = &constraints.one_of {
        if !allowed.iter().any(|candidate| same_value(candidate, value)) {
            let listed: Vec<String> = allowed.iter().map(ToString::to_string).collect();
            errors.push(FieldError::constraint(
                path,
                "one_of",
                format!("value is not one of: {}", listed.join(", ")),
                raw,
            ));
        }
    }
}

fn check_bounds(
    constraints: &Constraints,
    path: &str,
    value: &BoundValue,
    raw: &str,
    errors: &mut Vec<FieldError>,
) {
    let checks = [
        ("gt", constraints.gt, Ordering::is_gt as fn(Ordering) -> bool, "greater than"),
        ("ge", constraints.ge, Ordering::is_ge, "greater than or equal to"),
        ("lt", constraints.lt, Ordering::is_lt, "less than"),
        ("le", constraints.le, Ordering::is_le, "less than or equal to"),
    ];
    for (key, bound, holds, phrase) in checks {
        let Some(bound) = bound else { continue };
        if !compare_to_bound(value, bound).is_some_and(holds) {
            errors.push(FieldError::constraint(
                path,
                key,
                format!("ensure this value is {phrase} {bound}"),
                raw,
            ));
        }
    }
}

/// Integers meet integral bounds in integer arithmetic so values past 2^53 compare exactly.
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
fn compare_to_bound(value: &BoundValue, bound: f64) -> Option<Ordering> {
    match value {
        // `as i128` saturates, which keeps the ordering for bounds beyond the i64 range
        BoundValue::Int(v) if bound.fract() == 0.0 => Some(i128::from(*v).cmp(&(bound as i128))),
        BoundValue::Int(v) => (*v as f64).partial_cmp(&bound),
        BoundValue::Float(v) => v.partial_cmp(&bound),
        _ => None,
    }
}

fn measured_length(value: &BoundValue) -> Option<usize> {
    match value {
        BoundValue::Str(s) => Some(s.chars().count()),
        BoundValue::Url(url) => Some(url.as_str().chars().count()),
        BoundValue::List(items) => Some(items.len()),
        _ => None,
    }
}

fn unit(value: &BoundValue, count: usize) -> &'static str {
    match (value, count) {
        (BoundValue::List(_), 1) => "item",
        (BoundValue::List(_), _) => "items",
        (_, 1) => "character",
        _ => "characters",
    }
}

/// Integers and numbers compare numerically so `one_of: [1, 2]` accepts `2.0`.
fn same_value(a: &BoundValue, b: &BoundValue) -> bool {
    match (a, b) {
        (BoundValue::Int(x), BoundValue::Int(y)) => x == y,
        (BoundValue::Int(_) | BoundValue::Float(_), BoundValue::Int(_) | BoundValue::Float(_)) => {
            a.as_f64() == b.as_f64()
        }
        _ => a == b,
    }
}
