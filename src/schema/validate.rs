//! Fail-fast schema validation.
//!
//! The validator walks the schema tree in lock-step with the value tree and
//! surfaces the first violation it encounters, in schema declaration order:
//! required names before property recursion, properties in declared order,
//! array elements in index order. There is no aggregation; the walk aborts at
//! the first error.

use super::types::{SchemaNode, StringFormat};
use crate::error::{Path, ValidationError, ValidationErrorKind};
use crate::temporal;
use serde_json::Value;

/// Validate a raw value tree against a schema tree.
///
/// Returns nothing on success and the first violation found on failure, with
/// its full path from the root.
///
/// ```
/// use bindery::schema::{self, validate};
/// use bindery::ValidationErrorKind;
/// use serde_json::json;
///
/// let schema = schema::from_value(&json!({
///     "type": "object",
///     "required": ["name"],
///     "properties": {"name": {"type": "string"}}
/// })).unwrap();
///
/// assert!(validate(&json!({"name": "Bobek"}), &schema).is_ok());
/// let err = validate(&json!({}), &schema).unwrap_err();
/// assert_eq!(err.kind, ValidationErrorKind::RequiredPropertyMissing);
/// assert_eq!(err.path.to_string(), "$.name");
/// ```
pub fn validate(value: &Value, schema: &SchemaNode) -> Result<(), ValidationError> {
    validate_at(value, schema, &Path::root())
}

fn validate_at(value: &Value, schema: &SchemaNode, path: &Path) -> Result<(), ValidationError> {
    match schema {
        SchemaNode::Object {
            required,
            properties,
        } => {
            let obj = value.as_object().ok_or_else(|| {
                ValidationError::new(ValidationErrorKind::PropertyTypeMismatch, path.clone(), schema)
            })?;
            for name in required {
                if !obj.contains_key(name) {
                    return Err(ValidationError::new(
                        ValidationErrorKind::RequiredPropertyMissing,
                        path.key(name),
                        schema,
                    ));
                }
            }
            for (name, child) in properties {
                if let Some(present) = obj.get(name) {
                    validate_at(present, child, &path.key(name))?;
                }
            }
            Ok(())
        }
        SchemaNode::Array {
            items,
            min_items,
            max_items,
        } => {
            let arr = value.as_array().ok_or_else(|| {
                ValidationError::new(ValidationErrorKind::PropertyTypeMismatch, path.clone(), schema)
            })?;
            let out_of_bounds = min_items.map_or(false, |min| arr.len() < min)
                || max_items.map_or(false, |max| arr.len() > max);
            if out_of_bounds {
                return Err(ValidationError::new(
                    ValidationErrorKind::PropertyValueInvalid,
                    path.clone(),
                    schema,
                ));
            }
            if let Some(items) = items {
                for (idx, element) in arr.iter().enumerate() {
                    validate_at(element, items, &path.index(idx))?;
                }
            }
            Ok(())
        }
        SchemaNode::String {
            format,
            min_length,
            max_length,
        } => {
            let s = value.as_str().ok_or_else(|| {
                ValidationError::new(ValidationErrorKind::PropertyTypeMismatch, path.clone(), schema)
            })?;
            let length = s.chars().count();
            let out_of_bounds = min_length.map_or(false, |min| length < min)
                || max_length.map_or(false, |max| length > max);
            if out_of_bounds {
                return Err(ValidationError::new(
                    ValidationErrorKind::PropertyValueInvalid,
                    path.clone(),
                    schema,
                ));
            }
            if let Some(format) = format {
                check_format(*format, s).map_err(|_| {
                    ValidationError::new(ValidationErrorKind::FormatMismatch, path.clone(), schema)
                })?;
            }
            Ok(())
        }
        SchemaNode::Number { minimum, maximum } => {
            let n = number_value(value).ok_or_else(|| {
                ValidationError::new(ValidationErrorKind::PropertyTypeMismatch, path.clone(), schema)
            })?;
            let out_of_bounds = minimum.map_or(false, |min| n < min)
                || maximum.map_or(false, |max| n > max);
            if out_of_bounds {
                return Err(ValidationError::new(
                    ValidationErrorKind::PropertyValueInvalid,
                    path.clone(),
                    schema,
                ));
            }
            Ok(())
        }
        SchemaNode::Integer { minimum, maximum } => {
            let i = integer_value(value).ok_or_else(|| {
                ValidationError::new(ValidationErrorKind::PropertyTypeMismatch, path.clone(), schema)
            })?;
            let out_of_bounds = minimum.map_or(false, |min| i < min)
                || maximum.map_or(false, |max| i > max);
            if out_of_bounds {
                return Err(ValidationError::new(
                    ValidationErrorKind::PropertyValueInvalid,
                    path.clone(),
                    schema,
                ));
            }
            Ok(())
        }
        SchemaNode::Boolean => {
            if value.is_boolean() {
                Ok(())
            } else {
                Err(ValidationError::new(
                    ValidationErrorKind::PropertyTypeMismatch,
                    path.clone(),
                    schema,
                ))
            }
        }
        SchemaNode::Enum { allowed } => {
            if allowed.contains(value) {
                Ok(())
            } else {
                Err(ValidationError::new(
                    ValidationErrorKind::PropertyValueInvalid,
                    path.clone(),
                    schema,
                ))
            }
        }
        SchemaNode::AnyOf { alternatives } => {
            let mut first_failure = None;
            for alternative in alternatives {
                match validate_at(value, alternative, path) {
                    Ok(()) => return Ok(()),
                    Err(err) => {
                        if first_failure.is_none() {
                            first_failure = Some(err);
                        }
                    }
                }
            }
            // The first alternative's failure rides along as the source for
            // diagnostics.
            let mut err = ValidationError::new(
                ValidationErrorKind::PropertyValueInvalid,
                path.clone(),
                schema,
            );
            err.cause = first_failure.map(Box::new);
            Err(err)
        }
    }
}

fn check_format(format: StringFormat, s: &str) -> Result<(), crate::error::TemporalError> {
    match format {
        StringFormat::Date => temporal::parse_date(s).map(|_| ()),
        StringFormat::DateTime => temporal::parse_datetime(s).map(|_| ()),
        StringFormat::Time => temporal::parse_time(s).map(|_| ()),
        StringFormat::Duration => temporal::parse_duration(s).map(|_| ()),
    }
}

fn number_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        _ => None,
    }
}

/// A raw number counts as an integer when its fractional part is zero, so
/// `1.0` satisfies an `integer` schema while `1.5` does not.
fn integer_value(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => match n.as_i64() {
            Some(i) => Some(i),
            None => n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64),
        },
        _ => None,
    }
}
