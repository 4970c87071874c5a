//! Crate-wide error taxonomy.
//!
//! Every failure produced by the engine is a deterministic function of its
//! input, so no error here is ever retried. Hydration and extraction fail with
//! [`BindError`]; schema validation fails with a path-addressed
//! [`ValidationError`]; the ISO-8601 codec fails with [`TemporalError`], which
//! the validator translates into [`ValidationErrorKind::FormatMismatch`].

use crate::schema::SchemaNode;
use serde::Serialize;
use thiserror::Error;

/// A location inside a nested value tree: property names and array indices,
/// in traversal order from the root.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Path(Vec<PathSegment>);

/// One step of a [`Path`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum PathSegment {
    /// Property name of an object member.
    Key(String),
    /// Zero-based index of an array element.
    Index(usize),
}

impl Path {
    /// The root path, displayed as `$`.
    pub fn root() -> Self {
        Path(Vec::new())
    }

    /// Returns a new path extended with a property name.
    pub fn key(&self, name: &str) -> Path {
        let mut segments = self.0.clone();
        segments.push(PathSegment::Key(name.to_string()));
        Path(segments)
    }

    /// Returns a new path extended with an array index.
    pub fn index(&self, idx: usize) -> Path {
        let mut segments = self.0.clone();
        segments.push(PathSegment::Index(idx));
        Path(segments)
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }
}

impl std::fmt::Display for Path {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "$")?;
        for segment in &self.0 {
            match segment {
                PathSegment::Key(name) => write!(f, ".{name}")?,
                PathSegment::Index(idx) => write!(f, "[{idx}]")?,
            }
        }
        Ok(())
    }
}

/// Errors raised while hydrating a raw value into a typed value, or while
/// extracting a typed value back into raw form.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum BindError {
    /// The resolver could not categorize the annotation. Fatal; building a
    /// strategy for it is impossible, so the registry surfaces this
    /// immediately and caches nothing.
    #[error("unsupported type annotation `{0}`")]
    UnsupportedType(String),

    /// A value could not be coerced into (or out of) the expected shape.
    /// Raised once per offending leaf, fail-fast.
    #[error("cannot convert `{value}` into {expected}")]
    Conversion { expected: String, value: String },

    /// A strict record was hydrated from a mapping missing a declared field
    /// that has no default.
    #[error("missing required property `{0}`")]
    RequiredPropertyMissing(String),
}

impl BindError {
    pub(crate) fn conversion(expected: impl Into<String>, value: impl std::fmt::Display) -> Self {
        BindError::Conversion {
            expected: expected.into(),
            value: value.to_string(),
        }
    }
}

/// Classification of a schema validation failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationErrorKind {
    RequiredPropertyMissing,
    PropertyTypeMismatch,
    PropertyValueInvalid,
    FormatMismatch,
}

impl std::fmt::Display for ValidationErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ValidationErrorKind::RequiredPropertyMissing => "required property missing",
            ValidationErrorKind::PropertyTypeMismatch => "property type mismatch",
            ValidationErrorKind::PropertyValueInvalid => "property value invalid",
            ValidationErrorKind::FormatMismatch => "format mismatch",
        };
        write!(f, "{s}")
    }
}

/// First violation found while walking a value tree against a schema tree.
///
/// Carries the classification, the path of the offending value, the schema
/// node that rejected it, and (for `anyOf`) the failure of the first
/// alternative as the error source.
#[derive(Debug, Clone, Error, PartialEq)]
#[error("{kind} at {path}")]
pub struct ValidationError {
    pub kind: ValidationErrorKind,
    pub path: Path,
    /// The schema node the value was checked against.
    pub schema: SchemaNode,
    #[source]
    pub cause: Option<Box<ValidationError>>,
}

impl ValidationError {
    pub(crate) fn new(kind: ValidationErrorKind, path: Path, schema: &SchemaNode) -> Self {
        ValidationError {
            kind,
            path,
            schema: schema.clone(),
            cause: None,
        }
    }

    /// Renders the error as a plain JSON object suitable for a structured
    /// failure response body.
    pub fn to_value(&self) -> serde_json::Value {
        serde_json::json!({
            "kind": self.kind,
            "path": self.path.to_string(),
            "message": self.to_string(),
        })
    }
}

/// A string did not match any accepted ISO-8601 variant.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("`{value}` is not a valid ISO-8601 {expected}")]
pub struct TemporalError {
    /// Which grammar was expected: `date`, `time`, `date-time` or `duration`.
    pub expected: &'static str,
    pub value: String,
}

impl TemporalError {
    pub(crate) fn new(expected: &'static str, value: &str) -> Self {
        TemporalError {
            expected,
            value: value.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_display() {
        let path = Path::root().key("pet").index(2).key("name");
        assert_eq!(path.to_string(), "$.pet[2].name");
        assert_eq!(Path::root().to_string(), "$");
    }

    #[test]
    fn test_bind_error_display() {
        let err = BindError::conversion("integer", "abc");
        assert_eq!(err.to_string(), "cannot convert `abc` into integer");
        let err = BindError::RequiredPropertyMissing("name".to_string());
        assert_eq!(err.to_string(), "missing required property `name`");
    }

    #[test]
    fn test_temporal_error_display() {
        let err = TemporalError::new("duration", "PT");
        assert_eq!(err.to_string(), "`PT` is not a valid ISO-8601 duration");
    }
}
