//! The hydrated value model.
//!
//! [`TypedValue`] is what hydration produces and extraction consumes: a closed
//! set of domain shapes mirroring the descriptor categories. Raw transport
//! data stays `serde_json::Value` (with ordered maps via `preserve_order`).

use crate::temporal::{self, Duration, IsoDateTime, IsoTime};
use chrono::NaiveDate;
use serde_json::Value;

/// A statically-shaped domain value produced by hydration.
#[derive(Debug, Clone, PartialEq)]
pub enum TypedValue {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Date(NaiveDate),
    Time(IsoTime),
    DateTime(IsoDateTime),
    Duration(Duration),
    Tuple(Vec<TypedValue>),
    Sequence(Vec<TypedValue>),
    /// De-duplicated; element order is order of first appearance.
    Set(Vec<TypedValue>),
    /// Key/value pairs in input order.
    Mapping(Vec<(TypedValue, TypedValue)>),
    Record(RecordValue),
}

impl TypedValue {
    /// Short shape name for error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            TypedValue::None => "none",
            TypedValue::Bool(_) => "boolean",
            TypedValue::Int(_) => "integer",
            TypedValue::Float(_) => "float",
            TypedValue::Str(_) => "string",
            TypedValue::Date(_) => "date",
            TypedValue::Time(_) => "time",
            TypedValue::DateTime(_) => "date-time",
            TypedValue::Duration(_) => "duration",
            TypedValue::Tuple(_) => "tuple",
            TypedValue::Sequence(_) => "sequence",
            TypedValue::Set(_) => "set",
            TypedValue::Mapping(_) => "mapping",
            TypedValue::Record(_) => "record",
        }
    }

    /// Structural conversion from raw data, with no coercion: JSON leaves map
    /// to their direct typed counterparts, arrays to sequences, objects to
    /// string-keyed mappings. Used where values must pass through unvalidated,
    /// such as non-strict record hydration.
    pub fn from_raw(raw: &Value) -> TypedValue {
        match raw {
            Value::Null => TypedValue::None,
            Value::Bool(b) => TypedValue::Bool(*b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => TypedValue::Int(i),
                None => TypedValue::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            Value::String(s) => TypedValue::Str(s.clone()),
            Value::Array(items) => {
                TypedValue::Sequence(items.iter().map(TypedValue::from_raw).collect())
            }
            Value::Object(map) => TypedValue::Mapping(
                map.iter()
                    .map(|(k, v)| (TypedValue::Str(k.clone()), TypedValue::from_raw(v)))
                    .collect(),
            ),
        }
    }

    /// Structural conversion back to raw data. Only strings, numbers,
    /// booleans, null and plain ordered sequences/mappings survive; temporal
    /// values render as canonical ISO strings, records and mappings become
    /// plain objects, tuples and sets become plain arrays. Non-finite floats
    /// have no JSON representation and become null.
    pub fn to_raw(&self) -> Value {
        match self {
            TypedValue::None => Value::Null,
            TypedValue::Bool(b) => Value::Bool(*b),
            TypedValue::Int(i) => Value::from(*i),
            TypedValue::Float(f) => serde_json::Number::from_f64(*f)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            TypedValue::Str(s) => Value::String(s.clone()),
            TypedValue::Date(d) => Value::String(temporal::format_date(*d)),
            TypedValue::Time(t) => Value::String(temporal::format_time(t)),
            TypedValue::DateTime(dt) => Value::String(temporal::format_datetime(dt)),
            TypedValue::Duration(d) => Value::String(temporal::format_duration(*d)),
            TypedValue::Tuple(items) | TypedValue::Sequence(items) | TypedValue::Set(items) => {
                Value::Array(items.iter().map(TypedValue::to_raw).collect())
            }
            TypedValue::Mapping(pairs) => {
                let mut map = serde_json::Map::new();
                for (key, value) in pairs {
                    map.insert(raw_key(key), value.to_raw());
                }
                Value::Object(map)
            }
            TypedValue::Record(record) => {
                let mut map = serde_json::Map::new();
                for (name, value) in record.fields() {
                    map.insert(name.clone(), value.to_raw());
                }
                Value::Object(map)
            }
        }
    }
}

/// Object keys are strings on the wire; scalar keys render via their raw
/// form, anything else via its shape name (unreachable for hydrated data).
fn raw_key(key: &TypedValue) -> String {
    match key.to_raw() {
        Value::String(s) => s,
        other => other.to_string(),
    }
}

/// A record instance: named fields in assignment order.
///
/// Non-strict hydration may assign keys that were never declared on the
/// record's shape; they are retained here like any other field.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RecordValue {
    name: String,
    fields: Vec<(String, TypedValue)>,
}

/// Post-construction hook invoked once after all field assignments complete.
pub type PostInit = fn(&mut RecordValue);

impl RecordValue {
    pub fn new(name: impl Into<String>) -> Self {
        RecordValue {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    /// The record type's name, as carried by its shape.
    pub fn type_name(&self) -> &str {
        &self.name
    }

    /// Assign a field, replacing any existing value under the same name.
    pub fn set(&mut self, name: impl Into<String>, value: TypedValue) {
        let name = name.into();
        match self.fields.iter_mut().find(|(n, _)| *n == name) {
            Some((_, slot)) => *slot = value,
            None => self.fields.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&TypedValue> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut TypedValue> {
        self.fields
            .iter_mut()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.iter().any(|(n, _)| n == name)
    }

    pub fn fields(&self) -> impl Iterator<Item = &(String, TypedValue)> {
        self.fields.iter()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_raw_structural() {
        let raw = json!({"a": 1, "b": [true, null, 2.5], "c": "x"});
        let typed = TypedValue::from_raw(&raw);
        let TypedValue::Mapping(pairs) = &typed else {
            panic!("expected mapping, got {typed:?}");
        };
        assert_eq!(pairs[0], (TypedValue::Str("a".into()), TypedValue::Int(1)));
        assert_eq!(
            pairs[1].1,
            TypedValue::Sequence(vec![
                TypedValue::Bool(true),
                TypedValue::None,
                TypedValue::Float(2.5),
            ])
        );
        // Structural conversion round-trips untouched raw trees.
        assert_eq!(typed.to_raw(), raw);
    }

    #[test]
    fn test_to_raw_flattens_containers() {
        let typed = TypedValue::Tuple(vec![TypedValue::Int(1), TypedValue::Str("x".into())]);
        assert_eq!(typed.to_raw(), json!([1, "x"]));

        let mut record = RecordValue::new("Pet");
        record.set("name", TypedValue::Str("Bobek".into()));
        record.set("id", TypedValue::Int(1));
        assert_eq!(
            TypedValue::Record(record).to_raw(),
            json!({"name": "Bobek", "id": 1})
        );
    }

    #[test]
    fn test_record_set_replaces() {
        let mut record = RecordValue::new("Pet");
        record.set("tag", TypedValue::Str("a".into()));
        record.set("tag", TypedValue::Str("b".into()));
        assert_eq!(record.len(), 1);
        assert_eq!(record.get("tag"), Some(&TypedValue::Str("b".into())));
        assert!(!record.contains("name"));
    }
}
