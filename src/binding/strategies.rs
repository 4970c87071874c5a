//! One hydration/extraction strategy per resolved shape category.
//!
//! Strategies are stateless apart from the annotations they close over and a
//! handle to the [`StrategyRegistry`] for recursive child lookups; a sequence
//! strategy never owns its element strategy, it asks the registry each time,
//! which keeps mutually recursive shapes (sequence-of-record-of-tuple) free
//! of recursive ownership.

use super::annotation::{EnumMember, RecordShape, ScalarKind, TypeAnnotation};
use super::registry::StrategyRegistry;
use super::value::{RecordValue, TypedValue};
use crate::error::BindError;
use crate::temporal;
use serde_json::Value;
use std::sync::Arc;

/// Shape-specific hydration and extraction.
///
/// `extract` is the structural inverse of `hydrate`: it yields values built
/// only from strings, numbers, booleans, null and plain ordered
/// sequences/mappings. No record or non-standard container kind survives
/// extraction.
pub trait Strategy: Send + Sync {
    /// Convert a raw value tree into a typed value.
    fn hydrate(&self, raw: &Value) -> Result<TypedValue, BindError>;

    /// Convert a typed value back into a plain raw value tree.
    fn extract(&self, typed: &TypedValue) -> Result<Value, BindError>;
}

/// Compact rendering of a raw value for conversion error messages.
fn raw_repr(raw: &Value) -> String {
    match raw {
        Value::String(s) => s.clone(),
        Value::Array(_) => "a sequence".to_string(),
        Value::Object(_) => "a mapping".to_string(),
        other => other.to_string(),
    }
}

pub(super) struct ScalarStrategy {
    pub kind: ScalarKind,
}

/// Coerce a raw leaf into a primitive kind via that primitive's canonical
/// constructor. Pairings with no defined coercion fail.
fn coerce_scalar(kind: ScalarKind, raw: &Value) -> Result<TypedValue, BindError> {
    let fail = || BindError::conversion(kind.name(), raw_repr(raw));
    match kind {
        ScalarKind::Str => match raw {
            Value::String(s) => Ok(TypedValue::Str(s.clone())),
            Value::Number(n) => Ok(TypedValue::Str(n.to_string())),
            Value::Bool(b) => Ok(TypedValue::Str(b.to_string())),
            _ => Err(fail()),
        },
        ScalarKind::Int => match raw {
            Value::Number(n) => match n.as_i64() {
                Some(i) => Ok(TypedValue::Int(i)),
                // Fractional input truncates toward zero, as integer
                // construction from a float does; non-finite or out-of-range
                // floats fail rather than saturate.
                None => n
                    .as_f64()
                    .filter(|f| f.is_finite() && *f >= i64::MIN as f64 && *f < i64::MAX as f64)
                    .map(|f| TypedValue::Int(f.trunc() as i64))
                    .ok_or_else(fail),
            },
            Value::Bool(b) => Ok(TypedValue::Int(i64::from(*b))),
            Value::String(s) => s.trim().parse::<i64>().map(TypedValue::Int).map_err(|_| fail()),
            _ => Err(fail()),
        },
        ScalarKind::Float => match raw {
            Value::Number(n) => n.as_f64().map(TypedValue::Float).ok_or_else(fail),
            Value::Bool(b) => Ok(TypedValue::Float(if *b { 1.0 } else { 0.0 })),
            Value::String(s) => s.trim().parse::<f64>().map(TypedValue::Float).map_err(|_| fail()),
            _ => Err(fail()),
        },
        ScalarKind::Bool => match raw {
            Value::Bool(b) => Ok(TypedValue::Bool(*b)),
            Value::Number(n) => Ok(TypedValue::Bool(n.as_f64() != Some(0.0))),
            Value::String(s) => Ok(TypedValue::Bool(!s.is_empty())),
            _ => Err(fail()),
        },
        ScalarKind::Date => match raw {
            Value::String(s) => temporal::parse_date(s).map(TypedValue::Date).map_err(|_| fail()),
            _ => Err(fail()),
        },
        ScalarKind::Time => match raw {
            Value::String(s) => temporal::parse_time(s).map(TypedValue::Time).map_err(|_| fail()),
            _ => Err(fail()),
        },
        ScalarKind::DateTime => match raw {
            Value::String(s) => temporal::parse_datetime(s)
                .map(TypedValue::DateTime)
                .map_err(|_| fail()),
            _ => Err(fail()),
        },
        ScalarKind::Duration => match raw {
            Value::String(s) => temporal::parse_duration(s)
                .map(TypedValue::Duration)
                .map_err(|_| fail()),
            _ => Err(fail()),
        },
    }
}

impl Strategy for ScalarStrategy {
    fn hydrate(&self, raw: &Value) -> Result<TypedValue, BindError> {
        coerce_scalar(self.kind, raw)
    }

    fn extract(&self, typed: &TypedValue) -> Result<Value, BindError> {
        // Extraction coerces by the declared kind too: extracting 2.1 through
        // a string element yields "2.1". Project to raw form, run the same
        // coercion, then project the coerced result.
        Ok(coerce_scalar(self.kind, &typed.to_raw())?.to_raw())
    }
}

pub(super) struct OptionalStrategy {
    pub inner: TypeAnnotation,
    pub registry: Arc<StrategyRegistry>,
}

impl Strategy for OptionalStrategy {
    fn hydrate(&self, raw: &Value) -> Result<TypedValue, BindError> {
        if raw.is_null() {
            return Ok(TypedValue::None);
        }
        self.registry.get_strategy_for(&self.inner)?.hydrate(raw)
    }

    fn extract(&self, typed: &TypedValue) -> Result<Value, BindError> {
        if matches!(typed, TypedValue::None) {
            return Ok(Value::Null);
        }
        self.registry.get_strategy_for(&self.inner)?.extract(typed)
    }
}

/// Typed-side container items, for the strategies that walk element-wise.
fn typed_items<'a>(typed: &'a TypedValue, expected: &str) -> Result<&'a [TypedValue], BindError> {
    match typed {
        TypedValue::Tuple(items) | TypedValue::Sequence(items) | TypedValue::Set(items) => {
            Ok(items)
        }
        other => Err(BindError::conversion(expected, other.kind_name())),
    }
}

fn raw_items<'a>(raw: &'a Value, expected: &str) -> Result<&'a [Value], BindError> {
    raw.as_array()
        .map(Vec::as_slice)
        .ok_or_else(|| BindError::conversion(expected, raw_repr(raw)))
}

pub(super) struct TupleStrategy {
    pub elements: Vec<TypeAnnotation>,
    pub registry: Arc<StrategyRegistry>,
}

impl Strategy for TupleStrategy {
    fn hydrate(&self, raw: &Value) -> Result<TypedValue, BindError> {
        let items = raw_items(raw, "tuple")?;
        let mut out = Vec::with_capacity(self.elements.len());
        // Positional pairing: excess raw elements are ignored, a missing one
        // fails when its position is reached.
        for (position, annotation) in self.elements.iter().enumerate() {
            let item = items.get(position).ok_or_else(|| {
                BindError::conversion(
                    format!("tuple with at least {} elements", position + 1),
                    format!("sequence of length {}", items.len()),
                )
            })?;
            out.push(self.registry.get_strategy_for(annotation)?.hydrate(item)?);
        }
        Ok(TypedValue::Tuple(out))
    }

    fn extract(&self, typed: &TypedValue) -> Result<Value, BindError> {
        let items = typed_items(typed, "tuple")?;
        let mut out = Vec::with_capacity(self.elements.len());
        for (position, annotation) in self.elements.iter().enumerate() {
            let item = items.get(position).ok_or_else(|| {
                BindError::conversion(
                    format!("tuple with at least {} elements", position + 1),
                    format!("tuple of length {}", items.len()),
                )
            })?;
            out.push(self.registry.get_strategy_for(annotation)?.extract(item)?);
        }
        Ok(Value::Array(out))
    }
}

pub(super) struct VariadicTupleStrategy {
    pub element: TypeAnnotation,
    pub registry: Arc<StrategyRegistry>,
}

impl Strategy for VariadicTupleStrategy {
    fn hydrate(&self, raw: &Value) -> Result<TypedValue, BindError> {
        let strategy = self.registry.get_strategy_for(&self.element)?;
        let items = raw_items(raw, "variadic tuple")?
            .iter()
            .map(|item| strategy.hydrate(item))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(TypedValue::Tuple(items))
    }

    fn extract(&self, typed: &TypedValue) -> Result<Value, BindError> {
        let strategy = self.registry.get_strategy_for(&self.element)?;
        let items = typed_items(typed, "variadic tuple")?
            .iter()
            .map(|item| strategy.extract(item))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Value::Array(items))
    }
}

pub(super) struct SequenceStrategy {
    pub element: TypeAnnotation,
    pub registry: Arc<StrategyRegistry>,
}

impl Strategy for SequenceStrategy {
    fn hydrate(&self, raw: &Value) -> Result<TypedValue, BindError> {
        let strategy = self.registry.get_strategy_for(&self.element)?;
        let items = raw_items(raw, "sequence")?
            .iter()
            .map(|item| strategy.hydrate(item))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(TypedValue::Sequence(items))
    }

    fn extract(&self, typed: &TypedValue) -> Result<Value, BindError> {
        let strategy = self.registry.get_strategy_for(&self.element)?;
        let items = typed_items(typed, "sequence")?
            .iter()
            .map(|item| strategy.extract(item))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Value::Array(items))
    }
}

pub(super) struct SetStrategy {
    pub element: TypeAnnotation,
    pub registry: Arc<StrategyRegistry>,
}

impl Strategy for SetStrategy {
    fn hydrate(&self, raw: &Value) -> Result<TypedValue, BindError> {
        let strategy = self.registry.get_strategy_for(&self.element)?;
        let mut items: Vec<TypedValue> = Vec::new();
        for item in raw_items(raw, "set")? {
            let hydrated = strategy.hydrate(item)?;
            if !items.contains(&hydrated) {
                items.push(hydrated);
            }
        }
        Ok(TypedValue::Set(items))
    }

    fn extract(&self, typed: &TypedValue) -> Result<Value, BindError> {
        // Always a plain ordered sequence on the way out.
        let strategy = self.registry.get_strategy_for(&self.element)?;
        let items = typed_items(typed, "set")?
            .iter()
            .map(|item| strategy.extract(item))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Value::Array(items))
    }
}

pub(super) struct MappingStrategy {
    pub key: TypeAnnotation,
    pub value: TypeAnnotation,
    pub ordered: bool,
    pub registry: Arc<StrategyRegistry>,
}

impl Strategy for MappingStrategy {
    fn hydrate(&self, raw: &Value) -> Result<TypedValue, BindError> {
        let expected = if self.ordered { "ordered mapping" } else { "mapping" };
        let map = raw
            .as_object()
            .ok_or_else(|| BindError::conversion(expected, raw_repr(raw)))?;
        let key_strategy = self.registry.get_strategy_for(&self.key)?;
        let value_strategy = self.registry.get_strategy_for(&self.value)?;
        let mut pairs = Vec::with_capacity(map.len());
        for (key, value) in map {
            pairs.push((
                key_strategy.hydrate(&Value::String(key.clone()))?,
                value_strategy.hydrate(value)?,
            ));
        }
        Ok(TypedValue::Mapping(pairs))
    }

    fn extract(&self, typed: &TypedValue) -> Result<Value, BindError> {
        let expected = if self.ordered { "ordered mapping" } else { "mapping" };
        let pairs = match typed {
            TypedValue::Mapping(pairs) => pairs,
            other => return Err(BindError::conversion(expected, other.kind_name())),
        };
        let key_strategy = self.registry.get_strategy_for(&self.key)?;
        let value_strategy = self.registry.get_strategy_for(&self.value)?;
        let mut map = serde_json::Map::new();
        for (key, value) in pairs {
            let key = match key_strategy.extract(key)? {
                Value::String(s) => s,
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                other => return Err(BindError::conversion("object key", raw_repr(&other))),
            };
            map.insert(key, value_strategy.extract(value)?);
        }
        Ok(Value::Object(map))
    }
}

pub(super) struct EnumStrategy {
    pub members: Vec<EnumMember>,
}

impl EnumStrategy {
    fn matching(&self, raw: &Value) -> Option<TypedValue> {
        match raw {
            Value::String(s) => self
                .members
                .iter()
                .any(|m| matches!(m, EnumMember::Str(v) if v == s))
                .then(|| TypedValue::Str(s.clone())),
            Value::Number(n) => {
                let i = n.as_i64()?;
                self.members
                    .iter()
                    .any(|m| matches!(m, EnumMember::Int(v) if *v == i))
                    .then_some(TypedValue::Int(i))
            }
            _ => None,
        }
    }
}

impl Strategy for EnumStrategy {
    fn hydrate(&self, raw: &Value) -> Result<TypedValue, BindError> {
        self.matching(raw)
            .ok_or_else(|| BindError::conversion("one of the enum members", raw_repr(raw)))
    }

    fn extract(&self, typed: &TypedValue) -> Result<Value, BindError> {
        let raw = typed.to_raw();
        self.matching(&raw)
            .map(|member| member.to_raw())
            .ok_or_else(|| BindError::conversion("one of the enum members", raw_repr(&raw)))
    }
}

pub(super) struct RecordStrategy {
    pub shape: RecordShape,
    pub registry: Arc<StrategyRegistry>,
}

impl Strategy for RecordStrategy {
    fn hydrate(&self, raw: &Value) -> Result<TypedValue, BindError> {
        let map = raw
            .as_object()
            .ok_or_else(|| BindError::conversion(format!("record {}", self.shape.name), raw_repr(raw)))?;
        let mut record = RecordValue::new(&self.shape.name);
        if self.shape.strict {
            // Declared fields only, hydrated by name; unknown raw keys are
            // silently dropped.
            for field in &self.shape.fields {
                match map.get(&field.name) {
                    Some(value) => {
                        let strategy = self.registry.get_strategy_for(&field.annotation)?;
                        record.set(&field.name, strategy.hydrate(value)?);
                    }
                    None if field.has_default => {}
                    None => return Err(BindError::RequiredPropertyMissing(field.name.clone())),
                }
            }
        } else {
            // No field validation: every raw key is assigned verbatim, even
            // keys the record never declared.
            for (key, value) in map {
                record.set(key, TypedValue::from_raw(value));
            }
        }
        if let Some(post_init) = self.shape.post_init {
            post_init(&mut record);
        }
        Ok(TypedValue::Record(record))
    }

    fn extract(&self, typed: &TypedValue) -> Result<Value, BindError> {
        let record = match typed {
            TypedValue::Record(record) => record,
            other => {
                return Err(BindError::conversion(
                    format!("record {}", self.shape.name),
                    other.kind_name(),
                ))
            }
        };
        let mut map = serde_json::Map::new();
        for (name, value) in record.fields() {
            let extracted = match self.shape.field(name) {
                Some(field) => self.registry.get_strategy_for(&field.annotation)?.extract(value)?,
                // Undeclared fields (non-strict hydration residue) project
                // structurally.
                None => value.to_raw(),
            };
            map.insert(name.clone(), extracted);
        }
        Ok(Value::Object(map))
    }
}
