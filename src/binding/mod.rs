//! Typed payload binding: hydration of raw value trees into typed domain
//! values and extraction back into plain transport-shaped data.
//!
//! The flow is descriptor-driven: a caller-supplied [`TypeAnnotation`] is
//! resolved to a [`TypeDescriptor`] shape category, the [`StrategyRegistry`]
//! returns (or builds and caches) the matching [`Strategy`], and the strategy
//! recursively hydrates nested fields through the registry.

mod annotation;
mod registry;
mod strategies;
mod value;

pub use annotation::{
    resolve, EnumMember, FieldShape, RecordShape, ScalarKind, TypeAnnotation, TypeDescriptor,
};
pub use registry::{default_registry, StrategyRegistry};
pub use strategies::Strategy;
pub use value::{PostInit, RecordValue, TypedValue};

use crate::error::BindError;
use serde_json::Value;
use std::sync::Arc;

/// Look up the strategy for an annotation in the process-wide registry.
///
/// # Errors
///
/// [`BindError::UnsupportedType`] if the annotation cannot be categorized.
pub fn get_strategy_for(annotation: &TypeAnnotation) -> Result<Arc<dyn Strategy>, BindError> {
    default_registry().get_strategy_for(annotation)
}

/// Hydrate a raw value tree into an instance of the annotated type.
///
/// ```
/// use bindery::{hydrate, TypeAnnotation, TypedValue};
/// use serde_json::json;
///
/// let annotation = TypeAnnotation::variadic_tuple(TypeAnnotation::Str);
/// let typed = hydrate(&json!(["a", 1, 2.1, true]), &annotation).unwrap();
/// assert_eq!(
///     typed,
///     TypedValue::Tuple(vec![
///         TypedValue::Str("a".into()),
///         TypedValue::Str("1".into()),
///         TypedValue::Str("2.1".into()),
///         TypedValue::Str("true".into()),
///     ])
/// );
/// ```
pub fn hydrate(raw: &Value, annotation: &TypeAnnotation) -> Result<TypedValue, BindError> {
    get_strategy_for(annotation)?.hydrate(raw)
}

/// Extract a typed value back into a plain raw value tree built only from
/// strings, numbers, booleans, null and ordered sequences/mappings.
pub fn extract(typed: &TypedValue, annotation: &TypeAnnotation) -> Result<Value, BindError> {
    get_strategy_for(annotation)?.extract(typed)
}
