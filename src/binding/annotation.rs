//! Target type descriptions and the descriptor resolver.
//!
//! Rust has no runtime inspection of generic parameters, so the caller
//! supplies its declared binding type as an explicit [`TypeAnnotation`] value
//! (typically built once per route and reused). [`resolve`] normalizes an
//! annotation into a [`TypeDescriptor`]: one of a closed set of shape
//! categories over which strategy selection is a total match. Resolution
//! unwraps exactly one level; nested annotations are resolved lazily when the
//! registry first looks up their strategies.

use super::value::PostInit;

/// Caller-supplied description of a binding target type.
///
/// Equality and hashing are structural, which is what keys the strategy
/// cache: two routes declaring `Sequence(Int)` share one strategy instance.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeAnnotation {
    Str,
    Int,
    Float,
    Bool,
    Date,
    Time,
    DateTime,
    Duration,
    /// `Option<X>`: null and absence pass through on both directions.
    Optional(Box<TypeAnnotation>),
    /// Fixed tuple `(X, Y, Z)`: positional element types.
    Tuple(Vec<TypeAnnotation>),
    /// Variadic tuple `(X, ...)`: one element type repeated indefinitely.
    VariadicTuple(Box<TypeAnnotation>),
    /// Unordered mapping from key type to value type.
    Mapping(Box<TypeAnnotation>, Box<TypeAnnotation>),
    /// Mapping preserving input order through hydration.
    OrderedMapping(Box<TypeAnnotation>, Box<TypeAnnotation>),
    Sequence(Box<TypeAnnotation>),
    Set(Box<TypeAnnotation>),
    /// Closed set of allowed literal members.
    Enum(Vec<EnumMember>),
    Record(RecordShape),
    /// An annotation the resolver cannot categorize; rejected by the registry
    /// with an error naming it.
    Unknown(String),
}

impl TypeAnnotation {
    pub fn optional(inner: TypeAnnotation) -> Self {
        TypeAnnotation::Optional(Box::new(inner))
    }

    pub fn sequence(element: TypeAnnotation) -> Self {
        TypeAnnotation::Sequence(Box::new(element))
    }

    pub fn set(element: TypeAnnotation) -> Self {
        TypeAnnotation::Set(Box::new(element))
    }

    pub fn variadic_tuple(element: TypeAnnotation) -> Self {
        TypeAnnotation::VariadicTuple(Box::new(element))
    }

    pub fn mapping(key: TypeAnnotation, value: TypeAnnotation) -> Self {
        TypeAnnotation::Mapping(Box::new(key), Box::new(value))
    }

    pub fn ordered_mapping(key: TypeAnnotation, value: TypeAnnotation) -> Self {
        TypeAnnotation::OrderedMapping(Box::new(key), Box::new(value))
    }
}

impl std::fmt::Display for TypeAnnotation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TypeAnnotation::Str => write!(f, "string"),
            TypeAnnotation::Int => write!(f, "integer"),
            TypeAnnotation::Float => write!(f, "float"),
            TypeAnnotation::Bool => write!(f, "boolean"),
            TypeAnnotation::Date => write!(f, "date"),
            TypeAnnotation::Time => write!(f, "time"),
            TypeAnnotation::DateTime => write!(f, "date-time"),
            TypeAnnotation::Duration => write!(f, "duration"),
            TypeAnnotation::Optional(inner) => write!(f, "optional<{inner}>"),
            TypeAnnotation::Tuple(elements) => {
                write!(f, "tuple<")?;
                for (i, e) in elements.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{e}")?;
                }
                write!(f, ">")
            }
            TypeAnnotation::VariadicTuple(element) => write!(f, "tuple<{element}, ...>"),
            TypeAnnotation::Mapping(k, v) => write!(f, "mapping<{k}, {v}>"),
            TypeAnnotation::OrderedMapping(k, v) => write!(f, "ordered_mapping<{k}, {v}>"),
            TypeAnnotation::Sequence(e) => write!(f, "sequence<{e}>"),
            TypeAnnotation::Set(e) => write!(f, "set<{e}>"),
            TypeAnnotation::Enum(_) => write!(f, "enum"),
            TypeAnnotation::Record(shape) => write!(f, "record {}", shape.name),
            TypeAnnotation::Unknown(name) => write!(f, "{name}"),
        }
    }
}

/// An allowed literal member of an enum annotation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EnumMember {
    Str(String),
    Int(i64),
}

/// Shape of a record type: named fields in declaration order, strictness and
/// an optional post-construction hook.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RecordShape {
    pub name: String,
    pub fields: Vec<FieldShape>,
    /// Strict: declared fields hydrated by name, unknown keys dropped,
    /// missing required fields fail. Non-strict: raw keys assigned verbatim
    /// with no field validation.
    pub strict: bool,
    /// Invoked exactly once after all field assignments complete.
    pub post_init: Option<PostInit>,
}

impl RecordShape {
    pub fn field(&self, name: &str) -> Option<&FieldShape> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// One declared record field.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldShape {
    pub name: String,
    pub annotation: TypeAnnotation,
    /// Fields with a default may be absent from the raw mapping; the default
    /// itself belongs to the caller's constructor, the engine only knows the
    /// flag and omits the field from the built record.
    pub has_default: bool,
}

/// Primitive kinds a [`TypeDescriptor::Scalar`] can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    Str,
    Int,
    Float,
    Bool,
    Date,
    Time,
    DateTime,
    Duration,
}

impl ScalarKind {
    pub fn name(&self) -> &'static str {
        match self {
            ScalarKind::Str => "string",
            ScalarKind::Int => "integer",
            ScalarKind::Float => "float",
            ScalarKind::Bool => "boolean",
            ScalarKind::Date => "date",
            ScalarKind::Time => "time",
            ScalarKind::DateTime => "date-time",
            ScalarKind::Duration => "duration",
        }
    }
}

/// A resolved shape category. Immutable once produced; child positions hold
/// annotations, not descriptors, so nesting resolves lazily.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeDescriptor {
    Scalar(ScalarKind),
    Optional(TypeAnnotation),
    Tuple(Vec<TypeAnnotation>),
    VariadicTuple(TypeAnnotation),
    Mapping {
        key: TypeAnnotation,
        value: TypeAnnotation,
        ordered: bool,
    },
    Sequence(TypeAnnotation),
    Set(TypeAnnotation),
    Enum(Vec<EnumMember>),
    Record(RecordShape),
    Unknown(String),
}

/// Normalize an annotation into its shape category.
///
/// Pure and deterministic: the same annotation always resolves to the same
/// descriptor, with no side effects. Unwraps one generic level only.
pub fn resolve(annotation: &TypeAnnotation) -> TypeDescriptor {
    match annotation {
        TypeAnnotation::Str => TypeDescriptor::Scalar(ScalarKind::Str),
        TypeAnnotation::Int => TypeDescriptor::Scalar(ScalarKind::Int),
        TypeAnnotation::Float => TypeDescriptor::Scalar(ScalarKind::Float),
        TypeAnnotation::Bool => TypeDescriptor::Scalar(ScalarKind::Bool),
        TypeAnnotation::Date => TypeDescriptor::Scalar(ScalarKind::Date),
        TypeAnnotation::Time => TypeDescriptor::Scalar(ScalarKind::Time),
        TypeAnnotation::DateTime => TypeDescriptor::Scalar(ScalarKind::DateTime),
        TypeAnnotation::Duration => TypeDescriptor::Scalar(ScalarKind::Duration),
        TypeAnnotation::Optional(inner) => TypeDescriptor::Optional((**inner).clone()),
        TypeAnnotation::Tuple(elements) => TypeDescriptor::Tuple(elements.clone()),
        TypeAnnotation::VariadicTuple(element) => {
            TypeDescriptor::VariadicTuple((**element).clone())
        }
        TypeAnnotation::Mapping(key, value) => TypeDescriptor::Mapping {
            key: (**key).clone(),
            value: (**value).clone(),
            ordered: false,
        },
        TypeAnnotation::OrderedMapping(key, value) => TypeDescriptor::Mapping {
            key: (**key).clone(),
            value: (**value).clone(),
            ordered: true,
        },
        TypeAnnotation::Sequence(element) => TypeDescriptor::Sequence((**element).clone()),
        TypeAnnotation::Set(element) => TypeDescriptor::Set((**element).clone()),
        TypeAnnotation::Enum(members) => TypeDescriptor::Enum(members.clone()),
        TypeAnnotation::Record(shape) => TypeDescriptor::Record(shape.clone()),
        TypeAnnotation::Unknown(name) => TypeDescriptor::Unknown(name.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_is_deterministic() {
        let annotation = TypeAnnotation::sequence(TypeAnnotation::optional(TypeAnnotation::Int));
        assert_eq!(resolve(&annotation), resolve(&annotation));
        assert_eq!(
            resolve(&annotation),
            TypeDescriptor::Sequence(TypeAnnotation::optional(TypeAnnotation::Int))
        );
    }

    #[test]
    fn test_resolve_unwraps_one_level() {
        let nested = TypeAnnotation::mapping(
            TypeAnnotation::Str,
            TypeAnnotation::sequence(TypeAnnotation::Int),
        );
        // The value side stays an annotation; its descriptor is produced on
        // first strategy lookup, not here.
        match resolve(&nested) {
            TypeDescriptor::Mapping { value, ordered, .. } => {
                assert!(!ordered);
                assert_eq!(value, TypeAnnotation::sequence(TypeAnnotation::Int));
            }
            other => panic!("expected mapping descriptor, got {other:?}"),
        }
    }

    #[test]
    fn test_annotation_display() {
        assert_eq!(
            TypeAnnotation::variadic_tuple(TypeAnnotation::Str).to_string(),
            "tuple<string, ...>"
        );
        assert_eq!(
            TypeAnnotation::Tuple(vec![TypeAnnotation::Str, TypeAnnotation::Int]).to_string(),
            "tuple<string, integer>"
        );
        assert_eq!(
            TypeAnnotation::Unknown("RawSocket".into()).to_string(),
            "RawSocket"
        );
    }
}
