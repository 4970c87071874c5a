//! # bindery
//!
//! **bindery** is a typed payload binding and schema validation engine: it
//! hydrates untyped, dynamically-shaped transport data (decoded JSON objects,
//! form fields, query strings) into statically-shaped domain values, extracts
//! typed values back into plain transport-shaped data, and validates payloads
//! against an externally supplied schema with precise, path-addressed errors.
//!
//! ## Architecture
//!
//! The engine is organized leaf-first:
//!
//! - **[`temporal`]** - hand-written ISO-8601 grammar: dates, times,
//!   datetimes and signed durations, with canonical re-formatting
//! - **[`binding`]** - the hydration/extraction pipeline: type annotations,
//!   the descriptor resolver, the memoizing strategy registry and one
//!   conversion strategy per shape category
//! - **[`schema`]** - schema document loading and the fail-fast validator
//! - **[`error`]** - the error taxonomy shared by all of the above
//!
//! Control flow for hydration: the caller's [`TypeAnnotation`] is resolved to
//! a [`TypeDescriptor`], the [`StrategyRegistry`] returns (building and
//! caching on first use) the matching [`Strategy`], and the strategy
//! recursively hydrates nested fields through the registry. Validation is an
//! independent walk of a [`SchemaNode`] tree in lock-step with the value
//! tree, consulting the temporal codec for format checks.
//!
//! The engine performs no I/O of its own (schema loading is the one
//! file-reading convenience, and it sits at the edge), never suspends, and
//! never retries: every failure is a deterministic function of the input. The
//! only shared mutable state is the registry's strategy cache, which
//! publishes at most one strategy instance per annotation under concurrent
//! lookups.
//!
//! ## Quick start
//!
//! ```
//! use bindery::{hydrate, extract, schema, validate, TypeAnnotation};
//! use serde_json::json;
//!
//! // Binding: raw tree -> typed value -> raw tree.
//! let annotation = TypeAnnotation::sequence(TypeAnnotation::Int);
//! let typed = hydrate(&json!([1, 2, 3]), &annotation)?;
//! assert_eq!(extract(&typed, &annotation)?, json!([1, 2, 3]));
//!
//! // Validation: value tree against a schema tree, first violation wins.
//! let schema = schema::from_value(&json!({
//!     "type": "object",
//!     "required": ["when"],
//!     "properties": {"when": {"type": "string", "format": "date"}}
//! }))?;
//! validate(&json!({"when": "2020-12-10"}), &schema)?;
//! assert!(validate(&json!({"when": "tomorrow"}), &schema).is_err());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod binding;
pub mod error;
pub mod schema;
pub mod temporal;

pub use binding::{
    extract, get_strategy_for, hydrate, EnumMember, FieldShape, RecordShape, RecordValue,
    ScalarKind, Strategy, StrategyRegistry, TypeAnnotation, TypeDescriptor, TypedValue,
};
pub use error::{BindError, Path, PathSegment, TemporalError, ValidationError, ValidationErrorKind};
pub use schema::{load_schema, validate, SchemaNode, StringFormat};
