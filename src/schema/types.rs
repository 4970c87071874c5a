//! The schema tree model.

use serde::Serialize;
use serde_json::Value;

/// One node of an externally supplied validation schema tree.
///
/// Loaded once from a schema document (JSON Schema / OpenAPI component) and
/// treated as read-only from then on. Property and required-name order is the
/// document's declaration order, which fixes the validator's traversal order.
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaNode {
    Object {
        /// Field names that must be present, in declared order.
        required: Vec<String>,
        /// Property name to child schema, in declared order.
        properties: Vec<(String, SchemaNode)>,
    },
    Array {
        items: Option<Box<SchemaNode>>,
        min_items: Option<usize>,
        max_items: Option<usize>,
    },
    String {
        format: Option<StringFormat>,
        min_length: Option<usize>,
        max_length: Option<usize>,
    },
    Number {
        minimum: Option<f64>,
        maximum: Option<f64>,
    },
    Integer {
        minimum: Option<i64>,
        maximum: Option<i64>,
    },
    Boolean,
    Enum {
        /// Allowed literal values, compared for exact equality.
        allowed: Vec<Value>,
    },
    AnyOf {
        alternatives: Vec<SchemaNode>,
    },
}

impl SchemaNode {
    /// Short node name for diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            SchemaNode::Object { .. } => "object",
            SchemaNode::Array { .. } => "array",
            SchemaNode::String { .. } => "string",
            SchemaNode::Number { .. } => "number",
            SchemaNode::Integer { .. } => "integer",
            SchemaNode::Boolean => "boolean",
            SchemaNode::Enum { .. } => "enum",
            SchemaNode::AnyOf { .. } => "anyOf",
        }
    }

    pub fn property(&self, name: &str) -> Option<&SchemaNode> {
        match self {
            SchemaNode::Object { properties, .. } => {
                properties.iter().find(|(n, _)| n == name).map(|(_, s)| s)
            }
            _ => None,
        }
    }
}

/// String formats checked by delegating to the temporal codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum StringFormat {
    Date,
    DateTime,
    Time,
    Duration,
}

impl StringFormat {
    /// Maps a JSON Schema `format` keyword to a checked format. Formats the
    /// engine does not check (`email`, `uuid`, ...) map to `None` and pass.
    pub fn from_keyword(keyword: &str) -> Option<StringFormat> {
        match keyword {
            "date" => Some(StringFormat::Date),
            "date-time" => Some(StringFormat::DateTime),
            "time" => Some(StringFormat::Time),
            "duration" => Some(StringFormat::Duration),
            _ => None,
        }
    }
}
