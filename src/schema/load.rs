//! Schema document loading.
//!
//! Documents load from YAML or JSON by file extension and are parsed into a
//! [`SchemaNode`] tree once; the validator only ever sees the parsed tree.

use super::types::{SchemaNode, StringFormat};
use anyhow::{bail, Context};
use serde_json::Value;
use tracing::{info, warn};

/// Load a schema document from a `.yaml`/`.yml` or JSON file.
pub fn load_schema(file_path: &str) -> anyhow::Result<SchemaNode> {
    let content = std::fs::read_to_string(file_path)
        .with_context(|| format!("failed to read schema document `{file_path}`"))?;
    let value: Value = if file_path.ends_with(".yaml") || file_path.ends_with(".yml") {
        serde_yaml::from_str(&content)?
    } else {
        serde_json::from_str(&content)?
    };
    let schema = from_value(&value)
        .with_context(|| format!("invalid schema document `{file_path}`"))?;
    info!(file_path = file_path, "schema document loaded");
    Ok(schema)
}

/// Parse an already-decoded schema document into a [`SchemaNode`] tree.
///
/// Declaration order of `properties` and `required` is preserved, which is
/// what fixes validation traversal order.
pub fn from_value(value: &Value) -> anyhow::Result<SchemaNode> {
    let obj = match value.as_object() {
        Some(obj) => obj,
        None => bail!("schema node must be an object, got {value}"),
    };

    // `enum` and `anyOf` take precedence over any `type` keyword.
    if let Some(allowed) = obj.get("enum") {
        let allowed = allowed
            .as_array()
            .context("`enum` must be an array of literals")?;
        return Ok(SchemaNode::Enum {
            allowed: allowed.clone(),
        });
    }
    if let Some(alternatives) = obj.get("anyOf") {
        let alternatives = alternatives
            .as_array()
            .context("`anyOf` must be an array of schemas")?
            .iter()
            .map(from_value)
            .collect::<anyhow::Result<Vec<_>>>()?;
        return Ok(SchemaNode::AnyOf { alternatives });
    }

    let type_keyword = obj.get("type").and_then(|t| t.as_str());
    match type_keyword {
        Some("object") => parse_object(obj),
        // A bare node with `properties` is an object schema in practice.
        None if obj.contains_key("properties") || obj.contains_key("required") => {
            parse_object(obj)
        }
        Some("array") => {
            let items = match obj.get("items") {
                Some(items) => Some(Box::new(from_value(items)?)),
                None => None,
            };
            Ok(SchemaNode::Array {
                items,
                min_items: usize_keyword(obj, "minItems"),
                max_items: usize_keyword(obj, "maxItems"),
            })
        }
        Some("string") => Ok(SchemaNode::String {
            format: obj.get("format").and_then(|f| f.as_str()).and_then(|keyword| {
                let format = StringFormat::from_keyword(keyword);
                if format.is_none() {
                    warn!(format = keyword, "unchecked string format, values pass as-is");
                }
                format
            }),
            min_length: usize_keyword(obj, "minLength"),
            max_length: usize_keyword(obj, "maxLength"),
        }),
        Some("number") => Ok(SchemaNode::Number {
            minimum: obj.get("minimum").and_then(|v| v.as_f64()),
            maximum: obj.get("maximum").and_then(|v| v.as_f64()),
        }),
        Some("integer") => Ok(SchemaNode::Integer {
            minimum: obj.get("minimum").and_then(|v| v.as_i64()),
            maximum: obj.get("maximum").and_then(|v| v.as_i64()),
        }),
        Some("boolean") => Ok(SchemaNode::Boolean),
        Some(other) => bail!("unsupported schema type `{other}`"),
        None => bail!("schema node has no `type`, `enum`, `anyOf` or `properties`"),
    }
}

fn parse_object(obj: &serde_json::Map<String, Value>) -> anyhow::Result<SchemaNode> {
    let required = match obj.get("required") {
        Some(required) => required
            .as_array()
            .context("`required` must be an array of property names")?
            .iter()
            .map(|name| {
                name.as_str()
                    .map(str::to_string)
                    .with_context(|| format!("non-string entry in `required`: {name}"))
            })
            .collect::<anyhow::Result<Vec<_>>>()?,
        None => Vec::new(),
    };
    let properties = match obj.get("properties") {
        Some(properties) => properties
            .as_object()
            .context("`properties` must be an object")?
            .iter()
            .map(|(name, child)| {
                from_value(child)
                    .with_context(|| format!("invalid schema for property `{name}`"))
                    .map(|schema| (name.clone(), schema))
            })
            .collect::<anyhow::Result<Vec<_>>>()?,
        None => Vec::new(),
    };
    Ok(SchemaNode::Object {
        required,
        properties,
    })
}

fn usize_keyword(obj: &serde_json::Map<String, Value>, key: &str) -> Option<usize> {
    obj.get(key).and_then(|v| v.as_u64()).map(|v| v as usize)
}
