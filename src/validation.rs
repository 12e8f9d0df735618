//! Structural validation of configuration against a [`Schema`].
//!
//! This catches shape problems (missing required attributes, wrong JSON
//! types, block counts) before a resource model is decoded. Semantic rules
//! such as "exactly one schedule kind" live with the models.
//!
//! # Example
//!
//! ```
//! use sentry_provider::schema::{Attribute, Schema};
//! use sentry_provider::validation::validate;
//! use serde_json::json;
//!
//! let schema = Schema::v0()
//!     .with_attribute("name", Attribute::required_string())
//!     .with_attribute("max_runtime", Attribute::optional_int64());
//!
//! assert!(validate(&schema, &json!({"name": "nightly", "max_runtime": 30})).is_empty());
//!
//! let diagnostics = validate(&schema, &json!({"name": "nightly", "max_runtime": "30"}));
//! assert_eq!(diagnostics.len(), 1);
//! assert_eq!(diagnostics[0].attribute.as_deref(), Some("max_runtime"));
//! ```

use crate::schema::{
    join_path, Attribute, AttributeType, Block, BlockNestingMode, Diagnostic, NestedBlock, Schema,
};
use serde_json::Value;
use std::collections::BTreeMap;

/// Structural check of `value` against `schema`.
///
/// Every problem found becomes one error diagnostic with an attribute path;
/// no diagnostics means the value fits.
///
/// - required attributes are present and not null
/// - computed-only attributes are skipped
/// - values match their attribute type
/// - nested blocks recurse and respect their item bounds
pub fn validate(schema: &Schema, value: &Value) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    validate_block(&schema.block, value, "", &mut diagnostics);
    diagnostics
}

fn validate_block(
    block: &Block,
    value: &Value,
    path: &str,
    diagnostics: &mut Vec<Diagnostic>,
) {
    let obj = match value {
        Value::Object(map) => map,
        Value::Null => return,
        _ => {
            let mut diag = Diagnostic::error("Expected object")
                .with_detail(format!("Got {}", type_name(value)));
            if !path.is_empty() {
                diag = diag.with_attribute(path);
            }
            diagnostics.push(diag);
            return;
        },
    };

    for (name, attr) in &block.attributes {
        validate_attribute(attr, obj.get(name), &join_path(path, name), diagnostics);
    }

    for (name, nested) in &block.blocks {
        validate_nested_block(nested, obj.get(name), &join_path(path, name), diagnostics);
    }
}

fn validate_attribute(
    attr: &Attribute,
    value: Option<&Value>,
    path: &str,
    diagnostics: &mut Vec<Diagnostic>,
) {
    if attr.flags.is_computed_only() {
        return;
    }

    match value {
        None | Some(Value::Null) => {
            if attr.flags.required {
                diagnostics.push(Diagnostic::attribute_error(
                    path,
                    format!("Missing required attribute '{}'", path),
                    "This attribute is required and must be provided",
                ));
            }
        },
        Some(v) => validate_type(&attr.attr_type, v, path, diagnostics),
    }
}

fn validate_type(
    attr_type: &AttributeType,
    value: &Value,
    path: &str,
    diagnostics: &mut Vec<Diagnostic>,
) {
    // Nulls inside collections and objects are allowed; presence is only
    // enforced for top-level attributes.
    if value.is_null() {
        return;
    }

    match attr_type {
        AttributeType::String => {
            if !value.is_string() {
                diagnostics.push(type_error(path, "string", value));
            }
        },
        AttributeType::Int64 => {
            if !is_int64(value) {
                diagnostics.push(type_error(path, "int64", value));
            }
        },
        AttributeType::Bool => {
            if !value.is_boolean() {
                diagnostics.push(type_error(path, "bool", value));
            }
        },
        AttributeType::List(element_type) => match value.as_array() {
            Some(items) => {
                for (i, item) in items.iter().enumerate() {
                    validate_type(element_type, item, &format!("{}.{}", path, i), diagnostics);
                }
            },
            None => diagnostics.push(type_error(path, "list", value)),
        },
        AttributeType::Object(attrs) => match value.as_object() {
            Some(obj) => validate_object(attrs, obj, path, diagnostics),
            None => diagnostics.push(type_error(path, "object", value)),
        },
    }
}

fn validate_object(
    attrs: &BTreeMap<String, AttributeType>,
    obj: &serde_json::Map<String, Value>,
    path: &str,
    diagnostics: &mut Vec<Diagnostic>,
) {
    for (name, attr_type) in attrs {
        if let Some(value) = obj.get(name) {
            validate_type(attr_type, value, &join_path(path, name), diagnostics);
        }
    }
}

fn validate_nested_block(
    nested: &NestedBlock,
    value: Option<&Value>,
    path: &str,
    diagnostics: &mut Vec<Diagnostic>,
) {
    let items: Vec<(String, &Value)> = match (nested.nesting_mode, value) {
        (_, None) | (_, Some(Value::Null)) => Vec::new(),
        (BlockNestingMode::Single, Some(v)) => vec![(path.to_string(), v)],
        (BlockNestingMode::List, Some(Value::Array(arr))) => arr
            .iter()
            .enumerate()
            .map(|(i, item)| (format!("{}.{}", path, i), item))
            .collect(),
        (BlockNestingMode::List, Some(v)) => {
            diagnostics.push(Diagnostic::attribute_error(
                path,
                format!("Expected list for block '{}'", path),
                format!("Got {}", type_name(v)),
            ));
            return;
        },
    };

    let len = items.len() as u32;
    if len < nested.min_items {
        let summary = match nested.nesting_mode {
            BlockNestingMode::Single => format!("Missing required block '{}'", path),
            BlockNestingMode::List => format!(
                "Block '{}' requires at least {} item(s), got {}",
                path, nested.min_items, len
            ),
        };
        diagnostics.push(Diagnostic::error(summary).with_attribute(path));
    }
    if nested.max_items > 0 && len > nested.max_items {
        diagnostics.push(
            Diagnostic::error(format!(
                "Block '{}' allows at most {} item(s), got {}",
                path, nested.max_items, len
            ))
            .with_attribute(path),
        );
    }

    for (item_path, item) in items {
        validate_block(&nested.block, item, &item_path, diagnostics);
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn is_int64(value: &Value) -> bool {
    match value {
        Value::Number(n) if n.is_i64() => true,
        Value::Number(n) => n
            .as_f64()
            .map(|f| f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64)
            .unwrap_or(false),
        _ => false,
    }
}

fn type_error(path: &str, expected: &str, got: &Value) -> Diagnostic {
    Diagnostic::attribute_error(
        path,
        format!("Invalid type for attribute '{}'", path),
        format!("Expected {}, got {}", expected, type_name(got)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Attribute, AttributeFlags, Block, NestedBlock, Schema};
    use serde_json::json;

    fn monitor_like_schema() -> Schema {
        Schema::v0()
            .with_attribute("id", Attribute::computed_string())
            .with_attribute("name", Attribute::required_string())
            .with_attribute("is_muted", Attribute::optional_computed_bool())
            .with_block(
                "config",
                NestedBlock::required_single(
                    Block::new()
                        .with_attribute("schedule_crontab", Attribute::optional_string())
                        .with_attribute("max_runtime", Attribute::optional_int64())
                        .with_block(
                            "schedule_interval",
                            NestedBlock::single(
                                Block::new().with_attribute("day", Attribute::optional_int64()),
                            ),
                        ),
                ),
            )
    }

    #[test]
    fn test_validate_valid_config() {
        let diagnostics = validate(
            &monitor_like_schema(),
            &json!({
                "name": "nightly",
                "config": {"schedule_crontab": "0 0 * * *", "max_runtime": 30}
            }),
        );
        assert!(diagnostics.is_empty(), "{:?}", diagnostics);
    }

    #[test]
    fn test_validate_required_attribute() {
        let diagnostics = validate(&monitor_like_schema(), &json!({"config": {}}));
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].attribute.as_deref(), Some("name"));

        let diagnostics = validate(&monitor_like_schema(), &json!({"name": null, "config": {}}));
        assert_eq!(diagnostics.len(), 1);
    }

    #[test]
    fn test_validate_computed_attribute_skipped() {
        let diagnostics = validate(
            &monitor_like_schema(),
            &json!({"id": 123, "name": "nightly", "config": {}}),
        );
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_validate_missing_required_block() {
        let diagnostics = validate(&monitor_like_schema(), &json!({"name": "nightly"}));
        assert_eq!(diagnostics.len(), 1);
        let summary = &diagnostics[0].summary;
        assert!(summary.contains("Missing required block 'config'"));
    }

    #[test]
    fn test_validate_nested_type_error_path() {
        let diagnostics = validate(
            &monitor_like_schema(),
            &json!({
                "name": "nightly",
                "config": {"schedule_interval": {"day": "one"}}
            }),
        );
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(
            diagnostics[0].attribute.as_deref(),
            Some("config.schedule_interval.day")
        );
    }

    #[test]
    fn test_validate_int64() {
        let schema = Schema::v0().with_attribute("margin", Attribute::optional_int64());

        assert!(validate(&schema, &json!({"margin": 5})).is_empty());
        assert!(validate(&schema, &json!({"margin": 5.0})).is_empty());
        assert_eq!(validate(&schema, &json!({"margin": 5.5})).len(), 1);
        assert_eq!(validate(&schema, &json!({"margin": "5"})).len(), 1);
    }

    #[test]
    fn test_validate_list_of_objects() {
        let schema = Schema::v0().with_attribute(
            "widget",
            Attribute::new(
                AttributeType::list(AttributeType::object([
                    ("title", AttributeType::String),
                    ("limit", AttributeType::Int64),
                ])),
                AttributeFlags::optional(),
            ),
        );

        let config = json!({"widget": [{"title": "a", "limit": null}]});
        assert!(validate(&schema, &config).is_empty());

        let diagnostics = validate(&schema, &json!({"widget": [{"title": "a"}, {"title": 1}]}));
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].attribute.as_deref(), Some("widget.1.title"));
    }

    #[test]
    fn test_validate_list_block_limits() {
        let schema = Schema::v0().with_block(
            "query",
            NestedBlock::list(Block::new().with_attribute("name", Attribute::required_string()))
                .with_min_items(1)
                .with_max_items(2),
        );

        assert!(validate(&schema, &json!({"query": [{"name": "a"}]})).is_empty());

        let diagnostics = validate(&schema, &json!({"query": []}));
        assert!(diagnostics[0].summary.contains("at least 1"));

        let diagnostics = validate(
            &schema,
            &json!({"query": [{"name": "a"}, {"name": "b"}, {"name": "c"}]}),
        );
        assert!(diagnostics[0].summary.contains("at most 2"));

        let diagnostics = validate(&schema, &json!({"query": {"name": "a"}}));
        assert!(diagnostics[0].summary.contains("Expected list"));
    }

    #[test]
    fn test_validate_root_not_object() {
        let diagnostics = validate(&monitor_like_schema(), &json!("not an object"));
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].summary.contains("Expected object"));
        assert!(diagnostics[0].attribute.is_none());
    }
}
