//! Schema validation helpers.
//!
//! Checks an attribute bag (`serde_json::Value`) against a [`Schema`] before
//! anything is sent to Foreman.
//!
//! # Example
//!
//! ```
//! use foreman_provider::schema::{Schema, Attribute};
//! use foreman_provider::validation::validate;
//! use serde_json::json;
//!
//! let schema = Schema::v0()
//!     .with_attribute("match", Attribute::required_string())
//!     .with_attribute("omit", Attribute::optional_bool());
//!
//! let diagnostics = validate(&schema, &json!({"match": "os=RedHat", "omit": "yes"}));
//! assert_eq!(diagnostics.len(), 1);
//! assert_eq!(diagnostics[0].attribute, Some("omit".to_string()));
//! ```

use crate::schema::{Attribute, AttributeType, Block, Diagnostic, NestedBlock, Schema};
use serde_json::Value;

/// Validate a JSON value against a schema.
///
/// Returns a list of diagnostics for any validation errors found.
/// An empty list means the value is valid.
///
/// # Validation Rules
///
/// - Required attributes must be present and non-null
/// - Optional attributes may be absent or null
/// - Computed attributes are skipped (the provider sets these)
/// - Attribute types must match the schema
/// - Nested list blocks are validated per item with min/max item constraints
pub fn validate(schema: &Schema, value: &Value) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    validate_block(&schema.block, value, "", &mut diagnostics);
    diagnostics
}

/// Validate a JSON value against a schema, returning Ok if valid or Err with diagnostics.
pub fn validate_result(schema: &Schema, value: &Value) -> Result<(), Vec<Diagnostic>> {
    let diagnostics = validate(schema, value);
    if diagnostics.is_empty() {
        Ok(())
    } else {
        Err(diagnostics)
    }
}

/// Check if a JSON value is valid against a schema.
pub fn is_valid(schema: &Schema, value: &Value) -> bool {
    validate(schema, value).is_empty()
}

fn validate_block(block: &Block, value: &Value, path: &str, diagnostics: &mut Vec<Diagnostic>) {
    let obj = match value {
        Value::Object(map) => map,
        Value::Null => return,
        _ => {
            let mut diag =
                Diagnostic::error("Expected object").with_detail(format!("Got {}", value_type_name(value)));
            if !path.is_empty() {
                diag = diag.with_attribute(path);
            }
            diagnostics.push(diag);
            return;
        },
    };

    for (name, attr) in &block.attributes {
        let attr_path = join_path(path, name);
        validate_attribute(attr, obj.get(name), &attr_path, diagnostics);
    }

    for (name, nested) in &block.blocks {
        let block_path = join_path(path, name);
        validate_list_block(nested, obj.get(name), &block_path, diagnostics);
    }
}

fn validate_attribute(
    attr: &Attribute,
    value: Option<&Value>,
    path: &str,
    diagnostics: &mut Vec<Diagnostic>,
) {
    // Computed-only attributes belong to the provider.
    if attr.flags.computed && !attr.flags.optional && !attr.flags.required {
        return;
    }

    match value {
        None | Some(Value::Null) => {
            if attr.flags.required {
                diagnostics.push(
                    Diagnostic::error(format!("Missing required attribute '{}'", path))
                        .with_detail("This attribute is required and must be provided")
                        .with_attribute(path),
                );
            }
        },
        Some(v) => validate_attribute_type(&attr.attr_type, v, path, diagnostics),
    }
}

fn validate_attribute_type(
    attr_type: &AttributeType,
    value: &Value,
    path: &str,
    diagnostics: &mut Vec<Diagnostic>,
) {
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
        AttributeType::List(element_type) => {
            if let Some(arr) = value.as_array() {
                for (i, elem) in arr.iter().enumerate() {
                    let elem_path = format!("{}.{}", path, i);
                    validate_attribute_type(element_type, elem, &elem_path, diagnostics);
                }
            } else {
                diagnostics.push(type_error(path, "list", value));
            }
        },
    }
}

fn validate_list_block(
    nested: &NestedBlock,
    value: Option<&Value>,
    path: &str,
    diagnostics: &mut Vec<Diagnostic>,
) {
    match value {
        None | Some(Value::Null) => {
            if nested.min_items > 0 {
                diagnostics.push(
                    Diagnostic::error(format!(
                        "Block '{}' requires at least {} item(s)",
                        path, nested.min_items
                    ))
                    .with_attribute(path),
                );
            }
        },
        Some(Value::Array(arr)) => {
            let len = arr.len() as u32;

            if len < nested.min_items {
                diagnostics.push(
                    Diagnostic::error(format!(
                        "Block '{}' requires at least {} item(s), got {}",
                        path, nested.min_items, len
                    ))
                    .with_attribute(path),
                );
            }

            // 0 means unlimited
            if nested.max_items > 0 && len > nested.max_items {
                diagnostics.push(
                    Diagnostic::error(format!(
                        "Block '{}' allows at most {} item(s), got {}",
                        path, nested.max_items, len
                    ))
                    .with_attribute(path),
                );
            }

            for (i, item) in arr.iter().enumerate() {
                let item_path = format!("{}.{}", path, i);
                validate_block(&nested.block, item, &item_path, diagnostics);
            }
        },
        Some(v) => {
            diagnostics.push(
                Diagnostic::error(format!("Expected list for block '{}'", path))
                    .with_detail(format!("Got {}", value_type_name(v)))
                    .with_attribute(path),
            );
        },
    }
}

fn join_path(base: &str, name: &str) -> String {
    if base.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", base, name)
    }
}

fn value_type_name(value: &Value) -> &'static str {
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
        Value::Number(n) => {
            if n.as_i64().is_some() {
                true
            } else if let Some(f) = n.as_f64() {
                f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64
            } else {
                false
            }
        },
        _ => false,
    }
}

fn type_error(path: &str, expected: &str, got: &Value) -> Diagnostic {
    Diagnostic::error(format!("Invalid type for attribute '{}'", path))
        .with_detail(format!("Expected {}, got {}", expected, value_type_name(got)))
        .with_attribute(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Attribute, Block, NestedBlock, Schema};
    use serde_json::json;

    #[test]
    fn test_validate_required_string() {
        let schema = Schema::v0().with_attribute("match", Attribute::required_string());

        assert!(validate(&schema, &json!({"match": "domain=example.com"})).is_empty());

        let diagnostics = validate(&schema, &json!({}));
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].attribute, Some("match".to_string()));

        let diagnostics = validate(&schema, &json!({"match": null}));
        assert_eq!(diagnostics.len(), 1);

        let diagnostics = validate(&schema, &json!({"match": 123}));
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].summary.contains("Invalid type"));
    }

    #[test]
    fn test_validate_optional_attribute() {
        let schema = Schema::v0().with_attribute("host_id", Attribute::optional_int64());

        assert!(validate(&schema, &json!({"host_id": 42})).is_empty());
        assert!(validate(&schema, &json!({})).is_empty());
        assert!(validate(&schema, &json!({"host_id": null})).is_empty());
        assert_eq!(validate(&schema, &json!({"host_id": "42"})).len(), 1);
    }

    #[test]
    fn test_validate_computed_attribute_skipped() {
        let schema = Schema::v0().with_attribute("id", Attribute::computed_string());

        assert!(validate(&schema, &json!({})).is_empty());
        assert!(validate(&schema, &json!({"id": 123})).is_empty());
    }

    #[test]
    fn test_validate_int64() {
        let schema = Schema::v0().with_attribute("count", Attribute::required_int64());

        assert!(validate(&schema, &json!({"count": 42})).is_empty());
        assert!(validate(&schema, &json!({"count": 42.0})).is_empty());
        assert_eq!(validate(&schema, &json!({"count": 42.5})).len(), 1);
    }

    #[test]
    fn test_validate_bool() {
        let schema = Schema::v0().with_attribute("omit", Attribute::optional_bool());

        assert!(validate(&schema, &json!({"omit": true})).is_empty());
        assert!(validate(&schema, &json!({"omit": false})).is_empty());
        assert_eq!(validate(&schema, &json!({"omit": "true"})).len(), 1);
    }

    #[test]
    fn test_validate_list() {
        let schema = Schema::v0().with_attribute(
            "tags",
            Attribute::new(
                AttributeType::list(AttributeType::String),
                crate::schema::AttributeFlags::optional(),
            ),
        );

        assert!(validate(&schema, &json!({"tags": ["a", "b"]})).is_empty());

        let diagnostics = validate(&schema, &json!({"tags": ["a", 2]}));
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].attribute, Some("tags.1".to_string()));
    }

    #[test]
    fn test_validate_nested_list_block() {
        let schema = Schema::v0().with_block(
            "override_values",
            NestedBlock::list(
                Block::new()
                    .with_attribute("match", Attribute::required_string())
                    .with_attribute("omit", Attribute::optional_bool()),
            )
            .with_max_items(2),
        );

        let ok = json!({"override_values": [{"match": "os=RedHat"}, {"match": "os=Debian", "omit": true}]});
        assert!(validate(&schema, &ok).is_empty());

        let missing = json!({"override_values": [{"omit": true}]});
        let diagnostics = validate(&schema, &missing);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(
            diagnostics[0].attribute,
            Some("override_values.0.match".to_string())
        );

        let too_many = json!({"override_values": [{"match": "a"}, {"match": "b"}, {"match": "c"}]});
        let diagnostics = validate(&schema, &too_many);
        assert!(diagnostics[0].summary.contains("at most 2"));

        let not_list = json!({"override_values": {"match": "a"}});
        assert_eq!(validate(&schema, &not_list).len(), 1);
    }

    #[test]
    fn test_validate_min_items() {
        let schema = Schema::v0().with_block(
            "override_values",
            NestedBlock::list(Block::new()).with_min_items(1),
        );

        let diagnostics = validate(&schema, &json!({}));
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].summary.contains("at least 1"));
    }

    #[test]
    fn test_result_helpers() {
        let schema = Schema::v0().with_attribute("value", Attribute::required_string());

        assert!(is_valid(&schema, &json!({"value": "true"})));
        assert!(!is_valid(&schema, &json!({})));
        assert!(validate_result(&schema, &json!({"value": "x"})).is_ok());
        assert_eq!(validate_result(&schema, &json!({})).unwrap_err().len(), 1);
    }

    #[test]
    fn test_validate_root_not_object() {
        let schema = Schema::v0().with_attribute("value", Attribute::required_string());
        let diagnostics = validate(&schema, &json!("just a string"));
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].summary, "Expected object");
        assert!(diagnostics[0].attribute.is_none());
    }
}
