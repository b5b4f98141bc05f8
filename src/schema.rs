//! Schema types for describing provider and resource structure.
//!
//! Schemas describe the shape of the provider configuration, the resources and
//! the data sources. They drive validation and plan diffs.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The type of an attribute value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeType {
    /// A string value.
    String,
    /// A 64-bit integer.
    Int64,
    /// A boolean value.
    Bool,
    /// A list of values of a single type.
    List(Box<AttributeType>),
}

impl AttributeType {
    /// Create a list type.
    pub fn list(element_type: AttributeType) -> Self {
        Self::List(Box::new(element_type))
    }
}

/// Describes how an attribute can be used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct AttributeFlags {
    /// The attribute is required in configuration.
    pub required: bool,
    /// The attribute is optional in configuration.
    pub optional: bool,
    /// The attribute is computed by the provider (read-only).
    pub computed: bool,
    /// The attribute is sensitive and should be hidden in logs/UI.
    pub sensitive: bool,
}

impl AttributeFlags {
    /// Create flags for a required attribute.
    pub fn required() -> Self {
        Self {
            required: true,
            ..Default::default()
        }
    }

    /// Create flags for an optional attribute.
    pub fn optional() -> Self {
        Self {
            optional: true,
            ..Default::default()
        }
    }

    /// Create flags for a computed attribute (read-only, set by provider).
    pub fn computed() -> Self {
        Self {
            computed: true,
            ..Default::default()
        }
    }

    /// Create flags for an optional+computed attribute (can be set, but Foreman fills it otherwise).
    pub fn optional_computed() -> Self {
        Self {
            optional: true,
            computed: true,
            ..Default::default()
        }
    }
}

/// Describes a single attribute in a schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attribute {
    /// The type of the attribute.
    #[serde(rename = "type")]
    pub attr_type: AttributeType,
    /// Flags describing how the attribute can be used.
    #[serde(flatten)]
    pub flags: AttributeFlags,
    /// Human-readable description of the attribute.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// If set, changing this attribute forces resource replacement.
    #[serde(default)]
    pub force_new: bool,
}

impl Attribute {
    /// Create a new attribute with the given type and flags.
    pub fn new(attr_type: AttributeType, flags: AttributeFlags) -> Self {
        Self {
            attr_type,
            flags,
            description: None,
            force_new: false,
        }
    }

    /// Create a required string attribute.
    pub fn required_string() -> Self {
        Self::new(AttributeType::String, AttributeFlags::required())
    }

    /// Create an optional string attribute.
    pub fn optional_string() -> Self {
        Self::new(AttributeType::String, AttributeFlags::optional())
    }

    /// Create a computed string attribute.
    pub fn computed_string() -> Self {
        Self::new(AttributeType::String, AttributeFlags::computed())
    }

    /// Create an optional string attribute that Foreman fills when unset.
    pub fn optional_computed_string() -> Self {
        Self::new(AttributeType::String, AttributeFlags::optional_computed())
    }

    /// Create a required int64 attribute.
    pub fn required_int64() -> Self {
        Self::new(AttributeType::Int64, AttributeFlags::required())
    }

    /// Create an optional int64 attribute.
    pub fn optional_int64() -> Self {
        Self::new(AttributeType::Int64, AttributeFlags::optional())
    }

    /// Create an optional bool attribute.
    pub fn optional_bool() -> Self {
        Self::new(AttributeType::Bool, AttributeFlags::optional())
    }

    /// Create an optional bool attribute that Foreman fills when unset.
    pub fn optional_computed_bool() -> Self {
        Self::new(AttributeType::Bool, AttributeFlags::optional_computed())
    }

    /// Set the description for this attribute.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Mark this attribute as forcing resource replacement when changed.
    pub fn with_force_new(mut self) -> Self {
        self.force_new = true;
        self
    }

    /// Mark this attribute as sensitive.
    pub fn sensitive(mut self) -> Self {
        self.flags.sensitive = true;
        self
    }
}

/// A block of attributes, optionally containing nested list blocks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Block {
    /// The attributes within this block.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub attributes: HashMap<String, Attribute>,
    /// Nested blocks within this block.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub blocks: HashMap<String, NestedBlock>,
    /// Human-readable description of the block.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Block {
    /// Create a new empty block.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an attribute to this block.
    pub fn with_attribute(mut self, name: impl Into<String>, attr: Attribute) -> Self {
        self.attributes.insert(name.into(), attr);
        self
    }

    /// Set the description for this block.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Whether the attribute or nested block `key` is computed.
    pub fn is_computed(&self, key: &str) -> bool {
        match (self.attributes.get(key), self.blocks.get(key)) {
            (Some(attr), _) => attr.flags.computed,
            (None, Some(nested)) => nested.computed,
            (None, None) => false,
        }
    }
}

/// An ordered list of nested blocks (e.g. the override values of a parameter).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NestedBlock {
    /// The block definition.
    #[serde(flatten)]
    pub block: Block,
    /// Minimum number of blocks required.
    #[serde(default)]
    pub min_items: u32,
    /// Maximum number of blocks allowed (0 = unlimited).
    #[serde(default)]
    pub max_items: u32,
    /// Foreman fills the list when the configuration leaves it out.
    #[serde(default)]
    pub computed: bool,
}

impl NestedBlock {
    /// Create a list of nested blocks with no size constraints.
    pub fn list(block: Block) -> Self {
        Self {
            block,
            min_items: 0,
            max_items: 0,
            computed: false,
        }
    }

    /// Keep the remote list when the configuration leaves it out.
    pub fn with_computed(mut self) -> Self {
        self.computed = true;
        self
    }

    /// Set the minimum number of blocks required.
    pub fn with_min_items(mut self, min: u32) -> Self {
        self.min_items = min;
        self
    }

    /// Set the maximum number of blocks allowed.
    pub fn with_max_items(mut self, max: u32) -> Self {
        self.max_items = max;
        self
    }
}

/// Schema for a resource or data source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    /// The version of this schema (for state upgrades).
    #[serde(default)]
    pub version: u64,
    /// The root block containing all attributes and nested blocks.
    #[serde(flatten)]
    pub block: Block,
}

impl Schema {
    /// Create a new schema with the given version.
    pub fn new(version: u64) -> Self {
        Self {
            version,
            block: Block::new(),
        }
    }

    /// Create a schema at version 0.
    pub fn v0() -> Self {
        Self::new(0)
    }

    /// Add an attribute to the schema.
    pub fn with_attribute(mut self, name: impl Into<String>, attr: Attribute) -> Self {
        self.block.attributes.insert(name.into(), attr);
        self
    }

    /// Add a nested block to the schema.
    pub fn with_block(mut self, name: impl Into<String>, block: NestedBlock) -> Self {
        self.block.blocks.insert(name.into(), block);
        self
    }

    /// Set the description of the root block.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.block.description = Some(description.into());
        self
    }

    /// Derive a data source schema from a resource schema.
    ///
    /// Every attribute becomes computed and loses `force_new`; callers then
    /// re-declare the attributes used as search keys.
    pub fn as_data_source(&self) -> Self {
        let mut schema = self.clone();
        for attr in schema.block.attributes.values_mut() {
            attr.flags = AttributeFlags {
                sensitive: attr.flags.sensitive,
                ..AttributeFlags::computed()
            };
            attr.force_new = false;
        }
        schema
    }

    /// Names of the top-level attributes and nested blocks, sorted.
    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self
            .block
            .attributes
            .keys()
            .chain(self.block.blocks.keys())
            .map(String::as_str)
            .collect();
        keys.sort_unstable();
        keys
    }

    /// Whether `key` is filled by Foreman when the configuration leaves it out.
    pub fn is_computed(&self, key: &str) -> bool {
        self.block.is_computed(key)
    }

    /// Whether a change to `key` forces replacement.
    pub fn forces_new(&self, key: &str) -> bool {
        self.block
            .attributes
            .get(key)
            .map(|attr| attr.force_new)
            .unwrap_or(false)
    }
}

impl Default for Schema {
    fn default() -> Self {
        Self::v0()
    }
}

/// Schema for the whole provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ProviderSchema {
    /// Schema for provider configuration.
    #[serde(default)]
    pub provider: Schema,
    /// Schemas for each resource type.
    #[serde(default)]
    pub resources: HashMap<String, Schema>,
    /// Schemas for each data source type.
    #[serde(default)]
    pub data_sources: HashMap<String, Schema>,
}

impl ProviderSchema {
    /// Create a new empty provider schema.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the provider configuration schema.
    pub fn with_provider_config(mut self, schema: Schema) -> Self {
        self.provider = schema;
        self
    }

    /// Add a resource schema.
    pub fn with_resource(mut self, name: impl Into<String>, schema: Schema) -> Self {
        self.resources.insert(name.into(), schema);
        self
    }

    /// Add a data source schema.
    pub fn with_data_source(mut self, name: impl Into<String>, schema: Schema) -> Self {
        self.data_sources.insert(name.into(), schema);
        self
    }
}

/// Diagnostic severity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticSeverity {
    /// An error that prevents the operation from completing.
    Error,
    /// A warning that doesn't prevent the operation but should be addressed.
    Warning,
}

/// A diagnostic message from the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// The severity of the diagnostic.
    pub severity: DiagnosticSeverity,
    /// A short summary of the issue.
    pub summary: String,
    /// A detailed description of the issue.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    /// The attribute path where the issue occurred.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attribute: Option<String>,
}

impl Diagnostic {
    /// Create an error diagnostic.
    pub fn error(summary: impl Into<String>) -> Self {
        Self {
            severity: DiagnosticSeverity::Error,
            summary: summary.into(),
            detail: None,
            attribute: None,
        }
    }

    /// Create a warning diagnostic.
    pub fn warning(summary: impl Into<String>) -> Self {
        Self {
            severity: DiagnosticSeverity::Warning,
            summary: summary.into(),
            detail: None,
            attribute: None,
        }
    }

    /// Add detail to this diagnostic.
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// Set the attribute path for this diagnostic.
    pub fn with_attribute(mut self, attribute: impl Into<String>) -> Self {
        self.attribute = Some(attribute.into());
        self
    }

    /// Whether this diagnostic is an error.
    pub fn is_error(&self) -> bool {
        self.severity == DiagnosticSeverity::Error
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attribute_flags() {
        let required = AttributeFlags::required();
        assert!(required.required);
        assert!(!required.optional);
        assert!(!required.computed);

        let optional_computed = AttributeFlags::optional_computed();
        assert!(!optional_computed.required);
        assert!(optional_computed.optional);
        assert!(optional_computed.computed);
    }

    #[test]
    fn test_attribute_builders() {
        let attr = Attribute::required_string()
            .with_description("The parameter being overridden")
            .with_force_new();

        assert_eq!(attr.attr_type, AttributeType::String);
        assert!(attr.flags.required);
        assert_eq!(
            attr.description,
            Some("The parameter being overridden".to_string())
        );
        assert!(attr.force_new);

        let secret = Attribute::optional_string().sensitive();
        assert!(secret.flags.sensitive);
    }

    #[test]
    fn test_schema_builder_and_keys() {
        let schema = Schema::v0()
            .with_attribute("match", Attribute::required_string())
            .with_attribute("id", Attribute::computed_string())
            .with_block(
                "override_values",
                NestedBlock::list(Block::new().with_attribute("omit", Attribute::optional_bool())),
            );

        assert_eq!(schema.version, 0);
        assert_eq!(schema.keys(), vec!["id", "match", "override_values"]);
    }

    #[test]
    fn test_forces_new() {
        let schema = Schema::v0()
            .with_attribute("parent", Attribute::required_int64().with_force_new())
            .with_attribute("value", Attribute::required_string());

        assert!(schema.forces_new("parent"));
        assert!(!schema.forces_new("value"));
        assert!(!schema.forces_new("missing"));
    }

    #[test]
    fn test_as_data_source_makes_everything_computed() {
        let resource = Schema::v0()
            .with_attribute("parent", Attribute::required_int64().with_force_new())
            .with_attribute("token", Attribute::optional_string().sensitive());

        let ds = resource.as_data_source();
        let parent = &ds.block.attributes["parent"];
        assert!(parent.flags.computed);
        assert!(!parent.flags.required);
        assert!(!parent.force_new);
        assert!(ds.block.attributes["token"].flags.sensitive);
    }

    #[test]
    fn test_diagnostic() {
        let err = Diagnostic::error("Invalid scope")
            .with_detail("Exactly one parent must be set")
            .with_attribute("host_id");

        assert!(err.is_error());
        assert_eq!(err.summary, "Invalid scope");
        assert_eq!(
            err.detail,
            Some("Exactly one parent must be set".to_string())
        );
        assert_eq!(err.attribute, Some("host_id".to_string()));
        assert!(!Diagnostic::warning("heads up").is_error());
    }

    #[test]
    fn test_nested_block_limits() {
        let list = NestedBlock::list(Block::new())
            .with_min_items(1)
            .with_max_items(5);
        assert_eq!(list.min_items, 1);
        assert_eq!(list.max_items, 5);
        assert!(!list.computed);
    }

    #[test]
    fn test_is_computed() {
        let schema = Schema::v0()
            .with_attribute("id", Attribute::computed_string())
            .with_attribute("omit", Attribute::optional_computed_bool())
            .with_attribute("match", Attribute::required_string())
            .with_block("override_values", NestedBlock::list(Block::new()).with_computed())
            .with_block("extra", NestedBlock::list(Block::new()));

        assert!(schema.is_computed("id"));
        assert!(schema.is_computed("omit"));
        assert!(schema.is_computed("override_values"));
        assert!(!schema.is_computed("match"));
        assert!(!schema.is_computed("extra"));
        assert!(!schema.is_computed("missing"));
    }
}
