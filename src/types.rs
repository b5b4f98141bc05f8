//! Plan, import and metadata types exchanged with the host runtime.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::schema::{Block, Schema};

/// A change to a single attribute during a plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeChange {
    /// The path to the attribute that changed.
    pub path: String,
    /// The value before the change (None if creating).
    pub before: Option<Value>,
    /// The value after the change (None if deleting).
    pub after: Option<Value>,
}

impl AttributeChange {
    /// Create a new attribute change.
    pub fn new(path: impl Into<String>, before: Option<Value>, after: Option<Value>) -> Self {
        Self {
            path: path.into(),
            before,
            after,
        }
    }

    /// Create a change for a new attribute.
    pub fn added(path: impl Into<String>, value: Value) -> Self {
        Self::new(path, None, Some(value))
    }

    /// Create a change for a removed attribute.
    pub fn removed(path: impl Into<String>, value: Value) -> Self {
        Self::new(path, Some(value), None)
    }

    /// Create a change for a modified attribute.
    pub fn modified(path: impl Into<String>, before: Value, after: Value) -> Self {
        Self::new(path, Some(before), Some(after))
    }
}

/// The result of a plan operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanResult {
    /// The planned state after the operation.
    pub planned_state: Value,
    /// The list of attribute changes.
    pub changes: Vec<AttributeChange>,
    /// Whether the resource requires replacement.
    pub requires_replace: bool,
}

impl PlanResult {
    /// Create a plan result with no changes.
    pub fn no_change(state: Value) -> Self {
        Self {
            planned_state: state,
            changes: Vec::new(),
            requires_replace: false,
        }
    }

    /// Create a plan result with changes.
    pub fn with_changes(
        planned_state: Value,
        changes: Vec<AttributeChange>,
        requires_replace: bool,
    ) -> Self {
        Self {
            planned_state,
            changes,
            requires_replace,
        }
    }

    /// Diff `prior` against `proposed` over the keys of `schema`.
    ///
    /// A null `proposed` plans a deletion. Unless a `force_new` attribute
    /// changed, computed attributes and computed nested lists the proposal
    /// leaves out take their prior value, so the planned state already holds
    /// what Foreman filled in. Entries of nested lists are filled by position.
    /// The `id` is never reported as a change; absent and `null` values
    /// compare equal.
    pub fn diff(schema: &Schema, prior: Option<&Value>, proposed: &Value) -> Self {
        if proposed.is_null() {
            let changes = prior
                .and_then(Value::as_object)
                .map(|obj| {
                    schema
                        .keys()
                        .into_iter()
                        .filter_map(|key| match obj.get(key) {
                            Some(v) if !v.is_null() => Some(AttributeChange::removed(key, v.clone())),
                            _ => None,
                        })
                        .collect()
                })
                .unwrap_or_default();
            return Self::with_changes(Value::Null, changes, false);
        }

        let requires_replace = prior.is_some_and(|prior| {
            schema.block.attributes.iter().any(|(key, attr)| {
                attr.force_new && present(prior.get(key)) != present(proposed.get(key))
            })
        });

        let mut planned = proposed.clone();
        if let (Some(prior), false) = (prior, requires_replace) {
            fill_computed(&schema.block, prior, &mut planned);
        }

        let mut changes = Vec::new();
        for key in schema.keys() {
            if key == "id" {
                continue;
            }
            let before = present(prior.and_then(|p| p.get(key)));
            let after = present(planned.get(key));
            let change = match (before, after) {
                (None, None) => continue,
                (Some(b), Some(a)) if b == a => continue,
                (None, Some(a)) => AttributeChange::added(key, a.clone()),
                (Some(b), None) => AttributeChange::removed(key, b.clone()),
                (Some(b), Some(a)) => AttributeChange::modified(key, b.clone(), a.clone()),
            };
            changes.push(change);
        }

        Self::with_changes(planned, changes, requires_replace)
    }
}

fn present(value: Option<&Value>) -> Option<&Value> {
    value.filter(|v| !v.is_null())
}

/// Copy into `planned` the computed values of `block` it leaves out, taking
/// them from `prior`. Nested lists present on both sides are filled entry by
/// entry.
fn fill_computed(block: &Block, prior: &Value, planned: &mut Value) {
    let (Some(prior), Some(planned)) = (prior.as_object(), planned.as_object_mut()) else {
        return;
    };

    for (key, attr) in &block.attributes {
        if !attr.flags.computed || present(planned.get(key)).is_some() {
            continue;
        }
        if let Some(value) = present(prior.get(key)) {
            planned.insert(key.clone(), value.clone());
        }
    }

    for (key, nested) in &block.blocks {
        match (present(prior.get(key)), planned.get_mut(key)) {
            (Some(Value::Array(before)), Some(Value::Array(after))) => {
                for (before, after) in before.iter().zip(after.iter_mut()) {
                    fill_computed(&nested.block, before, after);
                }
            },
            (Some(value), None | Some(Value::Null)) if nested.computed => {
                planned.insert(key.clone(), value.clone());
            },
            _ => {},
        }
    }
}

/// An imported resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportedResource {
    /// The resource type.
    pub resource_type: String,
    /// The imported state.
    pub state: Value,
}

impl ImportedResource {
    /// Create a new imported resource.
    pub fn new(resource_type: impl Into<String>, state: Value) -> Self {
        Self {
            resource_type: resource_type.into(),
            state,
        }
    }
}

/// Provider metadata: the registered resource and data source names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ProviderMetadata {
    /// List of resource type names.
    pub resources: Vec<String>,
    /// List of data source type names.
    pub data_sources: Vec<String>,
}
