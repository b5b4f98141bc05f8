//! The `foreman_smart_class_parameter` resource.
//!
//! Parameters are created by Foreman's Puppet import, so the resource can
//! only adopt an existing parameter through import and then update it.
//! Create and delete are refused.

use serde_json::Value;
use tracing::{debug, instrument};

use super::{parse_import_segment, split_import_id};
use crate::api::override_value::OverrideValue;
use crate::api::smart_class_parameter::{ParameterAttributes, ParameterScope, SmartClassParameter};
use crate::api::Client;
use crate::attributes::AttributeBag;
use crate::error::ProviderError;
use crate::schema::{Attribute, Block, NestedBlock, Schema};

/// Resource type name.
pub const TYPE_NAME: &str = "foreman_smart_class_parameter";

/// Import ID format.
pub const IMPORT_ID_FORMAT: &str = "<hosts|hostgroups|environments>/<parent_id>/<id>";

/// Attribute keys naming the parent scope, in [`ParameterScope`] order.
pub const SCOPE_KEYS: [&str; 3] = ["host_id", "hostgroup_id", "environment_id"];

const OVERRIDE_VALUES: &str = "override_values";

/// Schema of the resource.
pub fn schema() -> Schema {
    Schema::v0()
        .with_description(
            "A Puppet smart class parameter, addressed through a host, host group or environment",
        )
        .with_attribute("id", Attribute::computed_string())
        .with_attribute("host_id", Attribute::optional_int64().with_force_new())
        .with_attribute("hostgroup_id", Attribute::optional_int64().with_force_new())
        .with_attribute("environment_id", Attribute::optional_int64().with_force_new())
        .with_attribute(
            "parameter",
            Attribute::computed_string().with_description("Name of the parameter"),
        )
        .with_attribute("override", Attribute::optional_computed_bool())
        .with_attribute("description", Attribute::optional_computed_string())
        .with_attribute("default_value", Attribute::optional_computed_string())
        .with_attribute("hidden_value", Attribute::optional_computed_bool())
        .with_attribute("omit", Attribute::optional_computed_bool())
        .with_attribute("path", Attribute::optional_computed_string())
        .with_attribute(
            "validator_type",
            Attribute::optional_computed_string().with_description("regexp or list"),
        )
        .with_attribute("validator_rule", Attribute::optional_computed_string())
        .with_attribute("override_value_order", Attribute::optional_computed_string())
        .with_attribute("parameter_type", Attribute::optional_computed_string())
        .with_attribute("required", Attribute::optional_computed_bool())
        .with_attribute("merge_overrides", Attribute::optional_computed_bool())
        .with_attribute("merge_default", Attribute::optional_computed_bool())
        .with_attribute("avoid_duplicates", Attribute::optional_computed_bool())
        .with_block(
            OVERRIDE_VALUES,
            NestedBlock::list(
                Block::new()
                    .with_description("Replaces every override value of the parameter")
                    .with_attribute("match", Attribute::required_string())
                    .with_attribute("value", Attribute::optional_string())
                    .with_attribute("omit", Attribute::optional_computed_bool()),
            )
            .with_computed(),
        )
}

/// Read the scope out of the `*_id` parent keys.
pub fn build_scope(bag: &AttributeBag) -> Result<ParameterScope, ProviderError> {
    let [host, hostgroup, environment] = SCOPE_KEYS;
    ParameterScope::from_parents(
        bag.get_i64(host)?,
        bag.get_i64(hostgroup)?,
        bag.get_i64(environment)?,
    )
}

/// Build the parameter content from a bag. `parameter_id` is stamped onto
/// the nested override values.
pub fn build_attributes(
    bag: &AttributeBag,
    parameter_id: i64,
) -> Result<ParameterAttributes, ProviderError> {
    let override_values = bag
        .get_list(OVERRIDE_VALUES)?
        .map(|items| {
            items
                .iter()
                .map(|item| -> Result<OverrideValue, ProviderError> {
                    Ok(OverrideValue {
                        id: None,
                        smart_class_parameter_id: parameter_id,
                        matcher: item.get_str("match")?,
                        value: item.get_str("value")?,
                        omit: item.get_bool("omit")?,
                    })
                })
                .collect::<Result<Vec<_>, _>>()
        })
        .transpose()?;

    Ok(ParameterAttributes {
        parameter: bag.get_str("parameter")?,
        overridable: bag.get_bool("override")?,
        description: bag.get_str("description")?,
        default_value: bag.get_str("default_value")?,
        hidden_value: bag.get_bool("hidden_value")?,
        omit: bag.get_bool("omit")?,
        path: bag.get_str("path")?,
        validator_type: bag.get_str("validator_type")?,
        validator_rule: bag.get_str("validator_rule")?,
        override_values,
        override_value_order: bag.get_str("override_value_order")?,
        parameter_type: bag.get_str("parameter_type")?,
        required: bag.get_bool("required")?,
        merge_overrides: bag.get_bool("merge_overrides")?,
        merge_default: bag.get_bool("merge_default")?,
        avoid_duplicates: bag.get_bool("avoid_duplicates")?,
    })
}

/// Build the full model. The bag must carry an identity.
pub fn build_smart_class_parameter(
    bag: &AttributeBag,
) -> Result<SmartClassParameter, ProviderError> {
    let id = bag.require_id()?;
    Ok(SmartClassParameter {
        id,
        scope: build_scope(bag)?,
        attributes: build_attributes(bag, id)?,
    })
}

/// Write the model back into the bag.
pub fn set_from_smart_class_parameter(bag: &mut AttributeBag, parameter: &SmartClassParameter) {
    bag.set_id(parameter.id);

    let parents = match parameter.scope {
        ParameterScope::Host(id) => [Some(id), None, None],
        ParameterScope::HostGroup(id) => [None, Some(id), None],
        ParameterScope::Environment(id) => [None, None, Some(id)],
    };
    for (key, parent) in SCOPE_KEYS.into_iter().zip(parents) {
        bag.set(key, parent);
    }

    let attrs = &parameter.attributes;
    bag.set("parameter", attrs.parameter.clone());
    bag.set("override", attrs.overridable);
    bag.set("description", attrs.description.clone());
    bag.set("default_value", attrs.default_value.clone());
    bag.set("hidden_value", attrs.hidden_value);
    bag.set("omit", attrs.omit);
    bag.set("path", attrs.path.clone());
    bag.set("validator_type", attrs.validator_type.clone());
    bag.set("validator_rule", attrs.validator_rule.clone());
    bag.set("override_value_order", attrs.override_value_order.clone());
    bag.set("parameter_type", attrs.parameter_type.clone());
    bag.set("required", attrs.required);
    bag.set("merge_overrides", attrs.merge_overrides);
    bag.set("merge_default", attrs.merge_default);
    bag.set("avoid_duplicates", attrs.avoid_duplicates);

    let values = attrs.override_values.as_ref().map(|values| {
        values
            .iter()
            .map(|value| {
                let mut item = AttributeBag::new();
                item.set("match", value.matcher.clone());
                item.set("value", value.value.clone());
                item.set("omit", value.omit);
                item
            })
            .collect()
    });
    bag.set_list(OVERRIDE_VALUES, values);
}

/// Refused: parameters only come from Foreman's Puppet import.
pub async fn create(_client: &Client, _planned: Value) -> Result<Value, ProviderError> {
    Err(ProviderError::Unimplemented(format!(
        "{} cannot be created; import an existing parameter with the id {}",
        TYPE_NAME, IMPORT_ID_FORMAT
    )))
}

/// Refresh `current` from Foreman.
#[instrument(skip_all)]
pub async fn read(client: &Client, current: Value) -> Result<Value, ProviderError> {
    let mut bag = AttributeBag::from_value(current)?;
    let scope = build_scope(&bag)?;
    let read = client.read_parameter(scope, bag.require_id()?).await?;
    set_from_smart_class_parameter(&mut bag, &read);
    Ok(bag.into_value())
}

/// Push `planned` to Foreman. A set `override_values` list that differs
/// from `prior` replaces the remote list entirely; an unchanged one is left
/// alone.
#[instrument(skip_all)]
pub async fn update(client: &Client, prior: Value, planned: Value) -> Result<Value, ProviderError> {
    let prior = AttributeBag::from_value(prior)?;
    let mut bag = AttributeBag::from_value(planned)?;
    if bag.id()?.is_none() {
        bag.set_id(prior.require_id()?);
    }
    let mut parameter = build_smart_class_parameter(&bag)?;
    if bag.get(OVERRIDE_VALUES) == prior.get(OVERRIDE_VALUES) {
        parameter.attributes.override_values = None;
    }
    debug!(?parameter, "updating smart class parameter");

    let updated = client.update_parameter(&parameter).await?;
    set_from_smart_class_parameter(&mut bag, &updated);
    Ok(bag.into_value())
}

/// Refused: a parameter disappears only when its Puppet class does.
pub async fn delete(_client: &Client, _current: Value) -> Result<(), ProviderError> {
    Err(ProviderError::Unimplemented(format!(
        "{} cannot be deleted; remove it from state instead",
        TYPE_NAME
    )))
}

/// Import a parameter by `<kind>/<parent_id>/<id>`, e.g. `hostgroups/3/41`.
#[instrument(skip(client))]
pub async fn import(client: &Client, id: &str) -> Result<Value, ProviderError> {
    let [kind, parent, parameter] = split_import_id::<3>(id, IMPORT_ID_FORMAT)?;
    let scope = ParameterScope::from_kind(kind, parse_import_segment(parent, id)?)?;
    let parameter_id = parse_import_segment(parameter, id)?;

    let read = client.read_parameter(scope, parameter_id).await?;
    let mut bag = AttributeBag::new();
    set_from_smart_class_parameter(&mut bag, &read);
    Ok(bag.into_value())
}
