//! The `foreman_override_value` resource.

use serde_json::Value;
use tracing::{debug, instrument};

use super::{parse_import_segment, split_import_id};
use crate::api::override_value::OverrideValue;
use crate::api::Client;
use crate::attributes::AttributeBag;
use crate::error::ProviderError;
use crate::schema::{Attribute, Schema};

/// Resource type name.
pub const TYPE_NAME: &str = "foreman_override_value";

/// Import ID format.
pub const IMPORT_ID_FORMAT: &str = "<smart_class_parameter_id>/<id>";

/// Schema of the resource.
pub fn schema() -> Schema {
    Schema::v0()
        .with_description(
            "An override of a smart class parameter's value for hosts matching an expression",
        )
        .with_attribute("id", Attribute::computed_string())
        .with_attribute(
            "smart_class_parameter_id",
            Attribute::required_string()
                .with_description("ID of the smart class parameter being overridden")
                .with_force_new(),
        )
        .with_attribute(
            "match",
            Attribute::required_string().with_description("Match expression, e.g. os=RedHat"),
        )
        .with_attribute("value", Attribute::required_string())
        .with_attribute(
            "omit",
            Attribute::optional_computed_bool()
                .with_description("Leave the parameter out of classification output"),
        )
}

/// Build the API model from an attribute bag.
///
/// Unset keys stay `None`; only the parent parameter is mandatory.
pub fn build_override_value(bag: &AttributeBag) -> Result<OverrideValue, ProviderError> {
    let smart_class_parameter_id = bag
        .get_numeric_id("smart_class_parameter_id")?
        .ok_or_else(|| {
            ProviderError::Validation(
                "an override value needs smart_class_parameter_id".to_string(),
            )
        })?;

    Ok(OverrideValue {
        id: bag.id()?,
        smart_class_parameter_id,
        matcher: bag.get_str("match")?,
        value: bag.get_str("value")?,
        omit: bag.get_bool("omit")?,
    })
}

/// Write the model's identity and content back into the bag.
pub fn set_from_override_value(bag: &mut AttributeBag, value: &OverrideValue) {
    if let Some(id) = value.id {
        bag.set_id(id);
    }
    bag.set(
        "smart_class_parameter_id",
        Some(value.smart_class_parameter_id.to_string()),
    );
    bag.set("match", value.matcher.clone());
    bag.set("value", value.value.clone());
    bag.set("omit", value.omit);
}

fn existing_id(value: &OverrideValue) -> Result<i64, ProviderError> {
    value
        .id
        .ok_or_else(|| ProviderError::Validation("state has no resource id".to_string()))
}

/// Create the override value described by `planned`.
#[instrument(skip_all)]
pub async fn create(client: &Client, planned: Value) -> Result<Value, ProviderError> {
    let mut bag = AttributeBag::from_value(planned)?;
    let value = build_override_value(&bag)?;
    debug!(?value, "creating override value");

    let created = client.create_override_value(&value).await?;
    set_from_override_value(&mut bag, &created);
    Ok(bag.into_value())
}

/// Refresh `current` from Foreman.
#[instrument(skip_all)]
pub async fn read(client: &Client, current: Value) -> Result<Value, ProviderError> {
    let mut bag = AttributeBag::from_value(current)?;
    let value = build_override_value(&bag)?;

    let read = client
        .read_override_value(value.smart_class_parameter_id, existing_id(&value)?)
        .await?;
    set_from_override_value(&mut bag, &read);
    Ok(bag.into_value())
}

/// Push `planned` to Foreman. The identity falls back to `prior` when the
/// planned state does not carry it.
#[instrument(skip_all)]
pub async fn update(client: &Client, prior: Value, planned: Value) -> Result<Value, ProviderError> {
    let prior = AttributeBag::from_value(prior)?;
    let mut bag = AttributeBag::from_value(planned)?;
    let mut value = build_override_value(&bag)?;
    if value.id.is_none() {
        value.id = prior.id()?;
    }
    existing_id(&value)?;
    debug!(?value, "updating override value");

    let updated = client.update_override_value(&value).await?;
    set_from_override_value(&mut bag, &updated);
    Ok(bag.into_value())
}

/// Delete the override value held in `current`.
#[instrument(skip_all)]
pub async fn delete(client: &Client, current: Value) -> Result<(), ProviderError> {
    let bag = AttributeBag::from_value(current)?;
    let value = build_override_value(&bag)?;
    client
        .delete_override_value(value.smart_class_parameter_id, existing_id(&value)?)
        .await
}

/// Import an existing override value by `<smart_class_parameter_id>/<id>`.
#[instrument(skip(client))]
pub async fn import(client: &Client, id: &str) -> Result<Value, ProviderError> {
    let [parameter, value_id] = split_import_id::<2>(id, IMPORT_ID_FORMAT)?;
    let parameter_id = parse_import_segment(parameter, id)?;
    let value_id = parse_import_segment(value_id, id)?;

    let read = client.read_override_value(parameter_id, value_id).await?;
    let mut bag = AttributeBag::new();
    set_from_override_value(&mut bag, &read);
    Ok(bag.into_value())
}
