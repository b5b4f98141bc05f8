//! The `foreman_override_value` data source.

use serde_json::Value;
use tracing::instrument;

use crate::api::Client;
use crate::attributes::AttributeBag;
use crate::error::ProviderError;
use crate::resources::override_value::{
    build_override_value, schema as resource_schema, set_from_override_value,
};
use crate::schema::{Attribute, Schema};

/// Data source type name.
pub use crate::resources::override_value::TYPE_NAME;

/// Schema of the data source: the resource's attributes, all computed,
/// searched by parent parameter and match expression.
pub fn schema() -> Schema {
    resource_schema()
        .as_data_source()
        .with_description("Looks up an override value by its match expression")
        .with_attribute("smart_class_parameter_id", Attribute::required_string())
        .with_attribute("match", Attribute::required_string())
}

/// Find the single override value of `smart_class_parameter_id` whose match
/// expression equals `match`.
#[instrument(skip_all)]
pub async fn read(client: &Client, config: Value) -> Result<Value, ProviderError> {
    let mut bag = AttributeBag::from_value(config)?;
    let search = build_override_value(&bag)?;

    let found = client
        .query_override_values(&search)
        .await?
        .into_single("override value")?;
    set_from_override_value(&mut bag, &found);
    Ok(bag.into_value())
}
