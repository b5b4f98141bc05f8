//! The `foreman_smart_class_parameter` data source.

use serde_json::Value;
use tracing::instrument;

use crate::api::Client;
use crate::attributes::AttributeBag;
use crate::error::ProviderError;
use crate::resources::smart_class_parameter::{
    build_scope, schema as resource_schema, set_from_smart_class_parameter,
};
use crate::schema::{Attribute, Schema};

/// Data source type name.
pub use crate::resources::smart_class_parameter::TYPE_NAME;

/// Schema of the data source: one parent key plus the parameter name.
pub fn schema() -> Schema {
    resource_schema()
        .as_data_source()
        .with_description("Looks up a smart class parameter by name")
        .with_attribute("host_id", Attribute::optional_int64())
        .with_attribute("hostgroup_id", Attribute::optional_int64())
        .with_attribute("environment_id", Attribute::optional_int64())
        .with_attribute(
            "parameter",
            Attribute::required_string().with_description("Name of the parameter"),
        )
}

/// Find the single parameter named `parameter` within the configured scope.
#[instrument(skip_all)]
pub async fn read(client: &Client, config: Value) -> Result<Value, ProviderError> {
    let mut bag = AttributeBag::from_value(config)?;
    let scope = build_scope(&bag)?;
    let name = bag.get_str("parameter")?.ok_or_else(|| {
        ProviderError::Validation("a parameter search needs 'parameter'".to_string())
    })?;

    let found = client
        .query_parameters(scope, &name)
        .await?
        .into_single("smart class parameter")?;
    set_from_smart_class_parameter(&mut bag, &found);
    Ok(bag.into_value())
}
