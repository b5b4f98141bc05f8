//! The Foreman provider: registers the resource and data source types and
//! routes host calls to them.

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, info, instrument, warn};

use crate::api::{Client, Endpoints};
use crate::config::ProviderConfig;
use crate::error::ProviderError;
use crate::schema::{Diagnostic, ProviderSchema, Schema};
use crate::service::ProviderService;
use crate::types::{ImportedResource, PlanResult};
use crate::validation::validate;
use crate::{data_sources, resources};

/// Provider for Foreman smart class parameters and their override values.
///
/// Every resource and data source operation fails with a configuration error
/// until [`ProviderService::configure`] has succeeded.
pub struct ForemanProvider {
    client: RwLock<Option<Arc<Client>>>,
    endpoints: Endpoints,
}

impl ForemanProvider {
    /// An unconfigured provider using the stock endpoints.
    pub fn new() -> Self {
        Self::with_endpoints(Endpoints::default())
    }

    /// An unconfigured provider using custom endpoint templates.
    pub fn with_endpoints(endpoints: Endpoints) -> Self {
        Self {
            client: RwLock::new(None),
            endpoints,
        }
    }

    /// A provider that is already configured with `client`.
    pub fn with_client(client: Client) -> Self {
        let endpoints = client.endpoints().clone();
        Self {
            client: RwLock::new(Some(Arc::new(client))),
            endpoints,
        }
    }

    async fn client(&self) -> Result<Arc<Client>, ProviderError> {
        self.client.read().await.clone().ok_or_else(|| {
            ProviderError::Configuration("provider has not been configured".to_string())
        })
    }

    fn resource_schema(resource_type: &str) -> Result<Schema, ProviderError> {
        match resource_type {
            resources::override_value::TYPE_NAME => Ok(resources::override_value::schema()),
            resources::smart_class_parameter::TYPE_NAME => {
                Ok(resources::smart_class_parameter::schema())
            },
            other => Err(ProviderError::UnknownResource(other.to_string())),
        }
    }

    fn data_source_schema(data_source_type: &str) -> Result<Schema, ProviderError> {
        match data_source_type {
            data_sources::override_value::TYPE_NAME => Ok(data_sources::override_value::schema()),
            data_sources::smart_class_parameter::TYPE_NAME => {
                Ok(data_sources::smart_class_parameter::schema())
            },
            other => Err(ProviderError::UnknownResource(other.to_string())),
        }
    }
}

impl Default for ForemanProvider {
    fn default() -> Self {
        Self::new()
    }
}

/// Schema validation plus the exactly-one-parent rule for parameters.
fn validate_config(type_name: &str, schema: &Schema, config: &Value) -> Vec<Diagnostic> {
    let mut diagnostics = validate(schema, config);
    if type_name == resources::smart_class_parameter::TYPE_NAME && config.is_object() {
        let set: Vec<&str> = resources::smart_class_parameter::SCOPE_KEYS
            .into_iter()
            .filter(|key| config.get(*key).is_some_and(|v| !v.is_null()))
            .collect();
        if set.len() != 1 {
            let got = if set.is_empty() {
                "none".to_string()
            } else {
                set.join(", ")
            };
            diagnostics.push(
                Diagnostic::error(
                    "Exactly one of host_id, hostgroup_id or environment_id must be set",
                )
                .with_detail(format!("Got {}", got)),
            );
        }
    }
    diagnostics
}

#[async_trait::async_trait]
impl ProviderService for ForemanProvider {
    fn schema(&self) -> ProviderSchema {
        ProviderSchema::new()
            .with_provider_config(ProviderConfig::schema())
            .with_resource(
                resources::override_value::TYPE_NAME,
                resources::override_value::schema(),
            )
            .with_resource(
                resources::smart_class_parameter::TYPE_NAME,
                resources::smart_class_parameter::schema(),
            )
            .with_data_source(
                data_sources::override_value::TYPE_NAME,
                data_sources::override_value::schema(),
            )
            .with_data_source(
                data_sources::smart_class_parameter::TYPE_NAME,
                data_sources::smart_class_parameter::schema(),
            )
    }

    async fn validate_provider_config(&self, config: Value) -> Result<Vec<Diagnostic>, ProviderError> {
        Ok(validate(&ProviderConfig::schema(), &config))
    }

    #[instrument(skip_all)]
    async fn configure(&self, config: Value) -> Result<Vec<Diagnostic>, ProviderError> {
        let client = ProviderConfig::from_value(config)
            .and_then(|config| Client::new(&config))
            .map(|client| client.with_endpoints(self.endpoints.clone()));
        let client = match client {
            Ok(client) => client,
            Err(err) => {
                warn!(error = %err, "provider configuration rejected");
                return Ok(vec![err.to_diagnostic()]);
            },
        };

        *self.client.write().await = Some(Arc::new(client));
        info!("provider configured");
        Ok(vec![])
    }

    async fn stop(&self) -> Result<(), ProviderError> {
        self.client.write().await.take();
        debug!("provider stopped");
        Ok(())
    }

    async fn validate_resource_config(
        &self,
        resource_type: &str,
        config: Value,
    ) -> Result<Vec<Diagnostic>, ProviderError> {
        let schema = Self::resource_schema(resource_type)?;
        Ok(validate_config(resource_type, &schema, &config))
    }

    #[instrument(skip(self, prior_state, proposed_state, _config))]
    async fn plan(
        &self,
        resource_type: &str,
        prior_state: Option<Value>,
        proposed_state: Value,
        _config: Value,
    ) -> Result<PlanResult, ProviderError> {
        let schema = Self::resource_schema(resource_type)?;
        let plan = PlanResult::diff(&schema, prior_state.as_ref(), &proposed_state);
        debug!(
            changes = plan.changes.len(),
            requires_replace = plan.requires_replace,
            "planned"
        );
        Ok(plan)
    }

    #[instrument(skip(self, planned_state))]
    async fn create(&self, resource_type: &str, planned_state: Value) -> Result<Value, ProviderError> {
        let client = self.client().await?;
        match resource_type {
            resources::override_value::TYPE_NAME => {
                resources::override_value::create(&client, planned_state).await
            },
            resources::smart_class_parameter::TYPE_NAME => {
                resources::smart_class_parameter::create(&client, planned_state).await
            },
            other => Err(ProviderError::UnknownResource(other.to_string())),
        }
    }

    #[instrument(skip(self, current_state))]
    async fn read(&self, resource_type: &str, current_state: Value) -> Result<Value, ProviderError> {
        let client = self.client().await?;
        match resource_type {
            resources::override_value::TYPE_NAME => {
                resources::override_value::read(&client, current_state).await
            },
            resources::smart_class_parameter::TYPE_NAME => {
                resources::smart_class_parameter::read(&client, current_state).await
            },
            other => Err(ProviderError::UnknownResource(other.to_string())),
        }
    }

    #[instrument(skip(self, prior_state, planned_state))]
    async fn update(
        &self,
        resource_type: &str,
        prior_state: Value,
        planned_state: Value,
    ) -> Result<Value, ProviderError> {
        let client = self.client().await?;
        match resource_type {
            resources::override_value::TYPE_NAME => {
                resources::override_value::update(&client, prior_state, planned_state).await
            },
            resources::smart_class_parameter::TYPE_NAME => {
                resources::smart_class_parameter::update(&client, prior_state, planned_state).await
            },
            other => Err(ProviderError::UnknownResource(other.to_string())),
        }
    }

    #[instrument(skip(self, current_state))]
    async fn delete(&self, resource_type: &str, current_state: Value) -> Result<(), ProviderError> {
        let client = self.client().await?;
        match resource_type {
            resources::override_value::TYPE_NAME => {
                resources::override_value::delete(&client, current_state).await
            },
            resources::smart_class_parameter::TYPE_NAME => {
                resources::smart_class_parameter::delete(&client, current_state).await
            },
            other => Err(ProviderError::UnknownResource(other.to_string())),
        }
    }

    #[instrument(skip(self))]
    async fn import_resource(
        &self,
        resource_type: &str,
        id: &str,
    ) -> Result<Vec<ImportedResource>, ProviderError> {
        let client = self.client().await?;
        let state = match resource_type {
            resources::override_value::TYPE_NAME => {
                resources::override_value::import(&client, id).await?
            },
            resources::smart_class_parameter::TYPE_NAME => {
                resources::smart_class_parameter::import(&client, id).await?
            },
            other => return Err(ProviderError::UnknownResource(other.to_string())),
        };
        Ok(vec![ImportedResource::new(resource_type, state)])
    }

    async fn validate_data_source_config(
        &self,
        data_source_type: &str,
        config: Value,
    ) -> Result<Vec<Diagnostic>, ProviderError> {
        let schema = Self::data_source_schema(data_source_type)?;
        Ok(validate_config(data_source_type, &schema, &config))
    }

    #[instrument(skip(self, config))]
    async fn read_data_source(
        &self,
        data_source_type: &str,
        config: Value,
    ) -> Result<Value, ProviderError> {
        let client = self.client().await?;
        match data_source_type {
            data_sources::override_value::TYPE_NAME => {
                data_sources::override_value::read(&client, config).await
            },
            data_sources::smart_class_parameter::TYPE_NAME => {
                data_sources::smart_class_parameter::read(&client, config).await
            },
            other => Err(ProviderError::UnknownResource(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_schema_registers_both_types() {
        let provider = ForemanProvider::new();
        let metadata = provider.metadata();
        assert_eq!(
            metadata.resources,
            vec!["foreman_override_value", "foreman_smart_class_parameter"]
        );
        assert_eq!(metadata.data_sources, metadata.resources);
    }

    #[tokio::test]
    async fn test_operations_fail_before_configure() {
        let provider = ForemanProvider::new();
        let err = provider
            .read("foreman_override_value", json!({"id": "1", "smart_class_parameter_id": "7"}))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Configuration(_)));

        let err = provider
            .read_data_source("foreman_override_value", json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Configuration(_)));
    }

    #[tokio::test]
    async fn test_configure_reports_bad_url() {
        let provider = ForemanProvider::new();
        let diagnostics = provider
            .configure(json!({"server_url": "not a url"}))
            .await
            .unwrap();
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].summary.contains("server_url"));
    }

    #[tokio::test]
    async fn test_unknown_type() {
        let provider = ForemanProvider::new();
        let err = provider
            .validate_resource_config("foreman_host", json!({}))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Unknown resource type: foreman_host");
    }

    #[tokio::test]
    async fn test_validate_parameter_scope() {
        let provider = ForemanProvider::new();
        let diagnostics = provider
            .validate_resource_config(
                "foreman_smart_class_parameter",
                json!({"host_id": 1, "hostgroup_id": 2}),
            )
            .await
            .unwrap();
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].detail.as_deref(), Some("Got host_id, hostgroup_id"));

        let diagnostics = provider
            .validate_data_source_config(
                "foreman_smart_class_parameter",
                json!({"environment_id": 1, "parameter": "ntp_servers"}),
            )
            .await
            .unwrap();
        assert!(diagnostics.is_empty());
    }

    #[tokio::test]
    async fn test_plan_replaces_on_parent_change() {
        let provider = ForemanProvider::new();
        let prior = json!({"id": "12", "smart_class_parameter_id": "7", "match": "a", "value": "1"});
        let proposed = json!({"smart_class_parameter_id": "8", "match": "a", "value": "1"});

        let plan = provider
            .plan("foreman_override_value", Some(prior), proposed, json!({}))
            .await
            .unwrap();
        assert!(plan.requires_replace);
        assert_eq!(plan.planned_state["id"], "12");
    }
}
