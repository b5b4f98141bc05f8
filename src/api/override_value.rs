//! Override values: context-specific values of a smart class parameter.
//!
//! Every endpoint is scoped under the parent parameter:
//! `smart_class_parameters/{parameter_id}/override_values[/{id}]`.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use super::{scalar_as_string, wrap_json, Client, QueryResponse, SearchFilter};
use crate::error::ProviderError;

/// Key the create/update payload is wrapped under.
const WRAPPER_KEY: &str = "override_value";

/// An override of a smart class parameter's value for hosts matching `matcher`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OverrideValue {
    /// Assigned by Foreman on creation.
    #[serde(default, skip_serializing)]
    pub id: Option<i64>,
    /// The parameter this value overrides. Not part of the JSON body; it
    /// selects the endpoint.
    #[serde(skip)]
    pub smart_class_parameter_id: i64,
    /// Match expression, e.g. `os=RedHat`.
    #[serde(rename = "match", default, skip_serializing_if = "Option::is_none")]
    pub matcher: Option<String>,
    /// Override value; required unless `omit` is set.
    #[serde(
        default,
        deserialize_with = "scalar_as_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub value: Option<String>,
    /// Foreman leaves the parameter out of classification output.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub omit: Option<bool>,
}

impl OverrideValue {
    /// An override value with all content attributes set.
    pub fn new(
        smart_class_parameter_id: i64,
        matcher: impl Into<String>,
        value: impl Into<String>,
        omit: bool,
    ) -> Self {
        Self {
            id: None,
            smart_class_parameter_id,
            matcher: Some(matcher.into()),
            value: Some(value.into()),
            omit: Some(omit),
        }
    }

    fn parent(&self) -> Result<i64, ProviderError> {
        if self.smart_class_parameter_id > 0 {
            Ok(self.smart_class_parameter_id)
        } else {
            Err(ProviderError::RequestConstruction(
                "override value has no smart class parameter".to_string(),
            ))
        }
    }

    fn with_parent(mut self, parameter_id: i64) -> Self {
        self.smart_class_parameter_id = parameter_id;
        self
    }
}

impl Client {
    /// Create an override value. The returned value carries Foreman's ID and
    /// any defaulted fields.
    #[instrument(skip(self, value), fields(parameter_id = value.smart_class_parameter_id))]
    pub async fn create_override_value(
        &self,
        value: &OverrideValue,
    ) -> Result<OverrideValue, ProviderError> {
        let parameter_id = value.parent()?;
        let path = self.endpoints().override_values(parameter_id);
        let body = wrap_json(WRAPPER_KEY, value)?;

        let created: OverrideValue = self.post(&path, &body).await?;
        info!(id = ?created.id, "created override value");
        Ok(created.with_parent(parameter_id))
    }

    /// Read the override value `id` of parameter `parameter_id`.
    #[instrument(skip(self))]
    pub async fn read_override_value(
        &self,
        parameter_id: i64,
        id: i64,
    ) -> Result<OverrideValue, ProviderError> {
        let path = self.endpoints().override_value(parameter_id, id);
        let read: OverrideValue = self.get(&path).await?;
        debug!(?read, "read override value");
        Ok(read.with_parent(parameter_id))
    }

    /// Replace the content of an existing override value.
    #[instrument(skip(self, value), fields(parameter_id = value.smart_class_parameter_id, id = ?value.id))]
    pub async fn update_override_value(
        &self,
        value: &OverrideValue,
    ) -> Result<OverrideValue, ProviderError> {
        let parameter_id = value.parent()?;
        let id = value.id.ok_or_else(|| {
            ProviderError::RequestConstruction("override value has no id".to_string())
        })?;
        let path = self.endpoints().override_value(parameter_id, id);
        let body = wrap_json(WRAPPER_KEY, value)?;

        let updated: OverrideValue = self.put(&path, &body).await?;
        info!("updated override value");
        Ok(updated.with_parent(parameter_id))
    }

    /// Delete the override value `id` of parameter `parameter_id`.
    #[instrument(skip(self))]
    pub async fn delete_override_value(
        &self,
        parameter_id: i64,
        id: i64,
    ) -> Result<(), ProviderError> {
        let path = self.endpoints().override_value(parameter_id, id);
        self.delete(&path).await?;
        info!("deleted override value");
        Ok(())
    }

    /// Search the override values of the parent parameter by the match
    /// expression of `value`.
    #[instrument(skip(self, value), fields(parameter_id = value.smart_class_parameter_id))]
    pub async fn query_override_values(
        &self,
        value: &OverrideValue,
    ) -> Result<QueryResponse<OverrideValue>, ProviderError> {
        let parameter_id = value.parent()?;
        let matcher = value.matcher.as_deref().ok_or_else(|| {
            ProviderError::RequestConstruction("override value search needs a match".to_string())
        })?;
        let path = self.endpoints().override_values(parameter_id);

        let mut response: QueryResponse<OverrideValue> =
            self.query(&path, &SearchFilter::name(matcher)).await?;
        for result in &mut response.results {
            result.smart_class_parameter_id = parameter_id;
        }
        debug!(matches = response.match_count(), "queried override values");
        Ok(response)
    }
}
