//! Smart class parameters.
//!
//! Parameters come from the Puppet integration; Foreman only lets them be
//! read and updated. Every endpoint is scoped by the parent the parameter is
//! viewed through: `{hosts|hostgroups|environments}/{parent_id}/parameters[/{id}]`.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use super::override_value::OverrideValue;
use super::{scalar_as_string, Client, QueryResponse, SearchFilter};
use crate::error::ProviderError;

/// The object a smart class parameter is scoped to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParameterScope {
    /// A single host.
    Host(i64),
    /// A host group.
    HostGroup(i64),
    /// A Puppet environment.
    Environment(i64),
}

impl ParameterScope {
    /// Build the scope from the three optional parent IDs; exactly one must be set.
    pub fn from_parents(
        host_id: Option<i64>,
        hostgroup_id: Option<i64>,
        environment_id: Option<i64>,
    ) -> Result<Self, ProviderError> {
        match (host_id, hostgroup_id, environment_id) {
            (Some(id), None, None) => Ok(Self::Host(id)),
            (None, Some(id), None) => Ok(Self::HostGroup(id)),
            (None, None, Some(id)) => Ok(Self::Environment(id)),
            (None, None, None) => Err(ProviderError::Validation(
                "one of host_id, hostgroup_id or environment_id must be set".to_string(),
            )),
            _ => Err(ProviderError::Validation(
                "only one of host_id, hostgroup_id or environment_id may be set".to_string(),
            )),
        }
    }

    /// Build the scope from its URL segment, e.g. `("hostgroups", 3)`.
    pub fn from_kind(kind: &str, parent_id: i64) -> Result<Self, ProviderError> {
        match kind {
            "hosts" => Ok(Self::Host(parent_id)),
            "hostgroups" => Ok(Self::HostGroup(parent_id)),
            "environments" => Ok(Self::Environment(parent_id)),
            other => Err(ProviderError::Validation(format!(
                "unknown parameter scope '{}', expected hosts, hostgroups or environments",
                other
            ))),
        }
    }

    /// URL segment naming the parent collection.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Host(_) => "hosts",
            Self::HostGroup(_) => "hostgroups",
            Self::Environment(_) => "environments",
        }
    }

    /// ID of the parent object.
    pub fn parent_id(&self) -> i64 {
        match self {
            Self::Host(id) | Self::HostGroup(id) | Self::Environment(id) => *id,
        }
    }
}

impl fmt::Display for ParameterScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.kind(), self.parent_id())
    }
}

/// The content of a smart class parameter as Foreman serializes it.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ParameterAttributes {
    /// Parameter name; read-only.
    #[serde(default, skip_serializing)]
    pub parameter: Option<String>,
    /// Whether the parameter may be overridden.
    #[serde(rename = "override", default, skip_serializing_if = "Option::is_none")]
    pub overridable: Option<bool>,
    /// Free-form description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Value used when no override matches.
    #[serde(
        default,
        deserialize_with = "scalar_as_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub default_value: Option<String>,
    /// Hide the value in the Foreman UI.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hidden_value: Option<bool>,
    /// Leave the parameter out of classification output.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub omit: Option<bool>,
    /// Matcher keys in evaluation order, one per line.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// `regexp` or `list`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validator_type: Option<String>,
    /// Rule applied by the validator.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validator_rule: Option<String>,
    /// Override values attached to the parameter.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub override_values: Option<Vec<OverrideValue>>,
    /// Order in which override matchers are evaluated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub override_value_order: Option<String>,
    /// Puppet type of the value (`string`, `boolean`, `array`, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameter_type: Option<String>,
    /// A value must be present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
    /// Merge all matching overrides (array and hash types).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merge_overrides: Option<bool>,
    /// Include the default value when merging.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merge_default: Option<bool>,
    /// Drop duplicates when merging arrays.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avoid_duplicates: Option<bool>,
}

/// A smart class parameter, identified by (scope, id).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmartClassParameter {
    /// Foreman's parameter ID.
    pub id: i64,
    /// Parent the parameter is addressed through.
    pub scope: ParameterScope,
    /// Everything else.
    pub attributes: ParameterAttributes,
}

/// Wire shape of a parameter; the scope is not part of the body.
#[derive(Debug, Deserialize)]
struct ParameterRecord {
    id: i64,
    #[serde(flatten)]
    attributes: ParameterAttributes,
}

impl ParameterRecord {
    fn into_parameter(self, scope: ParameterScope) -> SmartClassParameter {
        let mut attributes = self.attributes;
        if let Some(values) = attributes.override_values.as_mut() {
            for value in values {
                value.smart_class_parameter_id = self.id;
            }
        }
        SmartClassParameter {
            id: self.id,
            scope,
            attributes,
        }
    }
}

impl Client {
    /// Read parameter `id` through `scope`.
    #[instrument(skip(self), fields(scope = %scope))]
    pub async fn read_parameter(
        &self,
        scope: ParameterScope,
        id: i64,
    ) -> Result<SmartClassParameter, ProviderError> {
        let path = self.endpoints().parameter(&scope, id);
        let record: ParameterRecord = self.get(&path).await?;
        debug!(?record, "read parameter");
        Ok(record.into_parameter(scope))
    }

    /// Update a parameter, replacing its override values wholesale.
    ///
    /// When `override_values` is set, every override value currently on the
    /// parameter is deleted first and the submitted list is sent with the
    /// full model, so the remote list ends up equal to the submitted one
    /// whatever it held before. When it is unset the existing list is left
    /// untouched.
    ///
    /// The deletes are not transactional with the PUT: if the PUT fails the
    /// parameter is left without the deleted override values. The deleted IDs
    /// are logged at `warn` in that case.
    #[instrument(skip(self, parameter), fields(scope = %parameter.scope, id = parameter.id))]
    pub async fn update_parameter(
        &self,
        parameter: &SmartClassParameter,
    ) -> Result<SmartClassParameter, ProviderError> {
        let mut deleted = Vec::new();
        if parameter.attributes.override_values.is_some() {
            let current = self.read_parameter(parameter.scope, parameter.id).await?;
            let stale = current.attributes.override_values.unwrap_or_default();
            for value_id in stale.iter().filter_map(|value| value.id) {
                self.delete_override_value(parameter.id, value_id).await?;
                deleted.push(value_id);
            }
            debug!(removed = deleted.len(), "cleared override values");
        }

        let path = self.endpoints().parameter(&parameter.scope, parameter.id);
        let record: ParameterRecord = self
            .put(&path, &parameter.attributes)
            .await
            .inspect_err(|err| {
                if !deleted.is_empty() {
                    warn!(
                        ?deleted,
                        error = %err,
                        "parameter update failed after its override values were deleted"
                    );
                }
            })?;
        info!("updated parameter");
        Ok(record.into_parameter(parameter.scope))
    }

    /// Search the parameters of `scope` by name.
    #[instrument(skip(self), fields(scope = %scope))]
    pub async fn query_parameters(
        &self,
        scope: ParameterScope,
        name: &str,
    ) -> Result<QueryResponse<SmartClassParameter>, ProviderError> {
        let path = self.endpoints().parameters(&scope);
        let response: QueryResponse<ParameterRecord> =
            self.query(&path, &SearchFilter::name(name)).await?;
        debug!(matches = response.match_count(), "queried parameters");
        Ok(response.map(|record| record.into_parameter(scope)))
    }
}
