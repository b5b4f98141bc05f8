//! Test harness for driving a provider the way the host runtime does.
//!
//! # Example
//!
//! ```ignore
//! use foreman_provider::testing::ProviderTester;
//! use foreman_provider::ForemanProvider;
//! use serde_json::json;
//!
//! #[tokio::test]
//! async fn test_create_override_value() {
//!     let tester = ProviderTester::new(ForemanProvider::new());
//!     tester.configure(json!({"server_url": server.uri()})).await.unwrap();
//!
//!     let state = tester
//!         .apply_create("foreman_override_value", json!({
//!             "smart_class_parameter_id": "7",
//!             "match": "os=RedHat",
//!             "value": "true"
//!         }))
//!         .await
//!         .unwrap();
//!     assert_eq!(state["id"], "12");
//! }
//! ```

use serde_json::Value;
use thiserror::Error;

use crate::error::ProviderError;
use crate::schema::{Diagnostic, ProviderSchema};
use crate::service::ProviderService;
use crate::types::{ImportedResource, PlanResult};

/// Wraps a [`ProviderService`] and exposes its operations with test-friendly
/// signatures: validation turns error diagnostics into `Err`, and the
/// `apply_*` helpers chain plan and apply the way the host does.
pub struct ProviderTester<P: ProviderService> {
    provider: P,
}

impl<P: ProviderService> ProviderTester<P> {
    /// Wrap `provider`.
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    /// The wrapped provider.
    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// The provider's schema.
    pub fn schema(&self) -> ProviderSchema {
        self.provider.schema()
    }

    /// Configure the provider; error diagnostics become `Err`.
    pub async fn configure(&self, config: Value) -> Result<(), TestError> {
        errors_only(self.provider.configure(config).await?)
    }

    /// Stop the provider.
    pub async fn stop(&self) -> Result<(), ProviderError> {
        self.provider.stop().await
    }

    /// Validate a resource block; error diagnostics become `Err`.
    pub async fn validate_resource_config(
        &self,
        resource_type: &str,
        config: Value,
    ) -> Result<(), TestError> {
        errors_only(
            self.provider
                .validate_resource_config(resource_type, config)
                .await?,
        )
    }

    /// Validate a data source block; error diagnostics become `Err`.
    pub async fn validate_data_source_config(
        &self,
        data_source_type: &str,
        config: Value,
    ) -> Result<(), TestError> {
        errors_only(
            self.provider
                .validate_data_source_config(data_source_type, config)
                .await?,
        )
    }

    /// Plan with no prior state.
    pub async fn plan_create(
        &self,
        resource_type: &str,
        proposed: Value,
    ) -> Result<PlanResult, ProviderError> {
        self.provider
            .plan(resource_type, None, proposed.clone(), proposed)
            .await
    }

    /// Plan a change from `prior` to `proposed`.
    pub async fn plan_update(
        &self,
        resource_type: &str,
        prior: Value,
        proposed: Value,
    ) -> Result<PlanResult, ProviderError> {
        self.provider
            .plan(resource_type, Some(prior), proposed.clone(), proposed)
            .await
    }

    /// Plan the removal of `prior`.
    pub async fn plan_delete(
        &self,
        resource_type: &str,
        prior: Value,
    ) -> Result<PlanResult, ProviderError> {
        self.provider
            .plan(resource_type, Some(prior), Value::Null, Value::Null)
            .await
    }

    /// Create a resource from planned state.
    pub async fn create(&self, resource_type: &str, planned: Value) -> Result<Value, ProviderError> {
        self.provider.create(resource_type, planned).await
    }

    /// Refresh a resource.
    pub async fn read(&self, resource_type: &str, current: Value) -> Result<Value, ProviderError> {
        self.provider.read(resource_type, current).await
    }

    /// Update a resource.
    pub async fn update(
        &self,
        resource_type: &str,
        prior: Value,
        planned: Value,
    ) -> Result<Value, ProviderError> {
        self.provider.update(resource_type, prior, planned).await
    }

    /// Delete a resource.
    pub async fn delete(&self, resource_type: &str, current: Value) -> Result<(), ProviderError> {
        self.provider.delete(resource_type, current).await
    }

    /// Import by ID.
    pub async fn import_resource(
        &self,
        resource_type: &str,
        id: &str,
    ) -> Result<Vec<ImportedResource>, ProviderError> {
        self.provider.import_resource(resource_type, id).await
    }

    /// Read a data source.
    pub async fn read_data_source(
        &self,
        data_source_type: &str,
        config: Value,
    ) -> Result<Value, ProviderError> {
        self.provider.read_data_source(data_source_type, config).await
    }

    /// Plan then create.
    pub async fn apply_create(
        &self,
        resource_type: &str,
        config: Value,
    ) -> Result<Value, ProviderError> {
        let plan = self.plan_create(resource_type, config).await?;
        self.create(resource_type, plan.planned_state).await
    }

    /// Plan then update; the planned state carries the prior identity.
    pub async fn apply_update(
        &self,
        resource_type: &str,
        prior: Value,
        config: Value,
    ) -> Result<Value, ProviderError> {
        let plan = self.plan_update(resource_type, prior.clone(), config).await?;
        assert!(
            !plan.requires_replace,
            "apply_update on a plan that requires replacement: {:?}",
            plan.changes
        );
        self.update(resource_type, prior, plan.planned_state).await
    }

    /// Import a single object and refresh it.
    pub async fn import_and_read(
        &self,
        resource_type: &str,
        id: &str,
    ) -> Result<Value, ProviderError> {
        let mut imported = self.import_resource(resource_type, id).await?;
        let state = imported.pop().map(|r| r.state).ok_or_else(|| {
            ProviderError::NotFound(format!("import of {} returned nothing", id))
        })?;
        self.read(resource_type, state).await
    }
}

/// Failure of a tester call.
#[derive(Debug, Error)]
pub enum TestError {
    /// The provider answered with error diagnostics.
    #[error("{} error diagnostic(s): {}", .0.len(), summaries(.0))]
    Diagnostics(Vec<Diagnostic>),
    /// The provider returned an error.
    #[error(transparent)]
    Provider(#[from] ProviderError),
}

fn summaries(diagnostics: &[Diagnostic]) -> String {
    diagnostics
        .iter()
        .map(|d| match &d.attribute {
            Some(attr) => format!("{} (at {})", d.summary, attr),
            None => d.summary.clone(),
        })
        .collect::<Vec<_>>()
        .join("; ")
}

fn errors_only(diagnostics: Vec<Diagnostic>) -> Result<(), TestError> {
    let errors: Vec<Diagnostic> = diagnostics.into_iter().filter(Diagnostic::is_error).collect();
    if errors.is_empty() {
        Ok(())
    } else {
        Err(TestError::Diagnostics(errors))
    }
}

/// Assert that the plan replaces the resource.
///
/// # Panics
///
/// Panics if the plan updates in place.
pub fn assert_plan_replaces(plan: &PlanResult) {
    assert!(
        plan.requires_replace,
        "expected replacement, got in-place changes {:?}",
        changed_paths(plan)
    );
}

/// Assert that the plan touches `path`.
///
/// # Panics
///
/// Panics if no change has that path.
pub fn assert_plan_changes_attribute(plan: &PlanResult, path: &str) {
    assert!(
        plan.changes.iter().any(|c| c.path == path),
        "expected a change to '{}', changed: {:?}",
        path,
        changed_paths(plan)
    );
}

/// Assert that the plan has no changes.
///
/// # Panics
///
/// Panics on any change.
pub fn assert_plan_no_changes(plan: &PlanResult) {
    assert!(
        plan.changes.is_empty(),
        "expected no changes, changed: {:?}",
        changed_paths(plan)
    );
}

/// Assert that some error diagnostic mentions `substring`.
///
/// # Panics
///
/// Panics if none does.
pub fn assert_error_contains(diagnostics: &[Diagnostic], substring: &str) {
    assert!(
        diagnostics
            .iter()
            .any(|d| d.is_error() && d.summary.contains(substring)),
        "no error mentions '{}': {:?}",
        substring,
        diagnostics.iter().map(|d| &d.summary).collect::<Vec<_>>()
    );
}

fn changed_paths(plan: &PlanResult) -> Vec<&str> {
    plan.changes.iter().map(|c| c.path.as_str()).collect()
}
