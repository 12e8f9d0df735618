//! Test harness for driving the provider without a gRPC server.
//!
//! # Example
//!
//! ```no_run
//! use sentry_provider::testing::ProviderTester;
//! use serde_json::json;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! // Point the provider at a mock Sentry API.
//! let tester = ProviderTester::sentry("http://127.0.0.1:8080/api/").await?;
//!
//! let state = tester
//!     .lifecycle_create("sentry_monitor", json!({
//!         "organization": "acme",
//!         "project": "backend",
//!         "type": "cron_job",
//!         "name": "Nightly backup",
//!         "slug": "nightly-backup",
//!         "config": {"schedule_crontab": "0 0 * * *"}
//!     }))
//!     .await?;
//! assert_eq!(state["slug"], "nightly-backup");
//! # Ok(())
//! # }
//! ```

use serde_json::{json, Value};
use thiserror::Error;

use crate::error::ProviderError;
use crate::provider::SentryProvider;
use crate::schema::{has_errors, Diagnostic};
use crate::server::ProviderService;
use crate::types::{ImportedResource, PlanResult};

/// Drives a [`ProviderService`] the way the CLI would.
pub struct ProviderTester<P: ProviderService> {
    provider: P,
}

impl ProviderTester<SentryProvider> {
    /// A Sentry provider configured against `base_url` with a dummy token.
    pub async fn sentry(base_url: &str) -> Result<Self, TestError> {
        let tester = Self::new(SentryProvider::new());
        tester
            .configure(json!({"token": "test-token", "base_url": base_url}))
            .await?;
        Ok(tester)
    }
}

impl<P: ProviderService> ProviderTester<P> {
    /// Wrap a provider.
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    /// The wrapped provider.
    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Configure the provider, failing on error diagnostics.
    pub async fn configure(&self, config: Value) -> Result<(), TestError> {
        let diagnostics = self.provider.configure(config).await?;
        check_diagnostics(diagnostics)
    }

    /// Validate a resource configuration, failing on error diagnostics.
    pub async fn validate_resource_config(
        &self,
        resource_type: &str,
        config: Value,
    ) -> Result<(), TestError> {
        let diagnostics = self
            .provider
            .validate_resource_config(resource_type, config)
            .await?;
        check_diagnostics(diagnostics)
    }

    /// Validate a data source configuration, failing on error diagnostics.
    pub async fn validate_data_source_config(
        &self,
        data_source_type: &str,
        config: Value,
    ) -> Result<(), TestError> {
        let diagnostics = self
            .provider
            .validate_data_source_config(data_source_type, config)
            .await?;
        check_diagnostics(diagnostics)
    }

    /// Plan a create.
    pub async fn plan_create(
        &self,
        resource_type: &str,
        config: Value,
    ) -> Result<PlanResult, ProviderError> {
        self.provider
            .plan(resource_type, None, config.clone(), config)
            .await
    }

    /// Plan an update from `prior_state` to `config`.
    pub async fn plan_update(
        &self,
        resource_type: &str,
        prior_state: Value,
        config: Value,
    ) -> Result<PlanResult, ProviderError> {
        self.provider
            .plan(resource_type, Some(prior_state), config.clone(), config)
            .await
    }

    /// Create a resource from a planned state.
    pub async fn create(
        &self,
        resource_type: &str,
        planned_state: Value,
    ) -> Result<Value, ProviderError> {
        self.provider.create(resource_type, planned_state).await
    }

    /// Refresh a resource. `None` means it was removed remotely.
    pub async fn read(
        &self,
        resource_type: &str,
        state: Value,
    ) -> Result<Option<Value>, ProviderError> {
        self.provider.read(resource_type, state).await
    }

    /// Update a resource.
    pub async fn update(
        &self,
        resource_type: &str,
        prior_state: Value,
        planned_state: Value,
    ) -> Result<Value, ProviderError> {
        self.provider
            .update(resource_type, prior_state, planned_state)
            .await
    }

    /// Run `Delete` against `state`.
    pub async fn delete(&self, resource_type: &str, state: Value) -> Result<(), ProviderError> {
        self.provider.delete(resource_type, state).await
    }

    /// Import a resource by ID.
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
        self.provider
            .read_data_source(data_source_type, config)
            .await
    }

    /// Validate, plan, create and read back a resource.
    pub async fn lifecycle_create(
        &self,
        resource_type: &str,
        config: Value,
    ) -> Result<Value, TestError> {
        self.validate_resource_config(resource_type, config.clone())
            .await?;
        let plan = self.plan_create(resource_type, config).await?;
        let created = self.create(resource_type, plan.planned_state).await?;
        self.read_back(resource_type, created).await
    }

    /// Validate, plan, update and read back a resource.
    pub async fn lifecycle_update(
        &self,
        resource_type: &str,
        prior_state: Value,
        config: Value,
    ) -> Result<Value, TestError> {
        self.validate_resource_config(resource_type, config.clone())
            .await?;
        let plan = self
            .plan_update(resource_type, prior_state.clone(), config)
            .await?;
        let updated = self
            .update(resource_type, prior_state, plan.planned_state)
            .await?;
        self.read_back(resource_type, updated).await
    }

    async fn read_back(&self, resource_type: &str, state: Value) -> Result<Value, TestError> {
        self.read(resource_type, state)
            .await?
            .ok_or_else(|| TestError::Removed(resource_type.to_string()))
    }
}

/// Failure of a harness operation.
#[derive(Debug, Error)]
pub enum TestError {
    /// The operation reported error diagnostics.
    #[error("operation failed with diagnostics:\n{}", format_diagnostics(.0))]
    Diagnostics(Vec<Diagnostic>),
    /// The provider returned an error.
    #[error("provider error: {0}")]
    Provider(#[from] ProviderError),
    /// A read right after a write found nothing.
    #[error("{0} disappeared on read back")]
    Removed(String),
}

fn format_diagnostics(diagnostics: &[Diagnostic]) -> String {
    diagnostics
        .iter()
        .map(|diag| {
            let mut line = format!("  [{:?}] {}", diag.severity, diag.summary);
            if let Some(detail) = &diag.detail {
                line.push_str(&format!(": {}", detail));
            }
            if let Some(attr) = &diag.attribute {
                line.push_str(&format!(" (at {})", attr));
            }
            line
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn check_diagnostics(diagnostics: Vec<Diagnostic>) -> Result<(), TestError> {
    if has_errors(&diagnostics) {
        let errors = diagnostics.into_iter().filter(Diagnostic::is_error);
        Err(TestError::Diagnostics(errors.collect()))
    } else {
        Ok(())
    }
}

/// Assert that a plan creates the resource.
///
/// # Panics
///
/// Panics if the plan has no changes or requires replacement.
pub fn assert_plan_creates(plan: &PlanResult) {
    assert!(
        !plan.changes.is_empty(),
        "Expected plan to have changes for create, but got no changes"
    );
    assert!(
        !plan.requires_replace,
        "Expected plan to create, not replace"
    );
}

/// Assert that a plan has no changes.
///
/// # Panics
///
/// Panics if the plan has any changes.
pub fn assert_plan_no_changes(plan: &PlanResult) {
    assert!(
        plan.changes.is_empty(),
        "Expected no changes, but got {} change(s): {:?}",
        plan.changes.len(),
        plan.changes.iter().map(|c| &c.path).collect::<Vec<_>>()
    );
}

/// Assert that a plan requires replacement.
///
/// # Panics
///
/// Panics if the plan updates in place.
pub fn assert_plan_replaces(plan: &PlanResult) {
    assert!(
        plan.requires_replace,
        "Expected plan to require replacement, but it does not"
    );
}

/// Assert that a plan changes the top-level attribute or block `path`.
///
/// # Panics
///
/// Panics if `path` is not among the plan's changes.
pub fn assert_plan_changes_attribute(plan: &PlanResult, path: &str) {
    assert!(
        plan.changes.iter().any(|c| c.path == path),
        "Expected plan to change attribute '{}'. Changed attributes: {:?}",
        path,
        plan.changes.iter().map(|c| &c.path).collect::<Vec<_>>()
    );
}

/// Assert that an error diagnostic is attached to `attribute`.
///
/// # Panics
///
/// Panics if no error diagnostic points at `attribute`.
pub fn assert_error_at(diagnostics: &[Diagnostic], attribute: &str) {
    assert!(
        diagnostics
            .iter()
            .any(|d| d.is_error() && d.attribute.as_deref() == Some(attribute)),
        "Expected an error at '{}', got: {:?}",
        attribute,
        diagnostics
            .iter()
            .map(|d| (&d.summary, &d.attribute))
            .collect::<Vec<_>>()
    );
}

/// Assert that some error diagnostic's summary contains `substring`.
///
/// # Panics
///
/// Panics if no error summary contains `substring`.
pub fn assert_error_contains(diagnostics: &[Diagnostic], substring: &str) {
    assert!(
        diagnostics
            .iter()
            .any(|d| d.is_error() && d.summary.contains(substring)),
        "Expected an error containing '{}', got: {:?}",
        substring,
        diagnostics.iter().map(|d| &d.summary).collect::<Vec<_>>()
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AttributeChange;

    #[tokio::test]
    async fn test_sentry_tester_rejects_bad_base_url() {
        let err = match ProviderTester::sentry("ftp://example.com/").await {
            Ok(_) => panic!("expected configure to fail"),
            Err(e) => e,
        };
        match err {
            TestError::Diagnostics(diags) => assert_error_at(&diags, "base_url"),
            other => panic!("unexpected error: {}", other),
        }
    }

    #[tokio::test]
    async fn test_validate_reports_diagnostics() {
        let tester = ProviderTester::new(SentryProvider::new());
        let err = tester
            .validate_resource_config("sentry_monitor", json!({}))
            .await
            .unwrap_err();
        let TestError::Diagnostics(diags) = err else {
            panic!("expected diagnostics");
        };
        assert_error_contains(&diags, "Missing required attribute 'organization'");
    }

    #[tokio::test]
    async fn test_plan_create() {
        let tester = ProviderTester::new(SentryProvider::new());
        let plan = tester
            .plan_create(
                "sentry_monitor",
                json!({"organization": "acme", "name": "Nightly", "id": "stale"}),
            )
            .await
            .unwrap();
        assert_plan_creates(&plan);
        assert_plan_changes_attribute(&plan, "organization");
        assert_eq!(plan.planned_state["id"], Value::Null);
    }

    #[test]
    fn test_plan_assertions() {
        let plan = PlanResult::no_change(json!({"name": "a"}));
        assert_plan_no_changes(&plan);

        let plan = PlanResult {
            planned_state: json!({"organization": "b"}),
            changes: vec![AttributeChange::modified("organization", json!("a"), json!("b"))],
            requires_replace: true,
        };
        assert_plan_replaces(&plan);
        assert_plan_changes_attribute(&plan, "organization");
    }

    #[test]
    #[should_panic(expected = "Expected an error at 'token'")]
    fn test_assert_error_at_fails() {
        assert_error_at(
            &[Diagnostic::error("Other").with_attribute("base_url")],
            "token",
        );
    }

    #[test]
    fn test_error_display() {
        let err = TestError::Diagnostics(vec![Diagnostic::attribute_error(
            "config.schedule_interval",
            "Conflicting schedule",
            "Only one of schedule_crontab and schedule_interval can be set",
        )]);
        let text = err.to_string();
        assert!(text.contains("Conflicting schedule"));
        assert!(text.contains("(at config.schedule_interval)"));

        let err = TestError::Removed("sentry_monitor".to_string());
        assert_eq!(err.to_string(), "sentry_monitor disappeared on read back");
    }
}
