//! The Sentry provider: type registry, configuration and dispatch.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::RwLock;
use tracing::info;

use crate::apiclient::SentryClient;
use crate::config::ProviderConfig;
use crate::data_sources::{DashboardDataSource, DataSource};
use crate::error::ProviderError;
use crate::resources::{DashboardResource, MonitorResource, Resource};
use crate::schema::{has_errors, Diagnostic, ProviderSchema};
use crate::server::ProviderService;
use crate::types::{ImportedResource, PlanResult};
use crate::validation::validate;

/// Provider serving `sentry_*` resources and data sources.
pub struct SentryProvider {
    client: RwLock<Option<SentryClient>>,
    resources: BTreeMap<&'static str, Arc<dyn Resource>>,
    data_sources: BTreeMap<&'static str, Arc<dyn DataSource>>,
}

impl Default for SentryProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl SentryProvider {
    /// An unconfigured provider with every type registered.
    pub fn new() -> Self {
        let resources: Vec<Arc<dyn Resource>> =
            vec![Arc::new(MonitorResource), Arc::new(DashboardResource)];
        let data_sources: Vec<Arc<dyn DataSource>> = vec![Arc::new(DashboardDataSource)];

        Self {
            client: RwLock::new(None),
            resources: resources.into_iter().map(|r| (r.type_name(), r)).collect(),
            data_sources: data_sources.into_iter().map(|d| (d.type_name(), d)).collect(),
        }
    }

    /// A provider that is already configured with `client`.
    pub fn with_client(client: SentryClient) -> Self {
        Self {
            client: RwLock::new(Some(client)),
            ..Self::new()
        }
    }

    async fn client(&self) -> Result<SentryClient, ProviderError> {
        self.client.read().await.clone().ok_or_else(|| {
            Diagnostic::error("Provider not configured")
                .with_detail("The provider must be configured before resources can be managed")
                .into()
        })
    }

    fn resource(&self, resource_type: &str) -> Result<&Arc<dyn Resource>, ProviderError> {
        self.resources
            .get(resource_type)
            .ok_or_else(|| ProviderError::UnknownResource(resource_type.to_string()))
    }

    fn data_source(&self, data_source_type: &str) -> Result<&Arc<dyn DataSource>, ProviderError> {
        self.data_sources
            .get(data_source_type)
            .ok_or_else(|| ProviderError::UnknownResource(data_source_type.to_string()))
    }
}

#[async_trait::async_trait]
impl ProviderService for SentryProvider {
    fn schema(&self) -> ProviderSchema {
        let schema = ProviderSchema::new().with_provider_config(ProviderConfig::schema());
        let schema = self
            .resources
            .values()
            .fold(schema, |schema, r| {
                schema.with_resource(r.type_name(), r.schema())
            });
        self.data_sources
            .values()
            .fold(schema, |schema, d| {
                schema.with_data_source(d.type_name(), d.schema())
            })
    }

    async fn validate_provider_config(
        &self,
        config: Value,
    ) -> Result<Vec<Diagnostic>, ProviderError> {
        Ok(validate(&ProviderConfig::schema(), &config))
    }

    async fn configure(&self, config: Value) -> Result<Vec<Diagnostic>, ProviderError> {
        let config: ProviderConfig = serde_json::from_value(config)?;
        let resolved = match config.resolve() {
            Ok(resolved) => resolved,
            Err(diagnostics) => return Ok(diagnostics),
        };

        let client = resolved.client()?;
        *self.client.write().await = Some(client);

        info!(base_url = %resolved.base_url, "Provider configured");
        Ok(vec![])
    }

    async fn stop(&self) -> Result<(), ProviderError> {
        info!("Provider stopping");
        Ok(())
    }

    async fn validate_resource_config(
        &self,
        resource_type: &str,
        config: Value,
    ) -> Result<Vec<Diagnostic>, ProviderError> {
        let resource = self.resource(resource_type)?;
        let mut diagnostics = validate(&resource.schema(), &config);
        if !has_errors(&diagnostics) {
            diagnostics.extend(resource.validate(config)?);
        }
        Ok(diagnostics)
    }

    async fn plan(
        &self,
        resource_type: &str,
        prior_state: Option<Value>,
        proposed_state: Value,
        _config: Value,
    ) -> Result<PlanResult, ProviderError> {
        let resource = self.resource(resource_type)?;
        Ok(crate::plan::plan(
            &resource.schema(),
            prior_state.as_ref(),
            &proposed_state,
        ))
    }

    async fn create(
        &self,
        resource_type: &str,
        planned_state: Value,
    ) -> Result<Value, ProviderError> {
        let resource = self.resource(resource_type)?;
        resource.create(&self.client().await?, planned_state).await
    }

    async fn read(
        &self,
        resource_type: &str,
        current_state: Value,
    ) -> Result<Option<Value>, ProviderError> {
        let resource = self.resource(resource_type)?;
        resource.read(&self.client().await?, current_state).await
    }

    async fn update(
        &self,
        resource_type: &str,
        prior_state: Value,
        planned_state: Value,
    ) -> Result<Value, ProviderError> {
        let resource = self.resource(resource_type)?;
        resource
            .update(&self.client().await?, prior_state, planned_state)
            .await
    }

    async fn delete(&self, resource_type: &str, current_state: Value) -> Result<(), ProviderError> {
        let resource = self.resource(resource_type)?;
        resource.delete(&self.client().await?, current_state).await
    }

    async fn import_resource(
        &self,
        resource_type: &str,
        id: &str,
    ) -> Result<Vec<ImportedResource>, ProviderError> {
        let resource = self.resource(resource_type)?;
        let state = resource.import(&self.client().await?, id).await?;
        Ok(vec![ImportedResource {
            resource_type: resource_type.to_string(),
            state,
        }])
    }

    async fn validate_data_source_config(
        &self,
        data_source_type: &str,
        config: Value,
    ) -> Result<Vec<Diagnostic>, ProviderError> {
        let data_source = self.data_source(data_source_type)?;
        let mut diagnostics = validate(&data_source.schema(), &config);
        if !has_errors(&diagnostics) {
            diagnostics.extend(data_source.validate(config)?);
        }
        Ok(diagnostics)
    }

    async fn read_data_source(
        &self,
        data_source_type: &str,
        config: Value,
    ) -> Result<Value, ProviderError> {
        let data_source = self.data_source(data_source_type)?;
        data_source.read(&self.client().await?, config).await
    }
}
