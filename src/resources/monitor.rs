//! The `sentry_monitor` resource.

use serde_json::Value;
use tracing::{debug, info, warn};

use super::{decode_model, split_two_part_id, Resource};
use crate::apiclient::{Monitor, SentryClient};
use crate::diagnostics::{client_error, fill_error, import_error, missing_id, not_found};
use crate::error::ProviderError;
use crate::models::MonitorModel;
use crate::schema::{Diagnostic, Schema};

/// Cron monitors (`sentry_monitor`).
#[derive(Debug, Default, Clone, Copy)]
pub struct MonitorResource;

impl MonitorResource {
    /// Type name of this resource.
    pub const TYPE_NAME: &'static str = "sentry_monitor";
}

fn require_id(model: &MonitorModel) -> Result<String, ProviderError> {
    match model.id.as_deref() {
        Some(id) if !id.is_empty() => Ok(id.to_string()),
        _ => Err(missing_id("monitor").into()),
    }
}

/// State filled from `monitor`, plus whatever went wrong while filling it.
fn fill_state(
    organization: &str,
    monitor: &Monitor,
) -> Result<(Value, Vec<Diagnostic>), ProviderError> {
    let mut model = MonitorModel::default();
    let diagnostics = model.fill(organization, monitor);
    let state = serde_json::to_value(&model).map_err(fill_error)?;
    Ok((state, diagnostics))
}

fn into_state(organization: &str, monitor: &Monitor) -> Result<Value, ProviderError> {
    let (state, diagnostics) = fill_state(organization, monitor)?;
    ProviderError::check(diagnostics)?;
    Ok(state)
}

/// Like `into_state` for a monitor that was just written: fill errors keep
/// the state so the monitor stays tracked.
fn into_written_state(organization: &str, monitor: &Monitor) -> Result<Value, ProviderError> {
    let (state, diagnostics) = fill_state(organization, monitor)?;
    ProviderError::check_state(state, diagnostics)
}

#[async_trait::async_trait]
impl Resource for MonitorResource {
    fn type_name(&self) -> &'static str {
        Self::TYPE_NAME
    }

    fn schema(&self) -> Schema {
        MonitorModel::schema()
    }

    fn validate(&self, config: Value) -> Result<Vec<Diagnostic>, ProviderError> {
        let model: MonitorModel = decode_model(config)?;
        Ok(model.validate())
    }

    async fn create(
        &self,
        client: &SentryClient,
        planned_state: Value,
    ) -> Result<Value, ProviderError> {
        let model: MonitorModel = decode_model(planned_state)?;
        let body = model.to_request().map_err(ProviderError::Diagnostics)?;

        let monitor = client
            .create_monitor(&model.organization, &body)
            .await
            .map_err(|e| client_error("create", e))?;

        info!(organization = %model.organization, id = %monitor.id, "Created monitor");
        into_written_state(&model.organization, &monitor)
    }

    async fn read(
        &self,
        client: &SentryClient,
        state: Value,
    ) -> Result<Option<Value>, ProviderError> {
        let model: MonitorModel = decode_model(state)?;
        let id = require_id(&model)?;

        match client.get_monitor(&model.organization, &id).await {
            Ok(monitor) => into_state(&model.organization, &monitor).map(Some),
            Err(e) if e.is_not_found() => {
                warn!(
                    organization = %model.organization,
                    %id,
                    "Monitor not found, removing from state"
                );
                Ok(None)
            },
            Err(e) => Err(client_error("read", e).into()),
        }
    }

    async fn update(
        &self,
        client: &SentryClient,
        prior_state: Value,
        planned_state: Value,
    ) -> Result<Value, ProviderError> {
        let prior: MonitorModel = decode_model(prior_state)?;
        let planned: MonitorModel = decode_model(planned_state)?;
        let id = require_id(&prior)?;
        let body = planned.to_request().map_err(ProviderError::Diagnostics)?;

        let monitor = match client.update_monitor(&planned.organization, &id, &body).await {
            Ok(monitor) => monitor,
            Err(e) if e.is_not_found() => return Err(not_found("monitor").into()),
            Err(e) => return Err(client_error("update", e).into()),
        };

        info!(organization = %planned.organization, %id, "Updated monitor");
        into_written_state(&planned.organization, &monitor)
    }

    async fn delete(&self, client: &SentryClient, state: Value) -> Result<(), ProviderError> {
        let model: MonitorModel = decode_model(state)?;
        let id = require_id(&model)?;

        match client.delete_monitor(&model.organization, &id).await {
            Ok(()) => {
                info!(organization = %model.organization, %id, "Deleted monitor");
                Ok(())
            },
            Err(e) if e.is_not_found() => {
                debug!(organization = %model.organization, %id, "Monitor already deleted");
                Ok(())
            },
            Err(e) => Err(client_error("delete", e).into()),
        }
    }

    async fn import(&self, client: &SentryClient, id: &str) -> Result<Value, ProviderError> {
        let (organization, monitor_id) =
            split_two_part_id(id, "organization", "monitor-id").map_err(import_error)?;

        let monitor = match client.get_monitor(organization, monitor_id).await {
            Ok(monitor) => monitor,
            Err(e) if e.is_not_found() => return Err(not_found("monitor").into()),
            Err(e) => return Err(client_error("import", e).into()),
        };

        into_state(organization, &monitor)
    }
}
