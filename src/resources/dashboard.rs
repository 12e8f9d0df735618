//! The `sentry_dashboard` resource.

use serde_json::Value;
use tracing::{debug, info, warn};

use super::{decode_model, encode_model, split_two_part_id, Resource};
use crate::apiclient::{Dashboard, SentryClient};
use crate::diagnostics::{client_error, import_error, missing_id, not_found};
use crate::error::ProviderError;
use crate::models::DashboardModel;
use crate::schema::Schema;

/// Dashboards with their widgets (`sentry_dashboard`).
#[derive(Debug, Default, Clone, Copy)]
pub struct DashboardResource;

impl DashboardResource {
    /// Type name of this resource.
    pub const TYPE_NAME: &'static str = "sentry_dashboard";
}

fn require_internal_id(model: &DashboardModel) -> Result<&str, ProviderError> {
    if model.internal_id.is_empty() {
        return Err(missing_id("dashboard").into());
    }
    Ok(&model.internal_id)
}

fn into_state(organization: &str, dashboard: &Dashboard) -> Result<Value, ProviderError> {
    let mut model = DashboardModel::default();
    model.fill(organization, dashboard);
    encode_model(&model)
}

#[async_trait::async_trait]
impl Resource for DashboardResource {
    fn type_name(&self) -> &'static str {
        Self::TYPE_NAME
    }

    fn schema(&self) -> Schema {
        DashboardModel::resource_schema()
    }

    async fn create(
        &self,
        client: &SentryClient,
        planned_state: Value,
    ) -> Result<Value, ProviderError> {
        let model: DashboardModel = decode_model(planned_state)?;
        let body = model.to_request()?;

        let dashboard = client
            .create_dashboard(&model.organization, &body)
            .await
            .map_err(|e| client_error("create", e))?;

        info!(
            organization = %model.organization,
            id = %dashboard.id,
            widgets = dashboard.widgets.len(),
            "Created dashboard"
        );
        into_state(&model.organization, &dashboard)
    }

    async fn read(
        &self,
        client: &SentryClient,
        state: Value,
    ) -> Result<Option<Value>, ProviderError> {
        let model: DashboardModel = decode_model(state)?;
        let id = require_internal_id(&model)?;

        match client.get_dashboard(&model.organization, id).await {
            Ok(dashboard) => into_state(&model.organization, &dashboard).map(Some),
            Err(e) if e.is_not_found() => {
                warn!(
                    organization = %model.organization,
                    %id,
                    "Dashboard not found, removing from state"
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
        let prior: DashboardModel = decode_model(prior_state)?;
        let planned: DashboardModel = decode_model(planned_state)?;
        let id = require_internal_id(&prior)?;
        let body = planned.to_request()?;

        let dashboard = match client.update_dashboard(&planned.organization, id, &body).await {
            Ok(dashboard) => dashboard,
            Err(e) if e.is_not_found() => return Err(not_found("dashboard").into()),
            Err(e) => return Err(client_error("update", e).into()),
        };

        info!(organization = %planned.organization, %id, "Updated dashboard");
        into_state(&planned.organization, &dashboard)
    }

    async fn delete(&self, client: &SentryClient, state: Value) -> Result<(), ProviderError> {
        let model: DashboardModel = decode_model(state)?;
        let id = require_internal_id(&model)?;

        match client.delete_dashboard(&model.organization, id).await {
            Ok(()) => {
                info!(organization = %model.organization, %id, "Deleted dashboard");
                Ok(())
            },
            Err(e) if e.is_not_found() => {
                debug!(organization = %model.organization, %id, "Dashboard already deleted");
                Ok(())
            },
            Err(e) => Err(client_error("delete", e).into()),
        }
    }

    async fn import(&self, client: &SentryClient, id: &str) -> Result<Value, ProviderError> {
        let (organization, dashboard_id) =
            split_two_part_id(id, "organization", "dashboard-id").map_err(import_error)?;

        let dashboard = match client.get_dashboard(organization, dashboard_id).await {
            Ok(dashboard) => dashboard,
            Err(e) if e.is_not_found() => return Err(not_found("dashboard").into()),
            Err(e) => return Err(client_error("import", e).into()),
        };

        into_state(organization, &dashboard)
    }
}
