//! The `sentry_dashboard` data source.

use serde_json::Value;
use tracing::debug;

use super::DataSource;
use crate::apiclient::SentryClient;
use crate::diagnostics::{client_error, not_found};
use crate::error::ProviderError;
use crate::models::DashboardModel;
use crate::resources::{decode_model, encode_model};
use crate::schema::Schema;

/// Dashboard lookup (`sentry_dashboard`).
#[derive(Debug, Default, Clone, Copy)]
pub struct DashboardDataSource;

impl DashboardDataSource {
    /// Type name of this data source.
    pub const TYPE_NAME: &'static str = "sentry_dashboard";
}

#[async_trait::async_trait]
impl DataSource for DashboardDataSource {
    fn type_name(&self) -> &'static str {
        Self::TYPE_NAME
    }

    fn schema(&self) -> Schema {
        DashboardModel::data_source_schema()
    }

    async fn read(&self, client: &SentryClient, config: Value) -> Result<Value, ProviderError> {
        let mut model: DashboardModel = decode_model(config)?;

        let dashboard = match client.get_dashboard(&model.organization, &model.internal_id).await {
            Ok(dashboard) => dashboard,
            Err(e) if e.is_not_found() => return Err(not_found("dashboard").into()),
            Err(e) => return Err(client_error("read", e).into()),
        };

        debug!(
            organization = %model.organization,
            id = %dashboard.id,
            widgets = dashboard.widgets.len(),
            "Read dashboard"
        );
        let organization = std::mem::take(&mut model.organization);
        model.fill(&organization, &dashboard);
        encode_model(&model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;
    use url::Url;

    fn client(server: &MockServer) -> SentryClient {
        SentryClient::new(Url::parse(&server.url("/api/")).unwrap(), "secret").unwrap()
    }

    #[tokio::test]
    async fn test_read() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/api/0/organizations/acme/dashboards/11/")
                    .header("authorization", "Bearer secret");
                then.status(200).json_body(json!({
                    "id": "11",
                    "title": "Errors",
                    "widgets": []
                }));
            })
            .await;

        let state = DashboardDataSource
            .read(
                &client(&server),
                json!({"organization": "acme", "internal_id": "11"}),
            )
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(state["id"], "acme/11");
        assert_eq!(state["title"], "Errors");
        assert_eq!(state["widget"], json!([]));
    }

    #[tokio::test]
    async fn test_read_missing_dashboard() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/api/0/organizations/acme/dashboards/99/");
                then.status(404);
            })
            .await;

        let err = DashboardDataSource
            .read(
                &client(&server),
                json!({"organization": "acme", "internal_id": "99"}),
            )
            .await
            .unwrap_err();
        let diags = err.into_diagnostics();
        assert_eq!(diags[0].summary, "Not found");
        assert_eq!(
            diags[0].detail.as_deref(),
            Some("No matching dashboard found")
        );
    }
}
