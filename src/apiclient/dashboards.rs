//! Dashboard endpoints.

#![allow(missing_docs)]

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{ApiError, SentryClient};

/// A dashboard with its widgets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub widgets: Vec<DashboardWidget>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardWidget {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub display_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub widget_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<i64>,
    #[serde(default)]
    pub queries: Vec<WidgetQuery>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout: Option<WidgetLayout>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetQuery {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub fields: Vec<String>,
    #[serde(default)]
    pub aggregates: Vec<String>,
    #[serde(default)]
    pub columns: Vec<String>,
    #[serde(default)]
    pub field_aliases: Vec<String>,
    #[serde(default)]
    pub conditions: String,
    #[serde(default)]
    pub orderby: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetLayout {
    pub x: i64,
    pub y: i64,
    pub w: i64,
    pub h: i64,
    #[serde(default)]
    pub min_h: i64,
}

/// Body of `POST` and `PUT` on dashboards. Widgets replace the existing set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardRequest {
    pub title: String,
    pub widgets: Vec<DashboardWidget>,
}

impl SentryClient {
    /// `POST 0/organizations/{org}/dashboards/`
    pub async fn create_dashboard(
        &self,
        organization: &str,
        body: &DashboardRequest,
    ) -> Result<Dashboard, ApiError> {
        let url = self.endpoint(&["0", "organizations", organization, "dashboards"])?;
        debug!(%url, title = %body.title, "Creating dashboard");
        self.send_json(self.http.post(url).json(body)).await
    }

    /// `GET 0/organizations/{org}/dashboards/{id}/`
    pub async fn get_dashboard(&self, organization: &str, id: &str) -> Result<Dashboard, ApiError> {
        let url = self.endpoint(&["0", "organizations", organization, "dashboards", id])?;
        debug!(%url, "Fetching dashboard");
        self.send_json(self.http.get(url)).await
    }

    /// `PUT 0/organizations/{org}/dashboards/{id}/`
    pub async fn update_dashboard(
        &self,
        organization: &str,
        id: &str,
        body: &DashboardRequest,
    ) -> Result<Dashboard, ApiError> {
        let url = self.endpoint(&["0", "organizations", organization, "dashboards", id])?;
        debug!(%url, "Updating dashboard");
        self.send_json(self.http.put(url).json(body)).await
    }

    /// `DELETE 0/organizations/{org}/dashboards/{id}/`
    pub async fn delete_dashboard(&self, organization: &str, id: &str) -> Result<(), ApiError> {
        let url = self.endpoint(&["0", "organizations", organization, "dashboards", id])?;
        debug!(%url, "Deleting dashboard");
        self.send_empty(self.http.delete(url)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_dashboard_deserialize() {
        let dashboard: Dashboard = serde_json::from_value(json!({
            "id": "11",
            "title": "Errors",
            "dateCreated": "2024-01-01T00:00:00Z",
            "widgets": [{
                "title": "Custom Widget",
                "displayType": "world_map",
                "interval": "5m",
                "widgetType": "discover",
                "queries": [{
                    "name": "Metric",
                    "fields": ["count()"],
                    "aggregates": ["count()"],
                    "columns": [],
                    "fieldAliases": [],
                    "conditions": "!event.type:transaction",
                    "orderby": ""
                }],
                "layout": {"x": 0, "y": 0, "w": 2, "h": 1, "minH": 1}
            }]
        }))
        .unwrap();

        assert_eq!(dashboard.widgets.len(), 1);
        let widget = &dashboard.widgets[0];
        assert_eq!(widget.display_type, "world_map");
        assert_eq!(widget.limit, None);
        assert_eq!(widget.queries[0].conditions, "!event.type:transaction");
        assert_eq!(widget.layout.unwrap().min_h, 1);
    }

    #[test]
    fn test_request_omits_unset_widget_fields() {
        let body = DashboardRequest {
            title: "Errors".to_string(),
            widgets: vec![DashboardWidget {
                title: "Custom Widget".to_string(),
                display_type: "world_map".to_string(),
                interval: None,
                widget_type: None,
                limit: None,
                queries: vec![],
                layout: Some(WidgetLayout {
                    x: 0,
                    y: 0,
                    w: 2,
                    h: 1,
                    min_h: 1,
                }),
            }],
        };

        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({
                "title": "Errors",
                "widgets": [{
                    "title": "Custom Widget",
                    "displayType": "world_map",
                    "queries": [],
                    "layout": {"x": 0, "y": 0, "w": 2, "h": 1, "minH": 1}
                }]
            })
        );
    }
}
