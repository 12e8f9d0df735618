//! Cron monitor endpoints.
//!
//! Wire structs mirror the API's field names one-to-one.

#![allow(missing_docs)]

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use super::{ApiError, SentryClient};

/// A monitor as returned by the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Monitor {
    pub id: String,
    pub slug: String,
    pub name: String,
    pub status: String,
    #[serde(rename = "type")]
    pub monitor_type: String,
    #[serde(default)]
    pub is_muted: bool,
    #[serde(default)]
    pub owner: Option<MonitorOwner>,
    pub project: MonitorProject,
    pub config: MonitorConfig,
}

/// The actor owning a monitor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitorOwner {
    #[serde(rename = "type")]
    pub owner_type: String,
    pub id: FlexibleId,
}

/// The project a monitor belongs to. Other project fields are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitorProject {
    pub slug: String,
}

/// Monitor configuration as returned by the API.
///
/// `schedule` is a crontab string or a `[value, unit]` pair depending on
/// `schedule_type`; see [`crate::schedule::Schedule::from_api`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitorConfig {
    pub schedule_type: String,
    pub schedule: Value,
    #[serde(default)]
    pub checkin_margin: Option<i64>,
    #[serde(default)]
    pub max_runtime: Option<i64>,
    #[serde(default)]
    pub timezone: Option<String>,
    #[serde(default)]
    pub failure_issue_threshold: Option<i64>,
    #[serde(default)]
    pub recovery_threshold: Option<i64>,
    #[serde(default)]
    pub alert_rule_id: Option<FlexibleId>,
}

/// An identifier the API sends either as a JSON number or a string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FlexibleId {
    Number(i64),
    String(String),
}

impl FlexibleId {
    /// Parse the identifier as an integer.
    pub fn as_i64(&self) -> Result<i64, std::num::ParseIntError> {
        match self {
            FlexibleId::Number(n) => Ok(*n),
            FlexibleId::String(s) => s.parse(),
        }
    }
}

impl std::fmt::Display for FlexibleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FlexibleId::Number(n) => write!(f, "{}", n),
            FlexibleId::String(s) => f.write_str(s),
        }
    }
}

/// Body for creating or updating a monitor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonitorRequest {
    pub project: String,
    pub name: String,
    pub slug: String,
    #[serde(rename = "type")]
    pub monitor_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_muted: Option<bool>,
    pub config: MonitorConfigRequest,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonitorConfigRequest {
    pub schedule_type: String,
    pub schedule: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checkin_margin: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_runtime: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_issue_threshold: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recovery_threshold: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alert_rule_id: Option<i64>,
}

impl SentryClient {
    /// `POST 0/organizations/{org}/monitors/`
    pub async fn create_monitor(
        &self,
        organization: &str,
        body: &MonitorRequest,
    ) -> Result<Monitor, ApiError> {
        let url = self.endpoint(&["0", "organizations", organization, "monitors"])?;
        debug!(%url, slug = %body.slug, "Creating monitor");
        self.send_json(self.http.post(url).json(body)).await
    }

    /// `GET 0/organizations/{org}/monitors/{id}/`
    pub async fn get_monitor(&self, organization: &str, id: &str) -> Result<Monitor, ApiError> {
        let url = self.endpoint(&["0", "organizations", organization, "monitors", id])?;
        debug!(%url, "Fetching monitor");
        self.send_json(self.http.get(url)).await
    }

    /// `PUT 0/organizations/{org}/monitors/{id}/`
    pub async fn update_monitor(
        &self,
        organization: &str,
        id: &str,
        body: &MonitorRequest,
    ) -> Result<Monitor, ApiError> {
        let url = self.endpoint(&["0", "organizations", organization, "monitors", id])?;
        debug!(%url, "Updating monitor");
        self.send_json(self.http.put(url).json(body)).await
    }

    /// `DELETE 0/organizations/{org}/monitors/{id}/`
    pub async fn delete_monitor(&self, organization: &str, id: &str) -> Result<(), ApiError> {
        let url = self.endpoint(&["0", "organizations", organization, "monitors", id])?;
        debug!(%url, "Deleting monitor");
        self.send_empty(self.http.delete(url)).await
    }
}
