//! State model of the `sentry_monitor` resource.

use serde::{Deserialize, Serialize};

use crate::apiclient::{Monitor, MonitorConfig, MonitorConfigRequest, MonitorRequest};
use crate::models::owner::Owner;
use crate::schedule::{IntervalModel, Schedule};
use crate::schema::{join_path, Attribute, Block, Diagnostic, NestedBlock, Schema};

/// The only monitor type the API accepts.
pub const CRON_JOB: &str = "cron_job";

const STATUSES: [&str; 2] = ["active", "disabled"];

/// State of a `sentry_monitor` resource.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorModel {
    /// Monitor ID assigned by Sentry.
    pub id: Option<String>,
    /// Organization slug.
    pub organization: String,
    /// Project slug.
    pub project: String,
    /// Monitor type, always `cron_job`.
    #[serde(rename = "type")]
    pub monitor_type: String,
    /// Display name.
    pub name: String,
    /// URL-safe identifier, unique within the organization.
    pub slug: String,
    /// `user:<id>` or `team:<id>`.
    pub owner: Option<String>,
    /// Check-in configuration.
    pub config: MonitorConfigModel,
    /// Whether alerts are muted.
    pub is_muted: Option<bool>,
    /// `active` or `disabled`.
    pub status: Option<String>,
}

/// The `config` block of a monitor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfigModel {
    /// Crontab schedule; conflicts with `schedule_interval`.
    pub schedule_crontab: Option<String>,
    /// Interval schedule; conflicts with `schedule_crontab`.
    pub schedule_interval: Option<IntervalModel>,
    /// Minutes after the expected time before a check-in is considered missed.
    pub checkin_margin: Option<i64>,
    /// Minutes a check-in may stay in progress before it is marked timed out.
    pub max_runtime: Option<i64>,
    /// tz database name the crontab is evaluated in.
    pub timezone: Option<String>,
    /// Consecutive failures before an issue is created.
    pub failure_issue_threshold: Option<i64>,
    /// Consecutive successes before an issue is resolved.
    pub recovery_threshold: Option<i64>,
    /// Alert rule attached to the monitor.
    pub alert_rule_id: Option<i64>,
}

impl MonitorModel {
    /// Resource schema.
    pub fn schema() -> Schema {
        Schema::v0()
            .with_description("A cron monitor bound to a project.")
            .with_attribute(
                "id",
                Attribute::computed_string().with_description("The ID of this resource."),
            )
            .with_attribute(
                "organization",
                Attribute::required_string()
                    .with_description("The organization the monitor belongs to.")
                    .with_force_new(),
            )
            .with_attribute(
                "project",
                Attribute::required_string()
                    .with_description("The project the monitor belongs to."),
            )
            .with_attribute(
                "type",
                Attribute::required_string()
                    .with_description("The monitor type. Only `cron_job` is supported."),
            )
            .with_attribute("name", Attribute::required_string())
            .with_attribute("slug", Attribute::required_string())
            .with_attribute(
                "owner",
                Attribute::optional_string()
                    .with_description("The owning actor, as `user:<id>` or `team:<id>`."),
            )
            .with_attribute("is_muted", Attribute::optional_computed_bool())
            .with_attribute(
                "status",
                Attribute::optional_computed_string()
                    .with_description("`active` or `disabled`."),
            )
            .with_block(
                "config",
                NestedBlock::required_single(MonitorConfigModel::block()),
            )
    }

    /// Copy an API monitor into this model.
    ///
    /// The organization is not part of the API response and comes from the
    /// request context.
    pub fn fill(&mut self, organization: &str, monitor: &Monitor) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();

        self.id = Some(monitor.id.clone());
        self.organization = organization.to_string();
        self.project = monitor.project.slug.clone();
        self.monitor_type = monitor.monitor_type.clone();
        self.name = monitor.name.clone();
        self.slug = monitor.slug.clone();
        self.status = Some(monitor.status.clone());
        self.is_muted = Some(monitor.is_muted);

        self.owner = match &monitor.owner {
            None => None,
            Some(owner) => match Owner::from_api(owner) {
                Ok(owner) => Some(owner.to_string()),
                Err(e) => {
                    diagnostics.push(Diagnostic::attribute_error(
                        "owner",
                        "Invalid owner",
                        e.to_string(),
                    ));
                    None
                },
            },
        };

        diagnostics.extend(self.config.fill("config", &monitor.config));
        diagnostics
    }

    /// Build the create/update body, reporting every invalid attribute.
    pub fn to_request(&self) -> Result<MonitorRequest, Vec<Diagnostic>> {
        let mut diagnostics = Vec::new();

        if self.monitor_type != CRON_JOB {
            diagnostics.push(Diagnostic::attribute_error(
                "type",
                "Unsupported monitor type",
                format!("Expected \"{}\", got {:?}", CRON_JOB, self.monitor_type),
            ));
        }

        if let Some(status) = &self.status {
            if !STATUSES.contains(&status.as_str()) {
                diagnostics.push(Diagnostic::attribute_error(
                    "status",
                    "Invalid status",
                    format!("Expected one of {:?}, got {:?}", STATUSES, status),
                ));
            }
        }

        let owner = match self.owner.as_deref().map(str::parse::<Owner>) {
            None => None,
            Some(Ok(owner)) => Some(owner.to_string()),
            Some(Err(e)) => {
                diagnostics.push(Diagnostic::attribute_error(
                    "owner",
                    "Invalid owner",
                    e.to_string(),
                ));
                None
            },
        };

        let config = match self.config.to_request("config") {
            Ok(config) => Some(config),
            Err(diags) => {
                diagnostics.extend(diags);
                None
            },
        };

        match config {
            Some(config) if diagnostics.is_empty() => Ok(MonitorRequest {
                project: self.project.clone(),
                name: self.name.clone(),
                slug: self.slug.clone(),
                monitor_type: self.monitor_type.clone(),
                owner,
                status: self.status.clone(),
                is_muted: self.is_muted,
                config,
            }),
            _ => Err(diagnostics),
        }
    }

    /// Semantic validation beyond the schema's structural checks.
    pub fn validate(&self) -> Vec<Diagnostic> {
        self.to_request().err().unwrap_or_default()
    }
}

impl MonitorConfigModel {
    fn block() -> Block {
        let interval = ["year", "month", "week", "day", "hour", "minute"]
            .into_iter()
            .fold(Block::new(), |block, unit| {
                block.with_attribute(unit, Attribute::optional_int64())
            })
            .with_description("Run every N units. Exactly one unit may be set.");

        Block::new()
            .with_attribute(
                "schedule_crontab",
                Attribute::optional_string()
                    .with_description("Crontab schedule. Conflicts with `schedule_interval`."),
            )
            .with_block("schedule_interval", NestedBlock::single(interval))
            .with_attribute("checkin_margin", Attribute::optional_computed_int64())
            .with_attribute("max_runtime", Attribute::optional_computed_int64())
            .with_attribute("timezone", Attribute::optional_computed_string())
            .with_attribute(
                "failure_issue_threshold",
                Attribute::optional_computed_int64(),
            )
            .with_attribute("recovery_threshold", Attribute::optional_computed_int64())
            .with_attribute("alert_rule_id", Attribute::optional_int64())
    }

    fn fill(&mut self, path: &str, config: &MonitorConfig) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();

        match Schedule::from_api(&config.schedule_type, &config.schedule) {
            Ok(schedule) => {
                let (crontab, interval) = schedule.to_state();
                self.schedule_crontab = crontab;
                self.schedule_interval = interval;
            },
            Err(e) => diagnostics.push(Diagnostic::attribute_error(
                join_path(path, "schedule"),
                e.summary(),
                e.to_string(),
            )),
        }

        self.checkin_margin = config.checkin_margin;
        self.max_runtime = config.max_runtime;
        self.timezone = config.timezone.clone();
        self.failure_issue_threshold = config.failure_issue_threshold;
        self.recovery_threshold = config.recovery_threshold;

        self.alert_rule_id = match &config.alert_rule_id {
            None => None,
            Some(id) => match id.as_i64() {
                Ok(id) => Some(id),
                Err(e) => {
                    diagnostics.push(Diagnostic::attribute_error(
                        join_path(path, "alert_rule_id"),
                        "Invalid alert rule ID",
                        e.to_string(),
                    ));
                    None
                },
            },
        };

        diagnostics
    }

    fn to_request(&self, path: &str) -> Result<MonitorConfigRequest, Vec<Diagnostic>> {
        let schedule = Schedule::from_state(
            path,
            self.schedule_crontab.as_deref(),
            self.schedule_interval.as_ref(),
        )?;
        let (schedule_type, schedule) = schedule.to_api();

        Ok(MonitorConfigRequest {
            schedule_type: schedule_type.to_string(),
            schedule,
            checkin_margin: self.checkin_margin,
            max_runtime: self.max_runtime,
            timezone: self.timezone.clone(),
            failure_issue_threshold: self.failure_issue_threshold,
            recovery_threshold: self.recovery_threshold,
            alert_rule_id: self.alert_rule_id,
        })
    }
}
