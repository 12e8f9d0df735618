//! Monitor schedules.
//!
//! The API carries a schedule as `schedule_type` plus a polymorphic
//! `schedule` value: a crontab string, or a `[value, unit]` pair. In state the
//! same information is split across two mutually exclusive attributes,
//! `schedule_crontab` and the `schedule_interval` block with one field per
//! unit. [`Schedule`] is the single typed form both sides convert through.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

use crate::schema::{join_path, Diagnostic};

/// `schedule_type` for crontab schedules.
pub const CRONTAB: &str = "crontab";
/// `schedule_type` for interval schedules.
pub const INTERVAL: &str = "interval";

/// Unit of an interval schedule.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntervalUnit {
    Year,
    Month,
    Week,
    Day,
    Hour,
    Minute,
}

impl IntervalUnit {
    /// All units, largest first.
    pub const ALL: [IntervalUnit; 6] = [
        IntervalUnit::Year,
        IntervalUnit::Month,
        IntervalUnit::Week,
        IntervalUnit::Day,
        IntervalUnit::Hour,
        IntervalUnit::Minute,
    ];

    /// The API and attribute name of the unit.
    pub fn as_str(&self) -> &'static str {
        match self {
            IntervalUnit::Year => "year",
            IntervalUnit::Month => "month",
            IntervalUnit::Week => "week",
            IntervalUnit::Day => "day",
            IntervalUnit::Hour => "hour",
            IntervalUnit::Minute => "minute",
        }
    }
}

impl fmt::Display for IntervalUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IntervalUnit {
    type Err = ScheduleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        IntervalUnit::ALL
            .into_iter()
            .find(|unit| unit.as_str() == s)
            .ok_or_else(|| ScheduleError::UnknownUnit(s.to_string()))
    }
}

/// Why an API schedule could not be understood.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScheduleError {
    /// `schedule_type` is neither `crontab` nor `interval`.
    #[error("unknown schedule type {0:?}")]
    UnknownType(String),
    /// A crontab schedule whose value is not a string.
    #[error("expected a crontab string, got {0}")]
    ExpectedCrontab(Value),
    /// An interval schedule whose value is not an `[integer, unit]` pair.
    #[error("expected a [value, unit] pair, got {0}")]
    ExpectedInterval(Value),
    /// An interval unit outside [`IntervalUnit::ALL`].
    #[error("unknown interval unit {0:?}")]
    UnknownUnit(String),
}

impl ScheduleError {
    /// Diagnostic summary: an unknown type and a bad value read differently.
    pub fn summary(&self) -> &'static str {
        match self {
            ScheduleError::UnknownType(_) => "Invalid schedule type",
            _ => "Invalid schedule",
        }
    }
}

/// A monitor schedule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Schedule {
    /// A crontab expression such as `0 0 * * *`.
    Crontab(String),
    /// Every `value` `unit`s.
    Interval {
        /// Number of units between check-ins.
        value: i64,
        /// The unit of `value`.
        unit: IntervalUnit,
    },
}

/// State form of an interval schedule: one optional field per unit.
#[allow(missing_docs)]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntervalModel {
    pub year: Option<i64>,
    pub month: Option<i64>,
    pub week: Option<i64>,
    pub day: Option<i64>,
    pub hour: Option<i64>,
    pub minute: Option<i64>,
}

impl IntervalModel {
    fn get(&self, unit: IntervalUnit) -> Option<i64> {
        match unit {
            IntervalUnit::Year => self.year,
            IntervalUnit::Month => self.month,
            IntervalUnit::Week => self.week,
            IntervalUnit::Day => self.day,
            IntervalUnit::Hour => self.hour,
            IntervalUnit::Minute => self.minute,
        }
    }

    fn slot(&mut self, unit: IntervalUnit) -> &mut Option<i64> {
        match unit {
            IntervalUnit::Year => &mut self.year,
            IntervalUnit::Month => &mut self.month,
            IntervalUnit::Week => &mut self.week,
            IntervalUnit::Day => &mut self.day,
            IntervalUnit::Hour => &mut self.hour,
            IntervalUnit::Minute => &mut self.minute,
        }
    }

    /// The units that are set, largest first.
    pub fn set_units(&self) -> Vec<(IntervalUnit, i64)> {
        IntervalUnit::ALL
            .into_iter()
            .filter_map(|unit| self.get(unit).map(|value| (unit, value)))
            .collect()
    }
}

impl Schedule {
    /// Parse the API's `schedule_type` and `schedule` fields.
    pub fn from_api(schedule_type: &str, schedule: &Value) -> Result<Self, ScheduleError> {
        match schedule_type {
            CRONTAB => schedule
                .as_str()
                .map(|s| Schedule::Crontab(s.to_string()))
                .ok_or_else(|| ScheduleError::ExpectedCrontab(schedule.clone())),
            INTERVAL => {
                let bad = || ScheduleError::ExpectedInterval(schedule.clone());
                let [value, unit] = schedule.as_array().map(Vec::as_slice).ok_or_else(bad)? else {
                    return Err(bad());
                };
                let value = value.as_i64().ok_or_else(bad)?;
                let unit = unit.as_str().ok_or_else(bad)?.parse::<IntervalUnit>()?;
                Ok(Schedule::Interval { value, unit })
            },
            other => Err(ScheduleError::UnknownType(other.to_string())),
        }
    }

    /// The `(schedule_type, schedule)` pair sent to the API.
    pub fn to_api(&self) -> (&'static str, Value) {
        match self {
            Schedule::Crontab(expr) => (CRONTAB, Value::String(expr.clone())),
            Schedule::Interval { value, unit } => (INTERVAL, json!([value, unit.as_str()])),
        }
    }

    /// Build a schedule from the two state attributes under `path`.
    ///
    /// Exactly one of `crontab` and `interval` must be given, and an interval
    /// must set exactly one unit to a value of at least 1. Every violation is
    /// reported, each on the attribute it concerns.
    pub fn from_state(
        path: &str,
        crontab: Option<&str>,
        interval: Option<&IntervalModel>,
    ) -> Result<Self, Vec<Diagnostic>> {
        let crontab_path = join_path(path, "schedule_crontab");
        let interval_path = join_path(path, "schedule_interval");

        match (crontab, interval) {
            (Some(_), Some(_)) => Err(vec![Diagnostic::attribute_error(
                interval_path,
                "Conflicting schedule",
                "Only one of schedule_crontab and schedule_interval can be set",
            )]),
            (None, None) => Err(vec![Diagnostic::attribute_error(
                path,
                "Missing schedule",
                "One of schedule_crontab and schedule_interval must be set",
            )]),
            (Some(expr), None) => {
                if expr.trim().is_empty() {
                    Err(vec![Diagnostic::attribute_error(
                        crontab_path,
                        "Invalid schedule",
                        "The crontab expression must not be empty",
                    )])
                } else {
                    Ok(Schedule::Crontab(expr.to_string()))
                }
            },
            (None, Some(interval)) => Self::interval_from_state(&interval_path, interval),
        }
    }

    fn interval_from_state(path: &str, interval: &IntervalModel) -> Result<Self, Vec<Diagnostic>> {
        let set = interval.set_units();
        let mut diagnostics: Vec<Diagnostic> = set
            .iter()
            .filter(|(_, value)| *value < 1)
            .map(|(unit, value)| {
                Diagnostic::attribute_error(
                    join_path(path, unit.as_str()),
                    "Invalid schedule interval",
                    format!("Value must be at least 1, got {}", value),
                )
            })
            .collect();

        match set.as_slice() {
            [] => diagnostics.push(Diagnostic::attribute_error(
                path,
                "Invalid schedule interval",
                "Exactly one interval unit must be set",
            )),
            [_] => {},
            [_, rest @ ..] => {
                for (unit, _) in rest {
                    diagnostics.push(Diagnostic::attribute_error(
                        join_path(path, unit.as_str()),
                        "Conflicting schedule interval",
                        "Only one interval unit can be set",
                    ));
                }
            },
        }

        match (set.as_slice(), diagnostics.is_empty()) {
            ([(unit, value)], true) => Ok(Schedule::Interval {
                value: *value,
                unit: *unit,
            }),
            _ => Err(diagnostics),
        }
    }

    /// The `(schedule_crontab, schedule_interval)` state pair; exactly one is set.
    pub fn to_state(&self) -> (Option<String>, Option<IntervalModel>) {
        match self {
            Schedule::Crontab(expr) => (Some(expr.clone()), None),
            Schedule::Interval { value, unit } => {
                let mut interval = IntervalModel::default();
                *interval.slot(*unit) = Some(*value);
                (None, Some(interval))
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_api_crontab() {
        assert_eq!(
            Schedule::from_api("crontab", &json!("0 0 * * *")),
            Ok(Schedule::Crontab("0 0 * * *".to_string()))
        );
        assert!(matches!(
            Schedule::from_api("crontab", &json!([1, "day"])),
            Err(ScheduleError::ExpectedCrontab(_))
        ));
    }

    #[test]
    fn test_from_api_interval() {
        assert_eq!(
            Schedule::from_api("interval", &json!([3, "hour"])),
            Ok(Schedule::Interval {
                value: 3,
                unit: IntervalUnit::Hour
            })
        );
    }

    #[test]
    fn test_from_api_interval_errors() {
        let cases = [
            json!([3]),
            json!([3, "hour", 1]),
            json!(["3", "hour"]),
            json!([3, 4]),
            json!("3 hours"),
        ];
        for bad in cases {
            assert!(
                matches!(
                    Schedule::from_api("interval", &bad),
                    Err(ScheduleError::ExpectedInterval(_))
                ),
                "{}",
                bad
            );
        }
        assert_eq!(
            Schedule::from_api("interval", &json!([3, "fortnight"])),
            Err(ScheduleError::UnknownUnit("fortnight".to_string()))
        );
    }

    #[test]
    fn test_from_api_unknown_type() {
        let err = Schedule::from_api("solar", &json!("equinox")).unwrap_err();
        assert_eq!(err, ScheduleError::UnknownType("solar".to_string()));
        assert_eq!(err.summary(), "Invalid schedule type");
        assert_eq!(
            ScheduleError::UnknownUnit("x".into()).summary(),
            "Invalid schedule"
        );
    }

    #[test]
    fn test_to_api() {
        assert_eq!(
            Schedule::Crontab("*/5 * * * *".into()).to_api(),
            ("crontab", json!("*/5 * * * *"))
        );
        assert_eq!(
            Schedule::Interval {
                value: 2,
                unit: IntervalUnit::Week
            }
            .to_api(),
            ("interval", json!([2, "week"]))
        );
    }

    #[test]
    fn test_to_state_sets_exactly_one() {
        let (crontab, interval) = Schedule::Crontab("0 * * * *".into()).to_state();
        assert_eq!(crontab.as_deref(), Some("0 * * * *"));
        assert!(interval.is_none());

        let (crontab, interval) = Schedule::Interval {
            value: 10,
            unit: IntervalUnit::Minute,
        }
        .to_state();
        assert!(crontab.is_none());
        assert_eq!(
            interval,
            Some(IntervalModel {
                minute: Some(10),
                ..Default::default()
            })
        );
    }

    #[test]
    fn test_from_state() {
        assert_eq!(
            Schedule::from_state("config", Some("0 0 * * *"), None),
            Ok(Schedule::Crontab("0 0 * * *".into()))
        );

        let interval = IntervalModel {
            day: Some(1),
            ..Default::default()
        };
        assert_eq!(
            Schedule::from_state("config", None, Some(&interval)),
            Ok(Schedule::Interval {
                value: 1,
                unit: IntervalUnit::Day
            })
        );
    }

    #[test]
    fn test_from_state_conflict_and_missing() {
        let interval = IntervalModel {
            day: Some(1),
            ..Default::default()
        };
        let diags = Schedule::from_state("config", Some("0 0 * * *"), Some(&interval)).unwrap_err();
        assert_eq!(diags[0].summary, "Conflicting schedule");
        assert_eq!(
            diags[0].attribute.as_deref(),
            Some("config.schedule_interval")
        );

        let diags = Schedule::from_state("config", None, None).unwrap_err();
        assert_eq!(diags[0].summary, "Missing schedule");
        assert_eq!(diags[0].attribute.as_deref(), Some("config"));

        let diags = Schedule::from_state("config", Some("  "), None).unwrap_err();
        assert_eq!(
            diags[0].attribute.as_deref(),
            Some("config.schedule_crontab")
        );
    }

    #[test]
    fn test_from_state_interval_rules() {
        let interval = IntervalModel::default();
        let diags = Schedule::from_state("config", None, Some(&interval)).unwrap_err();
        assert_eq!(diags.len(), 1);
        assert_eq!(
            diags[0].attribute.as_deref(),
            Some("config.schedule_interval")
        );

        let two_units = IntervalModel {
            hour: Some(1),
            minute: Some(30),
            ..Default::default()
        };
        let diags = Schedule::from_state("config", None, Some(&two_units)).unwrap_err();
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].summary, "Conflicting schedule interval");
        assert_eq!(
            diags[0].attribute.as_deref(),
            Some("config.schedule_interval.minute")
        );

        let zero = IntervalModel {
            week: Some(0),
            ..Default::default()
        };
        let diags = Schedule::from_state("config", None, Some(&zero)).unwrap_err();
        assert_eq!(diags.len(), 1);
        assert_eq!(
            diags[0].attribute.as_deref(),
            Some("config.schedule_interval.week")
        );
        assert_eq!(
            diags[0].detail.as_deref(),
            Some("Value must be at least 1, got 0")
        );
    }

    #[test]
    fn test_interval_unit_parse() {
        assert_eq!("month".parse::<IntervalUnit>(), Ok(IntervalUnit::Month));
        assert!("Month".parse::<IntervalUnit>().is_err());
    }
}
