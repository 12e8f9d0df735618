//! Terraform state models and their conversion to and from API objects.

mod dashboard;
mod monitor;
mod owner;

pub use dashboard::{DashboardModel, LayoutModel, QueryModel, WidgetModel};
pub use monitor::{MonitorConfigModel, MonitorModel, CRON_JOB};
pub use owner::{Owner, OwnerParseError};

use serde::{Deserialize, Deserializer};

/// Read `null` as the default value. Unset optional attributes arrive as
/// `null`, including lists and strings the models keep non-optional.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
