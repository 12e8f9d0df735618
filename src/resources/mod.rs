//! Managed resource types.

mod dashboard;
mod monitor;

pub use dashboard::DashboardResource;
pub use monitor::MonitorResource;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::apiclient::SentryClient;
use crate::diagnostics::not_supported;
use crate::error::ProviderError;
use crate::schema::{Diagnostic, Schema};

/// A managed resource type.
///
/// Handlers receive the configured client; the provider resolves the type
/// name and the configuration before dispatching here.
#[async_trait::async_trait]
pub trait Resource: Send + Sync {
    /// Type name, e.g. `sentry_monitor`.
    fn type_name(&self) -> &'static str;

    /// Resource schema.
    fn schema(&self) -> Schema;

    /// Semantic validation of a configuration that passed the schema checks.
    fn validate(&self, config: Value) -> Result<Vec<Diagnostic>, ProviderError> {
        let _ = config;
        Ok(vec![])
    }

    /// Create the remote object and return the new state.
    async fn create(
        &self,
        client: &SentryClient,
        planned_state: Value,
    ) -> Result<Value, ProviderError>;

    /// Refresh state. `None` means the remote object is gone.
    async fn read(
        &self,
        client: &SentryClient,
        state: Value,
    ) -> Result<Option<Value>, ProviderError>;

    /// Apply the planned state to the remote object.
    async fn update(
        &self,
        client: &SentryClient,
        prior_state: Value,
        planned_state: Value,
    ) -> Result<Value, ProviderError>;

    /// Delete the remote object.
    async fn delete(&self, client: &SentryClient, state: Value) -> Result<(), ProviderError>;

    /// Build state for an existing remote object from an import ID.
    async fn import(&self, client: &SentryClient, id: &str) -> Result<Value, ProviderError> {
        let _ = (client, id);
        Err(not_supported("import").into())
    }
}

/// An import ID that is not of the form `first/second`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unexpected format of ID ({id:?}), expected {first}/{second}")]
pub struct IdFormatError {
    id: String,
    first: &'static str,
    second: &'static str,
}

/// Split an import ID such as `my-org/123` into its two parts.
///
/// `first` and `second` name the parts in the error message.
pub fn split_two_part_id<'a>(
    id: &'a str,
    first: &'static str,
    second: &'static str,
) -> Result<(&'a str, &'a str), IdFormatError> {
    let mut parts = id.split('/');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(a), Some(b), None) if !a.is_empty() && !b.is_empty() => Ok((a, b)),
        _ => Err(IdFormatError {
            id: id.to_string(),
            first,
            second,
        }),
    }
}

pub(crate) fn decode_model<T: DeserializeOwned>(value: Value) -> Result<T, ProviderError> {
    Ok(serde_json::from_value(value)?)
}

pub(crate) fn encode_model<T: Serialize>(model: &T) -> Result<Value, ProviderError> {
    Ok(serde_json::to_value(model)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_two_part_id() {
        assert_eq!(
            split_two_part_id("acme/8f3f5b1e", "organization", "monitor-id"),
            Ok(("acme", "8f3f5b1e"))
        );
    }

    #[test]
    fn test_split_two_part_id_rejects_malformed() {
        for bad in ["acme", "acme/", "/8f3f", "acme/8f3f/extra", ""] {
            let err = split_two_part_id(bad, "organization", "monitor-id").unwrap_err();
            let message = err.to_string();
            assert!(
                message.ends_with("expected organization/monitor-id"),
                "{}",
                message
            );
        }
    }
}
