//! Read-only data source types.

mod dashboard;

pub use dashboard::DashboardDataSource;

use serde_json::Value;

use crate::apiclient::SentryClient;
use crate::error::ProviderError;
use crate::schema::{Diagnostic, Schema};

/// A data source type.
#[async_trait::async_trait]
pub trait DataSource: Send + Sync {
    /// Type name, e.g. `sentry_dashboard`.
    fn type_name(&self) -> &'static str;

    /// Data source schema.
    fn schema(&self) -> Schema;

    /// Semantic validation of a configuration that passed the schema checks.
    fn validate(&self, config: Value) -> Result<Vec<Diagnostic>, ProviderError> {
        let _ = config;
        Ok(vec![])
    }

    /// Look up the remote object described by `config` and return its state.
    async fn read(&self, client: &SentryClient, config: Value) -> Result<Value, ProviderError>;
}
