//! Sentry provider plugin.
//!
//! Manages Sentry cron monitors (`sentry_monitor`) and looks up dashboards
//! (`sentry_dashboard`) on behalf of an infrastructure-as-code CLI. The CLI
//! spawns the `terraform-provider-sentry` binary and talks to it over gRPC.
//!
//! # Layout
//!
//! - [`server`]: the gRPC service, the [`ProviderService`] trait and the
//!   handshake
//! - [`provider`]: [`SentryProvider`], which dispatches to [`resources`] and
//!   [`data_sources`]
//! - [`models`]: state models and their conversion from API objects
//! - [`schedule`]: the crontab/interval schedule union
//! - [`apiclient`]: the REST client for the Sentry API
//! - [`schema`], [`validation`], [`plan`]: schema-driven validation and
//!   planning
//!
//! # Handshake Protocol
//!
//! On start the binary prints one line to stdout:
//!
//! ```text
//! SENTRY_PROVIDER|1|127.0.0.1:50051
//! ```
//!
//! Format: `SENTRY_PROVIDER|<protocol_version>|<address>`. Everything else,
//! logs included, goes to stderr.
//!
//! # Provider Protocol
//!
//! - **GetMetadata**: resource and data source names
//! - **GetSchema**: schemas for the provider block, resources and data sources
//! - **ValidateProviderConfig** / **Configure**: token and base URL
//! - **ValidateResourceConfig** / **ValidateDataSourceConfig**
//! - **UpgradeResourceState**: identity; every schema is at version 0
//! - **Plan**, **Create**, **Read**, **Update**, **Delete**
//! - **ImportResourceState**: `organization/monitor-id`
//! - **ReadDataSource**
//! - **Stop**

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod apiclient;
pub mod config;
pub mod data_sources;
pub mod diagnostics;
pub mod error;
pub mod logging;
pub mod models;
pub mod plan;
pub mod provider;
pub mod resources;
pub mod schedule;
pub mod schema;
pub mod server;
pub mod testing;
pub mod types;
pub mod validation;

#[allow(missing_docs)]
#[allow(clippy::all)]
pub mod generated;

pub use error::ProviderError;
pub use logging::{init_logging, init_logging_with_default};
pub use provider::SentryProvider;
pub use schema::ProviderSchema;
pub use server::{serve, serve_with_options, ProviderService, ServeOptions};
pub use types::{
    AttributeChange, ImportedResource, PlanResult, ProviderMetadata, HANDSHAKE_PREFIX,
    PROTOCOL_VERSION,
};
pub use validation::validate;
