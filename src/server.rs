//! gRPC plumbing between the CLI and a [`ProviderService`].
//!
//! [`serve`] binds a port, prints the handshake line and runs until a
//! shutdown signal arrives.
//!
//! # Signal Handling
//!
//! On SIGTERM or SIGINT the server:
//! 1. Refuses new connections
//! 2. Waits for in-flight requests for at most [`ServeOptions::shutdown_timeout`]
//! 3. Runs [`ProviderService::stop`]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::net::TcpListener;
use tonic::transport::Server;
use tracing::{debug, error, info, instrument, warn};

use crate::error::ProviderError;
use crate::generated as proto;
use crate::schema::{
    has_errors, Block, BlockNestingMode, Diagnostic, DiagnosticSeverity, ProviderSchema, Schema,
};
use crate::types::{
    ImportedResource, PlanResult, ProviderMetadata, HANDSHAKE_PREFIX, PROTOCOL_VERSION,
};

/// Operations a provider answers over the protocol.
///
/// States and configurations are plain JSON values; the server takes care of
/// the wire encoding and of turning errors into diagnostics.
#[async_trait::async_trait]
pub trait ProviderService: Send + Sync + 'static {
    /// Provider block, resource and data source schemas.
    fn schema(&self) -> ProviderSchema;

    /// Registered type names, taken from [`Self::schema`] unless overridden.
    fn metadata(&self) -> ProviderMetadata {
        let schema = self.schema();
        ProviderMetadata {
            resources: schema.resources.keys().cloned().collect(),
            data_sources: schema.data_sources.keys().cloned().collect(),
        }
    }

    /// Check the provider block before `configure`.
    async fn validate_provider_config(
        &self,
        config: Value,
    ) -> Result<Vec<Diagnostic>, ProviderError> {
        let _ = config;
        Ok(vec![])
    }

    /// Apply the provider block.
    async fn configure(&self, config: Value) -> Result<Vec<Diagnostic>, ProviderError>;

    /// Called once after the server has drained.
    async fn stop(&self) -> Result<(), ProviderError> {
        Ok(())
    }

    /// Check a resource configuration before `plan`.
    async fn validate_resource_config(
        &self,
        resource_type: &str,
        config: Value,
    ) -> Result<Vec<Diagnostic>, ProviderError> {
        let _ = (resource_type, config);
        Ok(vec![])
    }

    /// Migrate state written by an older schema version. Identity by default.
    async fn upgrade_resource_state(
        &self,
        resource_type: &str,
        version: i64,
        state: Value,
    ) -> Result<Value, ProviderError> {
        let _ = (resource_type, version);
        Ok(state)
    }

    /// Plan changes for a resource. `prior_state` is `None` for creates.
    async fn plan(
        &self,
        resource_type: &str,
        prior_state: Option<Value>,
        proposed_state: Value,
        config: Value,
    ) -> Result<PlanResult, ProviderError>;

    /// Create the remote object and return its state.
    async fn create(
        &self,
        resource_type: &str,
        planned_state: Value,
    ) -> Result<Value, ProviderError>;

    /// Refresh state. `None` means the object is gone.
    ///
    /// `Ok(None)` means the remote object no longer exists and the resource
    /// should be removed from state.
    async fn read(
        &self,
        resource_type: &str,
        current_state: Value,
    ) -> Result<Option<Value>, ProviderError>;

    /// Apply a planned in-place change.
    async fn update(
        &self,
        resource_type: &str,
        prior_state: Value,
        planned_state: Value,
    ) -> Result<Value, ProviderError>;

    /// Destroy the remote object.
    async fn delete(&self, resource_type: &str, current_state: Value) -> Result<(), ProviderError>;

    /// Adopt an existing object by its import id.
    async fn import_resource(
        &self,
        resource_type: &str,
        _id: &str,
    ) -> Result<Vec<ImportedResource>, ProviderError> {
        Err(ProviderError::Unimplemented(format!(
            "Import not supported for resource type: {}",
            resource_type
        )))
    }

    /// Check a data source configuration.
    async fn validate_data_source_config(
        &self,
        data_source_type: &str,
        config: Value,
    ) -> Result<Vec<Diagnostic>, ProviderError> {
        let _ = (data_source_type, config);
        Ok(vec![])
    }

    /// Look up a data source.
    async fn read_data_source(
        &self,
        data_source_type: &str,
        _config: Value,
    ) -> Result<Value, ProviderError> {
        Err(ProviderError::UnknownResource(data_source_type.to_string()))
    }
}

/// Adapts a [`ProviderService`] to the generated tonic service.
pub(crate) struct ProviderGrpcService<P: ProviderService> {
    provider: Arc<P>,
}

impl<P: ProviderService> ProviderGrpcService<P> {
    pub(crate) fn new(provider: Arc<P>) -> Self {
        Self { provider }
    }
}

/// Decode a JSON payload; an empty payload is `null`.
fn decode_json(bytes: &[u8]) -> Result<Value, ProviderError> {
    if bytes.is_empty() {
        return Ok(Value::Null);
    }
    Ok(serde_json::from_slice(bytes)?)
}

fn encode_json(value: &Value) -> Vec<u8> {
    serde_json::to_vec(value).unwrap_or_default()
}

fn diagnostics_to_proto(diagnostics: Vec<Diagnostic>) -> Vec<proto::Diagnostic> {
    diagnostics
        .into_iter()
        .map(|d| proto::Diagnostic {
            severity: match d.severity {
                DiagnosticSeverity::Error => proto::diagnostic::Severity::Error as i32,
                DiagnosticSeverity::Warning => proto::diagnostic::Severity::Warning as i32,
            },
            summary: d.summary,
            detail: d.detail.unwrap_or_default(),
            attribute: d.attribute.unwrap_or_default(),
        })
        .collect()
}

fn error_to_proto(err: ProviderError) -> Vec<proto::Diagnostic> {
    diagnostics_to_proto(err.into_diagnostics())
}

pub(crate) fn schema_to_proto(schema: &Schema) -> proto::Schema {
    proto::Schema {
        version: schema.version as i64,
        block: Some(block_to_proto(&schema.block)),
    }
}

fn block_to_proto(block: &Block) -> proto::Block {
    proto::Block {
        attributes: block
            .attributes
            .iter()
            .map(|(name, attr)| proto::Attribute {
                name: name.clone(),
                r#type: serde_json::to_vec(&attr.attr_type).unwrap_or_default(),
                required: attr.flags.required,
                optional: attr.flags.optional,
                computed: attr.flags.computed,
                sensitive: attr.flags.sensitive,
                description: attr.description.clone().unwrap_or_default(),
                force_new: attr.force_new,
            })
            .collect(),
        block_types: block
            .blocks
            .iter()
            .map(|(name, nested)| proto::NestedBlock {
                type_name: name.clone(),
                block: Some(block_to_proto(&nested.block)),
                nesting_mode: match nested.nesting_mode {
                    BlockNestingMode::Single => proto::nested_block::NestingMode::Single as i32,
                    BlockNestingMode::List => proto::nested_block::NestingMode::List as i32,
                },
                min_items: nested.min_items as i32,
                max_items: nested.max_items as i32,
            })
            .collect(),
        description: block.description.clone().unwrap_or_default(),
    }
}

/// Log the outcome of a validation-style RPC and convert its diagnostics.
fn finish_validation(
    rpc: &'static str,
    result: Result<Vec<Diagnostic>, ProviderError>,
) -> Vec<proto::Diagnostic> {
    match result {
        Ok(diagnostics) => {
            if has_errors(&diagnostics) {
                warn!(
                    rpc,
                    diagnostics = diagnostics.len(),
                    "Completed with errors"
                );
            } else {
                debug!(rpc, "Completed successfully");
            }
            diagnostics_to_proto(diagnostics)
        },
        Err(e) => {
            error!(rpc, error = %e, "Failed");
            error_to_proto(e)
        },
    }
}

/// Log the outcome of an RPC that returns a state and encode it.
///
/// `Ok(None)` encodes as an empty payload. A partial state is encoded next to
/// its diagnostics.
fn finish_state(
    rpc: &'static str,
    result: Result<Option<Value>, ProviderError>,
) -> (Vec<u8>, Vec<proto::Diagnostic>) {
    match result {
        Ok(Some(state)) => {
            debug!(rpc, "Completed successfully");
            (encode_json(&state), vec![])
        },
        Ok(None) => (vec![], vec![]),
        Err(ProviderError::PartialState { state, diagnostics }) => {
            warn!(
                rpc,
                diagnostics = diagnostics.len(),
                "Completed with a partial state"
            );
            (encode_json(&state), diagnostics_to_proto(diagnostics))
        },
        Err(e) => {
            error!(rpc, error = %e, "Failed");
            (vec![], error_to_proto(e))
        },
    }
}

#[tonic::async_trait]
impl<P: ProviderService> proto::provider_server::Provider for ProviderGrpcService<P> {
    #[instrument(skip(self, _request), name = "grpc.get_metadata")]
    async fn get_metadata(
        &self,
        _request: tonic::Request<proto::GetMetadataRequest>,
    ) -> Result<tonic::Response<proto::GetMetadataResponse>, tonic::Status> {
        let metadata = self.provider.metadata();
        debug!(
            resources = metadata.resources.len(),
            data_sources = metadata.data_sources.len(),
            "GetMetadata completed"
        );
        Ok(tonic::Response::new(proto::GetMetadataResponse {
            server_capabilities: Some(proto::ServerCapabilities { plan_destroy: true }),
            resources: metadata.resources,
            data_sources: metadata.data_sources,
            diagnostics: vec![],
        }))
    }

    #[instrument(skip(self, _request), name = "grpc.get_schema")]
    async fn get_schema(
        &self,
        _request: tonic::Request<proto::GetSchemaRequest>,
    ) -> Result<tonic::Response<proto::GetSchemaResponse>, tonic::Status> {
        let schema = self.provider.schema();
        debug!(
            resources = schema.resources.len(),
            data_sources = schema.data_sources.len(),
            "GetSchema completed"
        );
        Ok(tonic::Response::new(proto::GetSchemaResponse {
            provider: Some(schema_to_proto(&schema.provider)),
            resources: schema
                .resources
                .iter()
                .map(|(k, v)| (k.clone(), schema_to_proto(v)))
                .collect(),
            data_sources: schema
                .data_sources
                .iter()
                .map(|(k, v)| (k.clone(), schema_to_proto(v)))
                .collect(),
            diagnostics: vec![],
        }))
    }

    #[instrument(skip(self, request), name = "grpc.validate_provider_config")]
    async fn validate_provider_config(
        &self,
        request: tonic::Request<proto::ValidateProviderConfigRequest>,
    ) -> Result<tonic::Response<proto::ValidateProviderConfigResponse>, tonic::Status> {
        let req = request.into_inner();
        let result = async {
            let config = decode_json(&req.config)?;
            self.provider.validate_provider_config(config).await
        }
        .await;

        Ok(tonic::Response::new(proto::ValidateProviderConfigResponse {
            diagnostics: finish_validation("ValidateProviderConfig", result),
        }))
    }

    #[instrument(skip(self, request), name = "grpc.configure")]
    async fn configure(
        &self,
        request: tonic::Request<proto::ConfigureRequest>,
    ) -> Result<tonic::Response<proto::ConfigureResponse>, tonic::Status> {
        let req = request.into_inner();
        let result = async {
            let config = decode_json(&req.config)?;
            self.provider.configure(config).await
        }
        .await;

        Ok(tonic::Response::new(proto::ConfigureResponse {
            diagnostics: finish_validation("Configure", result),
        }))
    }

    #[instrument(skip(self, _request), name = "grpc.stop")]
    async fn stop(
        &self,
        _request: tonic::Request<proto::StopRequest>,
    ) -> Result<tonic::Response<proto::StopResponse>, tonic::Status> {
        info!("Stop called");
        let error = match self.provider.stop().await {
            Ok(()) => String::new(),
            Err(e) => {
                error!(error = %e, "Stop failed");
                e.to_string()
            },
        };
        Ok(tonic::Response::new(proto::StopResponse { error }))
    }

    #[instrument(
        skip(self, request),
        fields(resource_type = %request.get_ref().resource_type),
        name = "grpc.validate_resource_config"
    )]
    async fn validate_resource_config(
        &self,
        request: tonic::Request<proto::ValidateResourceConfigRequest>,
    ) -> Result<tonic::Response<proto::ValidateResourceConfigResponse>, tonic::Status> {
        let req = request.into_inner();
        let result = async {
            let config = decode_json(&req.config)?;
            self.provider
                .validate_resource_config(&req.resource_type, config)
                .await
        }
        .await;

        Ok(tonic::Response::new(proto::ValidateResourceConfigResponse {
            diagnostics: finish_validation("ValidateResourceConfig", result),
        }))
    }

    #[instrument(
        skip(self, request),
        fields(resource_type = %request.get_ref().resource_type),
        name = "grpc.upgrade_resource_state"
    )]
    async fn upgrade_resource_state(
        &self,
        request: tonic::Request<proto::UpgradeResourceStateRequest>,
    ) -> Result<tonic::Response<proto::UpgradeResourceStateResponse>, tonic::Status> {
        let req = request.into_inner();
        let result = async {
            let state = decode_json(&req.raw_state)?;
            self.provider
                .upgrade_resource_state(&req.resource_type, req.version, state)
                .await
        }
        .await;

        let (upgraded_state, diagnostics) = finish_state("UpgradeResourceState", result.map(Some));
        Ok(tonic::Response::new(proto::UpgradeResourceStateResponse {
            upgraded_state,
            diagnostics,
        }))
    }

    #[instrument(
        skip(self, request),
        fields(resource_type = %request.get_ref().resource_type),
        name = "grpc.plan"
    )]
    async fn plan(
        &self,
        request: tonic::Request<proto::PlanRequest>,
    ) -> Result<tonic::Response<proto::PlanResponse>, tonic::Status> {
        let req = request.into_inner();
        debug!(is_create = req.prior_state.is_empty(), "Plan called");

        let result = async {
            let prior_state = match decode_json(&req.prior_state)? {
                Value::Null => None,
                prior => Some(prior),
            };
            let proposed_state = decode_json(&req.proposed_state)?;
            let config = decode_json(&req.config)?;
            self.provider
                .plan(&req.resource_type, prior_state, proposed_state, config)
                .await
        }
        .await;

        let response = match result {
            Ok(result) => {
                info!(
                    changes = result.changes.len(),
                    requires_replace = result.requires_replace,
                    "Plan completed"
                );
                proto::PlanResponse {
                    planned_state: encode_json(&result.planned_state),
                    changes: result.changes.into_iter().map(Into::into).collect(),
                    requires_replace: result.requires_replace,
                    diagnostics: vec![],
                }
            },
            Err(e) => {
                error!(error = %e, "Plan failed");
                proto::PlanResponse {
                    planned_state: vec![],
                    changes: vec![],
                    requires_replace: false,
                    diagnostics: error_to_proto(e),
                }
            },
        };
        Ok(tonic::Response::new(response))
    }

    #[instrument(
        skip(self, request),
        fields(resource_type = %request.get_ref().resource_type),
        name = "grpc.create"
    )]
    async fn create(
        &self,
        request: tonic::Request<proto::CreateRequest>,
    ) -> Result<tonic::Response<proto::CreateResponse>, tonic::Status> {
        let req = request.into_inner();
        info!("Create called");
        let result = async {
            let planned_state = decode_json(&req.planned_state)?;
            self.provider
                .create(&req.resource_type, planned_state)
                .await
        }
        .await;

        let (state, diagnostics) = finish_state("Create", result.map(Some));
        Ok(tonic::Response::new(proto::CreateResponse { state, diagnostics }))
    }

    #[instrument(
        skip(self, request),
        fields(resource_type = %request.get_ref().resource_type),
        name = "grpc.read"
    )]
    async fn read(
        &self,
        request: tonic::Request<proto::ReadRequest>,
    ) -> Result<tonic::Response<proto::ReadResponse>, tonic::Status> {
        let req = request.into_inner();
        debug!("Read called");
        let result = async {
            let current_state = decode_json(&req.current_state)?;
            self.provider.read(&req.resource_type, current_state).await
        }
        .await;

        if matches!(result, Ok(None)) {
            info!("Resource no longer exists, removing from state");
        }
        let (state, diagnostics) = finish_state("Read", result);
        Ok(tonic::Response::new(proto::ReadResponse { state, diagnostics }))
    }

    #[instrument(
        skip(self, request),
        fields(resource_type = %request.get_ref().resource_type),
        name = "grpc.update"
    )]
    async fn update(
        &self,
        request: tonic::Request<proto::UpdateRequest>,
    ) -> Result<tonic::Response<proto::UpdateResponse>, tonic::Status> {
        let req = request.into_inner();
        info!("Update called");
        let result = async {
            let prior_state = decode_json(&req.prior_state)?;
            let planned_state = decode_json(&req.planned_state)?;
            self.provider
                .update(&req.resource_type, prior_state, planned_state)
                .await
        }
        .await;

        let (state, diagnostics) = finish_state("Update", result.map(Some));
        Ok(tonic::Response::new(proto::UpdateResponse { state, diagnostics }))
    }

    #[instrument(
        skip(self, request),
        fields(resource_type = %request.get_ref().resource_type),
        name = "grpc.delete"
    )]
    async fn delete(
        &self,
        request: tonic::Request<proto::DeleteRequest>,
    ) -> Result<tonic::Response<proto::DeleteResponse>, tonic::Status> {
        let req = request.into_inner();
        info!("Delete called");
        let result = async {
            let current_state = decode_json(&req.current_state)?;
            self.provider
                .delete(&req.resource_type, current_state)
                .await
        }
        .await;

        let (_, diagnostics) = finish_state("Delete", result.map(|()| None));
        Ok(tonic::Response::new(proto::DeleteResponse { diagnostics }))
    }

    #[instrument(
        skip(self, request),
        fields(resource_type = %request.get_ref().resource_type, id = %request.get_ref().id),
        name = "grpc.import_resource_state"
    )]
    async fn import_resource_state(
        &self,
        request: tonic::Request<proto::ImportResourceStateRequest>,
    ) -> Result<tonic::Response<proto::ImportResourceStateResponse>, tonic::Status> {
        let req = request.into_inner();
        info!("ImportResourceState called");

        let response = match self
            .provider
            .import_resource(&req.resource_type, &req.id)
            .await
        {
            Ok(imported) => {
                info!(
                    imported_count = imported.len(),
                    "ImportResourceState completed"
                );
                proto::ImportResourceStateResponse {
                    imported: imported
                        .into_iter()
                        .map(|r| proto::ImportedResource {
                            resource_type: r.resource_type,
                            state: encode_json(&r.state),
                        })
                        .collect(),
                    diagnostics: vec![],
                }
            },
            Err(e) => {
                error!(error = %e, "ImportResourceState failed");
                proto::ImportResourceStateResponse {
                    imported: vec![],
                    diagnostics: error_to_proto(e),
                }
            },
        };
        Ok(tonic::Response::new(response))
    }

    #[instrument(
        skip(self, request),
        fields(data_source_type = %request.get_ref().data_source_type),
        name = "grpc.validate_data_source_config"
    )]
    async fn validate_data_source_config(
        &self,
        request: tonic::Request<proto::ValidateDataSourceConfigRequest>,
    ) -> Result<tonic::Response<proto::ValidateDataSourceConfigResponse>, tonic::Status> {
        let req = request.into_inner();
        let result = async {
            let config = decode_json(&req.config)?;
            self.provider
                .validate_data_source_config(&req.data_source_type, config)
                .await
        }
        .await;

        Ok(tonic::Response::new(proto::ValidateDataSourceConfigResponse {
            diagnostics: finish_validation("ValidateDataSourceConfig", result),
        }))
    }

    #[instrument(
        skip(self, request),
        fields(data_source_type = %request.get_ref().data_source_type),
        name = "grpc.read_data_source"
    )]
    async fn read_data_source(
        &self,
        request: tonic::Request<proto::ReadDataSourceRequest>,
    ) -> Result<tonic::Response<proto::ReadDataSourceResponse>, tonic::Status> {
        let req = request.into_inner();
        debug!("ReadDataSource called");
        let result = async {
            let config = decode_json(&req.config)?;
            self.provider
                .read_data_source(&req.data_source_type, config)
                .await
        }
        .await;

        let (state, diagnostics) = finish_state("ReadDataSource", result.map(Some));
        Ok(tonic::Response::new(proto::ReadDataSourceResponse { state, diagnostics }))
    }
}

/// Listen address and drain timeout for [`serve_with_options`].
#[derive(Debug, Clone)]
pub struct ServeOptions {
    /// Address to listen on. `None` binds an ephemeral loopback port.
    pub listen: Option<SocketAddr>,
    /// How long in-flight requests may run after a shutdown signal.
    /// Default: 30 seconds.
    pub shutdown_timeout: Duration,
}

impl Default for ServeOptions {
    fn default() -> Self {
        Self {
            listen: None,
            shutdown_timeout: Duration::from_secs(30),
        }
    }
}

impl ServeOptions {
    /// Ephemeral localhost port, 30 second drain.
    pub fn new() -> Self {
        Self::default()
    }

    /// Listen on a fixed address instead of an ephemeral port.
    pub fn with_listen(mut self, addr: SocketAddr) -> Self {
        self.listen = Some(addr);
        self
    }

    /// Bound on the drain after a shutdown signal.
    pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }
}

/// Wait for SIGTERM or SIGINT (CTRL+C elsewhere).
async fn wait_for_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
            (Ok(mut sigterm), Ok(mut sigint)) => {
                tokio::select! {
                    _ = sigterm.recv() => info!("Received SIGTERM, initiating graceful shutdown"),
                    _ = sigint.recv() => info!("Received SIGINT, initiating graceful shutdown"),
                }
            },
            (Err(e), _) | (_, Err(e)) => {
                warn!(error = %e, "Failed to install signal handlers, waiting for CTRL+C");
                if tokio::signal::ctrl_c().await.is_err() {
                    std::future::pending::<()>().await;
                }
            },
        }
    }

    #[cfg(not(unix))]
    {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install CTRL+C handler");
            std::future::pending::<()>().await;
        }
        info!("Received CTRL+C, initiating graceful shutdown");
    }
}

/// Serve a provider on an ephemeral loopback port.
///
/// The handshake format is: `SENTRY_PROVIDER|<version>|<address>`
pub async fn serve<P: ProviderService>(provider: P) -> Result<(), ProviderError> {
    serve_with_options(provider, ServeOptions::default()).await
}

/// Like [`serve`], with an explicit address and drain timeout.
pub async fn serve_with_options<P: ProviderService>(
    provider: P,
    options: ServeOptions,
) -> Result<(), ProviderError> {
    let bind_addr = options
        .listen
        .unwrap_or_else(|| SocketAddr::from(([127, 0, 0, 1], 0)));
    let listener = TcpListener::bind(bind_addr).await?;
    let addr = listener.local_addr()?;

    println!("{}|{}|{}", HANDSHAKE_PREFIX, PROTOCOL_VERSION, addr);
    info!(address = %addr, "Provider server starting");

    let provider = Arc::new(provider);
    let grpc_service = ProviderGrpcService::new(Arc::clone(&provider));
    let server = proto::provider_server::ProviderServer::new(grpc_service);

    let (signal_tx, signal_rx) = tokio::sync::oneshot::channel::<()>();
    let server_future = Server::builder().add_service(server).serve_with_incoming_shutdown(
        tokio_stream::wrappers::TcpListenerStream::new(listener),
        async move {
            wait_for_shutdown_signal().await;
            let _ = signal_tx.send(());
        },
    );
    tokio::pin!(server_future);

    // The drain timeout only starts once a shutdown signal has arrived.
    tokio::select! {
        result = &mut server_future => result?,
        _ = signal_rx => {
            match tokio::time::timeout(options.shutdown_timeout, &mut server_future).await {
                Ok(result) => result?,
                Err(_) => warn!(
                    timeout = ?options.shutdown_timeout,
                    "Shutdown timeout exceeded, forcing shutdown"
                ),
            }
        }
    }

    debug!("Calling provider stop()");
    if let Err(e) = provider.stop().await {
        warn!(error = %e, "Provider stop() returned error");
    }

    info!("Provider shutdown complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generated::provider_server::Provider;
    use crate::schema::{Attribute, NestedBlock};
    use serde_json::json;

    struct StubProvider;

    #[async_trait::async_trait]
    impl ProviderService for StubProvider {
        fn schema(&self) -> ProviderSchema {
            ProviderSchema::new().with_resource(
                "sentry_monitor",
                Schema::v0()
                    .with_attribute("id", Attribute::computed_string())
                    .with_block(
                        "config",
                        NestedBlock::required_single(
                            Block::new().with_attribute("timezone", Attribute::optional_string()),
                        ),
                    ),
            )
        }

        async fn configure(&self, _config: Value) -> Result<Vec<Diagnostic>, ProviderError> {
            Ok(vec![Diagnostic::error("Missing token").with_attribute("token")])
        }

        async fn plan(
            &self,
            _resource_type: &str,
            prior_state: Option<Value>,
            proposed_state: Value,
            _config: Value,
        ) -> Result<PlanResult, ProviderError> {
            assert!(prior_state.is_none());
            Ok(PlanResult::no_change(proposed_state))
        }

        async fn create(
            &self,
            _resource_type: &str,
            planned_state: Value,
        ) -> Result<Value, ProviderError> {
            Ok(planned_state)
        }

        async fn read(
            &self,
            _resource_type: &str,
            current_state: Value,
        ) -> Result<Option<Value>, ProviderError> {
            if current_state["id"] == "gone" {
                Ok(None)
            } else {
                Ok(Some(current_state))
            }
        }

        async fn update(
            &self,
            _resource_type: &str,
            _prior_state: Value,
            planned_state: Value,
        ) -> Result<Value, ProviderError> {
            if planned_state["timezone"] == "Mars/Olympus" {
                return Err(ProviderError::PartialState {
                    state: planned_state,
                    diagnostics: vec![Diagnostic::error("Invalid timezone")],
                });
            }
            Ok(planned_state)
        }

        async fn delete(
            &self,
            resource_type: &str,
            _current_state: Value,
        ) -> Result<(), ProviderError> {
            Err(ProviderError::UnknownResource(resource_type.to_string()))
        }
    }

    fn service() -> ProviderGrpcService<StubProvider> {
        ProviderGrpcService::new(Arc::new(StubProvider))
    }

    #[test]
    fn test_decode_json() {
        assert_eq!(decode_json(b"").unwrap(), Value::Null);
        assert_eq!(decode_json(b"{\"a\":1}").unwrap(), json!({"a": 1}));
        assert!(matches!(decode_json(b"{"), Err(ProviderError::Serialization(_))));
    }

    #[test]
    fn test_schema_to_proto() {
        let schema = StubProvider.schema();
        let proto = schema_to_proto(&schema.resources["sentry_monitor"]);
        let block = proto.block.unwrap();

        assert_eq!(block.attributes.len(), 1);
        assert_eq!(block.attributes[0].name, "id");
        assert!(block.attributes[0].computed);
        assert_eq!(block.attributes[0].r#type, b"\"string\"".to_vec());

        assert_eq!(block.block_types.len(), 1);
        assert_eq!(block.block_types[0].type_name, "config");
        assert_eq!(
            block.block_types[0].nesting_mode,
            proto::nested_block::NestingMode::Single as i32
        );
        assert_eq!(block.block_types[0].min_items, 1);
    }

    #[tokio::test]
    async fn test_configure_diagnostics_are_forwarded() {
        let response = service()
            .configure(tonic::Request::new(proto::ConfigureRequest {
                config: b"{}".to_vec(),
            }))
            .await
            .unwrap()
            .into_inner();

        assert_eq!(response.diagnostics.len(), 1);
        assert_eq!(response.diagnostics[0].attribute, "token");
        assert_eq!(
            response.diagnostics[0].severity,
            proto::diagnostic::Severity::Error as i32
        );
    }

    #[tokio::test]
    async fn test_invalid_json_becomes_diagnostic() {
        let response = service()
            .create(tonic::Request::new(proto::CreateRequest {
                resource_type: "sentry_monitor".to_string(),
                planned_state: b"not json".to_vec(),
            }))
            .await
            .unwrap()
            .into_inner();

        assert!(response.state.is_empty());
        assert_eq!(response.diagnostics.len(), 1);
        let summary = &response.diagnostics[0].summary;
        assert!(summary.starts_with("Serialization error"));
    }

    #[tokio::test]
    async fn test_read_missing_resource_returns_empty_state() {
        let response = service()
            .read(tonic::Request::new(proto::ReadRequest {
                resource_type: "sentry_monitor".to_string(),
                current_state: br#"{"id":"gone"}"#.to_vec(),
            }))
            .await
            .unwrap()
            .into_inner();

        assert!(response.state.is_empty());
        assert!(response.diagnostics.is_empty());
    }

    #[tokio::test]
    async fn test_partial_state_is_stored_with_diagnostics() {
        let response = service()
            .update(tonic::Request::new(proto::UpdateRequest {
                resource_type: "sentry_monitor".to_string(),
                prior_state: br#"{"id":"1"}"#.to_vec(),
                planned_state: br#"{"id":"1","timezone":"Mars/Olympus"}"#.to_vec(),
            }))
            .await
            .unwrap()
            .into_inner();

        assert_eq!(
            serde_json::from_slice::<Value>(&response.state).unwrap(),
            json!({"id": "1", "timezone": "Mars/Olympus"})
        );
        assert_eq!(response.diagnostics.len(), 1);
        assert_eq!(response.diagnostics[0].summary, "Invalid timezone");
    }

    #[tokio::test]
    async fn test_plan_create_has_no_prior_state() {
        let response = service()
            .plan(tonic::Request::new(proto::PlanRequest {
                resource_type: "sentry_monitor".to_string(),
                prior_state: vec![],
                proposed_state: br#"{"id":null}"#.to_vec(),
                config: vec![],
            }))
            .await
            .unwrap()
            .into_inner();

        assert!(response.diagnostics.is_empty());
        assert_eq!(
            serde_json::from_slice::<Value>(&response.planned_state).unwrap(),
            json!({"id": null})
        );
    }

    #[tokio::test]
    async fn test_errors_become_diagnostics() {
        let response = service()
            .delete(tonic::Request::new(proto::DeleteRequest {
                resource_type: "sentry_widget".to_string(),
                current_state: vec![],
            }))
            .await
            .unwrap()
            .into_inner();

        assert_eq!(response.diagnostics.len(), 1);
        assert_eq!(
            response.diagnostics[0].summary,
            "Unknown resource type: sentry_widget"
        );
    }

    #[tokio::test]
    async fn test_get_metadata_lists_types() {
        let response = service()
            .get_metadata(tonic::Request::new(proto::GetMetadataRequest {}))
            .await
            .unwrap()
            .into_inner();

        assert_eq!(response.resources, vec!["sentry_monitor".to_string()]);
        assert!(response.data_sources.is_empty());
    }
}
