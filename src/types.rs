//! Plain Rust types exchanged between the provider and the protocol layer.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One attribute that differs between prior and planned state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeChange {
    /// Dotted attribute path, e.g. `config.max_runtime`.
    pub path: String,
    /// The value before the change (None if creating).
    pub before: Option<Value>,
    /// The value after the change (None if deleting).
    pub after: Option<Value>,
}

impl AttributeChange {
    /// Attribute absent before, set now.
    pub fn added(path: impl Into<String>, value: Value) -> Self {
        Self {
            path: path.into(),
            before: None,
            after: Some(value),
        }
    }

    /// Attribute set before, absent now.
    pub fn removed(path: impl Into<String>, value: Value) -> Self {
        Self {
            path: path.into(),
            before: Some(value),
            after: None,
        }
    }

    /// Attribute set on both sides with different values.
    pub fn modified(path: impl Into<String>, before: Value, after: Value) -> Self {
        Self {
            path: path.into(),
            before: Some(before),
            after: Some(after),
        }
    }
}

impl From<AttributeChange> for crate::generated::AttributeChange {
    fn from(change: AttributeChange) -> Self {
        let encode = |v: Option<Value>| {
            v.and_then(|v| serde_json::to_vec(&v).ok())
                .unwrap_or_default()
        };
        Self {
            path: change.path,
            before: encode(change.before),
            after: encode(change.after),
        }
    }
}

/// Planned state plus the diff that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanResult {
    /// The planned state after the operation (`Null` when destroying).
    pub planned_state: Value,
    /// Differences from the prior state.
    pub changes: Vec<AttributeChange>,
    /// A `force_new` attribute changed.
    pub requires_replace: bool,
}

impl PlanResult {
    /// Planned state equal to the prior state.
    pub fn no_change(state: Value) -> Self {
        Self {
            planned_state: state,
            changes: Vec::new(),
            requires_replace: false,
        }
    }
}

/// A resource produced by an import.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportedResource {
    /// The resource type, e.g. `sentry_monitor`.
    pub resource_type: String,
    /// State as the CLI should store it.
    pub state: Value,
}

/// Type names reported by `GetMetadata`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ProviderMetadata {
    /// Resource type names.
    pub resources: Vec<String>,
    /// Data source type names.
    pub data_sources: Vec<String>,
}

/// Version field of the handshake line.
pub const PROTOCOL_VERSION: u32 = 1;

/// The handshake prefix written to stdout when the plugin starts.
pub const HANDSHAKE_PREFIX: &str = "SENTRY_PROVIDER";
