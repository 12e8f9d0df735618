//! Error types for the Sentry provider.

use serde_json::Value;
use thiserror::Error;

use crate::apiclient::ApiError;
use crate::schema::Diagnostic;

/// Errors that can occur while serving provider requests.
///
/// Every variant can be turned into diagnostics with
/// [`ProviderError::into_diagnostics`]; the server never fails an RPC with a
/// gRPC status, it reports errors through the diagnostics channel instead.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The requested object was not found.
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// A validation error occurred.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The provider is unconfigured or its configuration is invalid.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The requested resource or data source type is unknown.
    #[error("Unknown resource type: {0}")]
    UnknownResource(String),

    /// The operation is not supported by this resource type.
    #[error("Unimplemented: {0}")]
    Unimplemented(String),

    /// A serialization/deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The Sentry API returned an error.
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// A gRPC transport error occurred.
    #[error("Transport error: {0}")]
    Transport(#[from] tonic::transport::Error),

    /// An I/O error occurred while binding the listener.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The operation failed with one or more diagnostics.
    #[error("{}", summarize(.0))]
    Diagnostics(Vec<Diagnostic>),

    /// The remote object was written but its state could not be fully read
    /// back. The server stores `state` and reports `diagnostics`.
    #[error("{}", summarize(.diagnostics))]
    PartialState {
        /// State of the object as far as it could be filled.
        state: Value,
        /// Why the state is incomplete.
        diagnostics: Vec<Diagnostic>,
    },
}

impl ProviderError {
    /// Get the error message as a string.
    pub fn message(&self) -> String {
        match self {
            Self::NotFound(msg)
            | Self::Validation(msg)
            | Self::Configuration(msg)
            | Self::UnknownResource(msg)
            | Self::Unimplemented(msg) => msg.clone(),
            Self::Serialization(err) => err.to_string(),
            Self::Api(err) => err.to_string(),
            Self::Transport(err) => err.to_string(),
            Self::Io(err) => err.to_string(),
            Self::Diagnostics(diags) | Self::PartialState { diagnostics: diags, .. } => {
                summarize(diags)
            },
        }
    }

    /// Convert this error into the diagnostics reported to the CLI.
    ///
    /// Diagnostics carried by [`ProviderError::Diagnostics`] are forwarded
    /// unchanged; every other variant becomes a single error diagnostic.
    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        match self {
            Self::Diagnostics(diags) | Self::PartialState { diagnostics: diags, .. } => diags,
            other => vec![Diagnostic::error(other.to_string())],
        }
    }

    /// Wrap diagnostics into an error, or return `Ok` if none are errors.
    pub fn check(diagnostics: Vec<Diagnostic>) -> Result<(), ProviderError> {
        if diagnostics.iter().any(Diagnostic::is_error) {
            Err(Self::Diagnostics(diagnostics))
        } else {
            Ok(())
        }
    }

    /// Like [`ProviderError::check`], but errors keep `state` so an object
    /// that already exists remotely stays tracked.
    pub fn check_state(
        state: Value,
        diagnostics: Vec<Diagnostic>,
    ) -> Result<Value, ProviderError> {
        if diagnostics.iter().any(Diagnostic::is_error) {
            Err(Self::PartialState { state, diagnostics })
        } else {
            Ok(state)
        }
    }
}

impl From<Diagnostic> for ProviderError {
    fn from(diagnostic: Diagnostic) -> Self {
        Self::Diagnostics(vec![diagnostic])
    }
}

fn summarize(diagnostics: &[Diagnostic]) -> String {
    match diagnostics {
        [] => "no diagnostics".to_string(),
        [only] => match &only.detail {
            Some(detail) => format!("{}: {}", only.summary, detail),
            None => only.summary.clone(),
        },
        [first, rest @ ..] => format!("{} (and {} more)", first.summary, rest.len()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ProviderError::NotFound("monitor-123".to_string());
        assert_eq!(format!("{}", err), "Resource not found: monitor-123");

        let err = ProviderError::Validation("invalid input".to_string());
        assert_eq!(format!("{}", err), "Validation error: invalid input");

        let err = ProviderError::UnknownResource("sentry_widget".to_string());
        assert_eq!(format!("{}", err), "Unknown resource type: sentry_widget");
    }

    #[test]
    fn test_message_method() {
        let err = ProviderError::Configuration("invalid config".to_string());
        assert_eq!(err.message(), "invalid config");

        let err = ProviderError::Diagnostics(vec![
            Diagnostic::error("Invalid schedule").with_detail("bad unit")
        ]);
        assert_eq!(err.message(), "Invalid schedule: bad unit");
    }

    #[test]
    fn test_diagnostics_display() {
        let err = ProviderError::Diagnostics(vec![
            Diagnostic::error("First"),
            Diagnostic::error("Second"),
            Diagnostic::error("Third"),
        ]);
        assert_eq!(format!("{}", err), "First (and 2 more)");
    }

    #[test]
    fn test_into_diagnostics_forwards_carried_diagnostics() {
        let carried = vec![
            Diagnostic::error("Client error").with_attribute("config.schedule"),
            Diagnostic::warning("Drift"),
        ];
        let diags = ProviderError::Diagnostics(carried.clone()).into_diagnostics();
        assert_eq!(diags, carried);
    }

    #[test]
    fn test_into_diagnostics_wraps_other_errors() {
        let diags = ProviderError::UnknownResource("sentry_widget".to_string()).into_diagnostics();
        assert_eq!(diags.len(), 1);
        assert!(diags[0].is_error());
        assert_eq!(diags[0].summary, "Unknown resource type: sentry_widget");
    }

    #[test]
    fn test_check() {
        assert!(ProviderError::check(vec![]).is_ok());
        assert!(ProviderError::check(vec![Diagnostic::warning("careful")]).is_ok());

        let err = ProviderError::check(vec![Diagnostic::error("broken")]).unwrap_err();
        assert!(matches!(err, ProviderError::Diagnostics(ref d) if d.len() == 1));
    }

    #[test]
    fn test_check_state_keeps_state() {
        let state = serde_json::json!({"id": "8f3f5b1e"});
        assert_eq!(
            ProviderError::check_state(state.clone(), vec![]).unwrap(),
            state
        );

        let diagnostics = vec![Diagnostic::error("Invalid owner")];
        let err = ProviderError::check_state(state.clone(), diagnostics).unwrap_err();
        assert_eq!(err.to_string(), "Invalid owner");
        match err {
            ProviderError::PartialState {
                state: kept,
                diagnostics,
            } => {
                assert_eq!(kept, state);
                assert_eq!(diagnostics.len(), 1);
            },
            other => panic!("expected partial state, got {:?}", other),
        }
    }
}
