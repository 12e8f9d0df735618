//! Diagnostics shared by the resource and data source handlers.

use std::fmt::Display;

use crate::schema::Diagnostic;

/// A Sentry API call failed.
pub fn client_error(action: &str, err: impl Display) -> Diagnostic {
    Diagnostic::error("Client error")
        .with_detail(format!("Unable to {}, got error: {}", action, err))
}

/// The API has no object matching the request.
pub fn not_found(what: &str) -> Diagnostic {
    Diagnostic::error("Not found").with_detail(format!("No matching {} found", what))
}

/// The operation is not available for this type.
pub fn not_supported(action: &str) -> Diagnostic {
    Diagnostic::error("Not supported").with_detail(format!("Action {:?} is not supported", action))
}

/// An API response could not be copied into the state model.
pub fn fill_error(err: impl Display) -> Diagnostic {
    Diagnostic::error("Fill error").with_detail(format!("Unable to fill model: {}", err))
}

/// State lacks the ID of an object that should exist.
pub fn missing_id(what: &str) -> Diagnostic {
    Diagnostic::attribute_error(
        "id",
        "Missing ID",
        format!("The {} ID is not in state", what),
    )
}

/// An import ID could not be understood.
pub fn import_error(err: impl Display) -> Diagnostic {
    Diagnostic::error("Import error").with_detail(format!("Unable to import: {}", err))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let diag = client_error("read", "404 Not Found");
        assert_eq!(diag.summary, "Client error");
        assert_eq!(
            diag.detail.as_deref(),
            Some("Unable to read, got error: 404 Not Found")
        );

        assert_eq!(
            not_found("monitor").detail.as_deref(),
            Some("No matching monitor found")
        );
        assert_eq!(
            not_supported("update").detail.as_deref(),
            Some("Action \"update\" is not supported")
        );
        assert_eq!(
            import_error("bad id").detail.as_deref(),
            Some("Unable to import: bad id")
        );
        assert!(fill_error("x").is_error());

        let diag = missing_id("dashboard");
        assert_eq!(diag.attribute.as_deref(), Some("id"));
        assert_eq!(
            diag.detail.as_deref(),
            Some("The dashboard ID is not in state")
        );
    }
}
