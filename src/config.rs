//! Provider configuration.
//!
//! Values come from the provider block, falling back to the environment:
//!
//! | Attribute  | Environment variable | Default                  |
//! |------------|----------------------|--------------------------|
//! | `token`    | `SENTRY_AUTH_TOKEN`  | none, required           |
//! | `base_url` | `SENTRY_BASE_URL`    | `https://sentry.io/api/` |

use serde::{Deserialize, Serialize};
use url::Url;

use crate::apiclient::SentryClient;
use crate::error::ProviderError;
use crate::schema::{Attribute, Diagnostic, Schema};

/// Environment variable holding the auth token.
pub const TOKEN_ENV: &str = "SENTRY_AUTH_TOKEN";
/// Environment variable holding the API base URL.
pub const BASE_URL_ENV: &str = "SENTRY_BASE_URL";
/// Base URL of sentry.io.
pub const DEFAULT_BASE_URL: &str = "https://sentry.io/api/";

/// The provider block as sent by the CLI.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Auth token.
    pub token: Option<String>,
    /// API base URL, for self-hosted Sentry.
    pub base_url: Option<String>,
}

/// Configuration with fallbacks applied and the base URL checked.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedConfig {
    /// Auth token.
    pub token: String,
    /// API base URL, ending in `/`.
    pub base_url: Url,
}

impl ProviderConfig {
    /// Provider configuration schema.
    pub fn schema() -> Schema {
        Schema::v0()
            .with_attribute(
                "token",
                Attribute::optional_string()
                    .sensitive()
                    .with_description(format!(
                        "The authentication token. Can also be set with {}.",
                        TOKEN_ENV
                    )),
            )
            .with_attribute(
                "base_url",
                Attribute::optional_string().with_description(format!(
                    "The Sentry API base URL. Can also be set with {}. Defaults to {}.",
                    BASE_URL_ENV, DEFAULT_BASE_URL
                )),
            )
    }

    /// Resolve against the process environment.
    pub fn resolve(&self) -> Result<ResolvedConfig, Vec<Diagnostic>> {
        self.resolve_with(|key| std::env::var(key).ok())
    }

    /// Resolve with `lookup` standing in for the environment.
    pub fn resolve_with<F>(&self, lookup: F) -> Result<ResolvedConfig, Vec<Diagnostic>>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_blank = |v: &String| !v.trim().is_empty();
        let pick = |value: &Option<String>, env: &str| {
            value
                .clone()
                .filter(non_blank)
                .or_else(|| lookup(env).filter(non_blank))
        };

        let mut diagnostics = Vec::new();

        let token = pick(&self.token, TOKEN_ENV);
        if token.is_none() {
            diagnostics.push(Diagnostic::attribute_error(
                "token",
                "Missing auth token",
                format!(
                    "Set the token attribute or the {} environment variable",
                    TOKEN_ENV
                ),
            ));
        }

        let raw_url =
            pick(&self.base_url, BASE_URL_ENV).unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let base_url = match parse_base_url(&raw_url) {
            Ok(url) => Some(url),
            Err(detail) => {
                diagnostics.push(Diagnostic::attribute_error(
                    "base_url",
                    "Invalid base URL",
                    detail,
                ));
                None
            },
        };

        match (token, base_url) {
            (Some(token), Some(base_url)) => Ok(ResolvedConfig { token, base_url }),
            _ => Err(diagnostics),
        }
    }
}

impl ResolvedConfig {
    /// Build an API client from this configuration.
    pub fn client(&self) -> Result<SentryClient, ProviderError> {
        Ok(SentryClient::new(self.base_url.clone(), &self.token)?)
    }
}

fn parse_base_url(raw: &str) -> Result<Url, String> {
    let mut url = Url::parse(raw).map_err(|e| format!("{:?} is not a valid URL: {}", raw, e))?;

    if !matches!(url.scheme(), "http" | "https") || url.cannot_be_a_base() {
        return Err(format!("{:?} must be an absolute http or https URL", raw));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}
