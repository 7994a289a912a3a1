//! Manifest validation port
//!
//! The publish engine hands every manifest to a [`Validator`] before touching
//! storage. Schema checks and package-ownership checks against third-party
//! registries live behind this trait; [`StructuralValidator`] covers what can
//! be checked locally.

use async_trait::async_trait;
use url::Url;

use super::schema::ServerJson;

/// Maximum description length accepted by [`StructuralValidator`]
pub const MAX_DESCRIPTION_LENGTH: usize = 100;

/// Validates a manifest before it is published or edited.
///
/// Any `Err` rejects the request; the message is surfaced to the caller as-is.
#[async_trait]
pub trait Validator: Send + Sync {
    async fn validate(&self, server: &ServerJson) -> Result<(), String>;
}

/// Local-only validation: remote URL shape, version shape, description length.
#[derive(Debug, Clone, Default)]
pub struct StructuralValidator;

impl StructuralValidator {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Validator for StructuralValidator {
    async fn validate(&self, server: &ServerJson) -> Result<(), String> {
        validate_version_string(&server.version)?;

        if server.description.chars().count() > MAX_DESCRIPTION_LENGTH {
            return Err(format!(
                "description exceeds {} characters",
                MAX_DESCRIPTION_LENGTH
            ));
        }

        for remote in &server.remotes {
            validate_remote_url(&remote.url)?;
        }

        for package in &server.packages {
            if package.identifier.trim().is_empty() {
                return Err(format!(
                    "package on '{}' is missing an identifier",
                    package.registry_type
                ));
            }
        }

        Ok(())
    }
}

/// Reject version ranges and aliases; a published version names one release.
pub fn validate_version_string(version: &str) -> Result<(), String> {
    if version.eq_ignore_ascii_case("latest") {
        return Err("version 'latest' is reserved".to_string());
    }

    let is_range = version.contains(['^', '~', '>', '<', '*', ' '])
        || version.contains("||")
        || version
            .split('.')
            .any(|part| part.eq_ignore_ascii_case("x"));
    if is_range {
        return Err(format!(
            "version '{}' looks like a range; publish a specific version",
            version
        ));
    }

    Ok(())
}

/// Remote endpoints must be absolute http(s) URLs.
pub fn validate_remote_url(raw: &str) -> Result<(), String> {
    let url = Url::parse(raw).map_err(|e| format!("invalid remote URL '{}': {}", raw, e))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(format!(
            "remote URL '{}' must use http or https",
            raw
        ));
    }
    if url.host_str().map_or(true, str::is_empty) {
        return Err(format!("remote URL '{}' has no host", raw));
    }

    Ok(())
}
