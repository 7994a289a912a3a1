//! MCP Server Manifest Schema
//!
//! The publisher-authored document (`server.json`) describing one version of
//! an MCP server: identity, source repository, installable packages and
//! hosted remote endpoints.
//!
//! ```json
//! {
//!   "name": "io.github.example/weather",
//!   "description": "Weather lookups",
//!   "version": "1.2.0",
//!   "repository": { "url": "https://github.com/example/weather", "source": "github" },
//!   "remotes": [{ "type": "streamable-http", "url": "https://weather.example.com/mcp" }]
//! }
//! ```

use serde::{Deserialize, Serialize};

use super::types::*;

/// Separator between the reverse-DNS namespace and the server segment
pub const NAMESPACE_SEPARATOR: char = '/';

/// Source repository of a server
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Repository {
    /// Browsable repository URL
    pub url: String,

    /// Hosting service (e.g., "github", "gitlab")
    pub source: String,

    /// Hosting-service specific repository ID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Path of the server inside a monorepo
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subfolder: Option<String>,
}

/// Header or environment input declared by a package or remote
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct KeyValueInput {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,

    #[serde(default)]
    pub is_required: bool,

    #[serde(default)]
    pub is_secret: bool,
}

/// Transport block of a package
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct PackageTransport {
    #[serde(rename = "type")]
    pub transport_type: TransportType,

    /// Endpoint URL for HTTP transports (may use `{placeholders}`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Installable distribution of a server on a package registry
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Package {
    /// Package registry type (e.g., "npm", "pypi", "oci", "nuget", "mcpb")
    pub registry_type: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registry_base_url: Option<String>,

    /// Package name or image reference on that registry
    pub identifier: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_sha256: Option<String>,

    /// Suggested runner (e.g., "npx", "uvx", "docker")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runtime_hint: Option<String>,

    #[serde(default)]
    pub transport: PackageTransport,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub environment_variables: Vec<KeyValueInput>,
}

/// Hosted endpoint of a server
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Remote {
    #[serde(rename = "type")]
    pub transport_type: TransportType,

    pub url: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub headers: Vec<KeyValueInput>,
}

impl Remote {
    pub fn streamable_http(url: impl Into<String>) -> Self {
        Self {
            transport_type: TransportType::StreamableHttp,
            url: url.into(),
            headers: Vec::new(),
        }
    }
}

/// Publisher-authored server manifest, immutable once published
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServerJson {
    /// Reverse-DNS namespaced name, e.g. "com.example/server"
    pub name: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub status: ServerStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repository: Option<Repository>,

    /// Free-form version string; semantic versions order best
    pub version: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website_url: Option<String>,

    #[serde(default)]
    pub packages: Vec<Package>,

    #[serde(default)]
    pub remotes: Vec<Remote>,
}

impl ServerJson {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            status: ServerStatus::Active,
            repository: None,
            version: version.into(),
            website_url: None,
            packages: Vec::new(),
            remotes: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_repository(mut self, url: impl Into<String>, source: impl Into<String>) -> Self {
        self.repository = Some(Repository {
            url: url.into(),
            source: source.into(),
            id: None,
            subfolder: None,
        });
        self
    }

    pub fn with_remote(mut self, remote: Remote) -> Self {
        self.remotes.push(remote);
        self
    }

    pub fn with_package(mut self, package: Package) -> Self {
        self.packages.push(package);
        self
    }

    pub fn with_status(mut self, status: ServerStatus) -> Self {
        self.status = status;
        self
    }

    /// Split the name into `(namespace, server)`.
    ///
    /// Returns `None` unless the name holds exactly one separator with
    /// non-empty text on both sides.
    pub fn namespace_parts(&self) -> Option<(&str, &str)> {
        let (namespace, server) = self.name.split_once(NAMESPACE_SEPARATOR)?;
        if namespace.is_empty() || server.is_empty() || server.contains(NAMESPACE_SEPARATOR) {
            return None;
        }
        Some((namespace, server))
    }

    /// Remote endpoint URLs in declaration order
    pub fn remote_urls(&self) -> impl Iterator<Item = &str> {
        self.remotes.iter().map(|r| r.url.as_str())
    }

    /// Structural checks every manifest must pass before anything else runs.
    pub fn check_structure(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("server name is required".to_string());
        }
        if self.namespace_parts().is_none() {
            return Err(format!(
                "server name '{}' must be in the form 'namespace/name'",
                self.name
            ));
        }
        if self.version.trim().is_empty() {
            return Err("server version is required".to_string());
        }
        match &self.repository {
            Some(repo) if !repo.url.trim().is_empty() => Ok(()),
            _ => Err("repository url is required".to_string()),
        }
    }
}
