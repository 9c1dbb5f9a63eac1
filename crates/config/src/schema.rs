//! Configuration schema definitions

use controller_types::utils::redact;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Resource kind recognised as a top-level configuration document
pub const CONFIG_KIND: &str = "config";

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Config {
    /// Identity of the resource the config was read from
    pub metadata: ResourceMetadata,
    /// Nomad scheduler connection settings
    pub nomad: NomadConfig,
    /// Boundary access broker connection settings
    pub boundary: BoundaryConfig,
}

/// Identity of a parsed resource, filled in by the parser and never read from the document body
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ResourceMetadata {
    /// Block label, empty when the block has none
    pub name: String,
    /// Resource kind, always [`CONFIG_KIND`]
    pub kind: String,
    /// Source identifier handed to the parser
    pub file: String,
}

/// Body of a `config` block as written in the document
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct ConfigBody {
    #[serde(default)]
    pub nomad: NomadConfig,
    pub boundary: BoundaryConfig,
}

/// Nomad configuration
#[derive(Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NomadConfig {
    /// Nomad API address
    pub address: String,
    /// ACL token
    pub token: String,
    /// Region
    pub region: String,
    /// Namespace
    pub namespace: String,
}

/// Boundary configuration
#[derive(Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BoundaryConfig {
    /// Whether the Boundary deployment is the enterprise tier
    #[serde(default)]
    pub enterprise: bool,
    /// Organization scope ID
    pub org_id: String,
    /// Project used when a job does not name one
    #[serde(default)]
    pub default_project: String,
    /// Groups granted access when a job does not name any
    #[serde(default)]
    pub default_groups: Vec<String>,
    /// Password auth method ID
    pub auth_method_id: String,
    /// Login name
    pub username: String,
    /// Login password
    pub password: String,
    /// Boundary controller API address
    pub address: String,
    /// Worker filter for ingress, enterprise only
    #[serde(default)]
    pub default_ingress_filter: String,
    /// Worker filter for egress, enterprise only
    #[serde(default)]
    pub default_egress_filter: String,
}

impl ResourceMetadata {
    /// Metadata for a `config` resource read from `file`
    pub fn new(name: impl Into<String>, file: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: CONFIG_KIND.to_string(),
            file: file.into(),
        }
    }
}

impl Config {
    pub(crate) fn from_body(metadata: ResourceMetadata, body: ConfigBody) -> Self {
        Self {
            metadata,
            nomad: body.nomad,
            boundary: body.boundary,
        }
    }
}

impl fmt::Debug for NomadConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NomadConfig")
            .field("address", &self.address)
            .field("token", &redact(&self.token))
            .field("region", &self.region)
            .field("namespace", &self.namespace)
            .finish()
    }
}

impl fmt::Debug for BoundaryConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundaryConfig")
            .field("enterprise", &self.enterprise)
            .field("org_id", &self.org_id)
            .field("default_project", &self.default_project)
            .field("default_groups", &self.default_groups)
            .field("auth_method_id", &self.auth_method_id)
            .field("username", &self.username)
            .field("password", &redact(&self.password))
            .field("address", &self.address)
            .field("default_ingress_filter", &self.default_ingress_filter)
            .field("default_egress_filter", &self.default_egress_filter)
            .finish()
    }
}
