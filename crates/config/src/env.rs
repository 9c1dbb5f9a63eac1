//! Environment variable overlay
//!
//! A fixed set of `NOMAD_*` and `BOUNDARY_*` variables overwrite file values
//! when set and non-empty. Empty or absent variables never clear a value.
//! Lookups go through [`EnvSource`] so callers and tests can supply their own
//! environment instead of the process one.

use crate::schema::Config;
use controller_types::utils::split_list;
use std::collections::{BTreeMap, HashMap};

/// Source of environment variable values
pub trait EnvSource: Send + Sync {
    /// Value of `name`, or `None` when unset
    fn get(&self, name: &str) -> Option<String>;
}

/// Reads from the process environment. Values that are not valid UTF-8 count as unset.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn get(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

impl EnvSource for BTreeMap<String, String> {
    fn get(&self, name: &str) -> Option<String> {
        BTreeMap::get(self, name).cloned()
    }
}

impl EnvSource for HashMap<String, String> {
    fn get(&self, name: &str) -> Option<String> {
        HashMap::get(self, name).cloned()
    }
}

/// Environment variables recognised by the overlay
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvVar {
    NomadAddress,
    NomadToken,
    NomadRegion,
    NomadNamespace,
    BoundaryEnterprise,
    BoundaryOrgId,
    BoundaryDefaultProject,
    BoundaryDefaultGroups,
    BoundaryAuthMethodId,
    BoundaryUsername,
    BoundaryPassword,
    BoundaryAddress,
    BoundaryDefaultIngressFilter,
    BoundaryDefaultEgressFilter,
}

impl EnvVar {
    /// Every recognised variable, in the order the overlay applies them
    pub const ALL: [EnvVar; 14] = [
        EnvVar::NomadAddress,
        EnvVar::NomadToken,
        EnvVar::NomadRegion,
        EnvVar::NomadNamespace,
        EnvVar::BoundaryEnterprise,
        EnvVar::BoundaryOrgId,
        EnvVar::BoundaryDefaultProject,
        EnvVar::BoundaryDefaultGroups,
        EnvVar::BoundaryAuthMethodId,
        EnvVar::BoundaryUsername,
        EnvVar::BoundaryPassword,
        EnvVar::BoundaryAddress,
        EnvVar::BoundaryDefaultIngressFilter,
        EnvVar::BoundaryDefaultEgressFilter,
    ];

    /// Environment variable name
    pub const fn as_str(self) -> &'static str {
        match self {
            EnvVar::NomadAddress => "NOMAD_ADDRESS",
            EnvVar::NomadToken => "NOMAD_TOKEN",
            EnvVar::NomadRegion => "NOMAD_REGION",
            EnvVar::NomadNamespace => "NOMAD_NAMESPACE",
            EnvVar::BoundaryEnterprise => "BOUNDARY_ENTERPRISE",
            EnvVar::BoundaryOrgId => "BOUNDARY_ORG_ID",
            EnvVar::BoundaryDefaultProject => "BOUNDARY_DEFAULT_PROJECT",
            EnvVar::BoundaryDefaultGroups => "BOUNDARY_DEFAULT_GROUPS",
            EnvVar::BoundaryAuthMethodId => "BOUNDARY_AUTH_METHOD_ID",
            EnvVar::BoundaryUsername => "BOUNDARY_USERNAME",
            EnvVar::BoundaryPassword => "BOUNDARY_PASSWORD",
            EnvVar::BoundaryAddress => "BOUNDARY_ADDRESS",
            EnvVar::BoundaryDefaultIngressFilter => "BOUNDARY_DEFAULT_INGRESS_FILTER",
            EnvVar::BoundaryDefaultEgressFilter => "BOUNDARY_DEFAULT_EGRESS_FILTER",
        }
    }

    /// Config field the variable overwrites
    pub const fn field(self) -> &'static str {
        match self {
            EnvVar::NomadAddress => "nomad.address",
            EnvVar::NomadToken => "nomad.token",
            EnvVar::NomadRegion => "nomad.region",
            EnvVar::NomadNamespace => "nomad.namespace",
            EnvVar::BoundaryEnterprise => "boundary.enterprise",
            EnvVar::BoundaryOrgId => "boundary.org_id",
            EnvVar::BoundaryDefaultProject => "boundary.default_project",
            EnvVar::BoundaryDefaultGroups => "boundary.default_groups",
            EnvVar::BoundaryAuthMethodId => "boundary.auth_method_id",
            EnvVar::BoundaryUsername => "boundary.username",
            EnvVar::BoundaryPassword => "boundary.password",
            EnvVar::BoundaryAddress => "boundary.address",
            EnvVar::BoundaryDefaultIngressFilter => "boundary.default_ingress_filter",
            EnvVar::BoundaryDefaultEgressFilter => "boundary.default_egress_filter",
        }
    }
}

impl Config {
    /// Overwrite fields from the environment.
    ///
    /// Values are taken as-is: nothing is trimmed and `BOUNDARY_DEFAULT_GROUPS`
    /// keeps empty segments. `BOUNDARY_ENTERPRISE` only accepts the exact
    /// strings `true` and `false`; anything else leaves the flag alone.
    pub fn apply_env(&mut self, env: &dyn EnvSource) {
        for var in EnvVar::ALL {
            if let Some(value) = env.get(var.as_str()) {
                self.apply_env_var(var, value);
            }
        }
    }

    fn apply_env_var(&mut self, var: EnvVar, value: String) {
        if value.is_empty() {
            return;
        }

        match var {
            EnvVar::NomadAddress => self.nomad.address = value,
            EnvVar::NomadToken => self.nomad.token = value,
            EnvVar::NomadRegion => self.nomad.region = value,
            EnvVar::NomadNamespace => self.nomad.namespace = value,
            EnvVar::BoundaryEnterprise => match value.as_str() {
                "true" => self.boundary.enterprise = true,
                "false" => self.boundary.enterprise = false,
                other => {
                    tracing::warn!(
                        variable = var.as_str(),
                        value = other,
                        "ignoring value, expected `true` or `false`"
                    );
                    return;
                }
            },
            EnvVar::BoundaryOrgId => self.boundary.org_id = value,
            EnvVar::BoundaryDefaultProject => self.boundary.default_project = value,
            EnvVar::BoundaryDefaultGroups => self.boundary.default_groups = split_list(&value),
            EnvVar::BoundaryAuthMethodId => self.boundary.auth_method_id = value,
            EnvVar::BoundaryUsername => self.boundary.username = value,
            EnvVar::BoundaryPassword => self.boundary.password = value,
            EnvVar::BoundaryAddress => self.boundary.address = value,
            EnvVar::BoundaryDefaultIngressFilter => self.boundary.default_ingress_filter = value,
            EnvVar::BoundaryDefaultEgressFilter => self.boundary.default_egress_filter = value,
        }

        tracing::debug!(
            variable = var.as_str(),
            field = var.field(),
            "applied environment override"
        );
    }
}
