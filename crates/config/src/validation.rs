//! Configuration validation
//!
//! [`Config::process`] is the post-parse hook that every resolution runs.
//! [`ConfigValidator`] is an advisory pass whose warnings never fail a load.

use crate::env::EnvSource;
use crate::schema::Config;
use controller_types::utils::has_http_scheme;
use controller_types::{ConfigError, Result};

const INGRESS_FILTER: &str = "boundary.default_ingress_filter";
const EGRESS_FILTER: &str = "boundary.default_egress_filter";

impl Config {
    /// Post-parse hook: trim filters, apply the environment overlay, check the tier.
    ///
    /// Filters are trimmed before the overlay runs, so filter values coming
    /// from the environment are kept verbatim. On error the overlay has
    /// already been applied and is not rolled back.
    pub fn process(&mut self, env: &dyn EnvSource) -> Result<()> {
        self.trim_filters();
        self.apply_env(env);
        self.check_tier()
    }

    /// Strip surrounding whitespace from both filters. Idempotent.
    pub fn trim_filters(&mut self) {
        trim_in_place(&mut self.boundary.default_ingress_filter);
        trim_in_place(&mut self.boundary.default_egress_filter);
    }

    /// Reject filters unless the enterprise tier is enabled
    pub fn check_tier(&self) -> Result<()> {
        if let Some(field) = self.tier_violations().next() {
            return Err(ConfigError::UnsupportedFeature {
                file: self.metadata.file.clone(),
                field: field.to_string(),
            });
        }
        Ok(())
    }

    fn tier_violations(&self) -> impl Iterator<Item = &'static str> + '_ {
        let boundary = &self.boundary;
        [
            (INGRESS_FILTER, &boundary.default_ingress_filter),
            (EGRESS_FILTER, &boundary.default_egress_filter),
        ]
        .into_iter()
        .filter(move |(_, filter)| !boundary.enterprise && !filter.is_empty())
        .map(|(field, _)| field)
    }
}

fn trim_in_place(value: &mut String) {
    let trimmed = value.trim();
    if trimmed.len() != value.len() {
        *value = trimmed.to_string();
    }
}

/// Configuration validator
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate complete configuration
    pub fn validate(config: &Config) -> ValidationReport {
        let mut report = ValidationReport::default();

        Self::validate_tier(config, &mut report);
        Self::validate_nomad(config, &mut report);
        Self::validate_boundary(config, &mut report);

        report
    }

    fn validate_tier(config: &Config, report: &mut ValidationReport) {
        for field in config.tier_violations() {
            report.add_error(field, "Filters are not supported outside the enterprise tier");
        }
    }

    fn validate_nomad(config: &Config, report: &mut ValidationReport) {
        if config.nomad.address.is_empty() {
            report.add_warning("nomad.address", "Nomad address not set, the client default will be used");
        } else if !has_http_scheme(&config.nomad.address) {
            report.add_warning("nomad.address", "Nomad address should start with http:// or https://");
        }
    }

    fn validate_boundary(config: &Config, report: &mut ValidationReport) {
        if !has_http_scheme(&config.boundary.address) {
            report.add_warning(
                "boundary.address",
                &format!("Boundary address should start with http:// or https://: {}", config.boundary.address),
            );
        }

        let empty_groups = config.boundary.default_groups.iter().filter(|g| g.is_empty()).count();
        if empty_groups > 0 {
            report.add_warning(
                "boundary.default_groups",
                &format!("Default groups contain {} empty entries", empty_groups),
            );
        }
    }
}

/// Errors and warnings found by [`ConfigValidator`]
#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    pub errors: Vec<ValidationIssue>,
    pub warnings: Vec<ValidationIssue>,
}

/// A single finding against one config field
#[derive(Debug, Clone)]
pub struct ValidationIssue {
    pub field: String,
    pub message: String,
}

impl ValidationIssue {
    fn new(field: &str, message: &str) -> Self {
        Self {
            field: field.to_string(),
            message: message.to_string(),
        }
    }
}

impl ValidationReport {
    pub fn add_error(&mut self, field: &str, message: &str) {
        self.errors.push(ValidationIssue::new(field, message));
    }

    pub fn add_warning(&mut self, field: &str, message: &str) {
        self.warnings.push(ValidationIssue::new(field, message));
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}
