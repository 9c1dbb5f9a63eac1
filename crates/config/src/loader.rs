//! Configuration loader implementation

use crate::env::{EnvSource, ProcessEnv};
use crate::parser::{DocumentParser, HclParser, YamlParser};
use crate::schema::Config;
use crate::validation::ConfigValidator;
use controller_types::{ConfigError, Result};
use std::path::Path;
use tracing::{debug, info, warn};

/// Resolve the configuration file at `path` against the process environment
pub fn resolve<P: AsRef<Path>>(path: P) -> Result<Config> {
    ConfigLoader::new().load(path)
}

/// Resolve configuration text already held in memory against the process environment
pub fn parse(text: &str, file: &str) -> Result<Config> {
    ConfigLoader::new().load_from_str(text, file)
}

/// Configuration loader: parse, overlay the environment, validate
///
/// Uses the process environment and picks the engine from the file
/// extension unless told otherwise.
pub struct ConfigLoader {
    env: Box<dyn EnvSource>,
    parser: Option<Box<dyn DocumentParser>>,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self {
            env: Box::new(ProcessEnv),
            parser: None,
        }
    }

    /// Read overrides from `env` instead of the process environment
    pub fn with_env(mut self, env: impl EnvSource + 'static) -> Self {
        self.env = Box::new(env);
        self
    }

    /// Always parse with `parser`, whatever the file extension
    pub fn with_parser(mut self, parser: impl DocumentParser + 'static) -> Self {
        self.parser = Some(Box::new(parser));
        self
    }

    /// Load configuration from file and environment variables
    pub fn load<P: AsRef<Path>>(&self, config_path: P) -> Result<Config> {
        let config_path = config_path.as_ref();

        let text = std::fs::read_to_string(config_path).map_err(|source| ConfigError::Read {
            path: config_path.to_path_buf(),
            source,
        })?;

        let file = config_path.display().to_string();
        match &self.parser {
            Some(parser) => self.resolve_with(parser.as_ref(), &text, &file),
            None if is_yaml(config_path) => self.resolve_with(&YamlParser, &text, &file),
            None => self.resolve_with(&HclParser, &text, &file),
        }
    }

    /// Load configuration from string, `file` only names the source in errors
    pub fn load_from_str(&self, text: &str, file: &str) -> Result<Config> {
        match &self.parser {
            Some(parser) => self.resolve_with(parser.as_ref(), text, file),
            None => self.resolve_with(&HclParser, text, file),
        }
    }

    fn resolve_with(&self, parser: &dyn DocumentParser, text: &str, file: &str) -> Result<Config> {
        let mut config = parser.parse_document(text, file)?;
        debug!(file, name = %config.metadata.name, "parsed configuration");

        config.process(self.env.as_ref())?;

        let report = ConfigValidator::validate(&config);
        for issue in &report.warnings {
            warn!(file, field = %issue.field, "{}", issue.message);
        }

        info!(
            file,
            name = %config.metadata.name,
            enterprise = config.boundary.enterprise,
            "configuration resolved"
        );
        Ok(config)
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

fn is_yaml(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::EnvVar;
    use std::collections::BTreeMap;
    use std::io::Write;
    use std::sync::{Mutex, MutexGuard};
    use tempfile::{Builder, NamedTempFile};

    const CONTROLLER_HCL: &str = r#"
config "controller" {
  nomad {
    address = "file-addr"
    region  = "global"
  }

  boundary {
    enterprise      = true
    org_id          = "o_1234567890"
    default_groups  = ["developers"]
    auth_method_id  = "ampw_1234567890"
    username        = "admin"
    password        = "password"
    address         = "http://localhost:9200"

    default_ingress_filter = "  \"ingress\" in \"/tags/type\"  "
    default_egress_filter  = trim("  \"egress\" in \"/tags/type\" ")
  }
}
"#;

    const OSS_HCL: &str = r#"
config "controller" {
  boundary {
    org_id         = "o_1234567890"
    auth_method_id = "ampw_1234567890"
    username       = "admin"
    password       = "password"
    address        = "http://localhost:9200"

    default_ingress_filter = " proxy-allow "
  }
}
"#;

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    /// Clears every overlay variable for the test and restores them on drop
    struct EnvGuard {
        saved: Vec<(&'static str, Option<String>)>,
        _lock: MutexGuard<'static, ()>,
    }

    impl EnvGuard {
        fn clear() -> Self {
            let lock = ENV_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            let saved = EnvVar::ALL
                .iter()
                .map(|var| (var.as_str(), std::env::var(var.as_str()).ok()))
                .collect();
            for var in EnvVar::ALL {
                std::env::remove_var(var.as_str());
            }
            Self { saved, _lock: lock }
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            for (name, value) in self.saved.drain(..) {
                match value {
                    Some(value) => std::env::set_var(name, value),
                    None => std::env::remove_var(name),
                }
            }
        }
    }

    fn write_config(suffix: &str, content: &str) -> NamedTempFile {
        let mut file = Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    fn loader(pairs: &[(&str, &str)]) -> ConfigLoader {
        let env: BTreeMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ConfigLoader::new().with_env(env)
    }

    #[test]
    fn test_load_file_values() {
        let file = write_config(".hcl", CONTROLLER_HCL);
        let config = loader(&[]).load(file.path()).unwrap();

        assert_eq!(config.metadata.name, "controller");
        assert_eq!(config.metadata.file, file.path().display().to_string());
        assert_eq!(config.nomad.address, "file-addr");
        assert_eq!(config.nomad.region, "global");
        assert!(config.boundary.enterprise);
        assert_eq!(config.boundary.default_groups, vec!["developers"]);
    }

    #[test]
    fn test_enterprise_filters_trimmed() {
        let file = write_config(".hcl", CONTROLLER_HCL);
        let config = loader(&[]).load(file.path()).unwrap();

        assert_eq!(config.boundary.default_ingress_filter, r#""ingress" in "/tags/type""#);
        assert_eq!(config.boundary.default_egress_filter, r#""egress" in "/tags/type""#);
    }

    #[test]
    fn test_env_address_beats_file() {
        let file = write_config(".hcl", CONTROLLER_HCL);
        let config = loader(&[("NOMAD_ADDRESS", "env-addr")]).load(file.path()).unwrap();
        assert_eq!(config.nomad.address, "env-addr");
        assert_eq!(config.nomad.region, "global");
    }

    #[test]
    fn test_empty_enterprise_env_keeps_file_value() {
        let file = write_config(".hcl", CONTROLLER_HCL);
        let config = loader(&[("BOUNDARY_ENTERPRISE", "")]).load(file.path()).unwrap();
        assert!(config.boundary.enterprise);
    }

    #[test]
    fn test_default_groups_from_env() {
        let file = write_config(".hcl", CONTROLLER_HCL);
        let config = loader(&[("BOUNDARY_DEFAULT_GROUPS", "a,b,,c")])
            .load(file.path())
            .unwrap();
        assert_eq!(config.boundary.default_groups, vec!["a", "b", "", "c"]);
    }

    #[test]
    fn test_oss_filter_rejected() {
        let file = write_config(".hcl", OSS_HCL);
        let err = loader(&[]).load(file.path()).unwrap_err();

        assert!(matches!(err, ConfigError::UnsupportedFeature { .. }));
        assert_eq!(err.file(), file.path().display().to_string());
    }

    #[test]
    fn test_oss_filter_allowed_when_env_enables_enterprise() {
        let file = write_config(".hcl", OSS_HCL);
        let config = loader(&[("BOUNDARY_ENTERPRISE", "true")])
            .load(file.path())
            .unwrap();
        assert_eq!(config.boundary.default_ingress_filter, "proxy-allow");
    }

    #[test]
    fn test_cardinality_from_file() {
        let file = write_config(".hcl", "# nothing here\n");
        let err = loader(&[]).load(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Cardinality { found: 0, .. }));

        let twice = format!("{}\n{}", OSS_HCL, OSS_HCL.replace("\"controller\"", "\"other\""));
        let file = write_config(".hcl", &twice);
        let err = loader(&[]).load(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Cardinality { found: 2, .. }));
        assert!(err.to_string().contains(&file.path().display().to_string()));
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.hcl");
        let err = loader(&[]).load(&path).unwrap_err();

        assert!(matches!(err, ConfigError::Read { .. }));
        assert!(err.to_string().contains("missing.hcl"));
    }

    #[test]
    fn test_parse_error_names_file() {
        let file = write_config(".hcl", "config \"controller\" {\n  boundary {\n");
        let err = loader(&[]).load(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains(&file.path().display().to_string()));
    }

    #[test]
    fn test_yaml_selected_by_extension() {
        let yaml = r#"
config:
  controller:
    boundary:
      org_id: "o_1234567890"
      auth_method_id: "ampw_1234567890"
      username: "admin"
      password: "password"
      address: "http://localhost:9200"
"#;
        let file = write_config(".yml", yaml);
        let config = loader(&[("BOUNDARY_PASSWORD", "env-password")])
            .load(file.path())
            .unwrap();

        assert_eq!(config.metadata.name, "controller");
        assert_eq!(config.boundary.password, "env-password");
    }

    #[test]
    fn test_explicit_parser_overrides_extension() {
        let file = write_config(".conf", CONTROLLER_HCL);
        let err = loader(&[])
            .with_parser(YamlParser::new())
            .load(file.path())
            .unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));

        let config = loader(&[]).with_parser(HclParser::new()).load(file.path()).unwrap();
        assert_eq!(config.metadata.name, "controller");
    }

    #[test]
    fn test_load_from_str() {
        let config = loader(&[("BOUNDARY_USERNAME", "env-user")])
            .load_from_str(CONTROLLER_HCL, "inline")
            .unwrap();
        assert_eq!(config.metadata.file, "inline");
        assert_eq!(config.boundary.username, "env-user");
        assert_eq!(config.boundary.password, "password");
    }

    #[test]
    fn test_resolve_with_process_env() {
        let _env = EnvGuard::clear();
        let file = write_config(".hcl", CONTROLLER_HCL);

        let config = resolve(file.path()).unwrap();
        assert_eq!(config.metadata.name, "controller");
        assert_eq!(config.nomad.address, "file-addr");
        assert!(config.boundary.enterprise);
        assert_eq!(config.boundary.default_ingress_filter, r#""ingress" in "/tags/type""#);

        let err = resolve(write_config(".hcl", OSS_HCL).path()).unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedFeature { .. }));
    }

    #[test]
    fn test_parse_with_process_env() {
        let _env = EnvGuard::clear();

        let config = parse(CONTROLLER_HCL, "inline").unwrap();
        assert_eq!(config.metadata.file, "inline");
        assert_eq!(config.boundary.username, "admin");

        let err = parse("", "inline").unwrap_err();
        assert!(matches!(err, ConfigError::Cardinality { found: 0, .. }));
    }
}
