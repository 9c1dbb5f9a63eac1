//! Document parsers
//!
//! Parsing is the structural phase only: it turns text into a [`Config`]
//! with field presence and types checked. Environment overlay and tier
//! validation run afterwards through [`Config::process`].

use crate::schema::{Config, ConfigBody, ResourceMetadata, CONFIG_KIND};
use controller_types::{ConfigError, Result};
use figment::{
    providers::{Format, Yaml},
    Figment,
};
use hcl::eval::{Context, Evaluate, FuncArgs, FuncDef, ParamType};
use hcl::structure::{Body, Structure};
use serde::Deserialize;
use std::collections::BTreeMap;

/// Engine that turns raw document text into a [`Config`]
pub trait DocumentParser: Send + Sync {
    /// Parse `text`, using `file` to identify the source in errors and metadata
    fn parse_document(&self, text: &str, file: &str) -> Result<Config>;
}

/// HCL engine with a `trim` template function
#[derive(Debug, Clone, Copy, Default)]
pub struct HclParser;

impl HclParser {
    pub fn new() -> Self {
        Self
    }

    fn context() -> Context<'static> {
        let mut ctx = Context::new();
        ctx.declare_func(
            "trim",
            FuncDef::builder().param(ParamType::String).build(trim),
        );
        ctx
    }
}

impl DocumentParser for HclParser {
    fn parse_document(&self, text: &str, file: &str) -> Result<Config> {
        let body: Body = hcl::parse(text).map_err(|e| ConfigError::parse(file, e))?;
        let body = body
            .evaluate(&Self::context())
            .map_err(|e| ConfigError::parse(file, e))?;

        let mut resources = Vec::new();
        for structure in body {
            match structure {
                Structure::Block(block) if block.identifier.as_str() == CONFIG_KIND => {
                    resources.push(block);
                }
                Structure::Block(block) => {
                    return Err(ConfigError::parse(
                        file,
                        format!("unsupported resource type `{}`", block.identifier.as_str()),
                    ));
                }
                Structure::Attribute(attribute) => {
                    return Err(ConfigError::parse(
                        file,
                        format!("unexpected top-level attribute `{}`", attribute.key.as_str()),
                    ));
                }
            }
        }

        let block = single_resource(file, resources)?;
        let name = block
            .labels
            .first()
            .map(|label| label.as_str().to_string())
            .unwrap_or_default();
        let body: ConfigBody =
            hcl::from_value(block_value(file, block.body)?).map_err(|e| ConfigError::parse(file, e))?;

        tracing::debug!(file, name = %name, "parsed HCL config resource");
        Ok(Config::from_body(ResourceMetadata::new(name, file), body))
    }
}

/// Turn an evaluated block body into an object value.
///
/// Going through `hcl::Value` keeps literals typed, so a number or list in a
/// string field fails deserialization. Nested blocks may appear once each and
/// carry no labels.
fn block_value(file: &str, body: Body) -> Result<hcl::Value> {
    let mut object = hcl::Map::new();
    for structure in body {
        match structure {
            Structure::Attribute(attribute) => {
                let key = attribute.key.as_str().to_string();
                if object.contains_key(&key) {
                    return Err(ConfigError::parse(file, format!("duplicate `{}` attribute", key)));
                }
                object.insert(key, hcl::Value::from(attribute.expr));
            }
            Structure::Block(block) => {
                let key = block.identifier.as_str().to_string();
                if object.contains_key(&key) {
                    return Err(ConfigError::parse(file, format!("duplicate `{}` block", key)));
                }
                if !block.labels.is_empty() {
                    return Err(ConfigError::parse(file, format!("`{}` block takes no labels", key)));
                }
                let nested = block_value(file, block.body)?;
                object.insert(key, nested);
            }
        }
    }
    Ok(hcl::Value::Object(object))
}

/// `trim(s)`: strip leading and trailing whitespace
fn trim(args: FuncArgs) -> std::result::Result<hcl::Value, String> {
    args.first()
        .and_then(hcl::Value::as_str)
        .map(|s| hcl::Value::String(s.trim().to_string()))
        .ok_or_else(|| "trim expects a single string argument".to_string())
}

/// YAML engine backed by figment
///
/// Resources live under a top-level `config` mapping keyed by name. There are
/// no template functions; filters are still trimmed by [`Config::process`].
#[derive(Debug, Clone, Copy, Default)]
pub struct YamlParser;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct YamlDocument {
    #[serde(default)]
    config: BTreeMap<String, ConfigBody>,
}

impl YamlParser {
    pub fn new() -> Self {
        Self
    }
}

impl DocumentParser for YamlParser {
    fn parse_document(&self, text: &str, file: &str) -> Result<Config> {
        let document: YamlDocument = Figment::from(Yaml::string(text))
            .extract()
            .map_err(|e| ConfigError::parse(file, e))?;

        let (name, body) = single_resource(file, document.config.into_iter().collect())?;

        tracing::debug!(file, name = %name, "parsed YAML config resource");
        Ok(Config::from_body(ResourceMetadata::new(name, file), body))
    }
}

fn single_resource<T>(file: &str, mut resources: Vec<T>) -> Result<T> {
    let cardinality = |found| ConfigError::Cardinality {
        file: file.to_string(),
        found,
    };

    if resources.len() != 1 {
        return Err(cardinality(resources.len()));
    }
    resources.pop().ok_or_else(|| cardinality(0))
}
