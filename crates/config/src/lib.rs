//! Configuration management for the Nomad and Boundary controller
//!
//! This crate parses the controller configuration document, overlays
//! `NOMAD_*` and `BOUNDARY_*` environment variables, and rejects
//! combinations the Boundary license tier does not support.

pub mod env;
pub mod loader;
pub mod parser;
pub mod schema;
pub mod validation;

pub use env::{EnvSource, EnvVar, ProcessEnv};
pub use loader::{parse, resolve, ConfigLoader};
pub use parser::{DocumentParser, HclParser, YamlParser};
pub use schema::*;
pub use validation::*;
