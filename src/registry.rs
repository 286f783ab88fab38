//! Environment registry
//!
//! Maps logical target names ("host", "linux", "windows") to execution
//! environment descriptors. The table is built once at startup and never
//! mutated; resolution is a pure lookup with no I/O.

use crate::config::Config;
use crate::error::{CrucibleError, CrucibleResult};
use std::path::PathBuf;

/// Default cross-compilation triple for the windows environment
pub const WINDOWS_TRIPLE: &str = "x86_64-pc-windows-gnu";

/// A named execution environment for pipeline runs
#[derive(Debug, Clone)]
pub struct Environment {
    /// Logical name used on the command line
    pub name: String,
    /// How stages execute in this environment
    pub kind: EnvKind,
}

/// Execution mode of an environment
#[derive(Debug, Clone)]
pub enum EnvKind {
    /// Run the toolchain directly on the invoking machine
    Host,
    /// Run the toolchain inside a container built from a local context
    Container(ContainerTarget),
}

/// Container-specific environment parameters
#[derive(Debug, Clone)]
pub struct ContainerTarget {
    /// Image repository name; the tag is content-addressed at build time
    pub image_repo: String,
    /// Build context directory, relative to the project root
    pub build_context: PathBuf,
    /// Cross-compilation triple passed verbatim to the toolchain
    pub target_triple: Option<String>,
    /// Name of this environment's build-output cache volume
    pub output_volume: String,
}

impl Environment {
    /// The container target, if this environment is containerized
    pub fn container(&self) -> Option<&ContainerTarget> {
        match &self.kind {
            EnvKind::Host => None,
            EnvKind::Container(target) => Some(target),
        }
    }
}

/// Immutable table of registered environments, in declared order
#[derive(Debug, Clone)]
pub struct Registry {
    environments: Vec<Environment>,
}

impl Registry {
    /// Build the static environment table.
    ///
    /// Declared order is the composite-run order: host first for fast
    /// feedback, then the linux container, then windows cross-compilation.
    pub fn builtin(config: &Config) -> Self {
        let prefix = &config.images.prefix;

        let environments = vec![
            Environment {
                name: "host".to_string(),
                kind: EnvKind::Host,
            },
            Environment {
                name: "linux".to_string(),
                kind: EnvKind::Container(ContainerTarget {
                    image_repo: format!("{prefix}-linux"),
                    build_context: PathBuf::from("docker/linux"),
                    target_triple: None,
                    output_volume: format!("{prefix}-target-linux"),
                }),
            },
            Environment {
                name: "windows".to_string(),
                kind: EnvKind::Container(ContainerTarget {
                    image_repo: format!("{prefix}-windows"),
                    build_context: PathBuf::from("docker/windows"),
                    target_triple: Some(WINDOWS_TRIPLE.to_string()),
                    output_volume: format!("{prefix}-target-windows"),
                }),
            },
        ];

        Self { environments }
    }

    /// Resolve a logical name to its environment descriptor
    pub fn resolve(&self, name: &str) -> CrucibleResult<&Environment> {
        self.environments
            .iter()
            .find(|env| env.name == name)
            .ok_or_else(|| CrucibleError::UnknownEnvironment {
                name: name.to_string(),
                known: self.names().join(", "),
            })
    }

    /// Iterate environments in declared order
    pub fn iter(&self) -> impl Iterator<Item = &Environment> {
        self.environments.iter()
    }

    /// Names of all registered environments, in declared order
    pub fn names(&self) -> Vec<&str> {
        self.environments.iter().map(|e| e.name.as_str()).collect()
    }
}
