//! Ci command - composite run across every registered environment
//!
//! Environments run sequentially in declared order (host, linux,
//! windows). The composite aborts on the first failing environment and
//! names it; the failing stage's exit status is propagated unchanged.

use crate::cli::commands::run::run_in_environment;
use crate::config::Config;
use crate::error::CrucibleResult;
use crate::pipeline::Pipeline;
use crate::registry::Registry;
use crate::runtime::ContainerBackend;
use console::style;
use std::path::Path;

/// Execute the ci command
pub async fn execute(
    config: &Config,
    backend: &dyn ContainerBackend,
    project_root: &Path,
) -> CrucibleResult<()> {
    let registry = Registry::builtin(config);

    for environment in registry.iter() {
        if let Err(e) =
            run_in_environment(backend, config, project_root, environment, Pipeline::full()).await
        {
            eprintln!(
                "{} environment '{}' failed, aborting remaining environments",
                style("✗").red(),
                environment.name
            );
            return Err(e);
        }
    }

    println!(
        "{} all environments passed: {}",
        style("✓").green(),
        registry.names().join(", ")
    );
    Ok(())
}
