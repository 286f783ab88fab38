//! Run command - execute the verification pipeline in one environment
//!
//! Also hosts the shared per-environment flow used by the composite `ci`
//! command: resolve the environment, provision its image if needed,
//! ensure cache volumes, then run the pipeline fail-fast.

use crate::config::Config;
use crate::error::CrucibleResult;
use crate::image;
use crate::pipeline::{self, ExecTarget, Pipeline, RunContext};
use crate::registry::{Environment, Registry};
use crate::runtime::ContainerBackend;
use crate::volume;
use console::style;
use std::path::Path;
use tracing::debug;

/// Execute a pipeline command for a single named environment
pub async fn execute(
    env_name: &str,
    selection: Pipeline,
    config: &Config,
    backend: &dyn ContainerBackend,
    project_root: &Path,
) -> CrucibleResult<()> {
    let registry = Registry::builtin(config);
    let environment = registry.resolve(env_name)?;

    run_in_environment(backend, config, project_root, environment, selection).await?;

    println!(
        "{} pipeline passed in '{}'",
        style("✓").green(),
        environment.name
    );
    Ok(())
}

/// Run a pipeline in one resolved environment.
///
/// Provisioning happens here so the composite run provisions each
/// environment lazily, right before it is used.
pub async fn run_in_environment(
    backend: &dyn ContainerBackend,
    config: &Config,
    project_root: &Path,
    environment: &Environment,
    selection: Pipeline,
) -> CrucibleResult<()> {
    println!(
        "{} {} [{}]",
        style("▸").cyan(),
        environment.name,
        selection.describe()
    );

    let target = match environment.container() {
        None => ExecTarget::Host,
        Some(container) => {
            let image = image::ensure(backend, container, project_root, false).await?;
            if image.was_cached {
                debug!("Using cached image {}", image.reference);
            } else {
                println!("{} built image {}", style("✓").green(), image.reference);
            }

            let volumes = volume::volumes_for(&config.images.prefix, container);
            volume::ensure_all(backend, &volumes).await?;

            ExecTarget::Container {
                image: image.reference,
                triple: container.target_triple.clone(),
                volumes,
                target_dir: volume::target_dir(),
            }
        }
    };

    let ctx = RunContext {
        env_name: environment.name.clone(),
        target,
        workdir: project_root.to_path_buf(),
        pipeline: selection,
    };

    pipeline::run(backend, &ctx).await
}
