//! Shell command - interactive session in a container environment
//!
//! No pipeline, just a live shell with the project and caches mounted.
//! Stdio is inherited end to end, so prompts and TTY behavior pass
//! through untouched.

use crate::config::Config;
use crate::error::{CrucibleError, CrucibleResult};
use crate::image;
use crate::pipeline::container_spec;
use crate::registry::Registry;
use crate::runtime::ContainerBackend;
use crate::volume;
use console::style;
use std::path::Path;

/// Execute the shell command
pub async fn execute(
    env_name: &str,
    config: &Config,
    backend: &dyn ContainerBackend,
    project_root: &Path,
) -> CrucibleResult<()> {
    let registry = Registry::builtin(config);
    let environment = registry.resolve(env_name)?;

    let Some(container) = environment.container() else {
        return Err(CrucibleError::User(format!(
            "environment '{}' is the host; open a terminal instead",
            environment.name
        )));
    };

    let image = image::ensure(backend, container, project_root, false).await?;

    let volumes = volume::volumes_for(&config.images.prefix, container);
    volume::ensure_all(backend, &volumes).await?;

    println!(
        "{} entering '{}' ({})",
        style("▸").cyan(),
        environment.name,
        image.reference
    );

    let spec = container_spec(
        &image.reference,
        &volumes,
        project_root,
        &volume::target_dir(),
        true,
    );
    let code = backend.run(&spec, &["/bin/bash".to_string()]).await?;

    if code != 0 {
        println!("{} shell exited with code {}", style("!").yellow(), code);
    }
    Ok(())
}
