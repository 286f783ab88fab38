//! Rebuild command - force-rebuild an environment's image

use crate::config::Config;
use crate::error::{CrucibleError, CrucibleResult};
use crate::image;
use crate::registry::Registry;
use crate::runtime::ContainerBackend;
use console::style;
use std::path::Path;

/// Execute the rebuild command
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
            "environment '{}' runs natively and has no image to rebuild",
            environment.name
        )));
    };

    let image = image::ensure(backend, container, project_root, true).await?;

    println!("{} rebuilt {}", style("✓").green(), image.reference);
    Ok(())
}
