//! Clean command - remove images and cache volumes
//!
//! Per-environment: that environment's images (every content tag) and
//! its build-output volume. Global: every managed image and volume,
//! including the shared cargo registry volume. Volume removal is
//! best-effort; failures are reported, not fatal.

use crate::config::Config;
use crate::error::{CrucibleError, CrucibleResult};
use crate::image;
use crate::registry::Registry;
use crate::runtime::ContainerBackend;
use crate::volume::{self, output_volume, CacheVolume};
use console::style;

/// Execute the clean command
pub async fn execute(
    env_name: Option<&str>,
    config: &Config,
    backend: &dyn ContainerBackend,
) -> CrucibleResult<()> {
    let registry = Registry::builtin(config);

    let (environments, volumes): (Vec<_>, Vec<CacheVolume>) = match env_name {
        Some(name) => {
            let environment = registry.resolve(name)?;
            let Some(container) = environment.container() else {
                return Err(CrucibleError::User(format!(
                    "environment '{}' runs natively; nothing to clean",
                    environment.name
                )));
            };
            (vec![environment.clone()], vec![output_volume(container)])
        }
        None => (
            registry.iter().cloned().collect(),
            volume::managed_volumes(&config.images.prefix, &registry),
        ),
    };

    let mut images_removed = 0;
    for environment in &environments {
        if let Some(container) = environment.container() {
            images_removed += image::remove_all(backend, container).await?;
        }
    }

    let report = volume::prune(backend, &volumes).await?;

    println!(
        "{} removed {} image(s), {} volume(s)",
        style("✓").green(),
        images_removed,
        report.removed.len()
    );

    for (name, reason) in &report.failures {
        eprintln!(
            "{} could not remove volume {}: {}",
            style("!").yellow(),
            name,
            reason
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::mock::MockBackend;

    #[tokio::test]
    async fn per_environment_clean_is_scoped() {
        let backend = MockBackend::new()
            .with_image("crucible-linux:aaa")
            .with_image("crucible-windows:bbb")
            .with_volume("crucible-target-linux")
            .with_volume("crucible-target-windows")
            .with_volume("crucible-cargo-registry");

        execute(Some("linux"), &Config::default(), &backend)
            .await
            .unwrap();

        // Only linux artifacts are gone; windows and the shared registry stay
        assert!(!backend.image_exists("crucible-linux:aaa").await.unwrap());
        assert!(backend.image_exists("crucible-windows:bbb").await.unwrap());
        assert!(!backend.volume_exists("crucible-target-linux").await.unwrap());
        assert!(backend.volume_exists("crucible-target-windows").await.unwrap());
        assert!(backend.volume_exists("crucible-cargo-registry").await.unwrap());
    }

    #[tokio::test]
    async fn global_clean_removes_everything_it_can() {
        let backend = MockBackend::new()
            .with_image("crucible-linux:aaa")
            .with_image("crucible-windows:bbb")
            .with_volume("crucible-cargo-registry")
            .with_volume("crucible-target-linux");
        backend
            .in_use_volumes
            .lock()
            .unwrap()
            .insert("crucible-target-linux".to_string());

        // In-use volume is reported, not fatal
        execute(None, &Config::default(), &backend).await.unwrap();

        assert!(!backend.image_exists("crucible-linux:aaa").await.unwrap());
        assert!(!backend.image_exists("crucible-windows:bbb").await.unwrap());
        assert!(!backend.volume_exists("crucible-cargo-registry").await.unwrap());
        assert!(backend.volume_exists("crucible-target-linux").await.unwrap());
    }

    #[tokio::test]
    async fn host_clean_is_rejected() {
        let err = execute(Some("host"), &Config::default(), &MockBackend::new())
            .await
            .unwrap_err();
        assert!(matches!(err, CrucibleError::User(_)));
    }
}
