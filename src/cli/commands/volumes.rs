//! Volumes command - pre-provision and inspect cache volumes

use crate::cli::args::{OutputFormat, VolumesAction, VolumesArgs};
use crate::config::Config;
use crate::error::CrucibleResult;
use crate::registry::Registry;
use crate::runtime::ContainerBackend;
use crate::volume::{self, CacheVolume};
use console::style;

/// Execute the volumes command
pub async fn execute(
    args: VolumesArgs,
    config: &Config,
    backend: &dyn ContainerBackend,
) -> CrucibleResult<()> {
    let registry = Registry::builtin(config);
    let volumes = volume::managed_volumes(&config.images.prefix, &registry);

    match args.action {
        VolumesAction::Create => create(backend, &volumes).await,
        VolumesAction::List { format } => list(backend, &volumes, format).await,
    }
}

async fn create(backend: &dyn ContainerBackend, volumes: &[CacheVolume]) -> CrucibleResult<()> {
    let created = volume::ensure_all(backend, volumes).await?;
    println!(
        "{} {} volume(s) ready ({} created)",
        style("✓").green(),
        volumes.len(),
        created
    );
    Ok(())
}

async fn list(
    backend: &dyn ContainerBackend,
    volumes: &[CacheVolume],
    format: OutputFormat,
) -> CrucibleResult<()> {
    let mut rows = Vec::new();
    for volume in volumes {
        rows.push((volume, backend.volume_exists(&volume.name).await?));
    }

    match format {
        OutputFormat::Table => print_table(&rows),
        OutputFormat::Json => print_json(&rows)?,
    }
    Ok(())
}

fn print_table(rows: &[(&CacheVolume, bool)]) {
    println!(
        "{:<30} {:<16} {:<30} {:<8}",
        "VOLUME", "SCOPE", "MOUNT", "STATUS"
    );
    println!("{}", "-".repeat(86));

    for (volume, exists) in rows {
        let status = if *exists {
            style("created").green().to_string()
        } else {
            style("missing").dim().to_string()
        };
        println!(
            "{:<30} {:<16} {:<30} {:<8}",
            volume.name,
            volume.scope.to_string(),
            volume.mount_path,
            status
        );
    }
}

fn print_json(rows: &[(&CacheVolume, bool)]) -> CrucibleResult<()> {
    #[derive(serde::Serialize)]
    struct VolumeJson<'a> {
        name: &'a str,
        scope: String,
        mount_path: &'a str,
        created: bool,
    }

    let json_rows: Vec<VolumeJson> = rows
        .iter()
        .map(|(v, exists)| VolumeJson {
            name: &v.name,
            scope: v.scope.to_string(),
            mount_path: &v.mount_path,
            created: *exists,
        })
        .collect();

    println!("{}", serde_json::to_string_pretty(&json_rows)?);
    Ok(())
}
