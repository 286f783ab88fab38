//! Cache volume management
//!
//! Crucible keeps toolchain state and build output in named backend
//! volumes so repeated runs don't redownload the cargo registry or
//! rebuild from scratch. One registry volume is shared by every
//! container environment; each environment gets its own build-output
//! volume (target dirs are not portable across triples).

use crate::error::CrucibleResult;
use crate::registry::{ContainerTarget, Registry};
use crate::runtime::ContainerBackend;
use std::fmt;
use tracing::debug;

/// Container-side mount point for the shared cargo registry volume
pub const REGISTRY_MOUNT: &str = "/usr/local/cargo/registry";

/// Container-side mount point for build-output volumes
pub const TARGET_MOUNT: &str = "/cache/target";

/// In-container build-output directory for toolchain runs.
///
/// `CRUCIBLE_TARGET_DIR` redirects where cargo writes build output inside
/// the container; the default is the build-output volume's mount point.
/// Every container entry point (pipeline runs and the interactive shell)
/// resolves the directory through here so the override applies uniformly.
pub fn target_dir() -> String {
    std::env::var("CRUCIBLE_TARGET_DIR").unwrap_or_else(|_| TARGET_MOUNT.to_string())
}

/// What a cache volume stores
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VolumeScope {
    /// Downloaded toolchain state (cargo registry), shared across targets
    ToolchainState,
    /// Compiled build output, one volume per container environment
    BuildOutput,
}

impl fmt::Display for VolumeScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ToolchainState => write!(f, "toolchain-state"),
            Self::BuildOutput => write!(f, "build-output"),
        }
    }
}

/// A named persistent volume and where it mounts inside containers
#[derive(Debug, Clone)]
pub struct CacheVolume {
    /// Backend volume name
    pub name: String,
    /// Mount path inside the container
    pub mount_path: String,
    /// What the volume stores
    pub scope: VolumeScope,
}

impl CacheVolume {
    /// The `name:path` mount argument for the backend
    pub fn mount_arg(&self) -> String {
        format!("{}:{}", self.name, self.mount_path)
    }
}

/// The shared toolchain-state volume
pub fn registry_volume(prefix: &str) -> CacheVolume {
    CacheVolume {
        name: format!("{prefix}-cargo-registry"),
        mount_path: REGISTRY_MOUNT.to_string(),
        scope: VolumeScope::ToolchainState,
    }
}

/// The build-output volume for one container environment
pub fn output_volume(target: &ContainerTarget) -> CacheVolume {
    CacheVolume {
        name: target.output_volume.clone(),
        mount_path: TARGET_MOUNT.to_string(),
        scope: VolumeScope::BuildOutput,
    }
}

/// Volumes a single container environment mounts for a run
pub fn volumes_for(prefix: &str, target: &ContainerTarget) -> Vec<CacheVolume> {
    vec![registry_volume(prefix), output_volume(target)]
}

/// Every volume this tool manages, across all registered environments
pub fn managed_volumes(prefix: &str, registry: &Registry) -> Vec<CacheVolume> {
    let mut volumes = vec![registry_volume(prefix)];
    for env in registry.iter() {
        if let Some(target) = env.container() {
            volumes.push(output_volume(target));
        }
    }
    volumes
}

/// Idempotently ensure a volume exists.
///
/// Query-first rather than create-and-ignore-duplicate: some backends
/// treat duplicate creation as a hard failure, and this normalizes both
/// behaviors into one outcome. Returns whether a volume was created.
pub async fn ensure(backend: &dyn ContainerBackend, volume: &CacheVolume) -> CrucibleResult<bool> {
    if backend.volume_exists(&volume.name).await? {
        debug!("Volume already exists: {}", volume.name);
        return Ok(false);
    }
    backend.create_volume(&volume.name).await?;
    Ok(true)
}

/// Ensure a set of volumes exists; returns how many were newly created
pub async fn ensure_all(
    backend: &dyn ContainerBackend,
    volumes: &[CacheVolume],
) -> CrucibleResult<usize> {
    let mut created = 0;
    for volume in volumes {
        if ensure(backend, volume).await? {
            created += 1;
        }
    }
    Ok(created)
}

/// Outcome of a best-effort prune
#[derive(Debug, Default)]
pub struct PruneReport {
    /// Volumes that were removed
    pub removed: Vec<String>,
    /// Volumes that could not be removed, with the backend's reason
    pub failures: Vec<(String, String)>,
}

/// Remove managed volumes, best-effort.
///
/// Individual failures (a volume in use, say) are collected in the
/// report instead of aborting the operation; volumes that don't exist
/// are skipped silently.
pub async fn prune(
    backend: &dyn ContainerBackend,
    volumes: &[CacheVolume],
) -> CrucibleResult<PruneReport> {
    let mut report = PruneReport::default();

    for volume in volumes {
        if !backend.volume_exists(&volume.name).await? {
            continue;
        }
        match backend.remove_volume(&volume.name).await {
            Ok(()) => report.removed.push(volume.name.clone()),
            Err(e) => report.failures.push((volume.name.clone(), e.to_string())),
        }
    }

    Ok(report)
}
