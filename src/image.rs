//! Image provisioning
//!
//! Ensures a container environment's image exists before a run, building
//! it on demand. The image tag is content-addressed: a SHA256 hash over
//! the build context tree, so editing a Containerfile or any file it
//! copies changes the reference and triggers a rebuild on the next run.
//! Existence checks use
//! the backend's exact-reference query, so one image name being a prefix
//! of another can never cause a false hit.

use crate::error::{CrucibleError, CrucibleResult};
use crate::registry::ContainerTarget;
use crate::runtime::ContainerBackend;
use sha2::{Digest, Sha256};
use std::path::Path;
use tracing::{debug, info};

/// A provisioned image, ready to run
#[derive(Debug, Clone)]
pub struct ImageRef {
    /// Full reference (repo:content-tag)
    pub reference: String,
    /// Whether the image already existed (no build was needed)
    pub was_cached: bool,
}

/// Ensure the environment's image exists, building it if needed.
///
/// With `force` the image is rebuilt unconditionally and the backend's
/// layer cache is discarded. Build failures surface as `ProvisionFailed`
/// with the tail of the build output; the backend only tags on success,
/// so a failed build leaves no usable image behind.
pub async fn ensure(
    backend: &dyn ContainerBackend,
    target: &ContainerTarget,
    project_root: &Path,
    force: bool,
) -> CrucibleResult<ImageRef> {
    let context = project_root.join(&target.build_context);
    let reference = image_reference(target, project_root).await?;

    if !force && backend.image_exists(&reference).await? {
        debug!("Image already present: {}", reference);
        return Ok(ImageRef {
            reference,
            was_cached: true,
        });
    }

    info!("Provisioning image {}", reference);
    backend.build_image(&context, &reference, force).await?;

    Ok(ImageRef {
        reference,
        was_cached: false,
    })
}

/// Compute the content-addressed reference for an environment's image
pub async fn image_reference(
    target: &ContainerTarget,
    project_root: &Path,
) -> CrucibleResult<String> {
    let context = project_root.join(&target.build_context);
    let hash = context_hash(&context).await?;
    Ok(format!("{}:{}", target.image_repo, &hash[..12]))
}

/// Remove every locally stored image for an environment's repository,
/// including stale content tags from earlier context revisions.
/// Returns the number of images removed.
pub async fn remove_all(
    backend: &dyn ContainerBackend,
    target: &ContainerTarget,
) -> CrucibleResult<usize> {
    let ids = backend.list_image_ids(&target.image_repo).await?;
    for id in &ids {
        backend.remove_image(id).await?;
    }
    Ok(ids.len())
}

/// Hash the build context: every regular file in the context tree,
/// sorted by path, relative path and content both fed to the hash.
/// Subdirectories are walked so a file `COPY`'d from deeper in the
/// context still changes the image identity when it changes.
async fn context_hash(context: &Path) -> CrucibleResult<String> {
    if !context.is_dir() {
        return Err(CrucibleError::BuildContextNotFound(context.to_path_buf()));
    }

    let mut files = Vec::new();
    let mut pending = vec![context.to_path_buf()];
    while let Some(dir) = pending.pop() {
        let mut entries = tokio::fs::read_dir(&dir)
            .await
            .map_err(|e| CrucibleError::io(format!("reading {}", dir.display()), e))?;
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| CrucibleError::io(format!("reading {}", dir.display()), e))?
        {
            let file_type = entry
                .file_type()
                .await
                .map_err(|e| CrucibleError::io("reading file type", e))?;
            if file_type.is_dir() {
                pending.push(entry.path());
            } else if file_type.is_file() {
                files.push(entry.path());
            }
        }
    }

    // Sort by path for a deterministic hash
    files.sort();

    let mut hasher = Sha256::new();
    for path in &files {
        let relative = path.strip_prefix(context).unwrap_or(path.as_path());
        hasher.update(relative.to_string_lossy().as_bytes());
        let content = tokio::fs::read(path)
            .await
            .map_err(|e| CrucibleError::io(format!("reading {}", path.display()), e))?;
        hasher.update(&content);
    }

    Ok(hex::encode(hasher.finalize()))
}
