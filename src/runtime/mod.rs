//! Container backend abstraction
//!
//! Everything Crucible needs from a container runtime, behind one trait:
//! image existence/build/removal, named volume lifecycle, and running a
//! command in a container with stdio passed through. The production
//! implementation shells out to a podman-compatible CLI; tests use an
//! in-memory mock.

mod podman;

pub use podman::PodmanBackend;

use crate::config::Config;
use crate::error::CrucibleResult;
use async_trait::async_trait;
use std::path::Path;

/// Max number of output lines to include in build error messages.
const BUILD_ERROR_TAIL_LINES: usize = 50;

/// Extract the useful tail of build output for error diagnostics.
///
/// Returns the last `BUILD_ERROR_TAIL_LINES` lines so error messages are
/// actionable without being overwhelming.
pub(crate) fn output_tail(output: &str) -> String {
    let lines: Vec<&str> = output.lines().collect();
    let total = lines.len();
    let tail: &[&str] = if total > BUILD_ERROR_TAIL_LINES {
        &lines[total - BUILD_ERROR_TAIL_LINES..]
    } else {
        &lines
    };
    tail.join("\n")
}

/// Parameters for running a command inside a container
#[derive(Debug, Clone)]
pub struct ContainerSpec {
    /// Image reference to run
    pub image: String,
    /// Working directory inside the container
    pub workdir: String,
    /// Host bind mounts (host:container format)
    pub binds: Vec<String>,
    /// Named volume mounts (name:container format)
    pub volumes: Vec<String>,
    /// Environment variables set inside the container
    pub env: Vec<(String, String)>,
    /// Allocate a TTY and keep stdin open (interactive shell mode)
    pub interactive: bool,
}

/// Abstract container backend interface
///
/// All calls are blocking from the orchestrator's point of view: each one
/// awaits a single external process to completion. Backends do not retry.
#[async_trait]
pub trait ContainerBackend: Send + Sync {
    /// Exact-reference image existence check (never a substring match)
    async fn image_exists(&self, reference: &str) -> CrucibleResult<bool>;

    /// Build an image from a context directory and tag it.
    ///
    /// Output is streamed through as it arrives. On failure the error
    /// carries the tail of the build output, and no new tag is left behind
    /// (backends only tag on success).
    async fn build_image(
        &self,
        context: &Path,
        tag: &str,
        no_cache: bool,
    ) -> CrucibleResult<()>;

    /// List local image ids whose repository matches `repo` (any tag)
    async fn list_image_ids(&self, repo: &str) -> CrucibleResult<Vec<String>>;

    /// Remove an image by id or reference; missing images are not an error
    async fn remove_image(&self, reference: &str) -> CrucibleResult<()>;

    /// Exact-name volume existence check
    async fn volume_exists(&self, name: &str) -> CrucibleResult<bool>;

    /// Create a named volume; the caller guarantees it does not exist
    async fn create_volume(&self, name: &str) -> CrucibleResult<()>;

    /// Remove a named volume; fails if the backend refuses (e.g. in use)
    async fn remove_volume(&self, name: &str) -> CrucibleResult<()>;

    /// Run a command in a container with stdio inherited, returning its
    /// exit code. The container is removed when the command exits.
    async fn run(&self, spec: &ContainerSpec, command: &[String]) -> CrucibleResult<i32>;

    /// Human-readable backend name for logs and status lines
    fn backend_name(&self) -> &str;
}

/// Create the configured backend
pub fn create_backend(config: &Config) -> Box<dyn ContainerBackend> {
    Box::new(PodmanBackend::new(config.backend.binary.clone()))
}

#[cfg(test)]
pub mod mock;
