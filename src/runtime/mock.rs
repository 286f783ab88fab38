//! In-memory container backend for unit tests
//!
//! Records every interaction so tests can assert on what the orchestrator
//! asked the backend to do, without a container runtime on the machine.

use crate::error::{CrucibleError, CrucibleResult};
use crate::runtime::{ContainerBackend, ContainerSpec};
use async_trait::async_trait;
use std::collections::{HashSet, VecDeque};
use std::path::Path;
use std::sync::Mutex;

/// Scriptable, recording backend
#[derive(Default)]
pub struct MockBackend {
    /// Existing image references (repo:tag)
    pub images: Mutex<HashSet<String>>,
    /// Tags whose build should fail
    pub failing_builds: Mutex<HashSet<String>>,
    /// Existing volume names
    pub volumes: Mutex<HashSet<String>>,
    /// Volumes the backend refuses to remove (simulates "volume in use")
    pub in_use_volumes: Mutex<HashSet<String>>,
    /// When true, creating an existing volume is a hard error
    /// (some backends treat duplicate creation that way)
    pub duplicate_create_fails: bool,

    /// Every tag passed to build_image, in order
    pub builds: Mutex<Vec<String>>,
    /// Every name passed to create_volume, in order
    pub volume_creates: Mutex<Vec<String>>,
    /// Every name successfully removed by remove_volume
    pub volume_removals: Mutex<Vec<String>>,
    /// Every command passed to run, in order
    pub run_commands: Mutex<Vec<Vec<String>>>,
    /// Specs passed to run, in order
    pub run_specs: Mutex<Vec<ContainerSpec>>,
    /// Exit codes returned by run, front first (empty = 0)
    pub exit_codes: Mutex<VecDeque<i32>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-seed an existing image
    pub fn with_image(self, reference: &str) -> Self {
        self.images.lock().unwrap().insert(reference.to_string());
        self
    }

    /// Pre-seed an existing volume
    pub fn with_volume(self, name: &str) -> Self {
        self.volumes.lock().unwrap().insert(name.to_string());
        self
    }

    /// Queue exit codes for subsequent run calls
    pub fn with_exit_codes(self, codes: &[i32]) -> Self {
        self.exit_codes.lock().unwrap().extend(codes.iter().copied());
        self
    }

    /// Number of image builds performed
    pub fn build_count(&self) -> usize {
        self.builds.lock().unwrap().len()
    }

    /// Number of containers run
    pub fn run_count(&self) -> usize {
        self.run_commands.lock().unwrap().len()
    }
}

#[async_trait]
impl ContainerBackend for MockBackend {
    async fn image_exists(&self, reference: &str) -> CrucibleResult<bool> {
        Ok(self.images.lock().unwrap().contains(reference))
    }

    async fn build_image(
        &self,
        _context: &Path,
        tag: &str,
        _no_cache: bool,
    ) -> CrucibleResult<()> {
        if self.failing_builds.lock().unwrap().contains(tag) {
            return Err(CrucibleError::ProvisionFailed {
                image: tag.to_string(),
                output: "error: step 3/7 failed".to_string(),
            });
        }
        self.builds.lock().unwrap().push(tag.to_string());
        self.images.lock().unwrap().insert(tag.to_string());
        Ok(())
    }

    async fn list_image_ids(&self, repo: &str) -> CrucibleResult<Vec<String>> {
        let prefix = format!("{repo}:");
        Ok(self
            .images
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.starts_with(&prefix))
            .cloned()
            .collect())
    }

    async fn remove_image(&self, reference: &str) -> CrucibleResult<()> {
        self.images.lock().unwrap().remove(reference);
        Ok(())
    }

    async fn volume_exists(&self, name: &str) -> CrucibleResult<bool> {
        Ok(self.volumes.lock().unwrap().contains(name))
    }

    async fn create_volume(&self, name: &str) -> CrucibleResult<()> {
        self.volume_creates.lock().unwrap().push(name.to_string());

        if self.duplicate_create_fails && self.volumes.lock().unwrap().contains(name) {
            return Err(CrucibleError::VolumeOperationFailed {
                volume: name.to_string(),
                reason: "volume already exists".to_string(),
            });
        }

        self.volumes.lock().unwrap().insert(name.to_string());
        Ok(())
    }

    async fn remove_volume(&self, name: &str) -> CrucibleResult<()> {
        if self.in_use_volumes.lock().unwrap().contains(name) {
            return Err(CrucibleError::VolumeOperationFailed {
                volume: name.to_string(),
                reason: "volume is being used".to_string(),
            });
        }
        self.volumes.lock().unwrap().remove(name);
        self.volume_removals.lock().unwrap().push(name.to_string());
        Ok(())
    }

    async fn run(&self, spec: &ContainerSpec, command: &[String]) -> CrucibleResult<i32> {
        self.run_specs.lock().unwrap().push(spec.clone());
        self.run_commands.lock().unwrap().push(command.to_vec());
        Ok(self.exit_codes.lock().unwrap().pop_front().unwrap_or(0))
    }

    fn backend_name(&self) -> &str {
        "mock"
    }
}
