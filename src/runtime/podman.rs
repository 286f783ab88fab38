//! Podman-compatible container backend
//!
//! Implements the ContainerBackend trait by shelling out to a podman (or
//! docker) binary. Every operation is one subprocess invocation; nothing
//! is cached between calls.

use crate::error::{CrucibleError, CrucibleResult};
use crate::runtime::{output_tail, ContainerBackend, ContainerSpec};
use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tracing::{debug, info};

/// Container backend driven by a podman-compatible CLI
pub struct PodmanBackend {
    binary: String,
}

impl PodmanBackend {
    /// Create a backend for the given binary (e.g. "podman", "docker")
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    /// Execute a backend command and return the captured output
    async fn exec(&self, args: &[&str]) -> CrucibleResult<std::process::Output> {
        debug!("Executing: {} {:?}", self.binary, args);

        Command::new(&self.binary)
            .args(args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| CrucibleError::command_failed(format!("{} {:?}", self.binary, args), e))
    }

    /// Execute a backend command with stdio wired to the terminal
    async fn exec_inherited(&self, args: &[String]) -> CrucibleResult<i32> {
        debug!("Executing interactively: {} {:?}", self.binary, args);

        let status = Command::new(&self.binary)
            .args(args)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .await
            .map_err(|e| CrucibleError::command_failed(format!("{} {:?}", self.binary, args), e))?;

        // Signal-terminated processes carry no code; report the shell
        // convention for SIGINT.
        Ok(status.code().unwrap_or(130))
    }

    /// Existence checks (`image exists`, `volume exists`) signal absence
    /// with exit code 1; anything else is a backend failure.
    async fn exists_query(&self, args: &[&str]) -> CrucibleResult<bool> {
        let output = self.exec(args).await?;
        match output.status.code() {
            Some(0) => Ok(true),
            Some(1) => Ok(false),
            _ => {
                let stderr = String::from_utf8_lossy(&output.stderr);
                Err(CrucibleError::command_exec(
                    format!("{} {}", self.binary, args.join(" ")),
                    stderr,
                ))
            }
        }
    }
}

#[async_trait]
impl ContainerBackend for PodmanBackend {
    async fn image_exists(&self, reference: &str) -> CrucibleResult<bool> {
        self.exists_query(&["image", "exists", reference]).await
    }

    async fn build_image(
        &self,
        context: &Path,
        tag: &str,
        no_cache: bool,
    ) -> CrucibleResult<()> {
        info!("Building image {} from {}", tag, context.display());

        let mut args = vec!["build".to_string(), "-t".to_string(), tag.to_string()];
        if no_cache {
            args.push("--no-cache".to_string());
        }
        args.push(context.display().to_string());

        let mut child = Command::new(&self.binary)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| CrucibleError::command_failed(format!("{} build", self.binary), e))?;

        let collected = stream_child_output(&mut child).await;

        let status = child
            .wait()
            .await
            .map_err(|e| CrucibleError::command_failed(format!("{} build", self.binary), e))?;

        if status.success() {
            Ok(())
        } else {
            Err(CrucibleError::ProvisionFailed {
                image: tag.to_string(),
                output: output_tail(&collected.join("\n")),
            })
        }
    }

    async fn list_image_ids(&self, repo: &str) -> CrucibleResult<Vec<String>> {
        let filter = format!("reference={repo}");
        let output = self
            .exec(&["images", "--quiet", "--filter", &filter])
            .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(CrucibleError::command_exec(
                format!("{} images", self.binary),
                stderr,
            ));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(stdout.lines().map(|l| l.trim().to_string()).collect())
    }

    async fn remove_image(&self, reference: &str) -> CrucibleResult<()> {
        debug!("Removing image: {}", reference);

        let output = self.exec(&["rmi", "-f", reference]).await?;

        if output.status.success() {
            Ok(())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            // Missing images are fine for a maintenance command
            if stderr.contains("image not known") || stderr.contains("No such image") {
                Ok(())
            } else {
                Err(CrucibleError::command_exec(
                    format!("{} rmi", self.binary),
                    stderr,
                ))
            }
        }
    }

    async fn volume_exists(&self, name: &str) -> CrucibleResult<bool> {
        self.exists_query(&["volume", "exists", name]).await
    }

    async fn create_volume(&self, name: &str) -> CrucibleResult<()> {
        info!("Creating volume: {}", name);

        let output = self.exec(&["volume", "create", name]).await?;

        if output.status.success() {
            Ok(())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            Err(CrucibleError::VolumeOperationFailed {
                volume: name.to_string(),
                reason: stderr.trim().to_string(),
            })
        }
    }

    async fn remove_volume(&self, name: &str) -> CrucibleResult<()> {
        debug!("Removing volume: {}", name);

        let output = self.exec(&["volume", "rm", name]).await?;

        if output.status.success() {
            Ok(())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            Err(CrucibleError::VolumeOperationFailed {
                volume: name.to_string(),
                reason: stderr.trim().to_string(),
            })
        }
    }

    async fn run(&self, spec: &ContainerSpec, command: &[String]) -> CrucibleResult<i32> {
        let mut args = vec!["run".to_string(), "--rm".to_string()];

        if spec.interactive {
            args.push("-it".to_string());
        }

        args.push("-w".to_string());
        args.push(spec.workdir.clone());

        for bind in &spec.binds {
            args.push("-v".to_string());
            args.push(bind.clone());
        }
        for volume in &spec.volumes {
            args.push("-v".to_string());
            args.push(volume.clone());
        }

        for (key, value) in &spec.env {
            args.push("-e".to_string());
            args.push(format!("{key}={value}"));
        }

        args.push(spec.image.clone());
        args.extend(command.iter().cloned());

        self.exec_inherited(&args).await
    }

    fn backend_name(&self) -> &str {
        &self.binary
    }
}

/// Stream stdout+stderr lines from a child process to the terminal,
/// collecting them for error reporting.
async fn stream_child_output(child: &mut tokio::process::Child) -> Vec<String> {
    let stderr = child.stderr.take().expect("stderr piped");
    let stdout = child.stdout.take().expect("stdout piped");

    let mut stderr_reader = BufReader::new(stderr).lines();
    let mut stdout_reader = BufReader::new(stdout).lines();

    let mut all_output = Vec::new();
    let mut stderr_done = false;
    let mut stdout_done = false;

    while !stderr_done || !stdout_done {
        tokio::select! {
            line = stderr_reader.next_line(), if !stderr_done => {
                match line {
                    Ok(Some(line)) => {
                        eprintln!("{line}");
                        all_output.push(line);
                    }
                    _ => stderr_done = true,
                }
            }
            line = stdout_reader.next_line(), if !stdout_done => {
                match line {
                    Ok(Some(line)) => {
                        println!("{line}");
                        all_output.push(line);
                    }
                    _ => stdout_done = true,
                }
            }
        }
    }

    all_output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_name_is_binary() {
        let backend = PodmanBackend::new("podman");
        assert_eq!(backend.backend_name(), "podman");
    }

    #[test]
    fn container_spec_shape() {
        let spec = ContainerSpec {
            image: "crucible-linux:abc123".to_string(),
            workdir: "/workspace".to_string(),
            binds: vec!["/home/dev/proj:/workspace".to_string()],
            volumes: vec!["crucible-cargo-registry:/usr/local/cargo/registry".to_string()],
            env: vec![("CARGO_TARGET_DIR".to_string(), "/cache/target".to_string())],
            interactive: false,
        };
        assert!(!spec.interactive);
        assert_eq!(spec.binds.len(), 1);
    }
}
