//! Verification pipeline execution
//!
//! One pipeline, parameterized per target: check, then lint, then test,
//! strictly in order and fail-fast. Host environments invoke the
//! toolchain directly; container environments run the same commands
//! inside the provisioned image with cache volumes mounted and the
//! project bind-mounted at a fixed path. Stage stdio is passed through
//! unmodified so toolchain output (and interactive prompts) are never
//! buffered away.

use crate::error::{CrucibleError, CrucibleResult};
use crate::runtime::{ContainerBackend, ContainerSpec};
use crate::volume::CacheVolume;
use std::fmt;
use std::path::PathBuf;
use std::process::Stdio;
use tracing::debug;

/// Container-side mount point for the project directory
pub const WORKSPACE_MOUNT: &str = "/workspace";

/// One verification stage, run as an opaque external command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Compile check without codegen
    Check,
    /// Lint with warnings denied
    Lint,
    /// Test suite (compile-only on cross targets)
    Test,
}

impl Stage {
    /// All stages in pipeline order
    pub const ALL: [Stage; 3] = [Stage::Check, Stage::Lint, Stage::Test];

    /// Toolchain invocation for this stage.
    ///
    /// `triple` is passed verbatim as `--target`. Cross-compiled test
    /// binaries cannot execute on the invoking machine, so the test
    /// stage compiles without running when a triple is set.
    pub fn command(&self, triple: Option<&str>) -> Vec<String> {
        let mut cmd: Vec<String> = match self {
            Stage::Check => vec!["cargo", "check", "--workspace", "--all-targets"],
            Stage::Lint => vec!["cargo", "clippy", "--workspace", "--all-targets"],
            Stage::Test => vec!["cargo", "test", "--workspace"],
        }
        .into_iter()
        .map(String::from)
        .collect();

        if let Some(triple) = triple {
            cmd.push("--target".to_string());
            cmd.push(triple.to_string());
            if *self == Stage::Test {
                cmd.push("--no-run".to_string());
            }
        }

        if *self == Stage::Lint {
            cmd.push("--".to_string());
            cmd.push("-D".to_string());
            cmd.push("warnings".to_string());
        }

        cmd
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Check => write!(f, "check"),
            Stage::Lint => write!(f, "lint"),
            Stage::Test => write!(f, "test"),
        }
    }
}

/// Ordered sequence of stages to run
#[derive(Debug, Clone)]
pub struct Pipeline {
    stages: Vec<Stage>,
}

impl Pipeline {
    /// The full pipeline: check, lint, test
    pub fn full() -> Self {
        Self {
            stages: Stage::ALL.to_vec(),
        }
    }

    /// A single-stage subset
    pub fn only(stage: Stage) -> Self {
        Self {
            stages: vec![stage],
        }
    }

    /// Stages in execution order
    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    /// Human-readable stage list for status lines
    pub fn describe(&self) -> String {
        self.stages
            .iter()
            .map(Stage::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Where and how a pipeline executes
#[derive(Debug, Clone)]
pub enum ExecTarget {
    /// Directly on the invoking machine
    Host,
    /// Inside a provisioned container image
    Container {
        /// Resolved image reference
        image: String,
        /// Cross-compilation triple, if any
        triple: Option<String>,
        /// Cache volumes to mount
        volumes: Vec<CacheVolume>,
        /// Container-side build-output directory
        target_dir: String,
    },
}

/// Everything one invocation needs; built fresh per command, never persisted
#[derive(Debug, Clone)]
pub struct RunContext {
    /// Environment name, for status lines and error reporting
    pub env_name: String,
    /// Execution target
    pub target: ExecTarget,
    /// Host project directory (bind-mounted for container targets)
    pub workdir: PathBuf,
    /// Stages to run
    pub pipeline: Pipeline,
}

/// Run the pipeline, fail-fast.
///
/// The first stage returning non-zero aborts the rest; its exit status
/// is carried in the `StageFailed` error and becomes the process exit
/// code.
pub async fn run(backend: &dyn ContainerBackend, ctx: &RunContext) -> CrucibleResult<()> {
    for stage in ctx.pipeline.stages() {
        debug!("Running stage '{}' in '{}'", stage, ctx.env_name);

        let code = run_stage(backend, ctx, *stage).await?;
        if code != 0 {
            return Err(CrucibleError::StageFailed {
                stage: stage.to_string(),
                environment: ctx.env_name.clone(),
                code,
            });
        }
    }
    Ok(())
}

async fn run_stage(
    backend: &dyn ContainerBackend,
    ctx: &RunContext,
    stage: Stage,
) -> CrucibleResult<i32> {
    match &ctx.target {
        ExecTarget::Host => {
            let command = stage.command(None);
            host_exec(&command, &ctx.workdir).await
        }
        ExecTarget::Container {
            image,
            triple,
            volumes,
            target_dir,
        } => {
            let command = stage.command(triple.as_deref());
            let spec = container_spec(image, volumes, &ctx.workdir, target_dir, false);
            backend.run(&spec, &command).await
        }
    }
}

/// Build the container spec for a pipeline stage or an interactive shell
pub fn container_spec(
    image: &str,
    volumes: &[CacheVolume],
    workdir: &std::path::Path,
    target_dir: &str,
    interactive: bool,
) -> ContainerSpec {
    ContainerSpec {
        image: image.to_string(),
        workdir: WORKSPACE_MOUNT.to_string(),
        binds: vec![format!("{}:{}", workdir.display(), WORKSPACE_MOUNT)],
        volumes: volumes.iter().map(CacheVolume::mount_arg).collect(),
        env: vec![("CARGO_TARGET_DIR".to_string(), target_dir.to_string())],
        interactive,
    }
}

/// Run a toolchain command directly on the host with inherited stdio
async fn host_exec(command: &[String], workdir: &std::path::Path) -> CrucibleResult<i32> {
    debug!("Executing on host: {:?}", command);

    let status = tokio::process::Command::new(&command[0])
        .args(&command[1..])
        .current_dir(workdir)
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status()
        .await
        .map_err(|e| CrucibleError::command_failed(command.join(" "), e))?;

    Ok(status.code().unwrap_or(130))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::WINDOWS_TRIPLE;
    use crate::runtime::mock::MockBackend;
    use crate::volume::{registry_volume, TARGET_MOUNT};

    fn container_ctx(pipeline: Pipeline) -> RunContext {
        RunContext {
            env_name: "linux".to_string(),
            target: ExecTarget::Container {
                image: "crucible-linux:abc123def456".to_string(),
                triple: None,
                volumes: vec![registry_volume("crucible")],
                target_dir: TARGET_MOUNT.to_string(),
            },
            workdir: PathBuf::from("/home/dev/project"),
            pipeline,
        }
    }

    #[test]
    fn check_command_shape() {
        assert_eq!(
            Stage::Check.command(None),
            vec!["cargo", "check", "--workspace", "--all-targets"]
        );
    }

    #[test]
    fn lint_denies_warnings() {
        let cmd = Stage::Lint.command(None);
        assert_eq!(cmd[1], "clippy");
        assert_eq!(&cmd[cmd.len() - 3..], ["--", "-D", "warnings"]);
    }

    #[test]
    fn triple_passed_verbatim() {
        let cmd = Stage::Check.command(Some(WINDOWS_TRIPLE));
        let pos = cmd.iter().position(|a| a == "--target").unwrap();
        assert_eq!(cmd[pos + 1], WINDOWS_TRIPLE);
    }

    #[test]
    fn cross_tests_compile_without_running() {
        let cmd = Stage::Test.command(Some(WINDOWS_TRIPLE));
        assert!(cmd.contains(&"--no-run".to_string()));

        let host_cmd = Stage::Test.command(None);
        assert!(!host_cmd.contains(&"--no-run".to_string()));
    }

    #[test]
    fn lint_flags_come_after_target() {
        let cmd = Stage::Lint.command(Some(WINDOWS_TRIPLE));
        let target_pos = cmd.iter().position(|a| a == "--target").unwrap();
        let sep_pos = cmd.iter().position(|a| a == "--").unwrap();
        assert!(target_pos < sep_pos);
    }

    #[test]
    fn pipeline_order() {
        let pipeline = Pipeline::full();
        assert_eq!(pipeline.stages(), &[Stage::Check, Stage::Lint, Stage::Test]);
        assert_eq!(pipeline.describe(), "check, lint, test");
    }

    #[tokio::test]
    async fn full_pipeline_runs_every_stage() {
        let backend = MockBackend::new();
        run(&backend, &container_ctx(Pipeline::full())).await.unwrap();

        let commands = backend.run_commands.lock().unwrap();
        assert_eq!(commands.len(), 3);
        assert_eq!(commands[0][1], "check");
        assert_eq!(commands[1][1], "clippy");
        assert_eq!(commands[2][1], "test");
    }

    #[tokio::test]
    async fn failing_check_aborts_lint_and_test() {
        let backend = MockBackend::new().with_exit_codes(&[101]);

        let err = run(&backend, &container_ctx(Pipeline::full()))
            .await
            .unwrap_err();

        assert_eq!(backend.run_count(), 1);
        match err {
            CrucibleError::StageFailed {
                stage,
                environment,
                code,
            } => {
                assert_eq!(stage, "check");
                assert_eq!(environment, "linux");
                assert_eq!(code, 101);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn subset_pipeline_skips_other_stages() {
        let backend = MockBackend::new();
        run(&backend, &container_ctx(Pipeline::only(Stage::Lint)))
            .await
            .unwrap();

        let commands = backend.run_commands.lock().unwrap();
        assert_eq!(commands.len(), 1);
        assert_eq!(commands[0][1], "clippy");
    }

    #[tokio::test]
    async fn container_stage_mounts_project_and_caches() {
        let backend = MockBackend::new();
        run(&backend, &container_ctx(Pipeline::only(Stage::Check)))
            .await
            .unwrap();

        let specs = backend.run_specs.lock().unwrap();
        let spec = &specs[0];
        assert_eq!(spec.workdir, WORKSPACE_MOUNT);
        assert_eq!(spec.binds, vec!["/home/dev/project:/workspace"]);
        assert_eq!(
            spec.volumes,
            vec!["crucible-cargo-registry:/usr/local/cargo/registry"]
        );
        assert!(spec
            .env
            .contains(&("CARGO_TARGET_DIR".to_string(), TARGET_MOUNT.to_string())));
        assert!(!spec.interactive);
    }

    #[test]
    fn interactive_spec_for_shell() {
        let spec = container_spec(
            "crucible-linux:abc",
            &[],
            std::path::Path::new("/p"),
            TARGET_MOUNT,
            true,
        );
        assert!(spec.interactive);
    }
}
