//! CLI argument definitions using clap derive

use clap::{ArgAction, Parser, Subcommand, ValueEnum};

/// Recognized command names, printed when an unknown command is given
pub const KNOWN_COMMANDS: &str =
    "run, check, lint, test, ci, rebuild, clean, shell, volumes, help";

/// Crucible - Multi-platform build and test orchestrator
///
/// Runs the verification pipeline (check, lint, test) for a Cargo
/// workspace on the host, in a Linux container, and in a Windows
/// cross-compilation container.
#[derive(Parser, Debug)]
#[command(name = "crucible")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Container backend binary (podman-compatible)
    #[arg(long, global = true, env = "CRUCIBLE_BACKEND")]
    pub backend: Option<String>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the full pipeline (check, lint, test) in one environment
    Run(EnvArgs),

    /// Compile check only
    Check(EnvArgs),

    /// Lint only
    Lint(EnvArgs),

    /// Tests only
    Test(EnvArgs),

    /// Run the full pipeline across every registered environment
    Ci,

    /// Force-rebuild an environment's container image
    Rebuild {
        /// Environment name
        env: String,
    },

    /// Remove container images and cache volumes
    Clean {
        /// Environment to clean (all environments when omitted)
        env: Option<String>,
    },

    /// Open an interactive shell in a container environment
    Shell {
        /// Environment name
        env: String,
    },

    /// Manage cache volumes
    Volumes(VolumesArgs),

    /// Anything else: reported as an unknown command
    #[command(external_subcommand)]
    External(Vec<String>),
}

/// Environment selection for pipeline commands
#[derive(Parser, Debug)]
pub struct EnvArgs {
    /// Environment name
    #[arg(default_value = "host")]
    pub env: String,
}

/// Arguments for the volumes command
#[derive(Parser, Debug)]
pub struct VolumesArgs {
    /// Subcommand for volumes
    #[command(subcommand)]
    pub action: VolumesAction,
}

/// Volumes subcommands
#[derive(Subcommand, Debug)]
pub enum VolumesAction {
    /// Idempotently create all cache volumes
    Create,

    /// List managed cache volumes and their status
    List {
        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },
}

/// Output format for the volumes list command
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table
    Table,
    /// JSON output
    Json,
}
