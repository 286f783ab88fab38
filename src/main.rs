//! Crucible - Multi-platform build and test orchestrator
//!
//! CLI entry point that dispatches to subcommands. A failed pipeline
//! stage exits with that stage's own status; every other failure exits 1.

use clap::Parser;
use console::style;
use crucible::cli::args::{EnvArgs, KNOWN_COMMANDS};
use crucible::cli::{Cli, Commands};
use crucible::config::{self, Config};
use crucible::error::{CrucibleError, CrucibleResult};
use crucible::pipeline::{Pipeline, Stage};
use crucible::runtime::create_backend;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            ExitCode::from(e.exit_code().clamp(1, 255) as u8)
        }
    }
}

async fn run() -> CrucibleResult<()> {
    let cli = Cli::parse();

    // Initialize logging: 0 = warn, 1 = info, 2+ = debug
    let filter = match cli.verbose {
        0 => EnvFilter::new("crucible=warn"),
        1 => EnvFilter::new("crucible=info"),
        _ => EnvFilter::new("crucible=debug"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .init();

    // Unknown commands are rejected before any backend or config work
    if let Commands::External(words) = &cli.command {
        let name = words.first().cloned().unwrap_or_default();
        return Err(CrucibleError::UnknownCommand {
            name,
            known: KNOWN_COMMANDS.to_string(),
        });
    }

    let cwd = std::env::current_dir()
        .map_err(|e| CrucibleError::io("getting current directory", e))?;
    let project_root = config::find_project_root(&cwd);

    let mut config = Config::load(&cwd).await?;
    if let Some(binary) = cli.backend.clone() {
        config.backend.binary = binary;
    }

    let backend = create_backend(&config);

    match cli.command {
        Commands::Run(EnvArgs { env }) => {
            crucible::cli::commands::run(&env, Pipeline::full(), &config, &*backend, &project_root)
                .await
        }
        Commands::Check(EnvArgs { env }) => {
            crucible::cli::commands::run(
                &env,
                Pipeline::only(Stage::Check),
                &config,
                &*backend,
                &project_root,
            )
            .await
        }
        Commands::Lint(EnvArgs { env }) => {
            crucible::cli::commands::run(
                &env,
                Pipeline::only(Stage::Lint),
                &config,
                &*backend,
                &project_root,
            )
            .await
        }
        Commands::Test(EnvArgs { env }) => {
            crucible::cli::commands::run(
                &env,
                Pipeline::only(Stage::Test),
                &config,
                &*backend,
                &project_root,
            )
            .await
        }
        Commands::Ci => crucible::cli::commands::ci(&config, &*backend, &project_root).await,
        Commands::Rebuild { env } => {
            crucible::cli::commands::rebuild(&env, &config, &*backend, &project_root).await
        }
        Commands::Clean { env } => {
            crucible::cli::commands::clean(env.as_deref(), &config, &*backend).await
        }
        Commands::Shell { env } => {
            crucible::cli::commands::shell(&env, &config, &*backend, &project_root).await
        }
        Commands::Volumes(args) => {
            crucible::cli::commands::volumes(args, &config, &*backend).await
        }
        Commands::External(_) => unreachable!("handled above"),
    }
}
