//! Error types for Crucible
//!
//! All modules use `CrucibleResult<T>` as their return type.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for Crucible operations
pub type CrucibleResult<T> = Result<T, CrucibleError>;

/// All errors that can occur in Crucible
#[derive(Error, Debug)]
pub enum CrucibleError {
    // User input errors
    #[error("Unknown environment: {name}. Known environments: {known}")]
    UnknownEnvironment { name: String, known: String },

    #[error("Unknown command: {name}. Recognized commands: {known}")]
    UnknownCommand { name: String, known: String },

    // Image errors
    #[error("Image build failed for {image}:\n{output}")]
    ProvisionFailed { image: String, output: String },

    #[error("Build context not found: {0}")]
    BuildContextNotFound(PathBuf),

    // Pipeline errors
    #[error("Stage '{stage}' failed in environment '{environment}' with exit code {code}")]
    StageFailed {
        stage: String,
        environment: String,
        code: i32,
    },

    // Volume errors
    #[error("Volume operation failed for {volume}: {reason}")]
    VolumeOperationFailed { volume: String, reason: String },

    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Process errors
    #[error("Command failed: {command}")]
    CommandFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Command execution error: {command}, stderr: {stderr}")]
    CommandExecution { command: String, stderr: String },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // General errors
    #[error("{0}")]
    User(String),
}

impl CrucibleError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a command failed error
    pub fn command_failed(command: impl Into<String>, source: std::io::Error) -> Self {
        Self::CommandFailed {
            command: command.into(),
            source,
        }
    }

    /// Create a command execution error
    pub fn command_exec(command: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self::CommandExecution {
            command: command.into(),
            stderr: stderr.into(),
        }
    }

    /// Process exit code for this error.
    ///
    /// A failed pipeline stage propagates its own exit status unmodified;
    /// everything else exits 1.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::StageFailed { code, .. } => *code,
            _ => 1,
        }
    }
}
