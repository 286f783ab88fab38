//! Crucible - Multi-platform build and test orchestrator
//!
//! Validates a Cargo workspace by running the same verification pipeline
//! (check, lint, test) on the host, in a Linux container, and in a
//! Windows cross-compilation container, with content-addressed images
//! and persistent cache volumes managed through a podman-compatible
//! backend.

pub mod cli;
pub mod config;
pub mod error;
pub mod image;
pub mod pipeline;
pub mod registry;
pub mod runtime;
pub mod volume;

pub use error::{CrucibleError, CrucibleResult};
