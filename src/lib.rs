//! gdforge - containerized Godot export pipeline
//!
//! This library produces a platform-specific distributable artifact from a
//! Godot game project: it normalizes platform parameters into a build plan,
//! materializes a declarative set of addons from external sources into the
//! project, drives the export through a long-running container and verifies
//! the resulting artifact.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`cli`] - Command-line interface parsing and output formatting
//! - [`core`] - Business logic (normalization, resolution, the pipeline)
//! - [`infra`] - Infrastructure layer (container runtime, fetch commands)
//! - [`config`] - Configuration and constants
//! - [`error`] - Error types and handling

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod infra;

#[cfg(test)]
pub mod test_utils;
