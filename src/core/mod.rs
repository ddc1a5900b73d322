//! Core business logic module
//!
//! # Submodules
//!
//! - [`platform`] - Platform parameter normalization into a build plan
//! - [`addon`] - Addon descriptors and the addon manifest
//! - [`resolver`] - Addon resolution into the addons directory
//! - [`pipeline`] - Build pipeline driver (the top-level state machine)
//! - [`verify`] - Artifact verification

pub mod addon;
pub mod pipeline;
pub mod platform;
pub mod resolver;
pub mod verify;
