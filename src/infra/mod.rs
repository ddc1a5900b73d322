//! Infrastructure layer
//!
//! Talks to the container runtime and executes fetch commands inside it.
//! This module is the only place where external processes are spawned.

pub mod container;
pub mod fetch;
