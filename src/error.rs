//! Error types for gdforge
//!
//! Domain-specific error types using thiserror.

use thiserror::Error;

use crate::infra::container::ContainerError;

/// Platform parameter validation errors
///
/// Raised before any build side effect occurs; always recoverable by the
/// caller (retry with corrected input).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlatformError {
    /// Target platform is not one of the recognized values
    #[error("Invalid target platform '{value}': must be 'macos', 'linux' or 'windows'")]
    InvalidPlatform { value: String },

    /// Build-host architecture is not one of the recognized values
    #[error("Invalid build-host architecture '{value}': must be 'x86_64' or 'arm64'")]
    InvalidArchitecture { value: String },
}

/// Addon resolution and installation errors
#[derive(Error, Debug)]
pub enum AddonError {
    /// The fetched archive/repository did not contain the declared subpath
    #[error("Addon source '{descriptor}' is missing expected path '{path}'")]
    SourceMissing { descriptor: String, path: String },

    /// Two descriptors resolve to the same final addon folder name
    #[error("Duplicate addon folder name '{name}' in addon set")]
    DuplicateName { name: String },

    /// A descriptor field that must be non-empty is empty
    #[error("Addon descriptor '{descriptor}' has empty field '{field}'")]
    EmptyField {
        descriptor: String,
        field: &'static str,
    },

    /// Failed to read the addon manifest
    #[error("Failed to read addon manifest '{path}': {error}")]
    ManifestRead { path: String, error: String },

    /// Failed to parse the addon manifest
    #[error("Failed to parse addon manifest: {0}")]
    ManifestParse(#[from] toml::de::Error),

    /// An underlying fetch command failed
    #[error(transparent)]
    Exec(#[from] ContainerError),
}

/// Export verification errors
#[derive(Error, Debug)]
pub enum ExportError {
    /// The expected artifact was not found (or not readable) after export
    #[error("Export failed: expected artifact '{expected_path}' was not created")]
    ExportFailed { expected_path: String },

    /// The artifact exists but is empty
    #[error("Export failed: artifact '{expected_path}' is empty")]
    EmptyArtifact { expected_path: String },
}

/// Top-level gdforge error type
#[derive(Error, Debug)]
pub enum GdforgeError {
    /// Platform parameter error
    #[error(transparent)]
    Platform(#[from] PlatformError),

    /// Addon installation error
    #[error(transparent)]
    Addon(#[from] AddonError),

    /// Execution substrate error
    #[error(transparent)]
    Container(#[from] ContainerError),

    /// Export verification error
    #[error(transparent)]
    Export(#[from] ExportError),

    /// IO error
    #[error("IO error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}
