//! Platform parameter normalization
//!
//! Maps a (build-host architecture, target platform) pair into the concrete
//! build arguments and path conventions of a [`BuildPlan`]. Pure logic, no
//! I/O; validation happens here before any build side effect.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::config::defaults;
use crate::error::PlatformError;

/// Architecture of the machine the build container runs on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HostArch {
    /// 64-bit x86
    X86_64,
    /// 64-bit ARM
    Arm64,
}

impl HostArch {
    /// Godot toolchain platform identifier (`linux.<arch>`)
    pub fn platform_triple(self) -> &'static str {
        match self {
            Self::X86_64 => "linux.x86_64",
            Self::Arm64 => "linux.arm64",
        }
    }

    /// Archive naming convention used by Godot release bundles (`linux_<arch>`)
    pub fn archive_platform(self) -> &'static str {
        match self {
            Self::X86_64 => "linux_x86_64",
            Self::Arm64 => "linux_arm64",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::X86_64 => "x86_64",
            Self::Arm64 => "arm64",
        }
    }
}

impl FromStr for HostArch {
    type Err = PlatformError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "x86_64" => Ok(Self::X86_64),
            "arm64" => Ok(Self::Arm64),
            other => Err(PlatformError::InvalidArchitecture {
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for HostArch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Target platform for the exported artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetPlatform {
    MacOs,
    Linux,
    Windows,
}

impl TargetPlatform {
    /// Canonical lowercase name, used in export paths
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MacOs => "macos",
            Self::Linux => "linux",
            Self::Windows => "windows",
        }
    }

    /// Export preset label understood by the Godot export tool
    pub fn export_label(self) -> &'static str {
        match self {
            Self::MacOs => "macOS",
            Self::Windows => "Windows Desktop",
            Self::Linux => "Linux",
        }
    }
}

impl FromStr for TargetPlatform {
    type Err = PlatformError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "macos" => Ok(Self::MacOs),
            "linux" => Ok(Self::Linux),
            "windows" => Ok(Self::Windows),
            other => Err(PlatformError::InvalidPlatform {
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for TargetPlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validated input for one pipeline run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformRequest {
    /// Architecture the build container runs on
    pub host_arch: HostArch,
    /// Platform the artifact is exported for
    pub target: TargetPlatform,
    /// Base name of the produced archive (`<name>.zip`)
    pub artifact_name: String,
}

impl PlatformRequest {
    /// Parse raw string parameters into a validated request
    ///
    /// Fails with [`PlatformError`] before any resource is touched.
    pub fn parse(host_arch: &str, target: &str, artifact_name: &str) -> Result<Self, PlatformError> {
        Ok(Self {
            host_arch: host_arch.parse()?,
            target: target.parse()?,
            artifact_name: artifact_name.to_string(),
        })
    }
}

impl Default for PlatformRequest {
    fn default() -> Self {
        Self {
            host_arch: HostArch::Arm64,
            target: TargetPlatform::MacOs,
            artifact_name: defaults::DEFAULT_ARTIFACT_NAME.to_string(),
        }
    }
}

/// Concrete build inputs derived from a [`PlatformRequest`]
///
/// Immutable once produced. The export paths are a function of the target
/// platform only, never of the host architecture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildPlan {
    /// Godot toolchain version installed into the build image
    pub toolchain_version: String,
    /// Toolchain platform identifier (e.g. `linux.arm64`)
    pub platform_triple: String,
    /// Release archive naming convention (e.g. `linux_arm64`)
    pub archive_platform: String,
    /// Export preset label passed to the export tool
    pub export_label: String,
    /// Directory the artifact is exported into (inside the container)
    pub export_directory: String,
    /// Full path of the expected artifact (inside the container)
    pub export_file_path: String,
}

impl BuildPlan {
    /// Derive the build plan from a validated request
    ///
    /// Pure function: identical inputs always yield identical plans.
    pub fn normalize(request: &PlatformRequest) -> Self {
        let export_directory = format!("{}/{}", defaults::EXPORT_ROOT, request.target.as_str());
        let export_file_path = format!("{}/{}.zip", export_directory, request.artifact_name);

        Self {
            toolchain_version: defaults::GODOT_VERSION.to_string(),
            platform_triple: request.host_arch.platform_triple().to_string(),
            archive_platform: request.host_arch.archive_platform().to_string(),
            export_label: request.target.export_label().to_string(),
            export_directory,
            export_file_path,
        }
    }

    /// Build arguments passed to the image build
    pub fn build_args(&self) -> Vec<(String, String)> {
        vec![
            ("GODOT_VERSION".to_string(), self.toolchain_version.clone()),
            ("GODOT_PLATFORM".to_string(), self.platform_triple.clone()),
            (
                "GODOT_ZIP_PLATFORM".to_string(),
                self.archive_platform.clone(),
            ),
        ]
    }
}
