//! Default configuration values

/// Godot toolchain version baked into the build image
pub const GODOT_VERSION: &str = "4.4.1";

/// Path where the game project is mounted inside the container
pub const PROJECT_MOUNT: &str = "/GAMEDIR";

/// Root directory for export output inside the container
pub const EXPORT_ROOT: &str = "/export_build";

/// Default artifact base name (`<name>.zip`)
pub const DEFAULT_ARTIFACT_NAME: &str = "game";

/// Addon manifest file name looked up in the project directory
pub const ADDON_MANIFEST_NAME: &str = "addons.toml";

/// Temporary path for a downloaded archive inside the container
pub const TMP_ARCHIVE: &str = "/tmp/download.zip";

/// Temporary extraction directory for archives inside the container
pub const TMP_EXTRACT: &str = "/tmp/extract";

/// Temporary clone path for repositories inside the container
pub const TMP_REPO: &str = "/tmp/repo";

/// System tools the fetchers need inside the build container
pub const FETCH_TOOLS: [&str; 3] = ["wget", "unzip", "git"];

/// Default base image for standalone addon installation
pub const DEFAULT_ADDON_IMAGE: &str = "mcr.microsoft.com/dotnet/sdk:8.0-jammy";

/// Default root path for standalone addon installation
pub const DEFAULT_ADDON_ROOT: &str = "/game1";
