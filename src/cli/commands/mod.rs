//! CLI command implementations
//!
//! Each command is implemented in its own submodule.

pub mod addons;
pub mod build;
pub mod plan;

use std::path::PathBuf;

use anyhow::Result;
use clap::Subcommand;

use crate::config::defaults;

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Export the game project for a target platform
    Build {
        /// Directory containing the build image definition (Dockerfile)
        #[arg(short, long)]
        definition: PathBuf,

        /// Directory containing the game project
        #[arg(short, long)]
        project: PathBuf,

        /// Build-host architecture (x86_64 or arm64)
        #[arg(long, default_value = "arm64")]
        arch: String,

        /// Target platform (macos, linux or windows; case-insensitive)
        #[arg(long, default_value = "macos")]
        platform: String,

        /// Base name of the produced archive (<name>.zip)
        #[arg(long, default_value = defaults::DEFAULT_ARTIFACT_NAME)]
        artifact_name: String,

        /// Addon manifest path (defaults to <project>/addons.toml)
        #[arg(long)]
        manifest: Option<PathBuf>,

        /// Copy the verified artifact to this host path
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print the normalized build plan without building anything
    Plan {
        /// Build-host architecture (x86_64 or arm64)
        #[arg(long, default_value = "arm64")]
        arch: String,

        /// Target platform (macos, linux or windows; case-insensitive)
        #[arg(long, default_value = "macos")]
        platform: String,

        /// Base name of the produced archive (<name>.zip)
        #[arg(long, default_value = defaults::DEFAULT_ARTIFACT_NAME)]
        artifact_name: String,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Manage the addon set
    Addons {
        #[command(subcommand)]
        command: AddonsCommands,
    },
}

/// Addon subcommands
#[derive(Subcommand, Debug)]
pub enum AddonsCommands {
    /// Install the addon set into a fresh container from a base image
    Install {
        /// Base image to install into (must be Debian-based)
        #[arg(long, default_value = defaults::DEFAULT_ADDON_IMAGE)]
        image: String,

        /// Root path inside the container for the addons folder
        #[arg(long, default_value = defaults::DEFAULT_ADDON_ROOT)]
        root: String,

        /// Addon manifest path (defaults to the built-in set)
        #[arg(long)]
        manifest: Option<PathBuf>,
    },

    /// Print the resolved addon set
    List {
        /// Addon manifest path
        #[arg(long)]
        manifest: Option<PathBuf>,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
}

impl Commands {
    /// Execute the command
    pub async fn run(self) -> Result<()> {
        match self {
            Commands::Build {
                definition,
                project,
                arch,
                platform,
                artifact_name,
                manifest,
                output,
            } => {
                build::execute(build::BuildOptions {
                    definition,
                    project,
                    arch,
                    platform,
                    artifact_name,
                    manifest,
                    output,
                })
                .await
            }
            Commands::Plan {
                arch,
                platform,
                artifact_name,
                json,
            } => plan::execute(&arch, &platform, &artifact_name, json),
            Commands::Addons { command } => match command {
                AddonsCommands::Install {
                    image,
                    root,
                    manifest,
                } => addons::execute_install(&image, &root, manifest).await,
                AddonsCommands::List { manifest, json } => addons::execute_list(manifest, json),
            },
        }
    }
}
