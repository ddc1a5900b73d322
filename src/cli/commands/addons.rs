//! Addons command implementation
//!
//! `gdforge addons install` materializes the addon set into a plain base
//! image (no Godot toolchain required); `gdforge addons list` prints the
//! resolved set.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::cli::output::status;
use crate::config::defaults;
use crate::core::addon::{AddonDescriptor, AddonSet};
use crate::core::resolver;
use crate::infra::container::{BuildEnvironment, DockerExecutor};

/// Install the addon set into a fresh container from a base image
pub async fn execute_install(
    image: &str,
    root: &str,
    manifest: Option<PathBuf>,
) -> Result<()> {
    let set = AddonSet::resolve(manifest.as_deref(), None)?;
    let executor = Arc::new(DockerExecutor::new()?);

    let mut tool_args = vec!["apt-get", "install", "-y"];
    tool_args.extend_from_slice(&defaults::FETCH_TOOLS);

    let env = BuildEnvironment::from_image(executor, image)
        .run(&["apt-get", "update"])?
        .run(&tool_args)?;

    let env = resolver::install(env, root, &set).with_context(|| "Addon installation failed")?;

    // Show the result; the container's stdio is inherited.
    let addons_path = format!("{root}/addons");
    let (env, _) = env.run_tolerant(&["find", &addons_path, "-maxdepth", "1", "-type", "d"])?;
    drop(env);

    println!(
        "{} Installed {} addon(s) into {addons_path}",
        status::SUCCESS,
        set.len()
    );
    Ok(())
}

/// Print the resolved addon set
pub fn execute_list(manifest: Option<PathBuf>, json: bool) -> Result<()> {
    let cwd = std::env::current_dir()?;
    let set = AddonSet::resolve(manifest.as_deref(), Some(cwd.as_path()))?;

    if json {
        let descriptors: Vec<_> = set.iter().cloned().collect();
        println!("{}", serde_json::to_string_pretty(&descriptors)?);
        return Ok(());
    }

    for descriptor in &set {
        match descriptor {
            AddonDescriptor::Archive { url, folder } => {
                println!("{} {folder} (archive: {url})", status::INFO);
            }
            AddonDescriptor::Repository {
                repo,
                reference,
                path,
            } => {
                println!(
                    "{} {} (repository: {repo} @ {reference}, path: {path})",
                    status::INFO,
                    descriptor.install_name()
                );
            }
        }
    }
    Ok(())
}
