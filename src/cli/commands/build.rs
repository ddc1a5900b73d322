//! Build command implementation
//!
//! Implements `gdforge build`: normalize platform parameters, build the
//! execution environment, install addons, export and verify.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};

use crate::cli::output::{create_spinner, status};
use crate::core::addon::AddonSet;
use crate::core::pipeline::{self, PipelineConfig};
use crate::core::platform::PlatformRequest;
use crate::infra::container::DockerExecutor;

/// Build options
pub struct BuildOptions {
    /// Directory containing the build image definition (Dockerfile)
    pub definition: PathBuf,
    /// Directory containing the game project
    pub project: PathBuf,
    /// Build-host architecture
    pub arch: String,
    /// Target platform for export
    pub platform: String,
    /// Base name of the produced archive
    pub artifact_name: String,
    /// Explicit addon manifest path
    pub manifest: Option<PathBuf>,
    /// Copy the verified artifact to this host path
    pub output: Option<PathBuf>,
}

/// Execute the build command
pub async fn execute(options: BuildOptions) -> Result<()> {
    // Parameter validation happens before any build side effect.
    let request = PlatformRequest::parse(&options.arch, &options.platform, &options.artifact_name)?;

    if !options.definition.is_dir() {
        bail!(
            "Build definition directory not found: {}",
            options.definition.display()
        );
    }
    if !options.project.is_dir() {
        bail!("Project directory not found: {}", options.project.display());
    }

    let addons = AddonSet::resolve(options.manifest.as_deref(), Some(options.project.as_path()))?;

    let executor = Arc::new(DockerExecutor::new()?);
    let config = PipelineConfig {
        definition_dir: options.definition,
        project_dir: options.project,
        request,
        addons,
    };

    let spinner = create_spinner(&format!(
        "Exporting for {} ({})",
        config.request.target, config.request.host_arch
    ));
    let result = pipeline::run(executor, &config);
    spinner.finish_and_clear();

    let artifact = result.with_context(|| "Export pipeline failed")?;
    println!(
        "{} Export successful: {} ({} bytes)",
        status::SUCCESS,
        artifact.path(),
        artifact.size()
    );

    if let Some(dest) = options.output {
        artifact
            .copy_to(&dest)
            .with_context(|| format!("Failed to copy artifact to {}", dest.display()))?;
        println!("{} Artifact copied to {}", status::SUCCESS, dest.display());
    }

    Ok(())
}
