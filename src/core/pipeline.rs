//! Build pipeline driver
//!
//! Top-level orchestration of one export run. The pipeline is a linear state
//! machine with no back-edges:
//!
//! `Init -> ImageBuilt -> ProjectMounted -> ToolsInstalled ->
//!  AddonsInstalled -> Exported -> Verified | Failed`
//!
//! The export step runs under the tolerant-exit-code policy: some Godot
//! versions exit non-zero on partial or benign conditions, so the exit code
//! is logged but success is determined by artifact verification alone.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use crate::config::defaults;
use crate::core::addon::AddonSet;
use crate::core::platform::{BuildPlan, PlatformRequest};
use crate::core::resolver;
use crate::core::verify::{self, Artifact};
use crate::error::GdforgeError;
use crate::infra::container::{BuildEnvironment, ContainerExecutor};

/// Pipeline stages, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Init,
    ImageBuilt,
    ProjectMounted,
    ToolsInstalled,
    AddonsInstalled,
    Exported,
    Verified,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Init => "init",
            Self::ImageBuilt => "image-built",
            Self::ProjectMounted => "project-mounted",
            Self::ToolsInstalled => "tools-installed",
            Self::AddonsInstalled => "addons-installed",
            Self::Exported => "exported",
            Self::Verified => "verified",
        };
        f.write_str(name)
    }
}

/// Inputs for one pipeline run
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Directory containing the build image definition (Dockerfile)
    pub definition_dir: PathBuf,
    /// Directory containing the game project
    pub project_dir: PathBuf,
    /// Validated platform parameters
    pub request: PlatformRequest,
    /// Addons to materialize before export
    pub addons: AddonSet,
}

fn advance(stage: Stage) -> Stage {
    tracing::info!(stage = %stage, "Pipeline stage complete");
    stage
}

/// Run the full export pipeline and return the verified artifact
pub fn run(
    executor: Arc<dyn ContainerExecutor>,
    config: &PipelineConfig,
) -> Result<Artifact, GdforgeError> {
    let plan = BuildPlan::normalize(&config.request);
    tracing::info!(
        platform = %config.request.target,
        arch = %config.request.host_arch,
        export = %plan.export_file_path,
        "Starting export pipeline"
    );
    let _ = advance(Stage::Init);

    // Init -> ImageBuilt
    let env = BuildEnvironment::from_definition(
        Arc::clone(&executor),
        &config.definition_dir,
        &plan.build_args(),
    )?;
    let _ = advance(Stage::ImageBuilt);

    // ImageBuilt -> ProjectMounted
    let env = env
        .with_mounted_directory(defaults::PROJECT_MOUNT, config.project_dir.clone())?
        .with_env_var("GODOT_VERSION", plan.toolchain_version.clone())
        .run(&["mkdir", "-p", &plan.export_directory])?
        .with_workdir(defaults::PROJECT_MOUNT);
    let _ = advance(Stage::ProjectMounted);

    // ProjectMounted -> ToolsInstalled
    let mut install_args = vec!["apt-get", "install", "-y"];
    install_args.extend_from_slice(&defaults::FETCH_TOOLS);
    let env = env
        .run(&["apt-get", "update"])?
        .run(&install_args)?;
    let _ = advance(Stage::ToolsInstalled);

    // ToolsInstalled -> AddonsInstalled
    let env = resolver::install(env, defaults::PROJECT_MOUNT, &config.addons)?;
    let _ = advance(Stage::AddonsInstalled);

    // AddonsInstalled -> Exported (tolerant exit code)
    let (env, exit_code) = env.run_tolerant(&[
        "godot",
        "--headless",
        "--verbose",
        "--export-release",
        &plan.export_label,
        &plan.export_file_path,
    ])?;
    if exit_code != 0 {
        tracing::warn!(exit_code, "Export command exited non-zero; deferring to verification");
    }
    let _ = advance(Stage::Exported);

    // Exported -> Verified | Failed
    let artifact = verify::verify(env, &plan.export_file_path)?;
    let _ = advance(Stage::Verified);

    Ok(artifact)
}
