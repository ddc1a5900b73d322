//! Plan command implementation
//!
//! Implements `gdforge plan`: print the normalized build plan for a
//! platform request without touching any build resource.

use anyhow::Result;

use crate::core::platform::{BuildPlan, PlatformRequest};

/// Execute the plan command
pub fn execute(arch: &str, platform: &str, artifact_name: &str, json: bool) -> Result<()> {
    let request = PlatformRequest::parse(arch, platform, artifact_name)?;
    let plan = BuildPlan::normalize(&request);

    if json {
        println!("{}", serde_json::to_string_pretty(&plan)?);
        return Ok(());
    }

    println!("Build plan for {} on {}:", request.target, request.host_arch);
    println!("  toolchain version: {}", plan.toolchain_version);
    println!("  platform triple:   {}", plan.platform_triple);
    println!("  archive platform:  {}", plan.archive_platform);
    println!("  export label:      {}", plan.export_label);
    println!("  export directory:  {}", plan.export_directory);
    println!("  export file:       {}", plan.export_file_path);
    Ok(())
}
