//! Artifact verification
//!
//! Confirms the expected export output exists and is non-empty. The file
//! handle is lazy, so the size request is what forces evaluation; the export
//! command's own exit code is never consulted here.

use std::path::Path;

use crate::error::ExportError;
use crate::infra::container::{BuildEnvironment, ContainerError};

/// A verified export artifact
///
/// Owns the build environment so the container stays alive for as long as
/// the artifact handle is held; dropping the artifact tears it down.
#[derive(Debug)]
pub struct Artifact {
    env: BuildEnvironment,
    path: String,
    size: u64,
}

impl Artifact {
    /// Container-side path of the artifact
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Size in bytes, as observed at verification time
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Audit trail of the run that produced this artifact
    pub fn steps(&self) -> &[crate::infra::container::ExecutedStep] {
        self.env.steps()
    }

    /// Copy the artifact to a host path
    pub fn copy_to(&self, dest: &Path) -> Result<(), ContainerError> {
        self.env.copy_out(&self.path, dest)
    }
}

/// Verify the artifact at `export_file_path` and return a handle to it
pub fn verify(env: BuildEnvironment, export_file_path: &str) -> Result<Artifact, ExportError> {
    let size = match env.file(export_file_path).size() {
        Ok(size) => size,
        Err(e) => {
            tracing::error!(path = export_file_path, error = %e, "Artifact missing after export");
            return Err(ExportError::ExportFailed {
                expected_path: export_file_path.to_string(),
            });
        }
    };

    if size == 0 {
        return Err(ExportError::EmptyArtifact {
            expected_path: export_file_path.to_string(),
        });
    }

    tracing::info!(path = export_file_path, size, "Export verified");
    Ok(Artifact {
        env,
        path: export_file_path.to_string(),
        size,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::FakeExecutor;
    use std::sync::Arc;

    fn started_env(executor: &Arc<FakeExecutor>) -> BuildEnvironment {
        BuildEnvironment::from_image(
            Arc::clone(executor) as Arc<dyn crate::infra::container::ContainerExecutor>,
            "test-image",
        )
        .run(&["true"])
        .unwrap()
    }

    #[test]
    fn test_verify_success_returns_size() {
        let executor = Arc::new(FakeExecutor::new());
        executor.set_file_size("/export_build/macos/game.zip", 4096);
        let env = started_env(&executor);

        let artifact = verify(env, "/export_build/macos/game.zip").unwrap();
        assert_eq!(artifact.size(), 4096);
        assert_eq!(artifact.path(), "/export_build/macos/game.zip");
    }

    #[test]
    fn test_verify_missing_file_names_expected_path() {
        let executor = Arc::new(FakeExecutor::new());
        let env = started_env(&executor);

        let err = verify(env, "/export_build/linux/game.zip").unwrap_err();
        assert!(matches!(
            err,
            ExportError::ExportFailed { ref expected_path }
                if expected_path == "/export_build/linux/game.zip"
        ));
    }

    #[test]
    fn test_verify_empty_file_rejected() {
        let executor = Arc::new(FakeExecutor::new());
        executor.set_file_size("/export_build/macos/game.zip", 0);
        let env = started_env(&executor);

        let err = verify(env, "/export_build/macos/game.zip").unwrap_err();
        assert!(matches!(err, ExportError::EmptyArtifact { .. }));
    }

    #[test]
    fn test_verify_on_unstarted_environment_fails() {
        let executor = Arc::new(FakeExecutor::new());
        executor.set_file_size("/export_build/macos/game.zip", 10);
        let env = BuildEnvironment::from_image(
            Arc::clone(&executor) as Arc<dyn crate::infra::container::ContainerExecutor>,
            "test-image",
        );

        // No command ever ran, so there is no container to evaluate against.
        assert!(verify(env, "/export_build/macos/game.zip").is_err());
    }
}
