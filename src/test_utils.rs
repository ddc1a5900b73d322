//! Test utilities
//!
//! A scripted in-memory [`ContainerExecutor`] so resolver, fetcher and
//! pipeline tests run without a container runtime, plus proptest generators.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

use crate::infra::container::{
    ContainerError, ContainerExecutor, ContainerId, ImageId, Mount,
};

/// In-memory executor that records every call and replays scripted results
#[derive(Debug, Default)]
pub struct FakeExecutor {
    commands: Mutex<Vec<Vec<String>>>,
    build_args: Mutex<Vec<(String, String)>>,
    mounts: Mutex<Vec<Mount>>,
    exit_codes: Mutex<Vec<(String, i32)>>,
    file_sizes: Mutex<HashMap<String, u64>>,
    removed: Mutex<Vec<ContainerId>>,
}

impl FakeExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every command whose joined argv starts with `prefix` exit with
    /// `code`
    pub fn fail_matching(&self, prefix: &str, code: i32) {
        self.exit_codes
            .lock()
            .unwrap()
            .push((prefix.to_string(), code));
    }

    /// Register the size a container file reports when stat'd
    pub fn set_file_size(&self, path: &str, size: u64) {
        self.file_sizes
            .lock()
            .unwrap()
            .insert(path.to_string(), size);
    }

    /// Every executed command, argv joined with spaces
    pub fn executed_commands(&self) -> Vec<String> {
        self.commands
            .lock()
            .unwrap()
            .iter()
            .map(|argv| argv.join(" "))
            .collect()
    }

    /// Build args passed to the last image build
    pub fn recorded_build_args(&self) -> Vec<(String, String)> {
        self.build_args.lock().unwrap().clone()
    }

    /// Mounts passed to the last container start
    pub fn recorded_mounts(&self) -> Vec<Mount> {
        self.mounts.lock().unwrap().clone()
    }

    /// Containers that were removed
    pub fn removed_containers(&self) -> Vec<ContainerId> {
        self.removed.lock().unwrap().clone()
    }
}

impl ContainerExecutor for FakeExecutor {
    fn build_image(
        &self,
        _definition: &Path,
        build_args: &[(String, String)],
    ) -> Result<ImageId, ContainerError> {
        *self.build_args.lock().unwrap() = build_args.to_vec();
        Ok(ImageId("fake-image".to_string()))
    }

    fn start_container(
        &self,
        _image: &ImageId,
        mounts: &[Mount],
    ) -> Result<ContainerId, ContainerError> {
        *self.mounts.lock().unwrap() = mounts.to_vec();
        Ok(ContainerId("fake-container".to_string()))
    }

    fn exec(
        &self,
        _container: &ContainerId,
        argv: &[String],
        _workdir: Option<&Path>,
        _env: &[(String, String)],
    ) -> Result<i32, ContainerError> {
        self.commands.lock().unwrap().push(argv.to_vec());
        let joined = argv.join(" ");
        let code = self
            .exit_codes
            .lock()
            .unwrap()
            .iter()
            .find(|(prefix, _)| joined.starts_with(prefix.as_str()))
            .map_or(0, |(_, code)| *code);
        Ok(code)
    }

    fn file_size(&self, _container: &ContainerId, path: &str) -> Result<u64, ContainerError> {
        self.file_sizes
            .lock()
            .unwrap()
            .get(path)
            .copied()
            .ok_or_else(|| ContainerError::FileUnavailable {
                path: path.to_string(),
                error: "No such file or directory".to_string(),
            })
    }

    fn copy_out(
        &self,
        _container: &ContainerId,
        path: &str,
        dest: &Path,
    ) -> Result<(), ContainerError> {
        let size = self.file_size(_container, path)?;
        std::fs::write(dest, vec![0u8; usize::try_from(size).unwrap_or(0)]).map_err(|e| {
            ContainerError::CopyFailed {
                path: path.to_string(),
                error: e.to_string(),
            }
        })
    }

    fn remove_container(&self, container: &ContainerId) -> Result<(), ContainerError> {
        self.removed.lock().unwrap().push(container.clone());
        Ok(())
    }
}

pub mod generators {
    use proptest::prelude::*;

    /// Generate a valid addon folder name
    pub fn addon_name() -> impl Strategy<Value = String> {
        "[a-z][a-z0-9-]{0,20}"
    }

    /// Generate a plausible archive URL
    pub fn archive_url() -> impl Strategy<Value = String> {
        ("[a-z]{3,10}", "[a-z0-9-]{1,20}")
            .prop_map(|(domain, path)| format!("https://{domain}.example.com/{path}/addons.zip"))
    }

    /// Generate a git ref name
    pub fn git_ref() -> impl Strategy<Value = String> {
        "[a-zA-Z][a-zA-Z0-9._-]{0,30}"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_fake_executor_records_and_replays() {
        let executor = FakeExecutor::new();
        executor.fail_matching("false", 1);

        let container = ContainerId("c".to_string());
        let ok = executor
            .exec(&container, &["true".to_string()], None, &[])
            .unwrap();
        let bad = executor
            .exec(&container, &["false".to_string()], None, &[])
            .unwrap();

        assert_eq!(ok, 0);
        assert_eq!(bad, 1);
        assert_eq!(executor.executed_commands(), vec!["true", "false"]);
    }

    #[test]
    fn test_environment_drop_removes_container() {
        use crate::infra::container::{BuildEnvironment, ContainerExecutor};

        let executor = Arc::new(FakeExecutor::new());
        {
            let env = BuildEnvironment::from_image(
                Arc::clone(&executor) as Arc<dyn ContainerExecutor>,
                "img",
            );
            let _env = env.run(&["true"]).unwrap();
        }
        assert_eq!(
            executor.removed_containers(),
            vec![ContainerId("fake-container".to_string())]
        );
    }

    #[test]
    fn test_unstarted_environment_removes_nothing() {
        use crate::infra::container::{BuildEnvironment, ContainerExecutor};

        let executor = Arc::new(FakeExecutor::new());
        {
            let _env = BuildEnvironment::from_image(
                Arc::clone(&executor) as Arc<dyn ContainerExecutor>,
                "img",
            );
        }
        assert!(executor.removed_containers().is_empty());
    }
}
