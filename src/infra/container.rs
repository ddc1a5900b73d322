//! Container execution substrate
//!
//! Provides the boundary to the container runtime (Docker or Podman) and the
//! [`BuildEnvironment`] value that pipeline steps thread through by ownership
//! transfer. Every step consumes the previous environment and returns a new
//! one, so a run keeps an auditable trail of executed commands and two runs
//! can never share an environment.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;

/// Execution substrate errors
#[derive(Error, Debug)]
pub enum ContainerError {
    /// Neither Docker nor Podman found in PATH
    #[error("Neither Docker nor Podman found in PATH")]
    RuntimeNotFound,

    /// Image build from the definition directory failed
    #[error("Failed to build image from '{definition}': {error}")]
    ImageBuildFailed { definition: PathBuf, error: String },

    /// Container could not be started
    #[error("Failed to start container from image '{image}': {error}")]
    StartFailed { image: String, error: String },

    /// A command could not be spawned inside the container
    #[error("Failed to execute '{command}': {error}")]
    ExecFailed { command: String, error: String },

    /// A command exited non-zero in a context where that is fatal
    #[error("Command '{command}' exited with code {code}")]
    CommandFailed { command: String, code: i32 },

    /// A file inside the container could not be evaluated
    #[error("File '{path}' is not available in the container: {error}")]
    FileUnavailable { path: String, error: String },

    /// Copying a file out of the container failed
    #[error("Failed to copy '{path}' out of the container: {error}")]
    CopyFailed { path: String, error: String },

    /// Mounts are fixed once the container has started
    #[error("Cannot mount '{path}' after the container has started")]
    MountAfterStart { path: PathBuf },
}

/// Container runtime type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerRuntime {
    /// Docker container runtime
    Docker,
    /// Podman container runtime
    Podman,
}

impl ContainerRuntime {
    /// Get the command name for this runtime
    pub fn command(self) -> &'static str {
        match self {
            ContainerRuntime::Docker => "docker",
            ContainerRuntime::Podman => "podman",
        }
    }

    /// Detect an available container runtime, preferring Docker
    pub fn detect() -> Result<Self, ContainerError> {
        for runtime in [ContainerRuntime::Docker, ContainerRuntime::Podman] {
            if which::which(runtime.command()).is_ok() {
                return Ok(runtime);
            }
        }
        Err(ContainerError::RuntimeNotFound)
    }
}

/// Identifier of a built or pulled image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageId(pub String);

impl ImageId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Identifier of a running container
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerId(pub String);

impl ContainerId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Mount configuration for container volumes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mount {
    /// Host path to mount
    pub host_path: PathBuf,
    /// Container path to mount to
    pub container_path: PathBuf,
    /// Whether the mount is read-only
    pub read_only: bool,
}

impl Mount {
    /// Create a new read-only mount
    pub fn read_only(host_path: PathBuf, container_path: PathBuf) -> Self {
        Self {
            host_path,
            container_path,
            read_only: true,
        }
    }

    /// Create a new read-write mount
    pub fn read_write(host_path: PathBuf, container_path: PathBuf) -> Self {
        Self {
            host_path,
            container_path,
            read_only: false,
        }
    }
}

/// One executed command, recorded in the environment's audit trail
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutedStep {
    /// Command line that was executed
    pub argv: Vec<String>,
    /// Exit code the command returned
    pub exit_code: i32,
}

/// Contract required from the container runtime
///
/// The rest of the crate only talks to the substrate through this trait;
/// tests substitute a scripted in-memory implementation.
pub trait ContainerExecutor: Send + Sync {
    /// Build an image from a definition (Dockerfile) directory
    fn build_image(
        &self,
        definition: &Path,
        build_args: &[(String, String)],
    ) -> Result<ImageId, ContainerError>;

    /// Start a long-running container from an image with the given mounts
    fn start_container(&self, image: &ImageId, mounts: &[Mount])
        -> Result<ContainerId, ContainerError>;

    /// Execute a command inside a running container, returning its exit code
    fn exec(
        &self,
        container: &ContainerId,
        argv: &[String],
        workdir: Option<&Path>,
        env: &[(String, String)],
    ) -> Result<i32, ContainerError>;

    /// Size in bytes of a file inside the container; fails if the file is absent
    fn file_size(&self, container: &ContainerId, path: &str) -> Result<u64, ContainerError>;

    /// Copy a file out of the container to a host path
    fn copy_out(
        &self,
        container: &ContainerId,
        path: &str,
        dest: &Path,
    ) -> Result<(), ContainerError>;

    /// Remove a container
    fn remove_container(&self, container: &ContainerId) -> Result<(), ContainerError>;
}

/// Docker/Podman-backed executor
#[derive(Debug, Clone, Copy)]
pub struct DockerExecutor {
    runtime: ContainerRuntime,
}

impl DockerExecutor {
    /// Create an executor, detecting the available runtime
    pub fn new() -> Result<Self, ContainerError> {
        Ok(Self {
            runtime: ContainerRuntime::detect()?,
        })
    }

    /// Create an executor for a specific runtime
    pub fn with_runtime(runtime: ContainerRuntime) -> Self {
        Self { runtime }
    }

    /// Get the runtime in use
    pub fn runtime(&self) -> ContainerRuntime {
        self.runtime
    }

    fn command(&self) -> std::process::Command {
        std::process::Command::new(self.runtime.command())
    }
}

impl ContainerExecutor for DockerExecutor {
    fn build_image(
        &self,
        definition: &Path,
        build_args: &[(String, String)],
    ) -> Result<ImageId, ContainerError> {
        let mut cmd = self.command();
        cmd.arg("build").arg("-q");
        for (key, value) in build_args {
            cmd.arg("--build-arg").arg(format!("{key}={value}"));
        }
        cmd.arg(definition);

        let output = cmd.output().map_err(|e| ContainerError::ImageBuildFailed {
            definition: definition.to_path_buf(),
            error: e.to_string(),
        })?;

        if !output.status.success() {
            return Err(ContainerError::ImageBuildFailed {
                definition: definition.to_path_buf(),
                error: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(ImageId(
            String::from_utf8_lossy(&output.stdout).trim().to_string(),
        ))
    }

    fn start_container(
        &self,
        image: &ImageId,
        mounts: &[Mount],
    ) -> Result<ContainerId, ContainerError> {
        let mut cmd = self.command();
        cmd.arg("run").arg("-d");
        for mount in mounts {
            let spec = if mount.read_only {
                format!(
                    "{}:{}:ro",
                    mount.host_path.display(),
                    mount.container_path.display()
                )
            } else {
                format!(
                    "{}:{}",
                    mount.host_path.display(),
                    mount.container_path.display()
                )
            };
            cmd.arg("-v").arg(spec);
        }
        // Keep the container alive; all work happens through exec.
        cmd.arg(image.as_str()).arg("sleep").arg("infinity");

        let output = cmd.output().map_err(|e| ContainerError::StartFailed {
            image: image.as_str().to_string(),
            error: e.to_string(),
        })?;

        if !output.status.success() {
            return Err(ContainerError::StartFailed {
                image: image.as_str().to_string(),
                error: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(ContainerId(
            String::from_utf8_lossy(&output.stdout).trim().to_string(),
        ))
    }

    fn exec(
        &self,
        container: &ContainerId,
        argv: &[String],
        workdir: Option<&Path>,
        env: &[(String, String)],
    ) -> Result<i32, ContainerError> {
        let mut cmd = self.command();
        cmd.arg("exec");
        if let Some(dir) = workdir {
            cmd.arg("-w").arg(dir);
        }
        for (key, value) in env {
            cmd.arg("-e").arg(format!("{key}={value}"));
        }
        cmd.arg(container.as_str());
        cmd.args(argv);

        // Inherit stdio so long-running tool output stays visible.
        let status = cmd.status().map_err(|e| ContainerError::ExecFailed {
            command: argv.join(" "),
            error: e.to_string(),
        })?;

        Ok(status.code().unwrap_or(-1))
    }

    fn file_size(&self, container: &ContainerId, path: &str) -> Result<u64, ContainerError> {
        let output = self
            .command()
            .arg("exec")
            .arg(container.as_str())
            .args(["stat", "-c", "%s", path])
            .output()
            .map_err(|e| ContainerError::FileUnavailable {
                path: path.to_string(),
                error: e.to_string(),
            })?;

        if !output.status.success() {
            return Err(ContainerError::FileUnavailable {
                path: path.to_string(),
                error: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        String::from_utf8_lossy(&output.stdout)
            .trim()
            .parse()
            .map_err(|e: std::num::ParseIntError| ContainerError::FileUnavailable {
                path: path.to_string(),
                error: e.to_string(),
            })
    }

    fn copy_out(
        &self,
        container: &ContainerId,
        path: &str,
        dest: &Path,
    ) -> Result<(), ContainerError> {
        let output = self
            .command()
            .arg("cp")
            .arg(format!("{}:{}", container.as_str(), path))
            .arg(dest)
            .output()
            .map_err(|e| ContainerError::CopyFailed {
                path: path.to_string(),
                error: e.to_string(),
            })?;

        if !output.status.success() {
            return Err(ContainerError::CopyFailed {
                path: path.to_string(),
                error: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(())
    }

    fn remove_container(&self, container: &ContainerId) -> Result<(), ContainerError> {
        let output = self
            .command()
            .args(["rm", "-f", container.as_str()])
            .output()
            .map_err(|e| ContainerError::ExecFailed {
                command: format!("rm -f {}", container.as_str()),
                error: e.to_string(),
            })?;

        if !output.status.success() {
            return Err(ContainerError::ExecFailed {
                command: format!("rm -f {}", container.as_str()),
                error: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(())
    }
}

/// The evolving execution context of one pipeline run
///
/// Owned exclusively by one run. Operations consume the value and return a
/// new one; the container itself is started lazily on the first executed
/// command, so mounts and build arguments can be configured up front.
pub struct BuildEnvironment {
    executor: Arc<dyn ContainerExecutor>,
    image: ImageId,
    mounts: Vec<Mount>,
    env_vars: Vec<(String, String)>,
    workdir: Option<PathBuf>,
    container: Option<ContainerId>,
    steps: Vec<ExecutedStep>,
}

impl fmt::Debug for BuildEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BuildEnvironment")
            .field("image", &self.image)
            .field("container", &self.container)
            .field("mounts", &self.mounts)
            .field("workdir", &self.workdir)
            .field("steps", &self.steps.len())
            .finish_non_exhaustive()
    }
}

impl BuildEnvironment {
    /// Build an image from a definition directory and wrap it in a fresh
    /// environment
    pub fn from_definition(
        executor: Arc<dyn ContainerExecutor>,
        definition: &Path,
        build_args: &[(String, String)],
    ) -> Result<Self, ContainerError> {
        let image = executor.build_image(definition, build_args)?;
        tracing::info!(image = %image.as_str(), "Built image from definition");
        Ok(Self::from_image_id(executor, image))
    }

    /// Wrap an already-available image (e.g. a registry reference) in a
    /// fresh environment
    pub fn from_image(executor: Arc<dyn ContainerExecutor>, image: &str) -> Self {
        Self::from_image_id(executor, ImageId(image.to_string()))
    }

    fn from_image_id(executor: Arc<dyn ContainerExecutor>, image: ImageId) -> Self {
        Self {
            executor,
            image,
            mounts: Vec::new(),
            env_vars: Vec::new(),
            workdir: None,
            container: None,
            steps: Vec::new(),
        }
    }

    /// Mount a host directory into the container
    ///
    /// Mounts are fixed at container start; calling this after the first
    /// executed command is an error.
    pub fn with_mounted_directory(
        mut self,
        container_path: impl Into<PathBuf>,
        host_dir: impl Into<PathBuf>,
    ) -> Result<Self, ContainerError> {
        let container_path = container_path.into();
        if self.container.is_some() {
            return Err(ContainerError::MountAfterStart {
                path: container_path,
            });
        }
        self.mounts
            .push(Mount::read_write(host_dir.into(), container_path));
        Ok(self)
    }

    /// Set an environment variable for every subsequent command
    #[must_use]
    pub fn with_env_var(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env_vars.push((key.into(), value.into()));
        self
    }

    /// Set the working directory for every subsequent command
    #[must_use]
    pub fn with_workdir(mut self, path: impl Into<PathBuf>) -> Self {
        self.workdir = Some(path.into());
        self
    }

    /// Execute a command; a non-zero exit code is fatal
    pub fn run(self, argv: &[&str]) -> Result<Self, ContainerError> {
        let (env, code) = self.run_tolerant(argv)?;
        if code != 0 {
            return Err(ContainerError::CommandFailed {
                command: argv.join(" "),
                code,
            });
        }
        Ok(env)
    }

    /// Execute a command, returning its exit code instead of failing on
    /// non-zero (tolerant-exit-code policy for the export step)
    pub fn run_tolerant(mut self, argv: &[&str]) -> Result<(Self, i32), ContainerError> {
        let argv: Vec<String> = argv.iter().map(ToString::to_string).collect();
        let container = self.ensure_started()?;
        tracing::debug!(command = %argv.join(" "), "exec");
        let code = self.executor.exec(
            &container,
            &argv,
            self.workdir.as_deref(),
            &self.env_vars,
        )?;
        self.steps.push(ExecutedStep {
            argv,
            exit_code: code,
        });
        Ok((self, code))
    }

    fn ensure_started(&mut self) -> Result<ContainerId, ContainerError> {
        if let Some(container) = &self.container {
            return Ok(container.clone());
        }
        let container = self.executor.start_container(&self.image, &self.mounts)?;
        tracing::info!(container = %container.as_str(), "Started container");
        self.container = Some(container.clone());
        Ok(container)
    }

    /// Lazy handle to a file inside the container
    ///
    /// Creating the handle performs no check; [`LazyFile::size`] forces
    /// evaluation and fails if the file does not exist.
    pub fn file<'a>(&'a self, path: &str) -> LazyFile<'a> {
        LazyFile {
            env: self,
            path: path.to_string(),
        }
    }

    /// Copy a file out of the container to a host path
    pub fn copy_out(&self, path: &str, dest: &Path) -> Result<(), ContainerError> {
        let container = self
            .container
            .as_ref()
            .ok_or_else(|| ContainerError::FileUnavailable {
                path: path.to_string(),
                error: "container not started".to_string(),
            })?;
        self.executor.copy_out(container, path, dest)
    }

    /// Audit trail of executed commands
    pub fn steps(&self) -> &[ExecutedStep] {
        &self.steps
    }

    /// Handle for best-effort operations that outlive the environment value
    /// (temporary-path cleanup on fetch failure)
    pub(crate) fn cleanup_handle(&self) -> CleanupHandle {
        CleanupHandle {
            executor: Arc::clone(&self.executor),
            container: self.container.clone(),
        }
    }
}

impl Drop for BuildEnvironment {
    fn drop(&mut self) {
        if let Some(container) = self.container.take() {
            if let Err(e) = self.executor.remove_container(&container) {
                tracing::warn!(container = %container.as_str(), error = %e, "Failed to remove container");
            }
        }
    }
}

/// Lazily-evaluated file handle
///
/// Handle creation alone does not guarantee the file exists; requesting the
/// size is the only reliable existence check.
#[derive(Debug)]
pub struct LazyFile<'a> {
    env: &'a BuildEnvironment,
    path: String,
}

impl LazyFile<'_> {
    /// The container-side path of the handle
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Force evaluation by requesting the file's byte size
    pub fn size(&self) -> Result<u64, ContainerError> {
        let container =
            self.env
                .container
                .as_ref()
                .ok_or_else(|| ContainerError::FileUnavailable {
                    path: self.path.clone(),
                    error: "container not started".to_string(),
                })?;
        self.env.executor.file_size(container, &self.path)
    }
}

/// Best-effort executor handle used by fetch cleanup guards
#[derive(Clone)]
pub(crate) struct CleanupHandle {
    executor: Arc<dyn ContainerExecutor>,
    container: Option<ContainerId>,
}

impl CleanupHandle {
    /// Run a command, ignoring all failures
    pub(crate) fn best_effort_exec(&self, argv: &[&str]) {
        let Some(container) = &self.container else {
            return;
        };
        let argv: Vec<String> = argv.iter().map(ToString::to_string).collect();
        if let Err(e) = self.executor.exec(container, &argv, None, &[]) {
            tracing::warn!(command = %argv.join(" "), error = %e, "Cleanup command failed");
        }
    }
}
