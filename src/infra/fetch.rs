//! Addon source fetchers
//!
//! Two interchangeable strategies for materializing one addon into the
//! addons directory, both implemented as commands executed inside the build
//! container: the archive fetcher (download + unpack + extract one folder)
//! and the repository fetcher (shallow clone + extract one subpath).
//!
//! Temporary paths are fixed strings cleared before reuse, which makes a
//! retry of the same descriptor safe but forbids concurrent fetches against
//! the same environment. A scope guard removes the temporary paths whether a
//! fetch succeeds or fails partway.

use crate::config::defaults;
use crate::core::addon::strip_dot_prefix;
use crate::error::AddonError;
use crate::infra::container::{BuildEnvironment, CleanupHandle};

/// Removes temporary container paths when dropped, unless disarmed
struct TempPathGuard {
    handle: CleanupHandle,
    paths: &'static [&'static str],
    armed: bool,
}

impl TempPathGuard {
    fn new(env: &BuildEnvironment, paths: &'static [&'static str]) -> Self {
        Self {
            handle: env.cleanup_handle(),
            paths,
            armed: true,
        }
    }

    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for TempPathGuard {
    fn drop(&mut self) {
        if self.armed {
            let mut argv = vec!["rm", "-rf"];
            argv.extend_from_slice(self.paths);
            self.handle.best_effort_exec(&argv);
        }
    }
}

/// Install an addon from an archive URL
///
/// Downloads the archive, unpacks it, asserts the declared inner folder
/// exists and copies it into `addons_path`.
pub fn install_archive(
    env: BuildEnvironment,
    url: &str,
    folder: &str,
    addons_path: &str,
) -> Result<BuildEnvironment, AddonError> {
    tracing::info!(url, folder, "Installing addon from archive");

    let guard = TempPathGuard::new(&env, &[defaults::TMP_ARCHIVE, defaults::TMP_EXTRACT]);

    let env = env
        .run(&["mkdir", "-p", defaults::TMP_EXTRACT])?
        .run(&["wget", "-O", defaults::TMP_ARCHIVE, url])?
        .run(&["unzip", "-q", defaults::TMP_ARCHIVE, "-d", defaults::TMP_EXTRACT])?;

    let source_folder = format!("{}/{}", defaults::TMP_EXTRACT, folder);
    let (env, code) = env.run_tolerant(&["test", "-d", &source_folder])?;
    if code != 0 {
        return Err(AddonError::SourceMissing {
            descriptor: format!("archive:{url}"),
            path: folder.to_string(),
        });
    }

    let env = env
        .run(&["cp", "-r", &source_folder, addons_path])?
        .run(&["rm", "-rf", defaults::TMP_ARCHIVE, defaults::TMP_EXTRACT])?;
    guard.disarm();

    tracing::info!(folder, "Installed addon from archive");
    Ok(env)
}

/// Install an addon from a version-controlled repository
///
/// Clones `repo` at `reference` (shallow, single branch), asserts the source
/// path exists under the clone and copies it into `addons_path` under its
/// last path segment.
pub fn install_repository(
    env: BuildEnvironment,
    repo: &str,
    reference: &str,
    path: &str,
    addons_path: &str,
) -> Result<BuildEnvironment, AddonError> {
    tracing::info!(repo, reference, path, "Installing addon from repository");

    let guard = TempPathGuard::new(&env, &[defaults::TMP_REPO]);

    // Clear any stale clone from an earlier attempt before reuse.
    let env = env.run(&["rm", "-rf", defaults::TMP_REPO])?.run(&[
        "git",
        "clone",
        "--depth",
        "1",
        "--branch",
        reference,
        "--single-branch",
        repo,
        defaults::TMP_REPO,
    ])?;

    let source_path = format!("{}/{}", defaults::TMP_REPO, strip_dot_prefix(path));
    let (env, code) = env.run_tolerant(&["test", "-d", &source_path])?;
    if code != 0 {
        return Err(AddonError::SourceMissing {
            descriptor: format!("repository:{repo}@{reference}"),
            path: path.to_string(),
        });
    }

    let env = env
        .run(&["cp", "-r", &source_path, addons_path])?
        .run(&["rm", "-rf", defaults::TMP_REPO])?;
    guard.disarm();

    tracing::info!(path, "Installed addon from repository");
    Ok(env)
}
