//! Addon resolution
//!
//! Consumes an ordered [`AddonSet`] and materializes every descriptor into
//! `<root>/addons` by dispatching to the matching fetcher. The addons
//! directory is destructively replaced, never merged, so re-running the
//! installation cannot accumulate stale addons. Resolution is fail-fast: the
//! first failing descriptor aborts the remainder of the set.

use crate::core::addon::{AddonDescriptor, AddonSet};
use crate::error::AddonError;
use crate::infra::container::BuildEnvironment;
use crate::infra::fetch;

/// Install every addon in `set` into `<addons_root>/addons`
pub fn install(
    env: BuildEnvironment,
    addons_root: &str,
    set: &AddonSet,
) -> Result<BuildEnvironment, AddonError> {
    let addons_path = format!("{addons_root}/addons");
    tracing::info!(path = %addons_path, count = set.len(), "Installing addons");

    // Full replace: any prior contents are removed first.
    let mut env = env
        .run(&["rm", "-rf", &addons_path])?
        .run(&["mkdir", "-p", &addons_path])?;

    for descriptor in set {
        tracing::info!(addon = %descriptor.describe(), "Resolving addon");
        env = match descriptor {
            AddonDescriptor::Archive { url, folder } => {
                fetch::install_archive(env, url, folder, &addons_path)?
            }
            AddonDescriptor::Repository {
                repo,
                reference,
                path,
            } => fetch::install_repository(env, repo, reference, path, &addons_path)?,
        };
    }

    Ok(env)
}
