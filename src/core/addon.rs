//! Addon descriptors and the addon manifest
//!
//! An addon is a self-contained directory tree installed into the project's
//! `addons/` folder. Each descriptor names one external source; the closed
//! tagged union makes adding a new source kind a compile-time-checked
//! extension rather than a string-compared branch.
//!
//! Descriptors are loaded from an `addons.toml` manifest:
//!
//! ```toml
//! [[addon]]
//! type = "archive"
//! url = "https://example.com/releases/addons.zip"
//! folder = "fmod"
//!
//! [[addon]]
//! type = "repository"
//! repo = "https://github.com/expressobits/inventory-system"
//! ref = "addon-2.6.3"
//! path = "./addons/inventory-system"
//! ```

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::AddonError;

/// One addon to install, tagged by source kind
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AddonDescriptor {
    /// An archive available over HTTP; after unpacking, `folder` (relative
    /// to the archive root) is the addon payload
    Archive {
        /// Archive URL
        url: String,
        /// Folder inside the unpacked archive
        folder: String,
    },
    /// A version-controlled repository; checking out `ref` and taking the
    /// subpath `path` is the addon payload
    Repository {
        /// Repository URL
        repo: String,
        /// Branch or tag to check out
        #[serde(rename = "ref")]
        reference: String,
        /// Subpath inside the checkout (a leading `./` is tolerated)
        path: String,
    },
}

impl AddonDescriptor {
    /// Final folder name the addon is installed under
    ///
    /// For archives this is the declared inner folder; for repositories it
    /// is the last segment of the source path.
    pub fn install_name(&self) -> &str {
        match self {
            Self::Archive { folder, .. } => folder,
            Self::Repository { path, .. } => {
                let stripped = strip_dot_prefix(path);
                stripped.rsplit('/').next().unwrap_or(stripped)
            }
        }
    }

    /// Short human-readable identifier for log and error messages
    pub fn describe(&self) -> String {
        match self {
            Self::Archive { url, .. } => format!("archive:{url}"),
            Self::Repository { repo, reference, .. } => format!("repository:{repo}@{reference}"),
        }
    }

    /// Check that every field that must be non-empty is non-empty
    pub fn validate(&self) -> Result<(), AddonError> {
        let empty = |descriptor: &Self, field| AddonError::EmptyField {
            descriptor: descriptor.describe(),
            field,
        };

        match self {
            Self::Archive { url, folder } => {
                if url.is_empty() {
                    return Err(empty(self, "url"));
                }
                if folder.is_empty() {
                    return Err(empty(self, "folder"));
                }
            }
            Self::Repository {
                repo,
                reference,
                path,
            } => {
                if repo.is_empty() {
                    return Err(empty(self, "repo"));
                }
                if reference.is_empty() {
                    return Err(empty(self, "ref"));
                }
                if strip_dot_prefix(path).is_empty() {
                    return Err(empty(self, "path"));
                }
            }
        }
        Ok(())
    }
}

/// Strip a leading `./` from a relative path string
pub fn strip_dot_prefix(path: &str) -> &str {
    path.strip_prefix("./").unwrap_or(path)
}

/// Ordered set of addon descriptors, processed in order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AddonSet {
    descriptors: Vec<AddonDescriptor>,
}

/// Manifest file wrapper (`[[addon]]` array)
#[derive(Debug, Deserialize)]
struct AddonManifest {
    #[serde(default)]
    addon: Vec<AddonDescriptor>,
}

impl AddonSet {
    /// Build a set from descriptors, validating fields and rejecting
    /// duplicate final folder names
    pub fn new(descriptors: Vec<AddonDescriptor>) -> Result<Self, AddonError> {
        let mut seen = HashSet::new();
        for descriptor in &descriptors {
            descriptor.validate()?;
            if !seen.insert(descriptor.install_name().to_string()) {
                return Err(AddonError::DuplicateName {
                    name: descriptor.install_name().to_string(),
                });
            }
        }
        Ok(Self { descriptors })
    }

    /// Parse a manifest from TOML content
    pub fn from_toml(content: &str) -> Result<Self, AddonError> {
        let manifest: AddonManifest = toml::from_str(content)?;
        Self::new(manifest.addon)
    }

    /// Load a manifest file
    pub fn load(path: &Path) -> Result<Self, AddonError> {
        let content = std::fs::read_to_string(path).map_err(|e| AddonError::ManifestRead {
            path: path.display().to_string(),
            error: e.to_string(),
        })?;
        Self::from_toml(&content)
    }

    /// Resolve the addon set for a run
    ///
    /// An explicitly given manifest wins; otherwise a project-local
    /// `addons.toml` is used if present; otherwise the built-in set.
    pub fn resolve(
        manifest: Option<&Path>,
        project_dir: Option<&Path>,
    ) -> Result<Self, AddonError> {
        if let Some(path) = manifest {
            tracing::info!(manifest = %path.display(), "Loading addon manifest");
            return Self::load(path);
        }
        if let Some(dir) = project_dir {
            let candidate = dir.join(crate::config::defaults::ADDON_MANIFEST_NAME);
            if candidate.exists() {
                tracing::info!(manifest = %candidate.display(), "Loading project addon manifest");
                return Self::load(&candidate);
            }
        }
        tracing::info!("No addon manifest found, using built-in addon set");
        Ok(Self::builtin())
    }

    /// The built-in default set (FMOD archive + inventory-system repository)
    pub fn builtin() -> Self {
        let descriptors = vec![
            AddonDescriptor::Archive {
                url: "https://github.com/utopia-rise/fmod-gdextension/releases/download/5.0.6-4.4.0/addons.zip"
                    .to_string(),
                folder: "fmod".to_string(),
            },
            AddonDescriptor::Repository {
                repo: "https://github.com/expressobits/inventory-system".to_string(),
                reference: "addon-2.6.3".to_string(),
                path: "./addons/inventory-system".to_string(),
            },
        ];
        // The built-in list is known to validate.
        Self { descriptors }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, AddonDescriptor> {
        self.descriptors.iter()
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

impl<'a> IntoIterator for &'a AddonSet {
    type Item = &'a AddonDescriptor;
    type IntoIter = std::slice::Iter<'a, AddonDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.descriptors.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn archive(url: &str, folder: &str) -> AddonDescriptor {
        AddonDescriptor::Archive {
            url: url.to_string(),
            folder: folder.to_string(),
        }
    }

    fn repository(repo: &str, reference: &str, path: &str) -> AddonDescriptor {
        AddonDescriptor::Repository {
            repo: repo.to_string(),
            reference: reference.to_string(),
            path: path.to_string(),
        }
    }

    // ============================================
    // Unit Tests - install_name
    // ============================================

    #[test]
    fn test_archive_install_name_is_folder() {
        let d = archive("https://example.com/a.zip", "fmod");
        assert_eq!(d.install_name(), "fmod");
    }

    #[test]
    fn test_repository_install_name_strips_dot_prefix() {
        let dotted = repository("https://r", "main", "./addons/inventory-system");
        let plain = repository("https://r", "main", "addons/inventory-system");
        assert_eq!(dotted.install_name(), "inventory-system");
        assert_eq!(dotted.install_name(), plain.install_name());
    }

    #[test]
    fn test_repository_install_name_single_segment() {
        let d = repository("https://r", "main", "addon");
        assert_eq!(d.install_name(), "addon");
    }

    // ============================================
    // Unit Tests - Validation
    // ============================================

    #[test]
    fn test_empty_url_rejected() {
        let err = AddonSet::new(vec![archive("", "fmod")]).unwrap_err();
        assert!(matches!(err, AddonError::EmptyField { field: "url", .. }));
    }

    #[test]
    fn test_empty_folder_rejected() {
        let err = AddonSet::new(vec![archive("https://a", "")]).unwrap_err();
        assert!(matches!(err, AddonError::EmptyField { field: "folder", .. }));
    }

    #[test]
    fn test_dot_only_path_rejected() {
        let err = AddonSet::new(vec![repository("https://r", "main", "./")]).unwrap_err();
        assert!(matches!(err, AddonError::EmptyField { field: "path", .. }));
    }

    #[test]
    fn test_duplicate_install_names_rejected() {
        let err = AddonSet::new(vec![
            archive("https://a", "fmod"),
            repository("https://r", "main", "addons/fmod"),
        ])
        .unwrap_err();
        assert!(matches!(err, AddonError::DuplicateName { name } if name == "fmod"));
    }

    // ============================================
    // Unit Tests - Manifest parsing
    // ============================================

    #[test]
    fn test_manifest_round_trip() {
        let toml = r#"
            [[addon]]
            type = "archive"
            url = "https://example.com/addons.zip"
            folder = "fmod"

            [[addon]]
            type = "repository"
            repo = "https://github.com/expressobits/inventory-system"
            ref = "addon-2.6.3"
            path = "./addons/inventory-system"
        "#;

        let set = AddonSet::from_toml(toml).unwrap();
        assert_eq!(set.len(), 2);

        let names: Vec<_> = set.iter().map(AddonDescriptor::install_name).collect();
        assert_eq!(names, vec!["fmod", "inventory-system"]);
    }

    #[test]
    fn test_manifest_unknown_type_rejected() {
        let toml = r#"
            [[addon]]
            type = "carrier-pigeon"
            url = "https://example.com"
        "#;
        assert!(matches!(
            AddonSet::from_toml(toml),
            Err(AddonError::ManifestParse(_))
        ));
    }

    #[test]
    fn test_empty_manifest_is_empty_set() {
        let set = AddonSet::from_toml("").unwrap();
        assert!(set.is_empty());
    }

    #[test]
    fn test_builtin_set_is_valid() {
        let set = AddonSet::builtin();
        assert_eq!(set.len(), 2);
        assert!(AddonSet::new(set.iter().cloned().collect()).is_ok());
    }

    #[test]
    fn test_manifest_missing_file() {
        let err = AddonSet::load(Path::new("/nonexistent/addons.toml")).unwrap_err();
        assert!(matches!(err, AddonError::ManifestRead { .. }));
    }

    // ============================================
    // Property-Based Tests
    // ============================================

    fn segment_strategy() -> impl Strategy<Value = String> {
        crate::test_utils::generators::addon_name()
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Property: a leading `./` never changes the install name.
        #[test]
        fn prop_dot_prefix_equivalent(
            a in segment_strategy(),
            b in segment_strategy(),
        ) {
            let plain = repository("https://r", "main", &format!("{a}/{b}"));
            let dotted = repository("https://r", "main", &format!("./{a}/{b}"));
            prop_assert_eq!(plain.install_name(), dotted.install_name());
        }

        /// Property: the install name is always the last path segment.
        #[test]
        fn prop_install_name_is_last_segment(
            segments in proptest::collection::vec(segment_strategy(), 1..4),
        ) {
            let path = segments.join("/");
            let d = repository("https://r", "main", &path);
            prop_assert_eq!(d.install_name(), segments.last().unwrap());
        }

        /// Property: descriptors survive a TOML round trip unchanged.
        #[test]
        fn prop_manifest_serde_round_trip(
            folder in segment_strategy(),
            reference in segment_strategy(),
            path_tail in segment_strategy(),
        ) {
            let set = AddonSet::new(vec![
                archive("https://example.com/a.zip", &folder),
                repository("https://r", &reference, &format!("addons/{path_tail}")),
            ]);
            prop_assume!(set.is_ok());
            let set = set.unwrap();

            let toml_text = toml::to_string(&ManifestOut {
                addon: set.iter().cloned().collect(),
            })
            .unwrap();
            let reparsed = AddonSet::from_toml(&toml_text).unwrap();
            prop_assert_eq!(set, reparsed);
        }
    }

    #[derive(serde::Serialize)]
    struct ManifestOut {
        addon: Vec<AddonDescriptor>,
    }
}
