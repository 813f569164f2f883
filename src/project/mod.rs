//! Project resource and version discovery.
//!
//! A project's resources live in one or more search paths; the version is
//! read from a `VERSION` marker file in the first path that has one.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the version marker file.
pub const VERSION_FILE: &str = "VERSION";

/// A resource could not be found, or held no usable content.
#[derive(Error, Debug)]
pub enum MissingResourceError {
    /// No search path contains the resource.
    #[error("unable to locate {resource} in {searched}")]
    NotFound {
        /// Relative resource path.
        resource: String,
        /// Search paths that were tried, joined for display.
        searched: String,
    },

    /// The version file exists but holds no version.
    #[error("no version info found in file: {}", path.display())]
    NoVersion {
        /// Version file that was read.
        path: PathBuf,
    },

    /// The resource exists but could not be read.
    #[error("failed to read {}: {error}", path.display())]
    Unreadable {
        /// Resource path.
        path: PathBuf,
        /// Underlying error.
        error: std::io::Error,
    },
}

/// Resource lookup for a named project.
#[derive(Debug, Clone)]
pub struct ProjectManifest {
    name: String,
    search_paths: Vec<PathBuf>,
}

impl ProjectManifest {
    /// Describes project `name` whose resources live under `search_paths`,
    /// searched in order.
    pub fn about(name: impl Into<String>, search_paths: Vec<PathBuf>) -> Self {
        Self {
            name: name.into(),
            search_paths,
        }
    }

    /// Manifest for a project laid out as `{path}/src/{name}/`.
    pub fn in_source_tree(path: &Path, name: &str) -> Self {
        Self::about(name, vec![path.join("src").join(name)])
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the first existing `{search_path}/{relative}`.
    pub fn find(&self, relative: impl AsRef<Path>) -> Result<PathBuf, MissingResourceError> {
        let relative = relative.as_ref();
        self.search_paths
            .iter()
            .map(|dir| dir.join(relative))
            .find(|candidate| candidate.exists())
            .ok_or_else(|| MissingResourceError::NotFound {
                resource: relative.display().to_string(),
                searched: self
                    .search_paths
                    .iter()
                    .map(|p| p.display().to_string())
                    .collect::<Vec<_>>()
                    .join(", "),
            })
    }

    /// Reads the first line of the `VERSION` file, trimmed.
    pub fn version(&self) -> Result<String, MissingResourceError> {
        let path = self.find(VERSION_FILE)?;
        let contents =
            std::fs::read_to_string(&path).map_err(|error| MissingResourceError::Unreadable {
                path: path.clone(),
                error,
            })?;

        match contents.lines().next().map(str::trim) {
            Some(version) if !version.is_empty() => Ok(version.to_string()),
            _ => Err(MissingResourceError::NoVersion { path }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_resource_in_first_matching_path() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        std::fs::write(second.path().join("data.txt"), "x").unwrap();

        let manifest = ProjectManifest::about(
            "demo",
            vec![first.path().to_path_buf(), second.path().to_path_buf()],
        );

        assert_eq!(manifest.find("data.txt").unwrap(), second.path().join("data.txt"));
        assert!(matches!(
            manifest.find("other.txt"),
            Err(MissingResourceError::NotFound { .. })
        ));
    }

    #[test]
    fn reads_trimmed_first_line_as_version() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("src/demo");
        std::fs::create_dir_all(&src).unwrap();
        std::fs::write(src.join("VERSION"), "1.2.3 \nignored\n").unwrap();

        let manifest = ProjectManifest::in_source_tree(dir.path(), "demo");
        assert_eq!(manifest.version().unwrap(), "1.2.3");
    }

    #[test]
    fn empty_version_file_is_missing_version() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("VERSION"), "\n").unwrap();

        let manifest = ProjectManifest::about("demo", vec![dir.path().to_path_buf()]);
        assert!(matches!(
            manifest.version(),
            Err(MissingResourceError::NoVersion { .. })
        ));
    }
}
