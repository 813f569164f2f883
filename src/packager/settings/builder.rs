//! Builder for constructing PackSettings.

use super::PackSettings;
use crate::packager::{
    error::{Context, ErrorExt},
    index::DEFAULT_INDEX_URL,
};
use path_absolutize::Absolutize;
use std::{
    path::{Path, PathBuf},
    time::Duration,
};
use url::Url;

/// Requirements file used when none is given.
pub const DEFAULT_REQUIREMENTS_FILE: &str = "project/install_requires.txt";

/// Static layout directory used when none is given.
pub const DEFAULT_LAYOUT_DIR: &str = "pkg/layout";

/// Builder for constructing [`PackSettings`].
///
/// # Examples
///
/// ```no_run
/// use chuckbox::packager::PackSettingsBuilder;
///
/// # fn example() -> chuckbox::packager::Result<()> {
/// let settings = PackSettingsBuilder::new()
///     .project_name("myproj")
///     .version("1.0.0")
///     .project_path("/src/myproj")
///     .find_links(vec!["/srv/wheelhouse".into()])
///     .python("python3")
///     .build()?;
/// # Ok(())
/// # }
/// ```
#[derive(Default)]
pub struct PackSettingsBuilder {
    project_name: Option<String>,
    version: Option<String>,
    project_path: Option<PathBuf>,
    requirements_file: Option<PathBuf>,
    layout_dir: Option<PathBuf>,
    python: Option<String>,
    command_timeout: Option<Duration>,
    index_urls: Option<Vec<Url>>,
    find_links: Vec<PathBuf>,
    output_dir: Option<PathBuf>,
    temp_dir: Option<PathBuf>,
    preserve_symlinks: bool,
}

impl PackSettingsBuilder {
    /// Creates a new settings builder.
    pub fn new() -> Self {
        Default::default()
    }

    /// Sets the project name. Required.
    pub fn project_name(mut self, name: impl Into<String>) -> Self {
        self.project_name = Some(name.into());
        self
    }

    /// Sets the project version. Required.
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Sets the project source path. Required; relative paths are resolved
    /// against the current directory at build time.
    pub fn project_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.project_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Default: `project/install_requires.txt`
    pub fn requirements_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.requirements_file = Some(path.as_ref().to_path_buf());
        self
    }

    /// Default: `pkg/layout`
    pub fn layout_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.layout_dir = Some(path.as_ref().to_path_buf());
        self
    }

    /// Default: `python`
    pub fn python(mut self, interpreter: impl Into<String>) -> Self {
        self.python = Some(interpreter.into());
        self
    }

    /// Default: no timeout
    pub fn command_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.command_timeout = timeout;
        self
    }

    /// Default: the PyPI simple index. An empty list disables index lookups.
    pub fn index_urls(mut self, urls: Vec<Url>) -> Self {
        self.index_urls = Some(urls);
        self
    }

    /// Default: none
    pub fn find_links(mut self, dirs: Vec<PathBuf>) -> Self {
        self.find_links = dirs;
        self
    }

    /// Default: the working directory the run starts from
    pub fn output_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.output_dir = Some(path.as_ref().to_path_buf());
        self
    }

    /// Default: the system temp directory
    pub fn temp_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.temp_dir = Some(path.as_ref().to_path_buf());
        self
    }

    /// Default: false
    pub fn preserve_symlinks(mut self, preserve: bool) -> Self {
        self.preserve_symlinks = preserve;
        self
    }

    /// Builds the settings, absolutizing every path.
    ///
    /// # Errors
    ///
    /// Returns an error if `project_name`, `version` or `project_path` is
    /// missing, or a path cannot be made absolute.
    pub fn build(self) -> crate::packager::Result<PackSettings> {
        let project_path = self.project_path.context("project_path is required")?;
        let index_urls = match self.index_urls {
            Some(urls) => urls,
            None => vec![
                Url::parse(DEFAULT_INDEX_URL)
                    .map_err(|e| crate::packager::Error::GenericError(e.to_string()))?,
            ],
        };

        Ok(PackSettings {
            project_name: self.project_name.context("project_name is required")?,
            version: self.version.context("version is required")?,
            project_path: absolute(&project_path)?,
            requirements_file: self
                .requirements_file
                .unwrap_or_else(|| PathBuf::from(DEFAULT_REQUIREMENTS_FILE)),
            layout_dir: self
                .layout_dir
                .unwrap_or_else(|| PathBuf::from(DEFAULT_LAYOUT_DIR)),
            python: self.python.unwrap_or_else(|| "python".to_string()),
            command_timeout: self.command_timeout,
            index_urls,
            find_links: self
                .find_links
                .iter()
                .map(|dir| absolute(dir))
                .collect::<crate::packager::Result<_>>()?,
            output_dir: self.output_dir.as_deref().map(absolute).transpose()?,
            temp_dir: self.temp_dir.as_deref().map(absolute).transpose()?,
            preserve_symlinks: self.preserve_symlinks,
        })
    }
}

fn absolute(path: &Path) -> crate::packager::Result<PathBuf> {
    Ok(path
        .absolutize()
        .fs_context("resolving absolute path", path)?
        .into_owned())
}
