//! Core PackSettings struct and implementations.

use std::{
    path::{Path, PathBuf},
    time::Duration,
};
use url::Url;

/// Settings for one packaging run.
///
/// Constructed via [`PackSettingsBuilder`](super::PackSettingsBuilder).
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
///     .project_path(".")
///     .build()?;
/// assert_eq!(settings.archive_name(), "myproj_1.0.0.tar.gz");
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct PackSettings {
    pub(super) project_name: String,
    pub(super) version: String,

    /// Absolute path of the project source.
    pub(super) project_path: PathBuf,

    /// Top-level requirements file, relative to the project path.
    pub(super) requirements_file: PathBuf,

    /// Static deployment layout, relative to the project path.
    pub(super) layout_dir: PathBuf,

    pub(super) python: String,
    pub(super) command_timeout: Option<Duration>,
    pub(super) index_urls: Vec<Url>,
    pub(super) find_links: Vec<PathBuf>,

    /// Where the finished archive is copied. `None` means the working
    /// directory the run was started from.
    pub(super) output_dir: Option<PathBuf>,

    /// Parent of the temporary build root. `None` means the system temp dir.
    pub(super) temp_dir: Option<PathBuf>,

    pub(super) preserve_symlinks: bool,
}

impl PackSettings {
    pub fn project_name(&self) -> &str {
        &self.project_name
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn project_path(&self) -> &Path {
        &self.project_path
    }

    /// Absolute path of the top-level requirements file.
    pub fn requirements_file(&self) -> PathBuf {
        self.project_path.join(&self.requirements_file)
    }

    /// Absolute path of the static deployment layout directory.
    pub fn layout_dir(&self) -> PathBuf {
        self.project_path.join(&self.layout_dir)
    }

    /// Python interpreter used for build steps.
    pub fn python(&self) -> &str {
        &self.python
    }

    /// Per-command timeout, `None` waits indefinitely.
    pub fn command_timeout(&self) -> Option<Duration> {
        self.command_timeout
    }

    pub fn index_urls(&self) -> &[Url] {
        &self.index_urls
    }

    pub fn find_links(&self) -> &[PathBuf] {
        &self.find_links
    }

    pub fn output_dir(&self) -> Option<&Path> {
        self.output_dir.as_deref()
    }

    pub fn temp_dir(&self) -> Option<&Path> {
        self.temp_dir.as_deref()
    }

    /// Whether mirrored trees keep symlinks instead of copying their targets.
    pub fn preserve_symlinks(&self) -> bool {
        self.preserve_symlinks
    }

    /// Output archive filename, `{project}_{version}.tar.gz`.
    pub fn archive_name(&self) -> String {
        format!("{}_{}.tar.gz", self.project_name, self.version)
    }
}
