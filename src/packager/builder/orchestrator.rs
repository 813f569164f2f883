//! Package assembly.
//!
//! This module provides the [`Packager`] orchestrator that drives one full
//! packaging run, from the top-level requirements file to the deployable
//! tarball.

use crate::{
    bail,
    packager::{
        PackSettings, Result,
        context::BuildContext,
        error::ErrorExt,
        hooks::StageHooks,
        index::{PackageFinder, PackageIndex},
        requirement::read_requirements,
        utils::{archive, cmd::CommandRunner, fs},
    },
};
use std::path::{Path, PathBuf};

use super::{
    checksum::calculate_sha256,
    python::PythonBuild,
    resolver::{InstallReport, Installer},
};

/// The archive produced by a successful run.
#[derive(Debug, Clone)]
pub struct DeployedArchive {
    /// Location the archive was copied to.
    pub path: PathBuf,
    /// Archive size in bytes.
    pub size: u64,
    /// Hex-encoded SHA-256 of the archive.
    pub checksum: String,
    /// What happened to each requirement.
    pub report: InstallReport,
}

/// Main packaging orchestrator.
///
/// # Examples
///
/// ```no_run
/// use chuckbox::packager::{Packager, PackSettingsBuilder};
///
/// # async fn example() -> chuckbox::packager::Result<()> {
/// let settings = PackSettingsBuilder::new()
///     .project_name("myproj")
///     .version("1.0.0")
///     .project_path("/src/myproj")
///     .build()?;
///
/// let archive = Packager::new(settings).pack().await?;
/// println!("Created {} ({} bytes)", archive.path.display(), archive.size);
/// println!("SHA256: {}", archive.checksum);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Packager<I = PackageFinder> {
    settings: PackSettings,
    index: I,
    python: PythonBuild,
    hooks: StageHooks,
}

impl Packager<PackageFinder> {
    /// Creates a packager that resolves requirements through a
    /// [`PackageFinder`] over the configured find-links and index URLs.
    pub fn new(settings: PackSettings) -> Self {
        let index = PackageFinder::new(
            settings.find_links().to_vec(),
            settings.index_urls().to_vec(),
        );
        Self::with_index(settings, index)
    }
}

impl<I: PackageIndex> Packager<I> {
    /// Creates a packager that resolves requirements through `index`.
    pub fn with_index(settings: PackSettings, index: I) -> Self {
        let python = PythonBuild::new(
            settings.python(),
            CommandRunner::new(settings.command_timeout()),
        );
        Self {
            settings,
            index,
            python,
            hooks: StageHooks::default(),
        }
    }

    /// Registers stage hooks for this run.
    pub fn hooks(mut self, hooks: StageHooks) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn settings(&self) -> &PackSettings {
        &self.settings
    }

    /// Runs the whole pipeline and returns the deployed archive.
    ///
    /// The process working directory is switched to the project path for the
    /// duration of the build and restored afterwards, whatever the outcome.
    ///
    /// # Errors
    ///
    /// Failures of individual requirements are recorded in the returned
    /// report. Any other failure ends the run: the build root is left in
    /// place for inspection and its path logged.
    pub async fn pack(&self) -> Result<DeployedArchive> {
        let name = self.settings.project_name();
        if !self.settings.project_path().is_dir() {
            bail!(
                "project path {} is not a directory",
                self.settings.project_path().display()
            );
        }
        let original_dir =
            std::env::current_dir().fs_context("reading current directory", ".")?;
        let output_dir = self
            .settings
            .output_dir()
            .map_or_else(|| original_dir.clone(), Path::to_path_buf);

        let guard = WorkingDirGuard::enter(self.settings.project_path())?;
        let ctx = BuildContext::create_temp(self.settings.temp_dir(), name).await?;
        log::info!(
            "Packaging {} {} in {}",
            name,
            self.settings.version(),
            ctx.root().display()
        );

        let (tarball, report) = match self.assemble(&ctx).await {
            Ok(staged) => staged,
            Err(err) => return Err(leave_build_root(&ctx, err)),
        };
        drop(guard);

        let dest = output_dir.join(self.settings.archive_name());
        let deployed = match deliver(&tarball, &dest, report).await {
            Ok(deployed) => deployed,
            Err(err) => return Err(leave_build_root(&ctx, err)),
        };

        ctx.destroy().await?;
        log::info!(
            "Created {} ({} bytes, sha256 {})",
            deployed.path.display(),
            deployed.size,
            deployed.checksum
        );
        Ok(deployed)
    }

    /// Installs requirements, builds the project and writes the tarball
    /// inside the build root.
    async fn assemble(&self, ctx: &BuildContext) -> Result<(PathBuf, InstallReport)> {
        let name = self.settings.project_name();

        let lines = read_requirements(&self.settings.requirements_file()).await?;
        let mut installer = Installer::new(ctx, &self.index, &self.python, &self.hooks);
        installer.install_all(&lines).await;
        let report = installer.into_report();
        log_report(&report);

        log::info!("Building {}", name);
        self.python.build(ctx, None).await?;
        self.python.install(ctx, None).await?;

        let layout = self.settings.layout_dir();
        if tokio::fs::try_exists(&layout)
            .await
            .fs_context("checking layout directory", &layout)?
        {
            log::info!("Merging layout from {}", layout.display());
            fs::mirror_dir(&layout, &ctx.deploy.root, self.settings.preserve_symlinks()).await?;
        }

        fs::mirror_dir(
            &ctx.build.dist,
            &ctx.deploy.project_share,
            self.settings.preserve_symlinks(),
        )
        .await?;

        let tarball = ctx.root().join(self.settings.archive_name());
        log::info!("Writing {}", tarball.display());
        archive::create_tarball(&ctx.deploy.root, &tarball).await?;

        Ok((tarball, report))
    }
}

/// Copies the tarball to `dest` and measures the copy.
async fn deliver(tarball: &Path, dest: &Path, report: InstallReport) -> Result<DeployedArchive> {
    if let Some(parent) = dest.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .fs_context("creating output directory", parent)?;
    }
    tokio::fs::copy(tarball, dest)
        .await
        .fs_context("copying archive", dest)?;

    let size = tokio::fs::metadata(dest)
        .await
        .fs_context("reading archive metadata", dest)?
        .len();
    let checksum = calculate_sha256(dest).await?;

    Ok(DeployedArchive {
        path: dest.to_path_buf(),
        size,
        checksum,
        report,
    })
}

fn leave_build_root(ctx: &BuildContext, err: crate::packager::Error) -> crate::packager::Error {
    log::error!("{}", err);
    log::error!("Build root left at {}", ctx.root().display());
    err
}

fn log_report(report: &InstallReport) {
    log::info!(
        "Requirements: {} installed, {} skipped, {} failed",
        report.installed.len(),
        report.skipped.len(),
        report.failed.len()
    );
    for failed in &report.failed {
        log::warn!("  {}: {}", failed.requirement, failed.error);
    }
}

/// Switches the process working directory and switches it back on drop.
struct WorkingDirGuard {
    previous: PathBuf,
}

impl WorkingDirGuard {
    fn enter(dir: &Path) -> Result<Self> {
        let previous = std::env::current_dir().fs_context("reading current directory", ".")?;
        std::env::set_current_dir(dir).fs_context("changing directory", dir)?;
        log::debug!("Entered {}", dir.display());
        Ok(Self { previous })
    }
}

impl Drop for WorkingDirGuard {
    fn drop(&mut self) {
        if let Err(e) = std::env::set_current_dir(&self.previous) {
            log::warn!("Failed to restore {}: {}", self.previous.display(), e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[serial_test::serial]
    fn guard_restores_working_directory() {
        let before = std::env::current_dir().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().canonicalize().unwrap();

        {
            let _guard = WorkingDirGuard::enter(&target).unwrap();
            assert_eq!(std::env::current_dir().unwrap(), target);
        }

        assert_eq!(std::env::current_dir().unwrap(), before);
    }

    #[tokio::test]
    async fn missing_project_path_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let settings = crate::packager::PackSettingsBuilder::new()
            .project_name("p")
            .version("1")
            .project_path(dir.path().join("missing"))
            .build()
            .unwrap();

        let err = Packager::new(settings).pack().await.unwrap_err();
        assert!(matches!(err, crate::packager::Error::GenericError(_)));
    }

    #[test]
    #[serial_test::serial]
    fn guard_fails_for_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        assert!(WorkingDirGuard::enter(&dir.path().join("missing")).is_err());
    }
}
