//! Project packaging pipeline.
//!
//! Turns a project and its requirements list into a deployable tarball:
//!
//! 1. [`Installer`] resolves every requirement through a [`PackageIndex`],
//!    fetches and unpacks its source, installs its own requirements first and
//!    then builds and installs it into the staging tree of a [`BuildContext`]
//! 2. [`Packager`] builds the project itself, overlays the static deployment
//!    layout, mirrors the staged install into `usr/share/{project}` and writes
//!    `{project}_{version}.tar.gz`
//!
//! Lifecycle callbacks can observe each stage of each requirement through
//! [`StageHooks`].

pub mod builder;
pub mod context;
pub mod error;
pub mod hooks;
pub mod index;
pub mod requirement;
pub mod settings;
pub mod utils;

pub use builder::{
    DeployedArchive, FailedRequirement, InstallReport, Installer, Packager, PythonBuild,
};
pub use context::{BuildContext, BuildLocations, DeploymentLocations};
pub use error::{Error, Result};
pub use hooks::{HookContext, Stage, StageHooks};
pub use index::{PackageFinder, PackageIndex, ResolvedDistribution};
pub use requirement::{Requirement, VersionConstraint};
pub use settings::{PackSettings, PackSettingsBuilder};
pub use utils::cmd::{CommandResult, CommandRunner};
