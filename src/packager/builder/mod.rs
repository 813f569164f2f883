//! Build orchestration.
//!
//! This module provides the [`Packager`] orchestrator and the pieces it
//! drives:
//!
//! 1. [`Installer`] resolves, fetches, unpacks, builds and installs every
//!    requirement, dependencies first
//! 2. [`PythonBuild`] runs the setuptools steps for one source tree
//! 3. [`Packager`] builds the project itself, merges the deployment layout
//!    and writes the archive
//!
//! # Example
//!
//! ```no_run
//! use chuckbox::packager::{Packager, PackSettingsBuilder, Stage, StageHooks};
//!
//! # async fn example() -> chuckbox::packager::Result<()> {
//! let settings = PackSettingsBuilder::new()
//!     .project_name("myproj")
//!     .version("1.0.0")
//!     .project_path(".")
//!     .build()?;
//!
//! let hooks = StageHooks::new().on("requests", Stage::InstallAfter, |ctx| {
//!     println!("installed {}", ctx.requirement);
//! });
//!
//! let archive = Packager::new(settings).hooks(hooks).pack().await?;
//! println!("SHA256: {}", archive.checksum);
//! # Ok(())
//! # }
//! ```

mod checksum;
mod orchestrator;
mod python;
mod resolver;

pub use orchestrator::{DeployedArchive, Packager};
pub use python::PythonBuild;
pub use resolver::{FailedRequirement, InstallReport, Installer};
